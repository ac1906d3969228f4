use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::opt_string_or_number;

/// Payment notification body. The gateway sends either `{data: {id}}` or a
/// bare `{id}`; both ids may be strings or numbers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentEvent {
    #[serde(default)]
    pub data: Option<EventData>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventData {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,
}

impl PaymentEvent {
    pub fn payment_id(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|data| data.id.as_deref())
            .or(self.id.as_deref())
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WebhookOutcome {
    Paid,
    AlreadyPaid,
    NotApproved,
    NoPaymentId,
    NoOrderId,
}

impl WebhookOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            WebhookOutcome::Paid => "OK",
            WebhookOutcome::AlreadyPaid => "Order already paid.",
            WebhookOutcome::NotApproved => "Payment not approved.",
            WebhookOutcome::NoPaymentId => "No payment id.",
            WebhookOutcome::NoOrderId => "No order id.",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WebhookAck {
    pub outcome: WebhookOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<Uuid>,
}

impl WebhookAck {
    pub fn new(outcome: WebhookOutcome) -> Self {
        Self {
            outcome,
            payment_id: None,
            order_id: None,
        }
    }
}
