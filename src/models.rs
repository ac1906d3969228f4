use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::gateway::Payment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Created,
    Paid,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    pub price: f64,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub status: String,
    pub amount: Option<f64>,
    pub method: Option<String>,
}

/// An order record as persisted in the repository.
///
/// Keys this type does not know about are kept in `extra` so that a
/// read-modify-write never drops data someone added to the file by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub total: f64,
    pub currency: String,
    #[serde(default)]
    pub customer: Customer,
    pub items: Vec<OrderItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Order {
    pub fn new(items: Vec<OrderItem>, email: Option<String>, currency: &str) -> Self {
        let total = order_total(&items);
        Self {
            id: Uuid::new_v4(),
            status: OrderStatus::Created,
            created_at: Utc::now(),
            total,
            currency: currency.to_string(),
            customer: Customer {
                email: email
                    .map(|e| e.trim().to_string())
                    .filter(|e| !e.is_empty()),
            },
            items,
            payment: None,
            paid_at: None,
            extra: Map::new(),
        }
    }

    pub fn is_paid(&self) -> bool {
        self.status == OrderStatus::Paid
    }

    pub fn customer_email(&self) -> Option<&str> {
        self.customer
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }

    /// Moves the order to its terminal state. Line items are left untouched.
    pub fn mark_paid(&mut self, payment: &Payment, at: DateTime<Utc>) {
        self.status = OrderStatus::Paid;
        self.paid_at = Some(at);
        self.payment = Some(PaymentRecord {
            id: payment.id.clone(),
            status: payment.status.clone(),
            amount: payment.transaction_amount,
            method: payment.payment_method_id.clone(),
        });
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub fn order_total(items: &[OrderItem]) -> f64 {
    items
        .iter()
        .map(|item| item.price * f64::from(item.quantity))
        .sum()
}

/// Location of an order record inside the repository.
pub fn order_path(orders_dir: &str, id: Uuid) -> String {
    format!("{}/{}.json", orders_dir.trim_end_matches('/'), id)
}

/// Accepts either a JSON string or a JSON number and yields its text form.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or a number, got {other}"
        ))),
    }
}

/// Optional variant of [`string_or_number`]; `null` and `""` map to `None`.
pub fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string or a number, got {other}"
        ))),
    }
}
