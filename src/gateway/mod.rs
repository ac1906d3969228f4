//! Payment gateway seam: preference creation and payment lookups.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    config::ConfigError,
    models::{OrderItem, opt_string_or_number, string_or_number},
};

pub mod mercadopago;

pub use mercadopago::MercadoPagoClient;

/// Route the gateway calls back on payment updates.
pub const WEBHOOK_PATH: &str = "/api/mp-webhook";

pub const APPROVED: &str = "approved";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{message}")]
    Upstream { status: u16, message: String },

    #[error("payment preference has no checkout URL")]
    MissingCheckoutUrl,

    #[error("payment gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreferenceItem {
    pub title: String,
    pub quantity: u32,
    pub unit_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackUrls {
    pub success: String,
    pub failure: String,
    pub pending: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreferenceMetadata {
    pub order_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreferenceRequest {
    pub items: Vec<PreferenceItem>,
    pub external_reference: Uuid,
    pub back_urls: BackUrls,
    pub auto_return: &'static str,
    pub notification_url: String,
    pub metadata: PreferenceMetadata,
}

impl PreferenceRequest {
    /// Builds the checkout request for an order. `base_url` is the public
    /// origin of this service, without a trailing slash.
    pub fn for_order(items: &[OrderItem], order_id: Uuid, base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/');
        Self {
            items: items
                .iter()
                .map(|item| PreferenceItem {
                    title: item.title.clone(),
                    quantity: item.quantity,
                    unit_price: item.price,
                })
                .collect(),
            external_reference: order_id,
            back_urls: BackUrls {
                success: format!("{base_url}/success.html?order_id={order_id}"),
                failure: format!("{base_url}/?payment=failed"),
                pending: format!("{base_url}/?payment=pending"),
            },
            auto_return: APPROVED,
            notification_url: format!("{base_url}{WEBHOOK_PATH}"),
            metadata: PreferenceMetadata { order_id },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Preference {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub init_point: Option<String>,
    #[serde(default)]
    pub sandbox_init_point: Option<String>,
}

impl Preference {
    /// Live checkout URL, falling back to the sandbox one.
    pub fn checkout_url(&self) -> Option<&str> {
        [&self.init_point, &self.sandbox_init_point]
            .into_iter()
            .filter_map(|url| url.as_deref())
            .find(|url| !url.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Payment {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub transaction_amount: Option<f64>,
    #[serde(default)]
    pub payment_method_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub external_reference: Option<String>,
}

impl Payment {
    pub fn is_approved(&self) -> bool {
        self.status == APPROVED
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_preference(
        &self,
        items: &[OrderItem],
        order_id: Uuid,
        base_url: &str,
    ) -> Result<Preference, GatewayError>;

    async fn fetch_payment(&self, payment_id: &str) -> Result<Payment, GatewayError>;
}
