use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::string_or_number;

/// A cart line as posted by the storefront.
///
/// The storefront's cart may label a product with `title`, `name` or both;
/// `title` wins when both are present.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CartItem {
    #[serde(deserialize_with = "string_or_number")]
    #[schema(value_type = String)]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub price: f64,
    pub quantity: u32,
}

impl CartItem {
    pub fn label(&self) -> Option<&str> {
        [self.title.as_deref(), self.name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|label| !label.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CustomerInput {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub customer: Option<CustomerInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutResponse {
    pub order_id: Uuid,
    pub checkout_url: String,
}
