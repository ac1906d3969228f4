use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    config::{ConfigError, MercadoPagoSettings},
    models::OrderItem,
};

use super::{GatewayError, Payment, PaymentGateway, Preference, PreferenceRequest};

#[derive(Clone)]
pub struct MercadoPagoClient {
    client: Client,
    settings: MercadoPagoSettings,
}

#[derive(Deserialize, Default)]
struct UpstreamMessage {
    message: Option<String>,
}

impl MercadoPagoClient {
    pub fn new(client: Client, settings: MercadoPagoSettings) -> Self {
        Self { client, settings }
    }

    fn access_token(&self) -> Result<&str, GatewayError> {
        self.settings
            .access_token
            .as_deref()
            .ok_or(GatewayError::Config(ConfigError::Missing("MP_ACCESS_TOKEN")))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.api_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl PaymentGateway for MercadoPagoClient {
    async fn create_preference(
        &self,
        items: &[OrderItem],
        order_id: Uuid,
        base_url: &str,
    ) -> Result<Preference, GatewayError> {
        let token = self.access_token()?;
        let request = PreferenceRequest::for_order(items, order_id, base_url);

        let response = self
            .client
            .post(self.url("/checkout/preferences"))
            .bearer_auth(token)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(
                upstream_error(response, "Failed to create Mercado Pago preference.").await,
            );
        }

        let preference: Preference = response.json().await?;
        tracing::debug!(
            %order_id,
            preference_id = preference.id.as_deref().unwrap_or("-"),
            "payment preference created"
        );
        Ok(preference)
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<Payment, GatewayError> {
        let token = self.access_token()?;
        let response = self
            .client
            .get(self.url(&format!("/v1/payments/{payment_id}")))
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(upstream_error(response, "Failed to fetch payment.").await);
        }

        Ok(response.json().await?)
    }
}

async fn upstream_error(response: Response, fallback: &str) -> GatewayError {
    let status = response.status().as_u16();
    let body: UpstreamMessage = response.json().await.unwrap_or_default();
    GatewayError::Upstream {
        status,
        message: body
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| fallback.to_string()),
    }
}
