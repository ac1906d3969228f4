use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};

use crate::{
    error::AppError,
    signature::{SIGNATURE_HEADER, verify_signature},
    state::AppState,
};

/// Raw webhook body whose signature has been checked against the configured
/// secret. Extraction fails with `401` before the handler runs.
#[derive(Debug, Clone)]
pub struct VerifiedWebhook(pub Bytes);

impl FromRequest<AppState> for VerifiedWebhook {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = req
            .headers()
            .get(SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;

        let secret = state.config.mercadopago.webhook_secret.as_deref();
        if !verify_signature(header.as_deref(), &body, secret) {
            return Err(AppError::Unauthorized);
        }

        Ok(Self(body))
    }
}
