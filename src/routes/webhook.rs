use axum::{Json, extract::State, http::HeaderMap};

use crate::{
    dto::webhook::WebhookAck,
    error::AppResult,
    middleware::webhook_auth::VerifiedWebhook,
    response::{ApiResponse, Meta},
    services::order_service,
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/api/mp-webhook",
    request_body(
        content = String,
        content_type = "application/json",
        description = "Payment notification, `{data: {id}}` or `{id}`"
    ),
    params(
        ("x-signature" = Option<String>, Header, description = "`ts=<timestamp>,v1=<hex hmac>`")
    ),
    responses(
        (status = 200, description = "Notification handled or ignored", body = ApiResponse<WebhookAck>),
        (status = 401, description = "Invalid signature"),
        (status = 405, description = "Method not allowed"),
        (status = 500, description = "Gateway or storage failure; the gateway should retry"),
    ),
    security(("webhook_signature" = [])),
    tag = "Payments"
)]
pub async fn mp_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    VerifiedWebhook(body): VerifiedWebhook,
) -> AppResult<Json<ApiResponse<WebhookAck>>> {
    let ack = order_service::confirm_payment(&state, &body).await?;
    Ok(Json(ApiResponse::success(
        ack.outcome.message(),
        ack,
        Some(Meta::from_headers(&headers)),
    )))
}
