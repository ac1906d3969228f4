use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, header::HOST},
};

use crate::{
    dto::orders::{CheckoutResponse, CreateOrderRequest},
    error::{AppError, AppResult},
    services::order_service,
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/api/create-order",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Order stored and checkout opened", body = CheckoutResponse),
        (status = 400, description = "Empty cart or invalid item"),
        (status = 405, description = "Method not allowed"),
        (status = 500, description = "Storage or payment gateway failure"),
    ),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<CheckoutResponse>> {
    let payload: CreateOrderRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CreateOrderRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::Validation(format!("Invalid request body: {e}")))?
    };

    let base_url = resolve_base_url(state.config.public_url.as_deref(), &headers);
    let response = order_service::create_order(&state, payload, base_url.as_deref()).await?;
    Ok(Json(response))
}

/// Public origin of the service: the configured URL when there is one,
/// otherwise rebuilt from the proxy's forwarded headers.
pub fn resolve_base_url(configured: Option<&str>, headers: &HeaderMap) -> Option<String> {
    if let Some(url) = configured.map(str::trim).filter(|url| !url.is_empty()) {
        return Some(url.trim_end_matches('/').to_string());
    }

    let host = first_value(headers, "x-forwarded-host").or_else(|| first_value(headers, HOST.as_str()))?;
    let proto = first_value(headers, "x-forwarded-proto").unwrap_or("https");
    Some(format!("{proto}://{host}"))
}

fn first_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
