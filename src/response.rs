use axum::http::HeaderMap;
use serde::Serialize;
use utoipa::ToSchema;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct Meta {
    pub request_id: Option<String>,
}

impl Meta {
    pub fn empty() -> Self {
        Self { request_id: None }
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            request_id: headers
                .get(REQUEST_ID_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned),
        }
    }
}

/// Envelope for API bodies. The checkout response is the one flat exception.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta,
        }
    }
}
