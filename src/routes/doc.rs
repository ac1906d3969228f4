use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{ApiKey, ApiKeyValue, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        orders::{CartItem, CheckoutResponse, CreateOrderRequest, CustomerInput},
        webhook::{WebhookAck, WebhookOutcome},
    },
    response::{ApiResponse, Meta},
    routes::{health, orders, webhook},
    signature::SIGNATURE_HEADER,
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "webhook_signature",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                SIGNATURE_HEADER,
                "HMAC-SHA256 of `<ts>.<body>` with the shared webhook secret",
            ))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        orders::create_order,
        webhook::mp_webhook
    ),
    components(
        schemas(
            CartItem,
            CustomerInput,
            CreateOrderRequest,
            CheckoutResponse,
            WebhookAck,
            WebhookOutcome,
            Meta,
            ApiResponse<WebhookAck>,
            ApiResponse<health::HealthData>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Orders", description = "Order creation and checkout"),
        (name = "Payments", description = "Payment gateway notifications"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
