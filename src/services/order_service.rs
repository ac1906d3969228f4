use chrono::Utc;
use uuid::Uuid;

use crate::{
    config::ConfigError,
    dto::{
        orders::{CartItem, CheckoutResponse, CreateOrderRequest},
        webhook::{PaymentEvent, WebhookAck, WebhookOutcome},
    },
    error::{AppError, AppResult},
    gateway::GatewayError,
    models::{Order, OrderItem, order_path},
    notifier::{customer_confirmation, store_notification},
    state::AppState,
    store::StoreError,
};

/// Persists a new order and opens a checkout for it.
///
/// The order id is only handed back once both the record and the payment
/// preference exist. `base_url` is the public origin the gateway redirects
/// to and notifies; it is only required once the cart is known to be valid.
pub async fn create_order(
    state: &AppState,
    payload: CreateOrderRequest,
    base_url: Option<&str>,
) -> AppResult<CheckoutResponse> {
    let CreateOrderRequest { items, customer } = payload;
    if items.is_empty() {
        return Err(AppError::Validation("Cart is empty.".into()));
    }

    let items = items
        .into_iter()
        .map(validate_item)
        .collect::<AppResult<Vec<_>>>()?;
    let base_url = base_url.ok_or(ConfigError::UnresolvedBaseUrl)?;

    let order = Order::new(
        items,
        customer.and_then(|c| c.email),
        &state.config.store.currency,
    );
    let path = order_path(&state.config.store.orders_dir, order.id);
    let content = order.to_json().map_err(anyhow::Error::from)?;

    state
        .store
        .put(&path, &content, &format!("chore: create order {}", order.id))
        .await?;
    tracing::info!(
        order_id = %order.id,
        total = order.total,
        items = order.items.len(),
        "order created"
    );

    let preference = state
        .gateway
        .create_preference(&order.items, order.id, base_url)
        .await?;
    let checkout_url = preference
        .checkout_url()
        .ok_or(GatewayError::MissingCheckoutUrl)?
        .to_string();

    Ok(CheckoutResponse {
        order_id: order.id,
        checkout_url,
    })
}

/// Handles a verified payment notification.
///
/// Anything that does not lead to an approved payment for a known order is
/// acknowledged without side effects so the gateway stops redelivering it.
/// Storage failures, including a stale concurrency token, are returned as
/// errors so the gateway retries.
pub async fn confirm_payment(state: &AppState, body: &[u8]) -> AppResult<WebhookAck> {
    let event: PaymentEvent = if body.iter().all(u8::is_ascii_whitespace) {
        PaymentEvent::default()
    } else {
        match serde_json::from_slice(body) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(error = %err, "unreadable payment notification");
                return Ok(WebhookAck::new(WebhookOutcome::NoPaymentId));
            }
        }
    };

    let Some(payment_id) = event.payment_id() else {
        tracing::debug!(kind = ?event.kind, action = ?event.action, "notification without payment id");
        return Ok(WebhookAck::new(WebhookOutcome::NoPaymentId));
    };
    if !is_plain_id(payment_id) {
        tracing::warn!(payment_id, "rejecting malformed payment id");
        return Ok(WebhookAck::new(WebhookOutcome::NoPaymentId));
    }

    let payment = state.gateway.fetch_payment(payment_id).await?;
    let mut ack = WebhookAck {
        outcome: WebhookOutcome::NotApproved,
        payment_id: Some(payment.id.clone()),
        order_id: None,
    };
    if !payment.is_approved() {
        tracing::info!(payment_id = %payment.id, status = %payment.status, "payment not approved");
        return Ok(ack);
    }

    let Some(order_id) = payment
        .external_reference
        .as_deref()
        .and_then(|reference| Uuid::parse_str(reference.trim()).ok())
    else {
        tracing::warn!(payment_id = %payment.id, reference = ?payment.external_reference, "approved payment without order reference");
        ack.outcome = WebhookOutcome::NoOrderId;
        return Ok(ack);
    };
    ack.order_id = Some(order_id);

    let path = order_path(&state.config.store.orders_dir, order_id);
    let (mut order, sha) = load_order(state, &path).await?;

    if order.is_paid() {
        let recorded = order.payment.as_ref().map(|p| p.id.as_str());
        if is_redelivery(recorded, &payment.id) {
            tracing::info!(%order_id, payment_id = %payment.id, "order already paid; ignoring redelivery");
        } else {
            tracing::warn!(
                %order_id,
                payment_id = %payment.id,
                recorded = ?recorded,
                "second approved payment for an already paid order"
            );
        }
        ack.outcome = WebhookOutcome::AlreadyPaid;
        return Ok(ack);
    }

    order.mark_paid(&payment, Utc::now());
    let content = order.to_json().map_err(anyhow::Error::from)?;
    state
        .store
        .update(
            &path,
            &content,
            &format!("chore: mark order {order_id} as paid"),
            &sha,
        )
        .await?;
    tracing::info!(%order_id, payment_id = %payment.id, "order marked as paid");

    notify_paid(state, &order).await;

    ack.outcome = WebhookOutcome::Paid;
    Ok(ack)
}

async fn load_order(state: &AppState, path: &str) -> AppResult<(Order, String)> {
    let file = state.store.get(path).await?;
    let order = serde_json::from_str::<Order>(&file.content)
        .map_err(|e| StoreError::Malformed(format!("{path}: {e}")))?;
    Ok((order, file.sha))
}

/// Best-effort mail to the buyer and the store owner. The order is already
/// durably paid, so failures are only logged.
async fn notify_paid(state: &AppState, order: &Order) {
    if let Some(email) = order.customer_email() {
        let message = customer_confirmation(order, email, &state.config.store);
        if let Err(err) = state.notifier.send(&message).await {
            tracing::warn!(error = %err, order_id = %order.id, "customer notification failed");
        }
    }

    if let Some(owner) = state.config.store.notification_email.as_deref() {
        let message = store_notification(order, owner);
        if let Err(err) = state.notifier.send(&message).await {
            tracing::warn!(error = %err, order_id = %order.id, "store notification failed");
        }
    }
}

fn validate_item(item: CartItem) -> AppResult<OrderItem> {
    if item.quantity == 0 {
        return Err(AppError::Validation(format!(
            "Invalid quantity for item {}.",
            item.id
        )));
    }
    if !item.price.is_finite() || item.price < 0.0 {
        return Err(AppError::Validation(format!(
            "Invalid price for item {}.",
            item.id
        )));
    }
    let title = item
        .label()
        .map(str::to_string)
        .ok_or_else(|| AppError::Validation(format!("Missing title for item {}.", item.id)))?;
    Ok(OrderItem {
        id: item.id,
        title,
        price: item.price,
        quantity: item.quantity,
    })
}

fn is_plain_id(id: &str) -> bool {
    id.bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Whether an approved payment is the one already recorded on a paid order.
fn is_redelivery(recorded: Option<&str>, incoming: &str) -> bool {
    recorded.is_some_and(|id| id.trim() == incoming.trim())
}
