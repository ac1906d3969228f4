//! Plain-text e-mail notifications for paid orders.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
};
use thiserror::Error;

use crate::{
    config::{SmtpSettings, StoreSettings},
    models::Order,
};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("could not build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub text: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), NotifyError>;
}

/// Sends mail through an authenticated SMTP relay.
///
/// Port 465 uses implicit TLS; any other port upgrades with STARTTLS when
/// the server offers it. With incomplete settings every send is skipped.
pub struct SmtpNotifier {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Option<String>,
}

impl SmtpNotifier {
    pub fn new(smtp: &SmtpSettings, store: &StoreSettings) -> Result<Self, NotifyError> {
        let (Some(host), Some(port), Some(user), Some(pass)) = (
            smtp.host.as_deref(),
            smtp.port,
            smtp.username.as_deref(),
            smtp.password.as_deref(),
        ) else {
            tracing::warn!("SMTP settings incomplete; e-mail notifications are disabled");
            return Ok(Self {
                transport: None,
                from: None,
            });
        };

        let builder = if port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
                .tls(Tls::Opportunistic(TlsParameters::new(host.to_string())?))
        };
        let transport = builder
            .port(port)
            .credentials(Credentials::new(user.to_string(), pass.to_string()))
            .build();

        let from = smtp
            .from
            .clone()
            .or_else(|| store.notification_email.clone())
            .unwrap_or_else(|| user.to_string());

        Ok(Self {
            transport: Some(transport),
            from: Some(from),
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, email: &Email) -> Result<(), NotifyError> {
        let (Some(transport), Some(from)) = (&self.transport, &self.from) else {
            tracing::warn!(to = %email.to, "SMTP not configured; skipping email");
            return Ok(());
        };

        let message = Message::builder()
            .from(from.parse::<Mailbox>()?)
            .to(email.to.parse::<Mailbox>()?)
            .subject(email.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(email.text.clone())?;

        transport.send(message).await?;
        tracing::info!(to = %email.to, subject = %email.subject, "email sent");
        Ok(())
    }
}

pub fn customer_confirmation(order: &Order, to: &str, store: &StoreSettings) -> Email {
    Email {
        to: to.to_string(),
        subject: format!("Pago confirmado - {}", store.name),
        text: format!(
            "¡Gracias por tu compra! Tu pedido {} fue confirmado.\n\nTotal: {}",
            order.id,
            format_amount(order.total, &order.currency)
        ),
    }
}

pub fn store_notification(order: &Order, to: &str) -> Email {
    let mut text = format!(
        "El pedido {} está pagado y listo para preparar.\n\n",
        order.id
    );
    for item in &order.items {
        text.push_str(&format!(
            "- {} x{} ({})\n",
            item.title,
            item.quantity,
            format_amount(item.price * f64::from(item.quantity), &order.currency)
        ));
    }
    text.push_str(&format!(
        "\nTotal: {}\n",
        format_amount(order.total, &order.currency)
    ));
    if let Some(email) = order.customer_email() {
        text.push_str(&format!("Cliente: {email}\n"));
    }
    if let Some(payment) = &order.payment {
        text.push_str(&format!(
            "Pago: {} ({})\n",
            payment.id,
            payment.method.as_deref().unwrap_or("-")
        ));
    }

    Email {
        to: to.to_string(),
        subject: format!("Nuevo pedido pagado {}", order.id),
        text,
    }
}

fn format_amount(amount: f64, currency: &str) -> String {
    format!("{amount:.2} {currency}")
}
