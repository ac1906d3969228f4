use std::sync::Arc;

use crate::{
    config::AppConfig,
    gateway::{MercadoPagoClient, PaymentGateway},
    notifier::{Notifier, SmtpNotifier},
    store::{FileStore, GitHubStore},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn FileStore>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn FileStore>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            gateway,
            notifier,
        }
    }

    /// Wires the production collaborators: GitHub for order records,
    /// Mercado Pago for payments and SMTP for mail.
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let store = GitHubStore::new(http.clone(), config.github.clone());
        let gateway = MercadoPagoClient::new(http, config.mercadopago.clone());
        let notifier = SmtpNotifier::new(&config.smtp, &config.store)?;

        Ok(Self::new(
            config,
            Arc::new(store),
            Arc::new(gateway),
            Arc::new(notifier),
        ))
    }
}
