#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use storefront_orders::{
    config::AppConfig,
    gateway::{GatewayError, Payment, PaymentGateway, Preference},
    models::{Order, OrderItem},
    notifier::{Email, Notifier, NotifyError},
    state::AppState,
    store::{FileStore, StoreError, StoredFile},
};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Put { path: String },
    Get { path: String },
    Update { path: String, sha: String },
}

/// File store that enforces the same optimistic-lock rule as the real one.
#[derive(Default)]
pub struct MemoryStore {
    files: Mutex<HashMap<String, StoredFile>>,
    pub calls: Mutex<Vec<StoreCall>>,
    pub fail_writes: AtomicBool,
    /// Simulates a concurrent writer sneaking in right after a `get`.
    pub touch_after_get: AtomicBool,
}

impl MemoryStore {
    pub fn seed(&self, path: &str, content: &str) -> String {
        let sha = content_sha(content);
        self.files.lock().unwrap().insert(
            path.to_string(),
            StoredFile {
                content: content.to_string(),
                sha: sha.clone(),
            },
        );
        sha
    }

    pub fn content(&self, path: &str) -> Option<String> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .map(|file| file.content.clone())
    }

    pub fn order(&self, path: &str) -> Option<Order> {
        self.content(path)
            .map(|content| serde_json::from_str(&content).expect("stored order is valid JSON"))
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<StoreCall> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, StoreCall::Update { .. }))
            .collect()
    }
}

pub fn content_sha(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

#[async_trait]
impl FileStore for MemoryStore {
    async fn put(&self, path: &str, content: &str, _message: &str) -> Result<(), StoreError> {
        self.calls.lock().unwrap().push(StoreCall::Put {
            path: path.to_string(),
        });
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Upstream {
                status: 500,
                message: "Failed to store order.".into(),
            });
        }
        self.seed(path, content);
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<StoredFile, StoreError> {
        self.calls.lock().unwrap().push(StoreCall::Get {
            path: path.to_string(),
        });
        let file = self
            .files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                path: path.to_string(),
            })?;

        if self.touch_after_get.load(Ordering::SeqCst) {
            let mut value: serde_json::Value = serde_json::from_str(&file.content).unwrap();
            value["note"] = serde_json::json!("edited concurrently");
            self.seed(path, &serde_json::to_string_pretty(&value).unwrap());
        }
        Ok(file)
    }

    async fn update(
        &self,
        path: &str,
        content: &str,
        _message: &str,
        sha: &str,
    ) -> Result<(), StoreError> {
        self.calls.lock().unwrap().push(StoreCall::Update {
            path: path.to_string(),
            sha: sha.to_string(),
        });
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Upstream {
                status: 500,
                message: "Failed to update order.".into(),
            });
        }

        let mut files = self.files.lock().unwrap();
        let current = files.get(path).ok_or_else(|| StoreError::NotFound {
            path: path.to_string(),
        })?;
        if current.sha != sha {
            return Err(StoreError::Conflict {
                path: path.to_string(),
            });
        }
        files.insert(
            path.to_string(),
            StoredFile {
                content: content.to_string(),
                sha: content_sha(content),
            },
        );
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct PreferenceCall {
    pub items: Vec<OrderItem>,
    pub order_id: Uuid,
    pub base_url: String,
}

pub struct FakeGateway {
    pub preference: Mutex<Preference>,
    pub payments: Mutex<HashMap<String, Payment>>,
    pub preference_calls: Mutex<Vec<PreferenceCall>>,
    pub fetches: AtomicUsize,
    pub fail_preference: AtomicBool,
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self {
            preference: Mutex::new(Preference {
                id: Some("pref-1".into()),
                init_point: Some("https://pay.example/checkout/pref-1".into()),
                sandbox_init_point: Some("https://sandbox.pay.example/checkout/pref-1".into()),
            }),
            payments: Mutex::new(HashMap::new()),
            preference_calls: Mutex::new(Vec::new()),
            fetches: AtomicUsize::new(0),
            fail_preference: AtomicBool::new(false),
        }
    }
}

impl FakeGateway {
    pub fn add_payment(&self, payment: Payment) {
        self.payments
            .lock()
            .unwrap()
            .insert(payment.id.clone(), payment);
    }

    pub fn preference_calls(&self) -> Vec<PreferenceCall> {
        self.preference_calls.lock().unwrap().clone()
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_preference(
        &self,
        items: &[OrderItem],
        order_id: Uuid,
        base_url: &str,
    ) -> Result<Preference, GatewayError> {
        self.preference_calls.lock().unwrap().push(PreferenceCall {
            items: items.to_vec(),
            order_id,
            base_url: base_url.to_string(),
        });
        if self.fail_preference.load(Ordering::SeqCst) {
            return Err(GatewayError::Upstream {
                status: 400,
                message: "invalid items".into(),
            });
        }
        Ok(self.preference.lock().unwrap().clone())
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<Payment, GatewayError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.payments
            .lock()
            .unwrap()
            .get(payment_id)
            .cloned()
            .ok_or_else(|| GatewayError::Upstream {
                status: 404,
                message: "Payment not found".into(),
            })
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Email>>,
    pub fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, email: &Email) -> Result<(), NotifyError> {
        if self.fail.load(Ordering::SeqCst) {
            let err = "not an address"
                .parse::<lettre::Address>()
                .expect_err("invalid address");
            return Err(NotifyError::Address(err));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

pub struct Harness {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub gateway: Arc<FakeGateway>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn harness(config: AppConfig) -> Harness {
    let store = Arc::new(MemoryStore::default());
    let gateway = Arc::new(FakeGateway::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let state = AppState::new(config, store.clone(), gateway.clone(), notifier.clone());
    Harness {
        state,
        store,
        gateway,
        notifier,
    }
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.store.notification_email = Some("owner@example.com".into());
    config
}

pub fn approved_payment(id: &str, order_id: Uuid) -> Payment {
    Payment {
        id: id.to_string(),
        status: "approved".into(),
        transaction_amount: Some(59.5),
        payment_method_id: Some("visa".into()),
        external_reference: Some(order_id.to_string()),
    }
}
