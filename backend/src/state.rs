use poller::{CredentialStore, NotificationSink, Poller};
use std::sync::Arc;

/// Everything the handlers need; cloned per request
#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<CredentialStore>,
    pub poller: Arc<Poller>,
    pub notifier: Arc<dyn NotificationSink>,
}
