use crate::store::MetadataStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Shared application state (thread-safe)
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MetadataStore>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(store: MetadataStore) -> Self {
        Self {
            store: Arc::new(store),
            started_at: Utc::now(),
        }
    }
}
