// Application state module
// Shared, read-only state handed to every request

use std::sync::Arc;

use super::types::{Config, StreamSettings};
use crate::store::ResourceStore;

/// Application state
pub struct AppState {
    pub config: Config,
    pub settings: StreamSettings,
    pub store: Arc<dyn ResourceStore>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn ResourceStore>) -> Self {
        let settings = StreamSettings::from(&config.streaming);
        Self {
            config,
            settings,
            store,
        }
    }
}
