use crate::{backend::adapter::FirebaseAdapter, infra::config::AppConfig};

/// Composition root handed to the command handlers.
pub struct AppContext {
    pub config: AppConfig,
    pub backend: FirebaseAdapter,
}

impl AppContext {
    pub fn new(config: AppConfig, backend: FirebaseAdapter) -> Self {
        Self { config, backend }
    }
}
