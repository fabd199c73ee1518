//! Application state for the adapter service.

use std::sync::Arc;
use std::time::Duration;

use common::config::AppConfig;
use engine::Dispatcher;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    /// Creates the state with every shipped adapter registered.
    pub fn new(config: AppConfig) -> Self {
        let connect_timeout = Duration::from_secs(config.connect_timeout_secs);
        Self::with_dispatcher(config, Dispatcher::with_default_plugins(connect_timeout))
    }

    pub fn with_dispatcher(config: AppConfig, dispatcher: Dispatcher) -> Self {
        Self {
            config,
            dispatcher: Arc::new(dispatcher),
        }
    }
}
