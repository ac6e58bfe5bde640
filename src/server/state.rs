use std::sync::Arc;
use std::time::Instant;

use crate::config::Settings;
use crate::notification::PushDispatcher;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub dispatcher: Arc<PushDispatcher>,
    /// Backend name of the injected token store, for health output
    pub token_backend: &'static str,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        settings: Settings,
        dispatcher: Arc<PushDispatcher>,
        token_backend: &'static str,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            dispatcher,
            token_backend,
            start_time: Instant::now(),
        }
    }
}
