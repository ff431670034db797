use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::ChatBackend;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The chat backend. `LlmClient` in production, a scripted backend in tests.
    pub llm: Arc<dyn ChatBackend>,
    pub config: Config,
}
