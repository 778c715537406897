//! Application state: configuration plus the session-wide client cache.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::config::AppConfig;
use crate::engine::{EngineBuilder, GeminiBuilder};
use crate::factory::ClientFactory;

pub struct AppState {
    pub config: AppConfig,
    pub clients: ClientFactory,
}

impl AppState {
    /// Build state from env: load config and wire the Gemini engine builder.
    #[instrument(level = "info", skip_all)]
    pub fn from_env() -> Self {
        let config = AppConfig::from_env();
        info!(
            target: "tubequiz_backend",
            base_url = %config.gemini_base_url,
            default_model = %config.default_model,
            timeout_secs = config.request_timeout.as_secs(),
            "Gemini engine configured; clients are built per API key on first use."
        );
        let builder = Arc::new(GeminiBuilder::from_config(&config));
        Self::with_builder(config, builder)
    }

    pub fn with_builder(config: AppConfig, builder: Arc<dyn EngineBuilder>) -> Self {
        Self { clients: ClientFactory::new(builder), config }
    }
}
