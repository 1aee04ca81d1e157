use chainconv_core::{Config, RouteEngine, SanitizedConfig};
use tokio::sync::RwLock;

/// Shared application state
pub struct AppState {
    config: Config,
    engine: RwLock<RouteEngine>,
}

impl AppState {
    pub fn new(config: Config, engine: RouteEngine) -> Self {
        Self {
            config,
            engine: RwLock::new(engine),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    /// The route engine.
    ///
    /// Searches take the read lock. Conversions and refreshes take the write
    /// lock, since both share the engine's dead-end registry or replace its
    /// graph.
    pub fn engine(&self) -> &RwLock<RouteEngine> {
        &self.engine
    }
}
