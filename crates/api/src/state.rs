use std::sync::Arc;

use voxbridge_config::Settings;
use voxbridge_relay::{RelayConfig, StreamingBackend};

/// Shared application state: settings, the relay tuning derived from them,
/// and the recognizer backend every session streams through.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub relay: RelayConfig,
    pub backend: Arc<dyn StreamingBackend>,
}

impl AppState {
    pub fn new(settings: Settings, backend: Arc<dyn StreamingBackend>) -> Self {
        let relay = RelayConfig {
            language: settings.recognizer.language.clone(),
            sample_rate: settings.recognizer.sample_rate,
            heartbeat_interval_secs: settings.relay.heartbeat_interval_secs,
            poll_idle_ms: settings.relay.poll_idle_ms,
            reconnect_backoff_ms: settings.relay.reconnect_backoff_ms,
            ..RelayConfig::default()
        };
        Self {
            settings: Arc::new(settings),
            relay,
            backend,
        }
    }
}
