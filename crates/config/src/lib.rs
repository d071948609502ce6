use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Process-level settings, loaded once at startup.
///
/// Sources, in override order: built-in defaults, an optional
/// `voxbridge.toml` in the working directory, then environment variables
/// prefixed with `VOXBRIDGE__` (e.g. `VOXBRIDGE__SERVER__PORT=8080`).
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub recognizer: RecognizerSettings,
    pub relay: RelaySettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Connection settings for the remote streaming recognizer.
#[derive(Debug, Clone, Deserialize)]
pub struct RecognizerSettings {
    /// WebSocket URL of the recognizer service.
    pub url: String,
    /// Language code passed to the recognizer (e.g. "en-US").
    pub language: String,
    /// Audio sample rate the client is expected to send, in Hz.
    pub sample_rate: u32,
    /// Static bearer token. Ignored when `token_env` is set.
    pub token: Option<String>,
    /// Name of an environment variable holding the bearer token. The
    /// variable is re-read on credential refresh, so an external rotator
    /// can swap the token without restarting the process.
    pub token_env: Option<String>,
}

/// Tuning knobs for the per-session relay loops.
#[derive(Debug, Clone, Deserialize)]
pub struct RelaySettings {
    pub heartbeat_interval_secs: u64,
    pub poll_idle_ms: u64,
    pub reconnect_backoff_ms: u64,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("recognizer.url", "ws://127.0.0.1:9090/stream")?
            .set_default("recognizer.language", "en-US")?
            .set_default("recognizer.sample_rate", 16000)?
            .set_default("relay.heartbeat_interval_secs", 30)?
            .set_default("relay.poll_idle_ms", 100)?
            .set_default("relay.reconnect_backoff_ms", 1000)?
            .add_source(File::with_name("voxbridge").required(false))
            .add_source(Environment::with_prefix("VOXBRIDGE").separator("__"))
            .build()?
            .try_deserialize()
    }
}
