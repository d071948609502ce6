use serde::{Deserialize, Serialize};

/// Hard cap on a single decoded audio chunk. Larger chunks are rejected
/// before they reach the ingestion buffer.
pub const MAX_AUDIO_CHUNK_BYTES: usize = 10 * 1024;

/// Configuration for one relay session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Language code passed to the recognizer (e.g. "en-US").
    pub language: String,
    /// Sample rate of client audio, in Hz.
    pub sample_rate: u32,
    /// Maximum decoded size of one audio chunk, in bytes.
    pub max_chunk_bytes: usize,
    /// Idle backoff of the audio-supply loop between empty buffer polls.
    pub poll_idle_ms: u64,
    /// Client liveness ping period.
    pub heartbeat_interval_secs: u64,
    /// Fixed wait before the single credential-expiry reconnect.
    pub reconnect_backoff_ms: u64,
    /// Total stream attempts per session (1 initial + 1 retry).
    pub max_stream_attempts: u32,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            sample_rate: 16000,
            max_chunk_bytes: MAX_AUDIO_CHUNK_BYTES,
            poll_idle_ms: 100,
            heartbeat_interval_secs: 30,
            reconnect_backoff_ms: 1000,
            max_stream_attempts: 2,
        }
    }
}
