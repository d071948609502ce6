pub mod remote_ws;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Stable failure codes a backend adapter may surface. The session's error
/// classifier translates these once, at the point of detection.
pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const CONFLICT: &str = "conflict";
    pub const LIMIT_EXCEEDED: &str = "limit_exceeded";
    pub const SERVICE_UNAVAILABLE: &str = "service_unavailable";
    pub const INTERNAL: &str = "internal";
    pub const AUTH_EXPIRED: &str = "auth_expired";
    pub const DIARIZATION_UNSUPPORTED: &str = "diarization_unsupported";
    pub const STREAM_CLOSED: &str = "stream_closed";
}

/// A failure surfaced by a backend adapter, identified by a stable code.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct BackendError {
    pub code: String,
    pub message: String,
}

impl BackendError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// Token kind for a timed transcript item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// A spoken word; counts toward per-speaker word totals.
    Pronunciation,
    /// Punctuation attached by the recognizer; carries no word count.
    Punctuation,
}

/// One timed token within a transcript alternative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptItem {
    pub content: String,
    pub kind: ItemKind,
    pub start_time: f64,
    pub end_time: f64,
    /// Per-item speaker attribution, when the recognizer provides it.
    pub speaker: Option<String>,
}

/// One alternative transcription of the in-progress utterance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptAlternative {
    pub transcript: String,
    pub items: Vec<TranscriptItem>,
}

/// A unit of recognition output from the backend.
///
/// Partial events for the same utterance may be superseded by later partial
/// or final events; the latest received event is authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptEvent {
    pub alternatives: Vec<TranscriptAlternative>,
    pub is_partial: bool,
    /// Utterance-level speaker attribution, when diarization is active.
    pub speaker: Option<String>,
}

/// Parameters for opening one recognition stream.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Language code (e.g. "en-US").
    pub language: String,
    /// Sample rate of the audio the client sends, in Hz.
    pub sample_rate: u32,
}

/// An open recognition stream.
///
/// `audio_tx` is the backend's pull demand: the channel is bounded, so
/// `send().await` suspends until the backend wants more audio. Dropping it
/// signals end of audio. `events` yields transcript events in backend
/// order until the backend closes (channel end) or fails (an `Err` item).
pub struct BackendStream {
    pub audio_tx: mpsc::Sender<Vec<u8>>,
    pub events: mpsc::Receiver<Result<TranscriptEvent, BackendError>>,
}

/// Seam between the session and the remote streaming recognizer.
///
/// Implementations own the transport. The stream must be promptly
/// cancellable: dropping both halves of a `BackendStream` releases it.
#[async_trait]
pub trait StreamingBackend: Send + Sync + 'static {
    /// Opens a new recognition stream.
    async fn start_stream(&self, config: StreamConfig) -> Result<BackendStream, BackendError>;

    /// Rotates credential material ahead of a reconnect attempt.
    async fn refresh_credentials(&self) -> Result<(), BackendError> {
        Ok(())
    }

    /// Human-readable adapter name, for logs.
    fn name(&self) -> &str;
}
