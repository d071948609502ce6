use crate::backend::{codes, BackendError};

/// Closed taxonomy of session-level failures.
///
/// Backend failures are translated here exactly once, at the point of
/// detection, and never re-inspected downstream. Everything is fatal except
/// the two client-input kinds; credential expiry is retryable once.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    #[error("the recognizer rejected the request: {0}")]
    MalformedRequest(String),
    #[error("a conflicting recognition stream is already active")]
    ConflictingOperation,
    #[error("recognizer rate limit exceeded")]
    RateLimitExceeded,
    #[error("recognizer service unavailable")]
    ServiceUnavailable,
    #[error("recognizer internal failure")]
    InternalFailure,
    #[error("speaker diarization is not supported for this configuration")]
    DiarizationUnsupported,
    #[error("recognition stream closed before the session ended")]
    StreamClosedPrematurely,
    #[error("recognizer credentials expired")]
    CredentialExpired,
    #[error("invalid client message: {0}")]
    InvalidClientMessage(String),
    #[error("audio chunk of {size} bytes exceeds the {limit} byte limit")]
    AudioChunkTooLarge { size: usize, limit: usize },
    #[error("unclassified recognizer failure: {0}")]
    Unclassified(String),
}

impl RelayError {
    /// Translates a backend adapter failure. The single classification
    /// boundary for backend-originated errors.
    pub fn from_backend(err: &BackendError) -> Self {
        match err.code.as_str() {
            codes::BAD_REQUEST => RelayError::MalformedRequest(err.message.clone()),
            codes::CONFLICT => RelayError::ConflictingOperation,
            codes::LIMIT_EXCEEDED => RelayError::RateLimitExceeded,
            codes::SERVICE_UNAVAILABLE => RelayError::ServiceUnavailable,
            codes::INTERNAL => RelayError::InternalFailure,
            codes::AUTH_EXPIRED => RelayError::CredentialExpired,
            codes::DIARIZATION_UNSUPPORTED => RelayError::DiarizationUnsupported,
            codes::STREAM_CLOSED => RelayError::StreamClosedPrematurely,
            _ => RelayError::Unclassified(format!("{}: {}", err.code, err.message)),
        }
    }

    /// Wire code reported to the client.
    pub fn code(&self) -> &'static str {
        match self {
            RelayError::MalformedRequest(_) => "malformed-request",
            RelayError::ConflictingOperation => "conflicting-operation",
            RelayError::RateLimitExceeded => "rate-limit-exceeded",
            RelayError::ServiceUnavailable => "service-unavailable",
            RelayError::InternalFailure => "internal-failure",
            RelayError::DiarizationUnsupported => "diarization-unsupported",
            RelayError::StreamClosedPrematurely => "stream-closed-prematurely",
            RelayError::CredentialExpired => "credential-expired",
            RelayError::InvalidClientMessage(_) => "invalid-client-message",
            RelayError::AudioChunkTooLarge { .. } => "audio-chunk-too-large",
            RelayError::Unclassified(_) => "unclassified-failure",
        }
    }

    /// Fatal errors terminate the session after one error message.
    /// `CredentialExpired` reported here as non-fatal covers the single
    /// in-session retry; the session escalates the second occurrence to
    /// fatal itself.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            RelayError::InvalidClientMessage(_) | RelayError::AudioChunkTooLarge { .. }
        )
    }

    /// WebSocket close code used when this error terminates the connection.
    pub fn close_code(&self) -> u16 {
        match self {
            RelayError::MalformedRequest(_) | RelayError::InvalidClientMessage(_) => 1008,
            RelayError::RateLimitExceeded => 1013,
            _ => 1011,
        }
    }
}
