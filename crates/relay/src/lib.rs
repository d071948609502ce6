pub mod backend;
pub mod buffer;
pub mod classify;
pub mod config;
pub mod heartbeat;
pub mod messages;
pub mod processor;
pub mod session;
pub mod speakers;

pub use backend::{
    BackendError, BackendStream, ItemKind, StreamConfig, StreamingBackend,
    TranscriptAlternative, TranscriptEvent, TranscriptItem,
};
pub use classify::RelayError;
pub use config::{RelayConfig, MAX_AUDIO_CHUNK_BYTES};
pub use messages::{ClientMessage, OutboundFrame, ServerMessage};
pub use processor::TranscriptProcessor;
pub use session::Session;
pub use speakers::{SpeakerRegistry, SPEAKER_PALETTE};
