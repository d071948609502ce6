use serde::{Deserialize, Serialize};

use crate::backend::ItemKind;

/// Messages a client may send over the duplex connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// A base64-encoded audio chunk. Decodes to at most
    /// `RelayConfig::max_chunk_bytes` of raw audio.
    Audio { chunk: String },
}

/// A transcript item enriched with resolved speaker and color.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedItem {
    pub content: String,
    pub kind: ItemKind,
    pub start_time: f64,
    pub end_time: f64,
    pub speaker: Option<String>,
    pub color: Option<String>,
}

/// Per-speaker aggregate sent with every transcript message. Grows
/// monotonically across a session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakerSnapshot {
    pub speaker: String,
    pub color: String,
    pub duration: f64,
}

/// Per-speaker totals sent once at teardown.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakerSummaryEntry {
    pub speaker: String,
    pub color: String,
    pub duration: f64,
    pub word_count: u64,
}

/// Messages the relay sends to the client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    #[serde(rename_all = "camelCase")]
    Transcript {
        text: String,
        is_partial: bool,
        speaker: Option<String>,
        speaker_color: Option<String>,
        items: Vec<EnrichedItem>,
        speaker_segments: Vec<SpeakerSnapshot>,
    },
    Error {
        error: String,
        message: String,
        fatal: bool,
    },
    SpeakerSummary {
        speakers: Vec<SpeakerSummaryEntry>,
    },
}

/// What the session hands to the connection writer.
#[derive(Debug, Clone)]
pub enum OutboundFrame {
    Message(ServerMessage),
    Ping,
    Close { code: u16, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn audio_message_deserializes() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"audio","chunk":"AAAA"}"#).unwrap();
        let ClientMessage::Audio { chunk } = msg;
        assert_eq!(chunk, "AAAA");
    }

    #[test]
    fn unknown_message_type_is_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"video","chunk":"AAAA"}"#).is_err());
        assert!(serde_json::from_str::<ClientMessage>(r#"{"chunk":"AAAA"}"#).is_err());
    }

    #[test]
    fn transcript_message_uses_wire_field_names() {
        let msg = ServerMessage::Transcript {
            text: "hi".into(),
            is_partial: true,
            speaker: Some("spk_0".into()),
            speaker_color: Some("#e6194b".into()),
            items: vec![EnrichedItem {
                content: "hi".into(),
                kind: ItemKind::Pronunciation,
                start_time: 0.0,
                end_time: 0.2,
                speaker: Some("spk_0".into()),
                color: Some("#e6194b".into()),
            }],
            speaker_segments: vec![SpeakerSnapshot {
                speaker: "spk_0".into(),
                color: "#e6194b".into(),
                duration: 0.2,
            }],
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "transcript");
        assert_eq!(value["isPartial"], true);
        assert_eq!(value["speakerColor"], "#e6194b");
        assert_eq!(value["items"][0]["startTime"], 0.0);
        assert_eq!(value["items"][0]["kind"], "pronunciation");
        assert_eq!(value["speakerSegments"][0]["duration"], 0.2);
    }

    #[test]
    fn summary_and_error_wire_shapes() {
        let summary = ServerMessage::SpeakerSummary {
            speakers: vec![SpeakerSummaryEntry {
                speaker: "spk_0".into(),
                color: "#e6194b".into(),
                duration: 1.0,
                word_count: 4,
            }],
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["type"], "speakerSummary");
        assert_eq!(value["speakers"][0]["wordCount"], 4);

        let error = ServerMessage::Error {
            error: "audio-chunk-too-large".into(),
            message: "too big".into(),
            fatal: false,
        };
        let value = serde_json::to_value(&error).unwrap();
        assert_eq!(
            value,
            json!({"type":"error","error":"audio-chunk-too-large","message":"too big","fatal":false})
        );
    }
}
