use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, warn};

use super::{codes, BackendError, BackendStream, StreamConfig, StreamingBackend, TranscriptEvent};

/// Where the recognizer bearer token comes from.
///
/// `Env` is re-read on every credential refresh, so an external rotator can
/// swap the token without restarting the process. `Static` tokens cannot be
/// rotated; a refresh keeps the existing value.
#[derive(Debug, Clone)]
pub enum CredentialSource {
    Static(String),
    Env(String),
}

impl CredentialSource {
    fn resolve(&self) -> Result<String, BackendError> {
        match self {
            CredentialSource::Static(token) => Ok(token.clone()),
            CredentialSource::Env(var) => std::env::var(var).map_err(|_| {
                BackendError::new(
                    codes::AUTH_EXPIRED,
                    format!("credential variable {var} is not set"),
                )
            }),
        }
    }
}

/// Streaming recognizer client speaking JSON over WebSocket.
///
/// Per stream: one text frame with the recognition config, then binary
/// frames of raw audio; the service answers with text frames carrying
/// transcript or error events and closes the socket when recognition ends.
pub struct RemoteRecognizer {
    url: String,
    credentials: CredentialSource,
    token: RwLock<String>,
}

/// First frame sent on a new stream.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StartFrame<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    language: &'a str,
    sample_rate: u32,
    enable_diarization: bool,
}

/// Frames the recognizer sends back.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum WireEvent {
    Transcript(TranscriptEvent),
    Error { code: String, message: String },
}

impl RemoteRecognizer {
    pub fn new(url: impl Into<String>, credentials: CredentialSource) -> Result<Self, BackendError> {
        let token = credentials.resolve()?;
        Ok(Self {
            url: url.into(),
            credentials,
            token: RwLock::new(token),
        })
    }

    fn classify_connect(err: tungstenite::Error) -> BackendError {
        match err {
            tungstenite::Error::Url(e) => BackendError::new(codes::BAD_REQUEST, e.to_string()),
            tungstenite::Error::Http(response) => {
                let status = response.status();
                if status == 401 || status == 403 {
                    BackendError::new(codes::AUTH_EXPIRED, format!("handshake rejected: {status}"))
                } else {
                    BackendError::new(
                        codes::SERVICE_UNAVAILABLE,
                        format!("handshake failed: {status}"),
                    )
                }
            }
            other => BackendError::new(codes::SERVICE_UNAVAILABLE, other.to_string()),
        }
    }
}

#[async_trait]
impl StreamingBackend for RemoteRecognizer {
    async fn start_stream(&self, config: StreamConfig) -> Result<BackendStream, BackendError> {
        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(Self::classify_connect)?;
        let bearer = format!("Bearer {}", self.token.read());
        request.headers_mut().insert(
            "Authorization",
            bearer
                .parse()
                .map_err(|_| BackendError::new(codes::BAD_REQUEST, "invalid token material"))?,
        );

        let (socket, _) = connect_async(request).await.map_err(Self::classify_connect)?;
        let (mut sink, mut stream) = socket.split();

        let start = StartFrame {
            kind: "start",
            language: &config.language,
            sample_rate: config.sample_rate,
            enable_diarization: true,
        };
        let start_json = serde_json::to_string(&start)
            .map_err(|e| BackendError::new(codes::INTERNAL, e.to_string()))?;
        sink.send(Message::text(start_json))
            .await
            .map_err(|e| BackendError::new(codes::SERVICE_UNAVAILABLE, e.to_string()))?;

        // Bounded: send().await on a full channel is the backend's pull demand.
        let (audio_tx, mut audio_rx) = mpsc::channel::<Vec<u8>>(32);
        let (event_tx, event_rx) = mpsc::channel::<Result<TranscriptEvent, BackendError>>(64);

        // Audio half: session chunks out as binary frames. The session
        // dropping `audio_tx` ends this task and half-closes the stream.
        tokio::spawn(async move {
            while let Some(chunk) = audio_rx.recv().await {
                if let Err(e) = sink.send(Message::binary(chunk)).await {
                    debug!(%e, "recognizer audio send failed");
                    return;
                }
            }
            let _ = sink.send(Message::Close(None)).await;
            debug!("audio forwarding to recognizer complete");
        });

        // Event half: recognizer frames in. Channel close signals natural
        // end of stream; a final Err item signals failure.
        tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                let item = match frame {
                    Ok(Message::Text(text)) => match serde_json::from_str(text.as_str()) {
                        Ok(WireEvent::Transcript(event)) => Ok(event),
                        Ok(WireEvent::Error { code, message }) => {
                            Err(BackendError { code, message })
                        }
                        Err(e) => {
                            warn!(%e, "unparseable recognizer frame");
                            Err(BackendError::new(
                                codes::INTERNAL,
                                format!("unparseable recognizer frame: {e}"),
                            ))
                        }
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => Err(BackendError::new(codes::SERVICE_UNAVAILABLE, e.to_string())),
                };

                let failed = item.is_err();
                if event_tx.send(item).await.is_err() {
                    // Session aborted the stream.
                    return;
                }
                if failed {
                    return;
                }
            }
            debug!("recognizer event stream complete");
        });

        Ok(BackendStream {
            audio_tx,
            events: event_rx,
        })
    }

    async fn refresh_credentials(&self) -> Result<(), BackendError> {
        let fresh = self.credentials.resolve()?;
        *self.token.write() = fresh;
        debug!("recognizer credentials refreshed");
        Ok(())
    }

    fn name(&self) -> &str {
        "remote_ws"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ItemKind;

    #[test]
    fn parses_transcript_wire_frame() {
        let json = r#"{
            "type": "transcript",
            "isPartial": true,
            "speaker": "spk_0",
            "alternatives": [{
                "transcript": "hello there",
                "items": [
                    {"content": "hello", "kind": "pronunciation", "startTime": 0.1, "endTime": 0.4, "speaker": "spk_0"},
                    {"content": ".", "kind": "punctuation", "startTime": 0.4, "endTime": 0.4, "speaker": null}
                ]
            }]
        }"#;
        let event = match serde_json::from_str::<WireEvent>(json).unwrap() {
            WireEvent::Transcript(event) => event,
            WireEvent::Error { .. } => panic!("expected transcript"),
        };
        assert!(event.is_partial);
        assert_eq!(event.speaker.as_deref(), Some("spk_0"));
        let items = &event.alternatives[0].items;
        assert_eq!(items[0].kind, ItemKind::Pronunciation);
        assert_eq!(items[1].kind, ItemKind::Punctuation);
    }

    #[test]
    fn parses_error_wire_frame() {
        let json = r#"{"type": "error", "code": "limit_exceeded", "message": "too many streams"}"#;
        match serde_json::from_str::<WireEvent>(json).unwrap() {
            WireEvent::Error { code, .. } => assert_eq!(code, codes::LIMIT_EXCEEDED),
            WireEvent::Transcript(_) => panic!("expected error"),
        }
    }

    #[test]
    fn env_credentials_resolve_and_refresh() {
        // Unique variable name per test binary run; avoids cross-test races.
        let var = "VOXBRIDGE_TEST_RECOGNIZER_TOKEN";
        unsafe { std::env::set_var(var, "tok-1") };
        let source = CredentialSource::Env(var.to_string());
        assert_eq!(source.resolve().unwrap(), "tok-1");
        unsafe { std::env::set_var(var, "tok-2") };
        assert_eq!(source.resolve().unwrap(), "tok-2");
    }
}
