use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::backend::{BackendStream, StreamConfig, StreamingBackend};
use crate::buffer::AudioBuffer;
use crate::classify::RelayError;
use crate::config::RelayConfig;
use crate::heartbeat;
use crate::messages::{ClientMessage, OutboundFrame, ServerMessage};
use crate::processor::TranscriptProcessor;

/// Guard that aborts a spawned task when dropped.
///
/// `tokio::spawn` returns a `JoinHandle` whose `Drop` impl detaches (does
/// NOT abort) the task, so teardown must hold these.
struct AbortOnDrop(tokio::task::JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    Idle,
    Streaming,
    Reconnecting,
    Terminated,
}

/// Per-connection orchestrator: owns the ingestion buffer, the transcript
/// processor, the backend stream lifecycle and the heartbeat, from connect
/// to teardown.
///
/// At most one backend stream is active at a time. Transcription starts on
/// the first valid audio chunk, not at connection open.
pub struct Session {
    backend: Arc<dyn StreamingBackend>,
    config: RelayConfig,
    outbound: mpsc::Sender<OutboundFrame>,
    buffer: Arc<AudioBuffer>,
    processor: Mutex<TranscriptProcessor>,
    state: Mutex<StreamState>,
    transcribing: Arc<AtomicBool>,
    connected: AtomicBool,
    tasks: Mutex<Vec<AbortOnDrop>>,
}

impl Session {
    /// Creates the session and starts its heartbeat.
    pub fn new(
        backend: Arc<dyn StreamingBackend>,
        config: RelayConfig,
        outbound: mpsc::Sender<OutboundFrame>,
    ) -> Arc<Self> {
        let heartbeat_period = Duration::from_secs(config.heartbeat_interval_secs);
        let session = Arc::new(Self {
            backend,
            config,
            outbound: outbound.clone(),
            buffer: Arc::new(AudioBuffer::new()),
            processor: Mutex::new(TranscriptProcessor::new()),
            state: Mutex::new(StreamState::Idle),
            transcribing: Arc::new(AtomicBool::new(false)),
            connected: AtomicBool::new(true),
            tasks: Mutex::new(Vec::new()),
        });
        let ticker = heartbeat::spawn(outbound, heartbeat_period);
        session.tasks.lock().push(AbortOnDrop(ticker));
        session
    }

    pub fn is_transcribing(&self) -> bool {
        self.transcribing.load(Ordering::SeqCst)
    }

    /// Handles one inbound text message from the client.
    pub async fn handle_text(self: &Arc<Self>, text: &str) {
        let message = match serde_json::from_str::<ClientMessage>(text) {
            Ok(message) => message,
            Err(e) => {
                self.report(RelayError::InvalidClientMessage(e.to_string()))
                    .await;
                return;
            }
        };
        match message {
            ClientMessage::Audio { chunk } => self.handle_audio(&chunk).await,
        }
    }

    /// Pong observed; advisory only.
    pub fn handle_pong(&self) {
        debug!("heartbeat pong received");
    }

    async fn handle_audio(self: &Arc<Self>, chunk_b64: &str) {
        if *self.state.lock() == StreamState::Terminated {
            self.report(RelayError::InvalidClientMessage(
                "transcription has ended".to_string(),
            ))
            .await;
            return;
        }

        let bytes = match BASE64.decode(chunk_b64) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.report(RelayError::InvalidClientMessage(format!(
                    "chunk is not valid base64: {e}"
                )))
                .await;
                return;
            }
        };

        if bytes.len() > self.config.max_chunk_bytes {
            self.report(RelayError::AudioChunkTooLarge {
                size: bytes.len(),
                limit: self.config.max_chunk_bytes,
            })
            .await;
            return;
        }

        self.buffer.push(bytes);
        self.ensure_streaming();
    }

    /// Opens the backend stream on the first buffered chunk.
    fn ensure_streaming(self: &Arc<Self>) {
        {
            let mut state = self.state.lock();
            if *state != StreamState::Idle {
                return;
            }
            *state = StreamState::Streaming;
        }
        self.transcribing.store(true, Ordering::SeqCst);

        let session = Arc::clone(self);
        let handle = tokio::spawn(async move {
            session.run_stream().await;
        });
        self.tasks.lock().push(AbortOnDrop(handle));
    }

    /// Owns the backend stream lifecycle: open, supply audio, consume
    /// events, and reconnect once on credential expiry.
    async fn run_stream(self: Arc<Self>) {
        let mut attempt = 0u32;
        'reconnect: loop {
            attempt += 1;
            let stream_config = StreamConfig {
                language: self.config.language.clone(),
                sample_rate: self.config.sample_rate,
            };

            let stream = match self.backend.start_stream(stream_config).await {
                Ok(stream) => stream,
                Err(e) => {
                    let classified = RelayError::from_backend(&e);
                    if self.try_reconnect(&classified, attempt).await {
                        continue 'reconnect;
                    }
                    self.fail(classified).await;
                    return;
                }
            };
            info!(backend = self.backend.name(), attempt, "recognition stream opened");

            let BackendStream { audio_tx, mut events } = stream;
            let supply = tokio::spawn(Self::supply_loop(
                audio_tx,
                Arc::clone(&self.buffer),
                Arc::clone(&self.transcribing),
                Duration::from_millis(self.config.poll_idle_ms),
            ));
            // Aborts the supply loop when this stream attempt ends.
            let _supply_guard = AbortOnDrop(supply);

            while let Some(event) = events.recv().await {
                match event {
                    Ok(event) => {
                        let message = self.processor.lock().process(event);
                        if let Some(message) = message
                            && self
                                .outbound
                                .send(OutboundFrame::Message(message))
                                .await
                                .is_err()
                        {
                            // Connection writer is gone; teardown follows.
                            return;
                        }
                    }
                    Err(e) => {
                        let classified = RelayError::from_backend(&e);
                        if self.try_reconnect(&classified, attempt).await {
                            continue 'reconnect;
                        }
                        self.fail(classified).await;
                        return;
                    }
                }
            }

            // Backend closed the event stream on its own.
            if self.transcribing.load(Ordering::SeqCst) {
                self.fail(RelayError::StreamClosedPrematurely).await;
            }
            return;
        }
    }

    /// Feeds buffered audio to the backend on its demand (the bounded
    /// channel suspends the send until the backend pulls). Stops when the
    /// transcribing flag drops, which is how the stream is released.
    async fn supply_loop(
        audio_tx: mpsc::Sender<Vec<u8>>,
        buffer: Arc<AudioBuffer>,
        transcribing: Arc<AtomicBool>,
        idle: Duration,
    ) {
        while transcribing.load(Ordering::SeqCst) {
            match buffer.pull() {
                Some(chunk) => {
                    if audio_tx.send(chunk).await.is_err() {
                        break;
                    }
                }
                None => tokio::time::sleep(idle).await,
            }
        }
        debug!("audio supply loop stopped");
    }

    /// Credential expiry gets exactly one reconnect: tell the client
    /// (non-fatal), rotate credentials, wait the fixed backoff, reopen.
    /// Any other classification, or a second expiry, is not retried.
    async fn try_reconnect(&self, error: &RelayError, attempt: u32) -> bool {
        if !matches!(error, RelayError::CredentialExpired)
            || attempt >= self.config.max_stream_attempts
        {
            return false;
        }
        warn!(attempt, "recognizer credentials expired, reconnecting");
        self.send_message(ServerMessage::Error {
            error: error.code().to_string(),
            message: format!("{error}; reconnecting"),
            fatal: false,
        })
        .await;

        {
            let mut state = self.state.lock();
            if *state == StreamState::Terminated {
                return false;
            }
            *state = StreamState::Reconnecting;
        }

        if let Err(e) = self.backend.refresh_credentials().await {
            warn!(%e, "credential refresh failed, retrying with existing material");
        }
        tokio::time::sleep(Duration::from_millis(self.config.reconnect_backoff_ms)).await;

        let mut state = self.state.lock();
        if *state == StreamState::Terminated {
            return false;
        }
        *state = StreamState::Streaming;
        true
    }

    /// Fatal path: exactly one error message, then the close frame. The
    /// state guard makes a second fatal classification a no-op.
    async fn fail(&self, error: RelayError) {
        self.transcribing.store(false, Ordering::SeqCst);
        {
            let mut state = self.state.lock();
            if *state == StreamState::Terminated {
                return;
            }
            *state = StreamState::Terminated;
        }
        warn!(code = error.code(), %error, "fatal session error");
        self.send_message(ServerMessage::Error {
            error: error.code().to_string(),
            message: error.to_string(),
            fatal: true,
        })
        .await;
        let _ = self
            .outbound
            .send(OutboundFrame::Close {
                code: error.close_code(),
                reason: error.code().to_string(),
            })
            .await;
    }

    /// Non-fatal protocol error: report and carry on.
    async fn report(&self, error: RelayError) {
        debug!(code = error.code(), %error, "client protocol error");
        self.send_message(ServerMessage::Error {
            error: error.code().to_string(),
            message: error.to_string(),
            fatal: false,
        })
        .await;
    }

    async fn send_message(&self, message: ServerMessage) {
        if self
            .outbound
            .send(OutboundFrame::Message(message))
            .await
            .is_err()
        {
            debug!("outbound channel closed, message dropped");
        }
    }

    /// Tears the session down: stops transcribing (halting audio supply),
    /// aborts the stream and heartbeat tasks, and emits the final speaker
    /// summary if any speaker data was accumulated. Idempotent; safe to
    /// call from both the disconnect and the error path.
    pub async fn teardown(&self) {
        if !self.connected.swap(false, Ordering::SeqCst) {
            return;
        }
        self.transcribing.store(false, Ordering::SeqCst);
        *self.state.lock() = StreamState::Terminated;

        let tasks: Vec<AbortOnDrop> = {
            let mut guard = self.tasks.lock();
            guard.drain(..).collect()
        };
        drop(tasks);

        let summary = {
            let processor = self.processor.lock();
            processor.has_speakers().then(|| processor.summary())
        };
        if let Some(speakers) = summary {
            self.send_message(ServerMessage::SpeakerSummary { speakers })
                .await;
        }
        info!("session torn down");
    }
}
