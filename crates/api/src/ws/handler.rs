use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use voxbridge_relay::{OutboundFrame, Session};

use crate::state::AppState;

pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// One session per connection: a writer task drains the session's outbound
/// frames into the socket while this task feeds inbound messages to the
/// session, then tears it down when the client goes away.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = Uuid::new_v4().to_string();
    info!(%connection_id, "client connected");

    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<OutboundFrame>(64);
    let session = Session::new(state.backend.clone(), state.relay.clone(), outbound_tx);

    let writer_id = connection_id.clone();
    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            let result = match frame {
                OutboundFrame::Message(message) => match serde_json::to_string(&message) {
                    Ok(text) => sender.send(Message::text(text)).await,
                    Err(e) => {
                        warn!(%writer_id, %e, "unserializable server message");
                        continue;
                    }
                },
                OutboundFrame::Ping => sender.send(Message::Ping(Vec::new().into())).await,
                OutboundFrame::Close { code, reason } => {
                    let _ = sender
                        .send(Message::Close(Some(CloseFrame {
                            code,
                            reason: reason.into(),
                        })))
                        .await;
                    break;
                }
            };
            if let Err(e) = result {
                debug!(%writer_id, %e, "client write failed");
                break;
            }
        }
        debug!(%writer_id, "writer task stopped");
    });

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => session.handle_text(text.as_str()).await,
            Ok(Message::Pong(_)) => session.handle_pong(),
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(%connection_id, %e, "client connection error");
                break;
            }
        }
    }

    session.teardown().await;
    // Dropping the session closes the outbound channel once its tasks are
    // gone, letting the writer flush the final summary before exiting.
    drop(session);
    let _ = writer.await;

    info!(%connection_id, "client disconnected");
}
