//! WebSocket connect stream.
//!
//! The stream is one-way: every message fanned out by the room is pushed to
//! the client as a JSON text frame. Inbound frames other than Close are
//! ignored. The participant stays attached until the stream ends, whichever
//! side ends it. Server shutdown ends every stream with a Close frame.

use std::{fmt, sync::Arc};

use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};

use crate::{
    domain::{AuthenticatedIdentity, ChatId, ChatMessage, ChatRoom, UserId},
    infrastructure::{broadcast::Room, dto::websocket::ChatMessageDto},
    ui::{error::ApiError, state::AppState},
};

/// Why a connect stream ended
#[derive(Debug)]
enum DetachCause {
    ClientClosed,
    SocketError(String),
    /// The room dropped the sink (room closed or evicted)
    RoomClosed,
    SendFailed(String),
    ServerShutdown,
    TaskAborted,
}

impl fmt::Display for DetachCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientClosed => write!(f, "client closed the stream"),
            Self::SocketError(e) => write!(f, "socket error: {}", e),
            Self::RoomClosed => write!(f, "room closed"),
            Self::SendFailed(e) => write!(f, "push failed: {}", e),
            Self::ServerShutdown => write!(f, "server shutting down"),
            Self::TaskAborted => write!(f, "stream task aborted"),
        }
    }
}

pub async fn connect_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(chat_id): Path<i64>,
    identity: AuthenticatedIdentity,
) -> Result<impl IntoResponse, ApiError> {
    let chat_id = ChatId::new(chat_id);
    let user_id = identity.user_id;

    let room = state
        .registry
        .lookup(chat_id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("chat {} has no live room", chat_id)))?;

    state
        .connect_participant_usecase
        .execute(chat_id, user_id)
        .await?;

    tracing::info!(chat_id = %chat_id, user_id = %user_id, "participant connecting");
    let shutdown = state.subscribe_shutdown();
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, room, user_id, shutdown)))
}

/// Spawns a task that receives fanned-out messages and pushes them to the WebSocket sender.
///
/// Ends when the room drops the sink or the server shuts down, sending a
/// Close frame first, or when a push fails.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<ChatMessage>,
    mut sender: SplitSink<WebSocket, Message>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<DetachCause> {
    tokio::spawn(async move {
        loop {
            let message = tokio::select! {
                message = rx.recv() => match message {
                    Some(message) => message,
                    None => break,
                },
                // an error means the state is gone, which also ends the server
                _ = async { let _ = shutdown.wait_for(|stopping| *stopping).await; } => {
                    let _ = sender.send(Message::Close(None)).await;
                    return DetachCause::ServerShutdown;
                }
            };
            let dto = ChatMessageDto::from(message);
            let json = match serde_json::to_string(&dto) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to serialize chat message: {}", e);
                    continue;
                }
            };
            if let Err(e) = sender.send(Message::Text(json.into())).await {
                return DetachCause::SendFailed(e.to_string());
            }
        }

        let _ = sender.send(Message::Close(None)).await;
        DetachCause::RoomClosed
    })
}

async fn handle_socket(
    socket: WebSocket,
    room: Arc<Room>,
    user_id: UserId,
    shutdown: watch::Receiver<bool>,
) {
    let chat_id = room.id();
    let (tx, rx) = mpsc::unbounded_channel();
    room.attach(user_id, tx).await;

    let (sender, mut receiver) = socket.split();

    let mut recv_task = tokio::spawn(async move {
        while let Some(frame) = receiver.next().await {
            match frame {
                Ok(Message::Close(_)) => return DetachCause::ClientClosed,
                Ok(_) => {
                    tracing::debug!("inbound frame ignored on connect stream");
                }
                Err(e) => return DetachCause::SocketError(e.to_string()),
            }
        }
        DetachCause::ClientClosed
    });
    let mut send_task = pusher_loop(rx, sender, shutdown);

    // If any one of the tasks completes, abort the other
    let cause = tokio::select! {
        cause = &mut recv_task => {
            send_task.abort();
            cause.unwrap_or(DetachCause::TaskAborted)
        }
        cause = &mut send_task => {
            recv_task.abort();
            cause.unwrap_or(DetachCause::TaskAborted)
        }
    };

    room.detach(user_id).await;
    tracing::info!(chat_id = %chat_id, user_id = %user_id, "participant detached: {}", cause);
}
