//! Gateway server: WebSocket handler, frame decoding, and event dispatch.
//!
//! Each chat client opens one WebSocket on `/ws` and registers as an actor.
//! Inbound frames become conversation events handed to the [`Bot`]; replies
//! flow back through the [`WsGateway`] registry.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use duetask::bot::Bot;
use duetask::conversation::Event;
use duetask_proto::frame;
use duetask_proto::{ActorId, CallbackData, ClientFrame, MessageRef, ProtoError, ServerFrame};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};

use crate::gateway::WsGateway;

/// Shared server state.
pub type ServerState = Arc<Bot<WsGateway>>;

/// Handles an upgraded WebSocket connection for a single actor.
///
/// The connection lifecycle:
/// 1. Wait for a `Register` frame.
/// 2. Register the actor and send `Registered` back.
/// 3. Read frames in order, dispatching each event to completion before the
///    next one is read.
/// 4. On disconnect, unregister the actor.
pub async fn handle_socket(socket: WebSocket, state: ServerState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let Some(actor) = wait_for_register(&mut ws_receiver).await else {
        tracing::warn!("connection closed before registration");
        return;
    };

    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let gateway = Arc::clone(state.gateway());

    let connection = gateway.register(actor, tx).await;

    let ack = ServerFrame::Registered { actor };
    if let Err(e) = send_frame(&mut ws_sender, &ack).await {
        tracing::error!(actor = %actor, error = %e, "failed to send Registered ack");
        gateway.unregister(actor, connection).await;
        return;
    }
    tracing::info!(actor = %actor, "actor registered");

    let mut write_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(msg).await.is_err() {
                tracing::warn!(actor = %actor, "WebSocket write failed");
                break;
            }
        }
    });

    let reader_state = Arc::clone(&state);
    let mut read_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_receiver.next().await {
            match msg {
                Message::Text(text) => {
                    handle_text_frame(actor, text.as_str(), &reader_state).await;
                }
                Message::Close(_) => {
                    tracing::info!(actor = %actor, "received close frame");
                    break;
                }
                _ => {
                    // Ignore binary, ping, pong frames.
                }
            }
        }
    });

    tokio::select! {
        _ = &mut read_task => {
            write_task.abort();
        }
        _ = &mut write_task => {
            read_task.abort();
        }
    }

    gateway.unregister(actor, connection).await;
    tracing::info!(actor = %actor, "actor disconnected");
}

/// Waits for the first text frame, expecting `Register`.
async fn wait_for_register(
    receiver: &mut (impl StreamExt<Item = Result<Message, axum::Error>> + Unpin),
) -> Option<ActorId> {
    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => match frame::decode::<ClientFrame>(text.as_str()) {
                Ok(ClientFrame::Register { actor }) => return Some(actor),
                Ok(other) => {
                    tracing::warn!(frame = ?other, "expected Register, got different frame");
                    return None;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to decode registration frame");
                    return None;
                }
            },
            Message::Close(_) => return None,
            _ => {}
        }
    }
    None
}

/// Decodes one client frame and dispatches the resulting event.
async fn handle_text_frame(actor: ActorId, text: &str, state: &ServerState) {
    let inbound = frame::decode::<ClientFrame>(text).and_then(|frame| to_event(actor, frame));
    match inbound {
        Ok(Some((origin, event))) => {
            state.dispatch(actor, origin, event).await;
        }
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(actor = %actor, error = %e, "dropping malformed frame");
            let reply = ServerFrame::Error {
                reason: e.to_string(),
            };
            if let Err(e) = state.gateway().push(actor, &reply).await {
                tracing::warn!(actor = %actor, error = %e, "failed to send error frame");
            }
        }
    }
}

/// Maps a client frame to a conversation event and the message it came from.
///
/// Returns `Ok(None)` for frames that carry no event.
///
/// # Errors
///
/// Returns [`ProtoError`] when callback data cannot be parsed.
pub fn to_event(
    actor: ActorId,
    frame: ClientFrame,
) -> Result<Option<(Option<MessageRef>, Event)>, ProtoError> {
    match frame {
        ClientFrame::Command { name } => {
            if name.trim_start_matches('/') == "start" {
                Ok(Some((None, Event::Start)))
            } else {
                tracing::debug!(actor = %actor, command = %name, "ignoring unknown command");
                Ok(None)
            }
        }
        ClientFrame::Text { content } => Ok(Some((None, Event::FreeText(content)))),
        ClientFrame::Callback { message, data } => {
            let event = Event::try_from(CallbackData::parse(&data)?)?;
            Ok(Some((Some(message), event)))
        }
        ClientFrame::Register { actor: new_id } => {
            tracing::warn!(actor = %actor, new_id = %new_id, "received duplicate Register from registered actor");
            Ok(None)
        }
    }
}

/// Encodes and sends a frame directly on a WebSocket sender.
async fn send_frame(
    ws_sender: &mut (impl SinkExt<Message, Error = axum::Error> + Unpin),
    frame: &ServerFrame,
) -> Result<(), String> {
    let text = frame::encode(frame).map_err(|e| e.to_string())?;
    ws_sender
        .send(Message::Text(text.into()))
        .await
        .map_err(|e| format!("WebSocket send error: {e}"))
}

/// Starts the server on the given address and returns the bound address and
/// a join handle.
///
/// The server stops accepting connections once `shutdown` flips to `true`
/// or its sender is dropped.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server_with_state(
    addr: &str,
    state: ServerState,
    mut shutdown: watch::Receiver<bool>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = axum::Router::new()
        .route("/ws", axum::routing::get(ws_handler))
        .route("/healthz", axum::routing::get(healthz))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        let signal = async move {
            while !*shutdown.borrow_and_update() {
                if shutdown.changed().await.is_err() {
                    break;
                }
            }
        };
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(signal)
            .await
        {
            tracing::error!(error = %e, "server error");
        }
    });
    Ok((bound_addr, handle))
}

/// Liveness probe.
async fn healthz() -> &'static str {
    "ok"
}

/// axum handler that upgrades an HTTP request to a WebSocket connection.
async fn ws_handler(
    ws: axum::extract::ws::WebSocketUpgrade,
    axum::extract::State(state): axum::extract::State<ServerState>,
) -> impl axum::response::IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}
