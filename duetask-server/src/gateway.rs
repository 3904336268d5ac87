//! WebSocket implementation of the core [`Gateway`].
//!
//! Holds one outbound channel per connected actor. Each channel feeds the
//! writer task of that actor's WebSocket, so sending never waits on the
//! network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::ws::Message;
use duetask::gateway::{Gateway, GatewayError};
use duetask_proto::frame;
use duetask_proto::{ActorId, Keyboard, MessageRef, ServerFrame};
use tokio::sync::{RwLock, mpsc};

/// Identifies one registration of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionId(u64);

struct Connection {
    id: ConnectionId,
    sender: mpsc::UnboundedSender<Message>,
}

/// Registry of live actor connections.
#[derive(Default)]
pub struct WsGateway {
    /// Maps an actor to the sender feeding its WebSocket writer.
    connections: RwLock<HashMap<ActorId, Connection>>,
    next_id: AtomicU64,
}

impl WsGateway {
    /// Creates a gateway with no connections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an actor's connection.
    ///
    /// If the actor was already connected, the old sender is dropped, which
    /// closes the old channel; its writer task then shuts the old socket.
    pub async fn register(&self, actor: ActorId, sender: mpsc::UnboundedSender<Message>) -> ConnectionId {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let old = self
            .connections
            .write()
            .await
            .insert(actor, Connection { id, sender });
        if old.is_some() {
            tracing::info!(actor = %actor, "replaced existing connection (duplicate register)");
        }
        id
    }

    /// Removes the actor's connection if it is still registration `id`.
    ///
    /// A connection that was replaced by a newer registration is left alone.
    pub async fn unregister(&self, actor: ActorId, id: ConnectionId) -> bool {
        let mut conns = self.connections.write().await;
        if conns.get(&actor).is_some_and(|current| current.id == id) {
            conns.remove(&actor);
            return true;
        }
        false
    }

    /// Whether the actor currently has a live connection.
    pub async fn is_connected(&self, actor: ActorId) -> bool {
        self.connections.read().await.contains_key(&actor)
    }

    /// Sends a Close frame to every connected actor.
    pub async fn close_all_connections(&self) {
        let conns = self.connections.read().await;
        for (actor, conn) in conns.iter() {
            tracing::info!(actor = %actor, "sending close frame");
            let _ = conn.sender.send(Message::Close(None));
        }
    }

    /// Encodes and pushes one frame to the actor's writer.
    pub(crate) async fn push(&self, actor: ActorId, frame: &ServerFrame) -> Result<(), GatewayError> {
        let text = frame::encode(frame).map_err(|e| GatewayError::Encode(e.to_string()))?;
        let (id, sender) = self
            .connections
            .read()
            .await
            .get(&actor)
            .map(|conn| (conn.id, conn.sender.clone()))
            .ok_or(GatewayError::NotConnected(actor))?;

        if sender.send(Message::Text(text.into())).is_err() {
            tracing::warn!(actor = %actor, "writer gone, unregistering");
            self.unregister(actor, id).await;
            return Err(GatewayError::ConnectionClosed);
        }
        Ok(())
    }
}

impl Gateway for WsGateway {
    async fn send(
        &self,
        actor: ActorId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageRef, GatewayError> {
        let message = MessageRef::new(actor);
        let frame = ServerFrame::Message {
            message,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        };
        self.push(actor, &frame).await?;
        Ok(message)
    }

    async fn edit(
        &self,
        message: &MessageRef,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), GatewayError> {
        let frame = ServerFrame::Edit {
            message: *message,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        };
        self.push(message.actor, &frame).await
    }
}
