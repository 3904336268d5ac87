//! Messaging gateway abstraction.
//!
//! Defines the [`Gateway`] trait the core uses to reach actors. The core only
//! ever sends and edits messages; rendering of keyboards and the transport
//! loop belong to the implementation. Concrete implementations:
//! - [`recording::RecordingGateway`]: in-process gateway for tests
//! - `duetask_server::gateway::WsGateway`: WebSocket gateway

pub mod recording;

use std::future::Future;

use duetask_proto::{ActorId, Keyboard, MessageRef};

use crate::conversation::Reply;

/// Delivery failures reported by a gateway.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The actor has no live connection.
    #[error("actor {0} is not connected")]
    NotConnected(ActorId),

    /// The connection closed while delivering.
    #[error("connection closed")]
    ConnectionClosed,

    /// The outgoing frame could not be encoded.
    #[error("failed to encode outgoing frame: {0}")]
    Encode(String),
}

/// Outbound side of the chat transport.
///
/// Both operations are fallible and every caller in this crate treats a
/// failure as "drop this message and carry on": nothing is retried and no
/// failure is ever surfaced to the actor.
pub trait Gateway: Send + Sync {
    /// Sends a new message to the actor's chat.
    fn send(
        &self,
        actor: ActorId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> impl Future<Output = Result<MessageRef, GatewayError>> + Send;

    /// Replaces the text and keyboard of an earlier message.
    fn edit(
        &self,
        message: &MessageRef,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;
}

/// Delivers controller replies to one actor, best effort.
///
/// [`Reply::Replace`] edits `origin` when the event came from a button and
/// is sent as a new message otherwise. A failed delivery is logged and the
/// remaining replies are still attempted. Returns how many replies were
/// delivered.
pub async fn deliver<G: Gateway>(
    gateway: &G,
    actor: ActorId,
    origin: Option<&MessageRef>,
    replies: Vec<Reply>,
) -> usize {
    let mut delivered = 0;
    for reply in replies {
        let result = match (&reply, origin) {
            (Reply::Replace { text, keyboard }, Some(origin)) => {
                gateway.edit(origin, text, keyboard.as_ref()).await
            }
            (Reply::Replace { text, keyboard } | Reply::Send { text, keyboard }, _) => {
                gateway.send(actor, text, keyboard.as_ref()).await.map(|_| ())
            }
        };
        match result {
            Ok(()) => delivered += 1,
            Err(e) => {
                tracing::warn!(actor = %actor, error = %e, "reply delivery failed, dropping");
            }
        }
    }
    delivered
}
