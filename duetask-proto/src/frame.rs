//! WebSocket frames exchanged between chat clients and the gateway server.
//!
//! Frames are JSON text messages tagged by `type`. A client must send
//! [`ClientFrame::Register`] first; the server answers with
//! [`ServerFrame::Registered`] and from then on pushes messages and edits
//! addressed to that actor.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ProtoError;
use crate::markup::Keyboard;

/// Opaque numeric id of a chat participant, assigned by the chat client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub i64);

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to a message previously delivered to an actor, used for edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    /// Chat the message lives in.
    pub actor: ActorId,
    /// Gateway-assigned message id (UUID v7, time-ordered).
    pub id: Uuid,
}

impl MessageRef {
    /// Allocates a fresh reference in the given actor's chat.
    #[must_use]
    pub fn new(actor: ActorId) -> Self {
        Self {
            actor,
            id: Uuid::now_v7(),
        }
    }
}

/// Frames sent by a chat client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Binds this connection to an actor. Must be the first frame.
    Register {
        /// The actor this connection speaks for.
        actor: ActorId,
    },
    /// A slash command such as `/start` (sent without the slash).
    Command {
        /// Command name.
        name: String,
    },
    /// Free text typed by the actor.
    Text {
        /// Message body.
        content: String,
    },
    /// An inline button was pressed.
    Callback {
        /// The message that carried the button.
        message: MessageRef,
        /// The button's payload.
        data: String,
    },
}

/// Frames sent by the gateway server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Registration acknowledged.
    Registered {
        /// The registered actor, echoed back.
        actor: ActorId,
    },
    /// A new message in the actor's chat.
    Message {
        /// Reference the client should use when pressing buttons.
        message: MessageRef,
        /// Message body (Markdown).
        text: String,
        /// Optional inline keyboard.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        keyboard: Option<Keyboard>,
    },
    /// Replace the text and keyboard of an existing message.
    Edit {
        /// Message being edited.
        message: MessageRef,
        /// New body.
        text: String,
        /// New keyboard; `None` removes it.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        keyboard: Option<Keyboard>,
    },
    /// The server rejected a frame.
    Error {
        /// Human-readable reason.
        reason: String,
    },
}

/// Encodes a frame as JSON text.
///
/// # Errors
///
/// Returns [`ProtoError::Frame`] if serialization fails.
pub fn encode<T: Serialize>(frame: &T) -> Result<String, ProtoError> {
    serde_json::to_string(frame).map_err(|e| ProtoError::Frame(format!("encode: {e}")))
}

/// Decodes a frame from JSON text.
///
/// # Errors
///
/// Returns [`ProtoError::Frame`] if the text is not a valid frame.
pub fn decode<T: for<'de> Deserialize<'de>>(text: &str) -> Result<T, ProtoError> {
    serde_json::from_str(text).map_err(|e| ProtoError::Frame(format!("decode: {e}")))
}
