//! Shared protocol definitions for the duetask gateway wire format.

pub mod callback;
pub mod frame;
pub mod identity;
pub mod markup;

pub use callback::CallbackData;
pub use frame::{ActorId, ClientFrame, MessageRef, ServerFrame};
pub use identity::Identity;
pub use markup::{Button, Keyboard};

/// Errors produced while decoding protocol data.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProtoError {
    /// Callback data did not match any known button payload.
    #[error("unknown callback data: {0:?}")]
    UnknownCallback(String),
    /// Callback data had a known prefix but malformed arguments.
    #[error("malformed callback data: {0:?}")]
    MalformedCallback(String),
    /// A frame could not be encoded or decoded.
    #[error("frame codec error: {0}")]
    Frame(String),
}
