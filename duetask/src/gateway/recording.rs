//! Recording gateway for testing.
//!
//! Keeps every delivery in memory instead of talking to a transport, and can
//! be told to fail for chosen actors to exercise the best-effort delivery
//! paths.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use duetask_proto::{ActorId, Keyboard, MessageRef};
use parking_lot::Mutex;

use super::{Gateway, GatewayError};

/// A message the gateway was asked to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// A new message.
    Sent {
        /// Reference assigned to the message.
        message: MessageRef,
        /// Body.
        text: String,
        /// Keyboard, if any.
        keyboard: Option<Keyboard>,
    },
    /// An edit of an earlier message.
    Edited {
        /// Edited message.
        message: MessageRef,
        /// New body.
        text: String,
        /// New keyboard, if any.
        keyboard: Option<Keyboard>,
    },
}

impl Delivery {
    /// Actor the delivery was addressed to.
    #[must_use]
    pub const fn actor(&self) -> ActorId {
        match self {
            Self::Sent { message, .. } | Self::Edited { message, .. } => message.actor,
        }
    }

    /// Message the delivery created or edited.
    #[must_use]
    pub const fn message(&self) -> &MessageRef {
        match self {
            Self::Sent { message, .. } | Self::Edited { message, .. } => message,
        }
    }

    /// Body text.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Sent { text, .. } | Self::Edited { text, .. } => text,
        }
    }

    /// Keyboard, if any.
    #[must_use]
    pub const fn keyboard(&self) -> Option<&Keyboard> {
        match self {
            Self::Sent { keyboard, .. } | Self::Edited { keyboard, .. } => keyboard.as_ref(),
        }
    }
}

/// In-memory [`Gateway`] that records successful deliveries.
#[derive(Default)]
pub struct RecordingGateway {
    deliveries: Mutex<Vec<Delivery>>,
    failing: Mutex<HashSet<ActorId>>,
    attempts: AtomicUsize,
}

impl RecordingGateway {
    /// Creates an empty gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every delivery to `actor` fail with [`GatewayError::NotConnected`].
    pub fn fail_for(&self, actor: ActorId) {
        self.failing.lock().insert(actor);
    }

    /// Lets deliveries to `actor` succeed again.
    pub fn recover(&self, actor: ActorId) {
        self.failing.lock().remove(&actor);
    }

    /// All successful deliveries, in order.
    #[must_use]
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().clone()
    }

    /// Successful deliveries addressed to `actor`.
    #[must_use]
    pub fn deliveries_to(&self, actor: ActorId) -> Vec<Delivery> {
        self.deliveries
            .lock()
            .iter()
            .filter(|d| d.actor() == actor)
            .cloned()
            .collect()
    }

    /// Number of send/edit calls, successful or not.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Forgets recorded deliveries.
    pub fn clear(&self) {
        self.deliveries.lock().clear();
    }

    fn record(&self, actor: ActorId, delivery: Delivery) -> Result<(), GatewayError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().contains(&actor) {
            return Err(GatewayError::NotConnected(actor));
        }
        self.deliveries.lock().push(delivery);
        Ok(())
    }
}

impl Gateway for RecordingGateway {
    async fn send(
        &self,
        actor: ActorId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageRef, GatewayError> {
        let message = MessageRef::new(actor);
        self.record(
            actor,
            Delivery::Sent {
                message,
                text: text.to_string(),
                keyboard: keyboard.cloned(),
            },
        )?;
        Ok(message)
    }

    async fn edit(
        &self,
        message: &MessageRef,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), GatewayError> {
        self.record(
            message.actor,
            Delivery::Edited {
                message: *message,
                text: text.to_string(),
                keyboard: keyboard.cloned(),
            },
        )
    }
}
