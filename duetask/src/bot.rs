//! Event dispatch: session lock, controller, delivery.

use std::sync::Arc;

use duetask_proto::{ActorId, MessageRef};

use crate::conversation::{Controller, Event};
use crate::gateway::{self, Gateway};
use crate::session::SessionStore;
use crate::tasks::TaskStore;

/// Routes inbound events to the controller and replies back to the gateway.
///
/// Each event runs under the actor's session lock from the state update until
/// the last reply has been handed to the gateway, so two events from one
/// actor never interleave. Events from different actors run concurrently.
pub struct Bot<G> {
    controller: Controller,
    sessions: Arc<SessionStore>,
    gateway: Arc<G>,
}

impl<G: Gateway> Bot<G> {
    /// Creates a bot over shared sessions and gateway.
    pub const fn new(controller: Controller, sessions: Arc<SessionStore>, gateway: Arc<G>) -> Self {
        Self {
            controller,
            sessions,
            gateway,
        }
    }

    /// The session registry, shared with the reminder scheduler.
    #[must_use]
    pub const fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// The task store the controller mutates.
    #[must_use]
    pub const fn store(&self) -> &Arc<TaskStore> {
        self.controller.store()
    }

    /// The outbound gateway.
    #[must_use]
    pub const fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    /// Handles one event from `actor`.
    ///
    /// `origin` is the message whose button produced the event, if any;
    /// replies that replace the current screen edit it. Returns the number
    /// of replies delivered.
    pub async fn dispatch(&self, actor: ActorId, origin: Option<MessageRef>, event: Event) -> usize {
        let origin = origin.filter(|message| {
            let own = message.actor == actor;
            if !own {
                tracing::warn!(actor = %actor, owner = %message.actor, "ignoring foreign origin message");
            }
            own
        });

        let mut session = self.sessions.lock(actor).await;
        let replies = self.controller.handle(&mut session, &event);
        tracing::debug!(actor = %actor, ?event, replies = replies.len(), "event handled");

        gateway::deliver(self.gateway.as_ref(), actor, origin.as_ref(), replies).await
    }
}
