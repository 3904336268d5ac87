//! The closed set of task-owning identities.

use serde::{Deserialize, Serialize};

/// One of the two fixed personas that own task lists.
///
/// Identities are never user-supplied: an actor picks one from the identity
/// menu and the choice is cached for the rest of the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Identity {
    /// The first identity.
    A,
    /// The second identity.
    B,
}

impl Identity {
    /// Every identity, in menu order.
    pub const ALL: [Self; 2] = [Self::A, Self::B];

    /// Short key used in callback payloads and config files.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::A => "a",
            Self::B => "b",
        }
    }

    /// Looks up an identity by its [`key`](Self::key).
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|identity| identity.key() == key)
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}
