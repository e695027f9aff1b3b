//! Per-actor replication roles.
//!
//! A participant's relationship to an actor is resolved once, when the actor
//! is registered locally, and every inbound message is dispatched on it. The
//! capability queries below are the only place role semantics live.

use serde::{Deserialize, Serialize};

/// How this participant relates to one actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorRole {
    /// A client predicting its own actor.
    OwnerClient,
    /// The server (or a host) acting for an actor it controls itself.
    ServerOwned,
    /// The server, authoritative for an actor controlled by a remote client.
    ServerProxy,
    /// A client replaying someone else's actor.
    Observer,
}

impl ActorRole {
    /// Resolves the role from the three ownership facts a transport knows.
    pub fn resolve(is_server: bool, is_owner_client: bool, owned_by_server: bool) -> Self {
        match (is_server, is_owner_client || owned_by_server) {
            (true, true) => Self::ServerOwned,
            (true, false) => Self::ServerProxy,
            (false, _) if is_owner_client => Self::OwnerClient,
            (false, _) => Self::Observer,
        }
    }

    /// Canonical for the actor's effects.
    pub fn is_authority(self) -> bool {
        matches!(self, Self::ServerOwned | Self::ServerProxy)
    }

    /// Decides locally when the actor acts (input or AI lives here).
    pub fn initiates_actions(self) -> bool {
        matches!(self, Self::OwnerClient | Self::ServerOwned)
    }

    /// Applies each cue from its own session timing.
    pub fn applies_cues_locally(self) -> bool {
        !matches!(self, Self::Observer)
    }

    /// Sends one trigger event per cue to observers.
    pub fn emits_triggers(self) -> bool {
        self.is_authority()
    }

    /// Registers shots for later validation of client-reported hits.
    pub fn registers_hit_validation(self) -> bool {
        matches!(self, Self::ServerProxy)
    }

    /// Replays inbound trigger events.
    pub fn replays_triggers(self) -> bool {
        matches!(self, Self::Observer)
    }
}
