//! Combat wire messages and their serialization.
//!
//! Every message is addressed to one actor through an [`ActorMessage`]
//! envelope, serialized with [`postcard`] and prefixed with a protocol version
//! byte. Trigger events travel on the reliable-ordered channel; start/stop
//! declarations are unreliable and only bootstrap prediction.

use serde::{Deserialize, Serialize};

use crate::seed::CorrelationSeed;
use crate::types::{ActorId, AimPosition, Hand};

/// Current combat wire-protocol version. Prepended to every serialized message.
pub const PROTOCOL_VERSION: u8 = 1;

// ---------------------------------------------------------------------------
// Delivery classes
// ---------------------------------------------------------------------------

/// Transport guarantee a message requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Delivery {
    /// May be lost, duplicated or reordered.
    Unreliable,
    /// Delivered in send order; retransmits may duplicate.
    ReliableOrdered,
}

/// Who a message is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Audience {
    /// The actor's authority (server).
    Authority,
    /// Every participant observing the actor.
    Observers,
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Owner asks the authority to start an attack.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StartAction {
    /// Seed picked by the owner for its predicted session.
    pub seed: CorrelationSeed,
    /// Acting hand.
    pub hand: Hand,
}

/// Authority tells observers an attack started.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StartActionBroadcast {
    /// Seed of the authority's session.
    pub seed: CorrelationSeed,
    /// Acting hand.
    pub hand: Hand,
}

/// One cue of an action, sent by the authority to observers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TriggerEvent {
    /// Seed of the action this cue belongs to.
    pub seed: CorrelationSeed,
    /// Cue fired from the secondary hand.
    pub is_secondary_hand: bool,
    /// Cue driven by a skill; observers count it without a weapon attack.
    pub is_skill_driven: bool,
    /// Aim at the moment the cue fired.
    pub aim: AimPosition,
}

impl TriggerEvent {
    /// Acting hand encoded in this event.
    pub fn hand(&self) -> Hand {
        Hand::from_secondary_flag(self.is_secondary_hand)
    }
}

/// Owner asks the authority to start charging.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StartCharge {
    /// Charging hand.
    pub hand: Hand,
}

/// Authority tells observers charging started.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StartChargeBroadcast {
    /// Charging hand.
    pub hand: Hand,
}

// ---------------------------------------------------------------------------
// Top-level enum
// ---------------------------------------------------------------------------

/// Combat message. The enum discriminant is the type tag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum CombatMessage {
    /// Owner → authority, unreliable.
    StartAction(StartAction),
    /// Authority → observers, unreliable.
    StartActionBroadcast(StartActionBroadcast),
    /// Authority → observers, reliable-ordered, one per cue.
    TriggerEvent(TriggerEvent),
    /// Owner → authority, unreliable.
    StartCharge(StartCharge),
    /// Authority → observers, unreliable.
    StartChargeBroadcast(StartChargeBroadcast),
    /// Owner → authority, unreliable.
    StopCharge,
    /// Authority → observers, unreliable.
    StopChargeBroadcast,
}

impl CombatMessage {
    /// Transport guarantee this message needs.
    pub fn delivery(&self) -> Delivery {
        match self {
            Self::TriggerEvent(_) => Delivery::ReliableOrdered,
            _ => Delivery::Unreliable,
        }
    }

    /// Who should receive this message.
    pub fn audience(&self) -> Audience {
        match self {
            Self::StartAction(_) | Self::StartCharge(_) | Self::StopCharge => Audience::Authority,
            Self::StartActionBroadcast(_)
            | Self::TriggerEvent(_)
            | Self::StartChargeBroadcast(_)
            | Self::StopChargeBroadcast => Audience::Observers,
        }
    }
}

/// A combat message addressed to one actor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ActorMessage {
    /// Actor the message concerns.
    pub actor: ActorId,
    /// The message itself.
    pub message: CombatMessage,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during message deserialization.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    /// The payload was empty (no version byte).
    #[error("empty payload, no version byte")]
    EmptyPayload,

    /// The version byte does not match [`PROTOCOL_VERSION`].
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    /// Postcard (de)serialization failed.
    #[error("postcard error: {0}")]
    Postcard(#[from] postcard::Error),
}

// ---------------------------------------------------------------------------
// Serialization helpers
// ---------------------------------------------------------------------------

/// Serialize an [`ActorMessage`] into a versioned binary payload.
///
/// Wire format: `[version: u8] [postcard-encoded ActorMessage]`
pub fn serialize_message(msg: &ActorMessage) -> Result<Vec<u8>, MessageError> {
    let body = postcard::to_allocvec(msg)?;
    let mut out = Vec::with_capacity(1 + body.len());
    out.push(PROTOCOL_VERSION);
    out.extend_from_slice(&body);
    Ok(out)
}

/// Deserialize a versioned binary payload into an [`ActorMessage`].
pub fn deserialize_message(data: &[u8]) -> Result<ActorMessage, MessageError> {
    let Some((&version, body)) = data.split_first() else {
        return Err(MessageError::EmptyPayload);
    };
    if version != PROTOCOL_VERSION {
        return Err(MessageError::UnsupportedVersion(version));
    }
    Ok(postcard::from_bytes(body)?)
}

// ---------------------------------------------------------------------------
// Outbox
// ---------------------------------------------------------------------------

/// A message ready for the transport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outgoing {
    /// Addressed message.
    pub envelope: ActorMessage,
    /// Required transport guarantee.
    pub delivery: Delivery,
    /// Receivers.
    pub audience: Audience,
}

/// Messages produced during one tick, in production order.
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    queue: Vec<Outgoing>,
}

impl Outbox {
    /// Creates an empty outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `message` for `actor`, classifying delivery and audience.
    pub fn push(&mut self, actor: ActorId, message: CombatMessage) {
        self.queue.push(Outgoing {
            envelope: ActorMessage { actor, message },
            delivery: message.delivery(),
            audience: message.audience(),
        });
    }

    /// Removes and returns every queued message.
    pub fn drain(&mut self) -> Vec<Outgoing> {
        std::mem::take(&mut self.queue)
    }

    /// Queued messages.
    pub fn pending(&self) -> &[Outgoing] {
        &self.queue
    }

    /// Number of queued messages.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queued trigger events, for inspection.
    pub fn triggers(&self) -> impl Iterator<Item = &TriggerEvent> {
        self.queue.iter().filter_map(|o| match &o.envelope.message {
            CombatMessage::TriggerEvent(e) => Some(e),
            _ => None,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
