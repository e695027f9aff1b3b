//! Combat action synchronization: seeded action sessions, trigger
//! replication with out-of-order buffering, and the hit-validation handoff.
//!
//! Owners predict their own attacks, the authority re-runs them and sends one
//! trigger event per cue, and observers replay those events. Secondary random
//! values (sub-shot stagger, animation variant) are re-derived from a one-byte
//! correlation seed on every participant instead of being transmitted.

pub mod actor;
pub mod attack;
pub mod charge;
pub mod clock;
pub mod context;
pub mod ecs;
pub mod entity;
pub mod history;
pub mod hit;
pub mod messages;
pub mod role;
pub mod schedule;
pub mod seed;
pub mod session;
pub mod types;

#[cfg(test)]
mod test_support;

pub use actor::CombatActor;
pub use attack::{AttackComponent, StartRejected, TriggerOutcome};
pub use charge::ChargeComponent;
pub use clock::{DEFAULT_TICK_RATE, SimClock, SimTime};
pub use context::{CombatContext, Handled};
pub use ecs::{
    CombatInbox, CombatOutbox, CombatServices, Combatant, advance_combatants, combat_schedule,
    deliver_inbound,
};
pub use entity::{AttackingData, ChargeData, CombatEntity, CueInfo};
pub use history::{Advance, HistoryEntry, ParkOutcome, PendingTriggerQueue, TriggerHistory};
pub use hit::{
    AttackInput, AttackReport, DamageLauncher, HitBoxId, HitBoxResults, HitValidationRequest,
    HitValidator, LaunchRequest, apply_attack,
};
pub use messages::{
    ActorMessage, Audience, CombatMessage, Delivery, MessageError, Outbox, Outgoing,
    PROTOCOL_VERSION, StartAction, StartActionBroadcast, StartCharge, StartChargeBroadcast,
    TriggerEvent, deserialize_message, serialize_message,
};
pub use role::ActorRole;
pub use schedule::{
    ActionTiming, AnimationPicker, FallbackTiming, ScheduleKey, ScheduleResolver,
    StaticSchedules, fallback_timing,
};
pub use seed::{ApplySeed, CUE_SEED_STRIDE, CorrelationSeed, ShotStream, generate_seed, thread_seed};
pub use session::{ActionSession, SessionEvent, SessionParams, SessionPhase};
pub use types::{
    ActionKind, ActorId, AimPosition, DamageInfo, DamageMap, Hand, MinMax, MovementRestriction,
    SkillRef, WeaponSnapshot,
};
