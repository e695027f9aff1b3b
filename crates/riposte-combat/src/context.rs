//! Per-call access to the collaborators of one actor.

use crate::entity::CombatEntity;
use crate::hit::{DamageLauncher, HitValidator};
use crate::messages::Outbox;
use crate::schedule::ScheduleResolver;

/// Everything a combat component may touch while handling one input.
pub struct CombatContext<'a> {
    /// Current simulation time in seconds.
    pub now: f64,
    /// The acting character.
    pub entity: &'a mut dyn CombatEntity,
    /// Animation timing source.
    pub resolver: &'a mut dyn ScheduleResolver,
    /// Hit-box spawner.
    pub launcher: &'a mut dyn DamageLauncher,
    /// Authoritative hit registration.
    pub validator: &'a mut dyn HitValidator,
    /// Messages produced for the transport.
    pub outbox: &'a mut Outbox,
}

/// Whether an input changed anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    /// The input was acted on.
    Applied,
    /// The input does not concern this role.
    Ignored,
}
