//! Weapon charging (hold to power up, release to act).
//!
//! Charging has no schedule. It follows the same owner / authority /
//! observer split as attacks: the owner client applies immediately and asks
//! the authority, the authority applies and broadcasts, observers apply the
//! broadcasts. All charge messages are unreliable.

use crate::context::{CombatContext, Handled};
use crate::messages::{CombatMessage, StartCharge, StartChargeBroadcast};
use crate::role::ActorRole;
use crate::types::{ActorId, Hand, MovementRestriction};

/// Charge state of one actor as seen by this participant.
#[derive(Debug, Clone)]
pub struct ChargeComponent {
    actor: ActorId,
    role: ActorRole,
    is_charging: bool,
    hand: Hand,
    started_at: f64,
    duration: f32,
    move_speed_rate: f32,
    movement_restriction: MovementRestriction,
}

impl ChargeComponent {
    /// Creates a component that is not charging.
    pub fn new(actor: ActorId, role: ActorRole) -> Self {
        Self {
            actor,
            role,
            is_charging: false,
            hand: Hand::Primary,
            started_at: 0.0,
            duration: 0.0,
            move_speed_rate: 1.0,
            movement_restriction: MovementRestriction::default(),
        }
    }

    /// A charge is in progress.
    pub fn is_charging(&self) -> bool {
        self.is_charging
    }

    /// Hand of the latest charge.
    pub fn hand(&self) -> Hand {
        self.hand
    }

    /// Move speed multiplier while charging.
    pub fn move_speed_rate(&self) -> f32 {
        self.move_speed_rate
    }

    /// Movement limits while charging.
    pub fn movement_restriction(&self) -> MovementRestriction {
        self.movement_restriction
    }

    /// Releasing now would perform the charged action.
    pub fn will_act_when_stopped(&self, now: f64) -> bool {
        self.is_charging && now - self.started_at >= f64::from(self.duration)
    }

    /// Starts charging on this participant's initiative.
    pub fn start_charge(&mut self, hand: Hand, ctx: &mut CombatContext<'_>) -> Handled {
        match self.role {
            ActorRole::OwnerClient => {
                self.begin(hand, ctx);
                ctx.outbox
                    .push(self.actor, CombatMessage::StartCharge(StartCharge { hand }));
                Handled::Applied
            }
            ActorRole::ServerOwned => {
                self.begin_as_authority(hand, ctx);
                Handled::Applied
            }
            ActorRole::ServerProxy | ActorRole::Observer => Handled::Ignored,
        }
    }

    /// Stops charging on this participant's initiative.
    pub fn stop_charge(&mut self, ctx: &mut CombatContext<'_>) -> Handled {
        match self.role {
            ActorRole::OwnerClient => {
                self.end();
                ctx.outbox.push(self.actor, CombatMessage::StopCharge);
                Handled::Applied
            }
            ActorRole::ServerOwned => {
                self.end_as_authority(ctx);
                Handled::Applied
            }
            ActorRole::ServerProxy | ActorRole::Observer => Handled::Ignored,
        }
    }

    /// The owner asked the authority to start charging.
    pub fn handle_start_charge(
        &mut self,
        request: &StartCharge,
        ctx: &mut CombatContext<'_>,
    ) -> Handled {
        if self.role != ActorRole::ServerProxy {
            return Handled::Ignored;
        }
        self.begin_as_authority(request.hand, ctx);
        Handled::Applied
    }

    /// The owner asked the authority to stop charging.
    pub fn handle_stop_charge(&mut self, ctx: &mut CombatContext<'_>) -> Handled {
        if self.role != ActorRole::ServerProxy {
            return Handled::Ignored;
        }
        self.end_as_authority(ctx);
        Handled::Applied
    }

    /// The authority announced a charge.
    pub fn handle_start_broadcast(
        &mut self,
        broadcast: &StartChargeBroadcast,
        ctx: &mut CombatContext<'_>,
    ) -> Handled {
        if self.role != ActorRole::Observer {
            return Handled::Ignored;
        }
        self.begin(broadcast.hand, ctx);
        Handled::Applied
    }

    /// The authority announced the charge ended.
    pub fn handle_stop_broadcast(&mut self) -> Handled {
        if self.role != ActorRole::Observer {
            return Handled::Ignored;
        }
        self.end();
        Handled::Applied
    }

    /// Drops any charge without notifying anyone.
    pub fn clear(&mut self) {
        self.is_charging = false;
    }

    fn begin_as_authority(&mut self, hand: Hand, ctx: &mut CombatContext<'_>) {
        self.begin(hand, ctx);
        ctx.outbox.push(
            self.actor,
            CombatMessage::StartChargeBroadcast(StartChargeBroadcast { hand: self.hand }),
        );
    }

    fn end_as_authority(&mut self, ctx: &mut CombatContext<'_>) {
        self.end();
        ctx.outbox
            .push(self.actor, CombatMessage::StopChargeBroadcast);
    }

    fn begin(&mut self, hand: Hand, ctx: &mut CombatContext<'_>) {
        let data = ctx.entity.charge_data(hand);
        self.hand = data.hand;
        self.duration = data.duration;
        self.move_speed_rate = data.move_speed_rate;
        self.movement_restriction = data.movement_restriction;
        self.started_at = ctx.now;
        self.is_charging = true;
        tracing::debug!(actor = self.actor.0, hand = ?self.hand, "charge started");
    }

    fn end(&mut self) {
        self.is_charging = false;
    }
}
