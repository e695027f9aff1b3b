//! One actor's combat state: attack plus charge, with message dispatch.

use riposte_config::Config;

use crate::attack::{AttackComponent, TriggerOutcome};
use crate::charge::ChargeComponent;
use crate::context::{CombatContext, Handled};
use crate::messages::CombatMessage;
use crate::role::ActorRole;
use crate::types::ActorId;

/// Everything this participant tracks about one actor's combat.
#[derive(Debug, Clone)]
pub struct CombatActor {
    id: ActorId,
    role: ActorRole,
    attack: AttackComponent,
    charge: ChargeComponent,
}

impl CombatActor {
    /// Creates an idle actor with a fixed role.
    pub fn new(id: ActorId, role: ActorRole, config: &Config) -> Self {
        Self {
            id,
            role,
            attack: AttackComponent::new(id, role, &config.combat, &config.replication),
            charge: ChargeComponent::new(id, role),
        }
    }

    /// Network identifier.
    pub fn id(&self) -> ActorId {
        self.id
    }

    /// This participant's role for the actor.
    pub fn role(&self) -> ActorRole {
        self.role
    }

    /// Attack state.
    pub fn attack(&self) -> &AttackComponent {
        &self.attack
    }

    /// Attack state, for local initiation.
    pub fn attack_mut(&mut self) -> &mut AttackComponent {
        &mut self.attack
    }

    /// Charge state.
    pub fn charge(&self) -> &ChargeComponent {
        &self.charge
    }

    /// Charge state, for local initiation.
    pub fn charge_mut(&mut self) -> &mut ChargeComponent {
        &mut self.charge
    }

    /// Routes an inbound message to the component it concerns.
    ///
    /// Rejected start requests are logged by the attack component and
    /// reported here as [`Handled::Ignored`].
    pub fn handle(&mut self, message: &CombatMessage, ctx: &mut CombatContext<'_>) -> Handled {
        match message {
            CombatMessage::StartAction(request) => self
                .attack
                .handle_start_action(request, ctx)
                .unwrap_or(Handled::Ignored),
            CombatMessage::StartActionBroadcast(broadcast) => {
                self.attack.handle_start_broadcast(broadcast, ctx)
            }
            CombatMessage::TriggerEvent(event) => {
                match self.attack.handle_trigger_event(event, ctx) {
                    TriggerOutcome::Applied { .. } | TriggerOutcome::Parked => Handled::Applied,
                    TriggerOutcome::Dropped | TriggerOutcome::Ignored => Handled::Ignored,
                }
            }
            CombatMessage::StartCharge(request) => self.charge.handle_start_charge(request, ctx),
            CombatMessage::StartChargeBroadcast(broadcast) => {
                self.charge.handle_start_broadcast(broadcast, ctx)
            }
            CombatMessage::StopCharge => self.charge.handle_stop_charge(ctx),
            CombatMessage::StopChargeBroadcast => self.charge.handle_stop_broadcast(),
        }
    }

    /// Advances running actions by `dt` simulation seconds.
    pub fn tick(&mut self, dt: f32, ctx: &mut CombatContext<'_>) {
        self.attack.tick(dt, ctx);
    }

    /// Stops every action (death, stun, despawn).
    pub fn cancel_all(&mut self, now: f64) {
        self.attack.cancel(now);
        self.charge.clear();
    }
}
