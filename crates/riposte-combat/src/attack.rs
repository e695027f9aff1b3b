//! Attack actions with role-dispatched replication.
//!
//! Every participant runs its own [`ActionSession`] for an attack. What a
//! participant does with the session's cues depends on its [`ActorRole`]:
//!
//! - the owner client predicts: it applies each cue locally and tells the
//!   authority it started;
//! - the authority applies each cue and sends one [`TriggerEvent`] per cue;
//! - an observer plays the animation but applies cues only when trigger
//!   events arrive, re-deriving every random value from the seed.
//!
//! Trigger events can arrive before the observer's session knows its
//! schedule. They wait in the [`PendingTriggerQueue`] and are replayed in
//! arrival order as soon as it does. Start announcements are unreliable: a
//! trigger event for an action the observer never heard of starts the replay
//! session itself, and a repeated announcement of the running action is
//! ignored.

use riposte_config::{CombatConfig, ReplicationConfig};

use crate::context::{CombatContext, Handled};
use crate::entity::{AttackingData, CueInfo};
use crate::hit::{AttackInput, apply_attack};
use crate::history::{Advance, ParkOutcome, PendingTriggerQueue, TriggerHistory};
use crate::messages::{CombatMessage, StartAction, StartActionBroadcast, TriggerEvent};
use crate::role::ActorRole;
use crate::schedule::AnimationPicker;
use crate::seed::{ApplySeed, CorrelationSeed, thread_seed};
use crate::session::{ActionSession, SessionEvent, SessionParams};
use crate::types::{ActorId, DamageInfo, DamageMap, Hand, MovementRestriction};

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Why the authority refused to start an attack.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum StartRejected {
    /// The request arrived before the previous action could have ended.
    #[error(
        "attack requested at {now:.3}s but previous action ends at {last_action_end:.3}s \
         (tolerance {tolerance}s)"
    )]
    TooEarly {
        /// Simulation time of the request.
        now: f64,
        /// End of the previous action.
        last_action_end: f64,
        /// Allowed earliness.
        tolerance: f32,
    },
}

/// What happened to an inbound trigger event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Cue `index` was replayed.
    Applied {
        /// Zero-based cue index.
        index: usize,
    },
    /// Held until the session for its seed knows its schedule.
    Parked,
    /// Duplicate, stale, or over the pending limits.
    Dropped,
    /// Not handled by this role.
    Ignored,
}

// ---------------------------------------------------------------------------
// AttackComponent
// ---------------------------------------------------------------------------

/// Snapshot taken when an action starts.
#[derive(Debug, Clone)]
struct RunningAction {
    session: ActionSession,
    data: AttackingData,
    damage_info: DamageInfo,
    damage: DamageMap,
}

/// Attack state of one actor as seen by this participant.
#[derive(Debug, Clone)]
pub struct AttackComponent {
    actor: ActorId,
    role: ActorRole,
    cfg: CombatConfig,
    running: Option<RunningAction>,
    history: TriggerHistory,
    pending: PendingTriggerQueue,
    picker: AnimationPicker,
    cancelled_seed: Option<CorrelationSeed>,
    is_acting: bool,
    last_action_end: f64,
    move_speed_rate: f32,
    movement_restriction: MovementRestriction,
}

impl AttackComponent {
    /// Creates an idle component.
    pub fn new(
        actor: ActorId,
        role: ActorRole,
        combat: &CombatConfig,
        replication: &ReplicationConfig,
    ) -> Self {
        Self {
            actor,
            role,
            cfg: combat.clone(),
            running: None,
            history: TriggerHistory::new(),
            pending: PendingTriggerQueue::new(replication),
            picker: AnimationPicker::new(),
            cancelled_seed: None,
            is_acting: false,
            last_action_end: 0.0,
            move_speed_rate: 1.0,
            movement_restriction: MovementRestriction::default(),
        }
    }

    /// The actor this component belongs to.
    pub fn actor(&self) -> ActorId {
        self.actor
    }

    /// This participant's role for the actor.
    pub fn role(&self) -> ActorRole {
        self.role
    }

    /// An attack is in progress.
    pub fn is_acting(&self) -> bool {
        self.is_acting
    }

    /// When the latest action ended or is expected to end.
    pub fn last_action_end(&self) -> f64 {
        self.last_action_end
    }

    /// Move speed multiplier of the latest action.
    pub fn move_speed_rate(&self) -> f32 {
        self.move_speed_rate
    }

    /// Movement limits of the latest action.
    pub fn movement_restriction(&self) -> MovementRestriction {
        self.movement_restriction
    }

    /// The running session, if any.
    pub fn session(&self) -> Option<&ActionSession> {
        self.running.as_ref().map(|r| &r.session)
    }

    /// Applied-cue counters.
    pub fn history(&self) -> &TriggerHistory {
        &self.history
    }

    /// Trigger events waiting for their session.
    pub fn pending(&self) -> &PendingTriggerQueue {
        &self.pending
    }

    // -- Local initiation ---------------------------------------------------

    /// Starts an attack with a fresh seed.
    pub fn attack(
        &mut self,
        hand: Hand,
        ctx: &mut CombatContext<'_>,
    ) -> Result<Handled, StartRejected> {
        self.attack_with_seed(thread_seed(), hand, ctx)
    }

    /// Starts an attack decided on this participant.
    pub fn attack_with_seed(
        &mut self,
        seed: CorrelationSeed,
        hand: Hand,
        ctx: &mut CombatContext<'_>,
    ) -> Result<Handled, StartRejected> {
        match self.role {
            ActorRole::OwnerClient => {
                self.start(seed, hand, ctx);
                ctx.outbox
                    .push(self.actor, CombatMessage::StartAction(StartAction { seed, hand }));
                Ok(Handled::Applied)
            }
            ActorRole::ServerOwned => {
                self.start_as_authority(seed, hand, ctx)?;
                Ok(Handled::Applied)
            }
            // Input for this actor lives elsewhere.
            ActorRole::ServerProxy | ActorRole::Observer => Ok(Handled::Ignored),
        }
    }

    // -- Inbound messages ---------------------------------------------------

    /// The owner asked the authority to start an attack.
    pub fn handle_start_action(
        &mut self,
        request: &StartAction,
        ctx: &mut CombatContext<'_>,
    ) -> Result<Handled, StartRejected> {
        if self.role != ActorRole::ServerProxy || self.is_running(request.seed) {
            return Ok(Handled::Ignored);
        }
        self.start_as_authority(request.seed, request.hand, ctx)?;
        Ok(Handled::Applied)
    }

    /// The authority announced an attack.
    pub fn handle_start_broadcast(
        &mut self,
        broadcast: &StartActionBroadcast,
        ctx: &mut CombatContext<'_>,
    ) -> Handled {
        match self.role {
            // Repeated announcement of the running action.
            ActorRole::Observer if self.is_running(broadcast.seed) => Handled::Ignored,
            ActorRole::Observer => {
                self.start(broadcast.seed, broadcast.hand, ctx);
                Handled::Applied
            }
            // Already started locally.
            _ => Handled::Ignored,
        }
    }

    /// One cue of an attack arrived.
    pub fn handle_trigger_event(
        &mut self,
        event: &TriggerEvent,
        ctx: &mut CombatContext<'_>,
    ) -> TriggerOutcome {
        match self.role {
            ActorRole::OwnerClient => self.on_trigger_as_owner(event),
            ActorRole::ServerOwned | ActorRole::ServerProxy => self.on_trigger_as_authority(event),
            ActorRole::Observer => self.on_trigger_as_observer(event, ctx),
        }
    }

    fn on_trigger_as_owner(&self, _event: &TriggerEvent) -> TriggerOutcome {
        // Every cue was already predicted.
        TriggerOutcome::Ignored
    }

    fn on_trigger_as_authority(&self, _event: &TriggerEvent) -> TriggerOutcome {
        TriggerOutcome::Ignored
    }

    fn on_trigger_as_observer(
        &mut self,
        event: &TriggerEvent,
        ctx: &mut CombatContext<'_>,
    ) -> TriggerOutcome {
        match self.history.try_advance(event.seed) {
            Advance::Applied { index } => {
                self.replay_cue(index, event, ctx);
                TriggerOutcome::Applied { index }
            }
            Advance::Exhausted => TriggerOutcome::Dropped,
            Advance::Missing if self.is_running(event.seed) => self.park(event, ctx.now),
            // In flight when the action was cancelled here.
            Advance::Missing if self.cancelled_seed == Some(event.seed) => TriggerOutcome::Dropped,
            Advance::Missing => {
                // The start announcement was lost.
                tracing::debug!(
                    actor = self.actor.0,
                    seed = event.seed,
                    "replay session started from trigger event"
                );
                self.start(event.seed, event.hand(), ctx);
                match self.history.try_advance(event.seed) {
                    Advance::Applied { index } => {
                        self.replay_cue(index, event, ctx);
                        TriggerOutcome::Applied { index }
                    }
                    Advance::Exhausted => TriggerOutcome::Dropped,
                    Advance::Missing => self.park(event, ctx.now),
                }
            }
        }
    }

    fn park(&mut self, event: &TriggerEvent, now: f64) -> TriggerOutcome {
        match self.pending.park(event.seed, *event, now) {
            ParkOutcome::Queued | ParkOutcome::EvictedOldest { .. } => TriggerOutcome::Parked,
            ParkOutcome::DroppedFull => TriggerOutcome::Dropped,
        }
    }

    /// A session for `seed` is running.
    fn is_running(&self, seed: CorrelationSeed) -> bool {
        self.running
            .as_ref()
            .is_some_and(|r| r.session.is_active() && r.session.seed() == seed)
    }

    // -- Simulation ---------------------------------------------------------

    /// Advances the running action by `dt` and expires stale pending events.
    pub fn tick(&mut self, dt: f32, ctx: &mut CombatContext<'_>) {
        self.pending.sweep(ctx.now);
        self.step(dt, ctx);
    }

    /// Stops the running action. Returns `false` if nothing was running.
    pub fn cancel(&mut self, now: f64) -> bool {
        let Some(mut running) = self.running.take() else {
            return false;
        };
        let seed = running.session.seed();
        running.session.cancel();
        self.history.remove(seed);
        self.pending.remove(seed);
        self.is_acting = false;
        self.last_action_end = now;
        self.cancelled_seed = Some(seed);
        tracing::debug!(actor = self.actor.0, seed, "attack cancelled");
        true
    }

    fn start_as_authority(
        &mut self,
        seed: CorrelationSeed,
        hand: Hand,
        ctx: &mut CombatContext<'_>,
    ) -> Result<(), StartRejected> {
        let tolerance = self.cfg.speed_hack_tolerance;
        if ctx.now - self.last_action_end < -f64::from(tolerance) {
            let err = StartRejected::TooEarly {
                now: ctx.now,
                last_action_end: self.last_action_end,
                tolerance,
            };
            tracing::warn!(actor = self.actor.0, seed, "{err}");
            return Err(err);
        }
        self.start(seed, hand, ctx);
        ctx.outbox.push(
            self.actor,
            CombatMessage::StartActionBroadcast(StartActionBroadcast { seed, hand }),
        );
        Ok(())
    }

    fn start(&mut self, seed: CorrelationSeed, hand: Hand, ctx: &mut CombatContext<'_>) {
        if let Some(mut previous) = self.running.take()
            && previous.session.cancel()
        {
            tracing::debug!(
                actor = self.actor.0,
                seed = previous.session.seed(),
                "attack superseded"
            );
        }

        self.cancelled_seed = None;
        let data = ctx.entity.attacking_data(hand);
        let variants = ctx.entity.animation_variants(data.kind, data.data_id);
        let animation_index = self.picker.pick(
            &self.cfg,
            ctx.now,
            self.last_action_end,
            data.data_id,
            variants,
            seed,
        );
        let (damage_info, damage) = ctx.entity.weapon_damage(data.weapon.as_ref());
        let session = ActionSession::new(SessionParams {
            seed,
            hand: data.hand,
            kind: data.kind,
            data_id: data.data_id,
            animation_index,
            speed_multiplier: ctx.entity.action_speed_rate(data.kind),
            started_at: ctx.now,
        });

        self.is_acting = true;
        self.move_speed_rate = data.move_speed_rate;
        self.movement_restriction = data.movement_restriction;
        self.last_action_end = session.last_action_end(&self.cfg);
        if self.role.is_authority() {
            ctx.entity.on_attack_started();
        }
        tracing::debug!(
            actor = self.actor.0,
            seed,
            role = ?self.role,
            animation_index,
            "attack started"
        );

        self.running = Some(RunningAction {
            session,
            data,
            damage_info,
            damage,
        });
        // A schedule that is already available is installed right away.
        self.step(0.0, ctx);
    }

    fn step(&mut self, dt: f32, ctx: &mut CombatContext<'_>) {
        let Some(running) = self.running.as_mut() else {
            return;
        };
        let events = running
            .session
            .advance(dt, ctx.resolver, self.actor, &self.cfg);
        for event in events {
            self.on_session_event(event, ctx);
        }
    }

    fn on_session_event(&mut self, event: SessionEvent, ctx: &mut CombatContext<'_>) {
        let Some(seed) = self.running.as_ref().map(|r| r.session.seed()) else {
            return;
        };
        match event {
            SessionEvent::ScheduleKnown {
                schedule_length,
                last_action_end,
                ..
            } => {
                self.last_action_end = last_action_end;
                if !self.history.begin(seed, schedule_length) {
                    tracing::trace!(actor = self.actor.0, seed, "history entry kept");
                }
                for pending in self.pending.take(seed) {
                    if let Advance::Applied { index } = self.history.try_advance(seed) {
                        self.replay_cue(index, &pending, ctx);
                    }
                }
            }
            SessionEvent::Cue { index } => {
                if self.role.applies_cues_locally() {
                    self.fire_cue(index, ctx);
                }
            }
            SessionEvent::CuesDone => {
                if let Some(running) = &self.running
                    && self.role.is_authority()
                    && running
                        .data
                        .weapon
                        .as_ref()
                        .is_some_and(|w| w.destroy_immediately_after_fired)
                {
                    ctx.entity.discard_weapon(running.data.hand);
                }
            }
            SessionEvent::Finished => {
                self.is_acting = false;
                self.running = None;
            }
        }
    }

    fn fire_cue(&mut self, index: usize, ctx: &mut CombatContext<'_>) {
        let Some(running) = &self.running else {
            return;
        };
        let seed = running.session.seed();
        let hand = running.session.hand();
        let weapon = running.data.weapon.as_ref();
        let aim = ctx.entity.aim_position();

        let overridden = ctx.entity.on_attack_cue(&CueInfo {
            hand,
            weapon,
            index,
            damage: &running.damage,
            aim,
        });
        if !overridden {
            let input = AttackInput {
                actor: self.actor,
                hand,
                weapon,
                damage_info: &running.damage_info,
                damage: &running.damage,
                aim,
                seed: ApplySeed::for_cue(seed, index),
            };
            apply_attack(self.role, &input, ctx.entity, ctx.launcher, ctx.validator);
        }

        if self.role.emits_triggers() {
            ctx.outbox.push(
                self.actor,
                CombatMessage::TriggerEvent(TriggerEvent {
                    seed,
                    is_secondary_hand: hand.is_secondary(),
                    is_skill_driven: overridden,
                    aim,
                }),
            );
        }
    }

    fn replay_cue(&self, index: usize, event: &TriggerEvent, ctx: &mut CombatContext<'_>) {
        if event.is_skill_driven {
            return;
        }
        let (hand, weapon) = ctx.entity.available_weapon(event.hand());
        let (damage_info, damage) = ctx.entity.weapon_damage(weapon.as_ref());
        let input = AttackInput {
            actor: self.actor,
            hand,
            weapon: weapon.as_ref(),
            damage_info: &damage_info,
            damage: &damage,
            aim: event.aim,
            seed: ApplySeed::for_cue(event.seed, index),
        };
        apply_attack(self.role, &input, ctx.entity, ctx.launcher, ctx.validator);
    }
}

#[cfg(test)]
#[path = "attack_tests.rs"]
mod tests;
