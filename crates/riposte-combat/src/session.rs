//! The per-action timing state machine.
//!
//! An [`ActionSession`] owns nothing but timing. It is advanced by simulation
//! `dt`, asks the [`ScheduleResolver`] for its schedule, substitutes the
//! fallback when that takes too long, and reports what happened during the
//! step as a list of [`SessionEvent`]s. The attack component turns those
//! events into attacks and wire messages.
//!
//! ```text
//! Starting ─► AwaitingSchedule ─► Triggering(0..n) ─► Finishing ─► Completed
//!     └─────────────┴─────────────────┴──────────────────┴──────► Cancelled
//! ```

use riposte_config::CombatConfig;

use crate::schedule::{ActionTiming, ScheduleKey, ScheduleResolver, fallback_timing};
use crate::seed::CorrelationSeed;
use crate::types::{ActionKind, ActorId, Hand};

/// Lowest effective playback speed. Keeps waits finite.
pub const MIN_SPEED_RATE: f32 = 0.01;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionPhase {
    /// Created, schedule not polled yet.
    Starting,
    /// Polling the resolver.
    AwaitingSchedule {
        /// Simulation seconds spent polling.
        waited: f32,
    },
    /// Waiting for cue `index`.
    Triggering {
        /// Zero-based cue index.
        index: usize,
        /// Simulation seconds until the cue fires.
        wait_left: f32,
    },
    /// Playing out the tail of the animation.
    Finishing {
        /// Simulation seconds until completion.
        wait_left: f32,
    },
    /// Ran to completion.
    Completed,
    /// Stopped early.
    Cancelled,
}

impl SessionPhase {
    /// Returns `true` for [`Completed`](Self::Completed) and
    /// [`Cancelled`](Self::Cancelled).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Something that happened while advancing a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEvent {
    /// The cue schedule is known from now on.
    ScheduleKnown {
        /// Number of cues.
        schedule_length: usize,
        /// Updated end time of the action.
        last_action_end: f64,
        /// The fallback schedule was substituted.
        fallback: bool,
    },
    /// Cue `index` is due.
    Cue {
        /// Zero-based cue index.
        index: usize,
    },
    /// No more cues will fire.
    CuesDone,
    /// The action ended normally.
    Finished,
}

/// Identity and static parameters of one action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionParams {
    /// Correlation seed.
    pub seed: CorrelationSeed,
    /// Acting hand.
    pub hand: Hand,
    /// Animation family.
    pub kind: ActionKind,
    /// Animation set.
    pub data_id: i32,
    /// Animation variant.
    pub animation_index: u32,
    /// Attack-speed multiplier from the entity.
    pub speed_multiplier: f32,
    /// Simulation time the action started.
    pub started_at: f64,
}

/// One running action.
#[derive(Debug, Clone)]
pub struct ActionSession {
    params: SessionParams,
    phase: SessionPhase,
    trigger_offsets: Vec<f32>,
    total_duration: Option<f32>,
    speed_rate: f32,
    remaining: f32,
    cues_fired: usize,
    fallback: bool,
}

impl ActionSession {
    /// Creates a session in [`SessionPhase::Starting`].
    pub fn new(params: SessionParams) -> Self {
        Self {
            speed_rate: params.speed_multiplier.max(MIN_SPEED_RATE),
            params,
            phase: SessionPhase::Starting,
            trigger_offsets: Vec::new(),
            total_duration: None,
            remaining: 0.0,
            cues_fired: 0,
            fallback: false,
        }
    }

    /// Static parameters.
    pub fn params(&self) -> &SessionParams {
        &self.params
    }

    /// Correlation seed.
    pub fn seed(&self) -> CorrelationSeed {
        self.params.seed
    }

    /// Acting hand.
    pub fn hand(&self) -> Hand {
        self.params.hand
    }

    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Returns `true` until the session completes or is cancelled.
    pub fn is_active(&self) -> bool {
        !self.phase.is_terminal()
    }

    /// Cue offsets, empty until resolved.
    pub fn trigger_offsets(&self) -> &[f32] {
        &self.trigger_offsets
    }

    /// Action length at speed 1, `None` until resolved.
    pub fn total_duration(&self) -> Option<f32> {
        self.total_duration
    }

    /// Effective playback speed.
    pub fn speed_rate(&self) -> f32 {
        self.speed_rate
    }

    /// Cues reported so far.
    pub fn cues_fired(&self) -> usize {
        self.cues_fired
    }

    /// The fallback schedule was substituted.
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    /// When the action is expected to end. The default duration is never
    /// scaled by speed, whether the timing is still unknown or was replaced
    /// by the fallback.
    pub fn last_action_end(&self, cfg: &CombatConfig) -> f64 {
        let started = self.params.started_at;
        match self.total_duration {
            Some(total) if !self.fallback => started + f64::from(total / self.speed_rate),
            Some(total) => started + f64::from(total),
            None => started + f64::from(cfg.default_total_duration),
        }
    }

    fn key(&self) -> ScheduleKey {
        ScheduleKey {
            kind: self.params.kind,
            data_id: self.params.data_id,
            animation_index: self.params.animation_index,
        }
    }

    /// Stops the session. Returns `false` if it had already ended.
    pub fn cancel(&mut self) -> bool {
        if self.phase.is_terminal() {
            return false;
        }
        self.phase = SessionPhase::Cancelled;
        true
    }

    /// Advances by `dt` simulation seconds and reports what happened.
    ///
    /// A fresh session first polls the resolver without consuming time, so a
    /// timing that is already available is known in the step the session
    /// starts. Call with `dt = 0.0` right after creation to get that.
    pub fn advance(
        &mut self,
        dt: f32,
        resolver: &mut dyn ScheduleResolver,
        actor: ActorId,
        cfg: &CombatConfig,
    ) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        let mut budget = dt.max(0.0);
        loop {
            match self.phase {
                SessionPhase::Starting => {
                    if !self.poll(resolver, actor, cfg, &mut events) {
                        if cfg.state_setup_delay <= 0.0 {
                            self.use_fallback(cfg, &mut events);
                        } else {
                            self.phase = SessionPhase::AwaitingSchedule { waited: 0.0 };
                        }
                    }
                }
                SessionPhase::AwaitingSchedule { waited } => {
                    if budget <= 0.0 {
                        break;
                    }
                    let step = budget.min(cfg.state_setup_delay - waited);
                    budget -= step;
                    let waited = waited + step;
                    self.phase = SessionPhase::AwaitingSchedule { waited };
                    if self.poll(resolver, actor, cfg, &mut events) {
                        continue;
                    }
                    if waited >= cfg.state_setup_delay {
                        self.use_fallback(cfg, &mut events);
                        continue;
                    }
                    break;
                }
                SessionPhase::Triggering { index, wait_left } => {
                    let wait_left = consume(&mut budget, wait_left);
                    if wait_left > 0.0 {
                        self.phase = SessionPhase::Triggering { index, wait_left };
                        break;
                    }
                    self.cues_fired += 1;
                    events.push(SessionEvent::Cue { index });
                    let next = index + 1;
                    if self.remaining <= 0.0 || next >= self.trigger_offsets.len() {
                        self.enter_finishing(&mut events);
                    } else {
                        self.enter_triggering(next);
                    }
                }
                SessionPhase::Finishing { wait_left } => {
                    let wait_left = consume(&mut budget, wait_left);
                    if wait_left > 0.0 {
                        self.phase = SessionPhase::Finishing { wait_left };
                        break;
                    }
                    self.phase = SessionPhase::Completed;
                    events.push(SessionEvent::Finished);
                }
                SessionPhase::Completed | SessionPhase::Cancelled => break,
            }
        }
        events
    }

    /// Polls the resolver once. Returns `true` if the schedule became known.
    fn poll(
        &mut self,
        resolver: &mut dyn ScheduleResolver,
        actor: ActorId,
        cfg: &CombatConfig,
        events: &mut Vec<SessionEvent>,
    ) -> bool {
        let Some(timing) = resolver.poll_timing(actor, &self.key()) else {
            return false;
        };
        if !timing.is_resolved() {
            return false;
        }
        let ActionTiming {
            trigger_offsets,
            total_duration,
            speed_rate,
        } = timing;
        self.speed_rate = (speed_rate * self.params.speed_multiplier).max(MIN_SPEED_RATE);
        self.remaining = total_duration;
        self.install(trigger_offsets, total_duration, false, cfg, events);
        true
    }

    fn use_fallback(&mut self, cfg: &CombatConfig, events: &mut Vec<SessionEvent>) {
        let fallback = fallback_timing(cfg);
        tracing::debug!(
            seed = self.params.seed,
            data_id = self.params.data_id,
            "action timing unavailable, using fallback schedule"
        );
        self.remaining = fallback.remaining;
        self.install(
            fallback.trigger_offsets,
            fallback.total_duration,
            true,
            cfg,
            events,
        );
    }

    fn install(
        &mut self,
        trigger_offsets: Vec<f32>,
        total_duration: f32,
        fallback: bool,
        cfg: &CombatConfig,
        events: &mut Vec<SessionEvent>,
    ) {
        self.trigger_offsets = trigger_offsets;
        self.total_duration = Some(total_duration);
        self.fallback = fallback;
        events.push(SessionEvent::ScheduleKnown {
            schedule_length: self.trigger_offsets.len(),
            last_action_end: self.last_action_end(cfg),
            fallback,
        });
        if self.trigger_offsets.is_empty() {
            self.enter_finishing(events);
        } else {
            self.enter_triggering(0);
        }
    }

    fn enter_triggering(&mut self, index: usize) {
        let offset = self.trigger_offsets[index];
        self.remaining -= offset;
        self.phase = SessionPhase::Triggering {
            index,
            wait_left: offset / self.speed_rate,
        };
    }

    fn enter_finishing(&mut self, events: &mut Vec<SessionEvent>) {
        events.push(SessionEvent::CuesDone);
        self.phase = SessionPhase::Finishing {
            wait_left: self.remaining.max(0.0) / self.speed_rate,
        };
    }
}

/// Takes up to `wait` from `budget`, returning what is left to wait.
fn consume(budget: &mut f32, wait: f32) -> f32 {
    let step = budget.min(wait.max(0.0));
    *budget -= step;
    wait - step
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
