//! Shared mocks for unit tests.

use std::sync::{Arc, Mutex};

use glam::Vec3;
use riposte_config::Config;

use crate::context::CombatContext;
use crate::entity::{AttackingData, CombatEntity, CueInfo};
use crate::hit::{
    DamageLauncher, HitBoxId, HitBoxResults, HitValidationRequest, HitValidator, LaunchRequest,
};
use crate::messages::Outbox;
use crate::schedule::{ActionTiming, ScheduleKey, ScheduleResolver};
use crate::seed::ApplySeed;
use crate::types::{
    ActionKind, ActorId, AimPosition, DamageInfo, DamageMap, Hand, MinMax, MovementRestriction,
    WeaponSnapshot,
};

/// Tick length that keeps every timing in the tests exact in `f32`.
pub const DT: f32 = 1.0 / 64.0;

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Answers with one timing after a number of misses.
#[derive(Debug, Clone)]
pub struct ScriptedResolver {
    timing: Option<ActionTiming>,
    misses: usize,
    /// Total polls so far.
    pub polls: usize,
}

impl ScriptedResolver {
    pub fn immediate(timing: ActionTiming) -> Self {
        Self::after(0, timing)
    }

    /// Misses the first `misses` polls.
    pub fn after(misses: usize, timing: ActionTiming) -> Self {
        Self {
            timing: Some(timing),
            misses,
            polls: 0,
        }
    }

    pub fn never() -> Self {
        Self {
            timing: None,
            misses: 0,
            polls: 0,
        }
    }
}

impl ScheduleResolver for ScriptedResolver {
    fn poll_timing(&mut self, _actor: ActorId, _key: &ScheduleKey) -> Option<ActionTiming> {
        self.polls += 1;
        if self.polls > self.misses {
            self.timing.clone()
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Launcher and validator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Prepare,
    Launch,
}

/// Call order shared between a launcher and a validator.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    fn push(&self, call: Call) {
        if let Ok(mut calls) = self.0.lock() {
            calls.push(call);
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LaunchRecord {
    pub actor: ActorId,
    pub hand: Hand,
    pub seed: ApplySeed,
    pub stagger: Vec3,
    pub damage: DamageMap,
    pub aim: AimPosition,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingLauncher {
    pub launches: Vec<LaunchRecord>,
    pub log: CallLog,
    next_id: u64,
}

impl RecordingLauncher {
    pub fn with_log(log: CallLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    /// Apply seeds of every launch, in order.
    pub fn seeds(&self) -> Vec<ApplySeed> {
        self.launches.iter().map(|l| l.seed).collect()
    }
}

impl DamageLauncher for RecordingLauncher {
    fn launch(&mut self, request: &LaunchRequest<'_>) -> HitBoxResults {
        self.log.push(Call::Launch);
        self.launches.push(LaunchRecord {
            actor: request.actor,
            hand: request.hand,
            seed: request.seed,
            stagger: request.stagger,
            damage: request.damage.clone(),
            aim: request.aim,
        });
        self.next_id += 1;
        vec![HitBoxId(self.next_id)]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrepareRecord {
    pub actor: ActorId,
    pub seed: ApplySeed,
    pub fire_spread: u8,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingValidator {
    pub prepared: Vec<PrepareRecord>,
    pub log: CallLog,
}

impl RecordingValidator {
    pub fn with_log(log: CallLog) -> Self {
        Self {
            prepared: Vec::new(),
            log,
        }
    }
}

impl HitValidator for RecordingValidator {
    fn prepare(&mut self, request: &HitValidationRequest<'_>) {
        self.log.push(Call::Prepare);
        self.prepared.push(PrepareRecord {
            actor: request.actor,
            seed: request.seed,
            fire_spread: request.fire_spread,
        });
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct MockEntity {
    pub weapon: Option<WeaponSnapshot>,
    pub data_id: i32,
    pub speed: f32,
    pub variants: u32,
    pub aim: AimPosition,
    pub damage: DamageMap,
    pub ammo_bonus: Option<DamageMap>,
    pub ammo_consumed: usize,
    pub attacks_started: usize,
    /// Cue indices for which a skill replaces the weapon attack.
    pub skill_cues: Vec<usize>,
    pub cues_seen: Vec<usize>,
    pub discarded: Vec<Hand>,
}

impl Default for MockEntity {
    fn default() -> Self {
        Self {
            weapon: Some(WeaponSnapshot::default()),
            data_id: 3,
            speed: 1.0,
            variants: 1,
            aim: AimPosition::default(),
            damage: DamageMap::from([(1, MinMax { min: 4.0, max: 8.0 })]),
            ammo_bonus: None,
            ammo_consumed: 0,
            attacks_started: 0,
            skill_cues: Vec::new(),
            cues_seen: Vec::new(),
            discarded: Vec::new(),
        }
    }
}

impl CombatEntity for MockEntity {
    fn attacking_data(&self, hand: Hand) -> AttackingData {
        AttackingData {
            hand,
            kind: ActionKind::attack(hand),
            data_id: self.data_id,
            weapon: self.weapon.clone(),
            move_speed_rate: 0.5,
            movement_restriction: MovementRestriction::default(),
        }
    }

    fn available_weapon(&self, hand: Hand) -> (Hand, Option<WeaponSnapshot>) {
        (hand, self.weapon.clone())
    }

    fn weapon_damage(&self, weapon: Option<&WeaponSnapshot>) -> (DamageInfo, DamageMap) {
        let info = DamageInfo {
            data_id: weapon.map_or(0, |w| w.item_id),
        };
        (info, self.damage.clone())
    }

    fn aim_position(&self) -> AimPosition {
        self.aim
    }

    fn action_speed_rate(&self, _kind: ActionKind) -> f32 {
        self.speed
    }

    fn animation_variants(&self, _kind: ActionKind, _data_id: i32) -> u32 {
        self.variants
    }

    fn on_attack_started(&mut self) {
        self.attacks_started += 1;
    }

    fn on_attack_cue(&mut self, cue: &CueInfo<'_>) -> bool {
        self.cues_seen.push(cue.index);
        self.skill_cues.contains(&cue.index)
    }

    fn consume_ammo(&mut self, _hand: Hand, _weapon: Option<&WeaponSnapshot>) -> Option<DamageMap> {
        self.ammo_consumed += 1;
        self.ammo_bonus.clone()
    }

    fn discard_weapon(&mut self, hand: Hand) {
        self.discarded.push(hand);
        self.weapon = None;
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// One participant's collaborators for a single actor.
pub struct Harness {
    pub now: f64,
    pub config: Config,
    pub entity: MockEntity,
    pub resolver: ScriptedResolver,
    pub launcher: RecordingLauncher,
    pub validator: RecordingValidator,
    pub outbox: Outbox,
}

impl Harness {
    pub fn new(resolver: ScriptedResolver) -> Self {
        Self {
            now: 0.0,
            config: Config::default(),
            entity: MockEntity::default(),
            resolver,
            launcher: RecordingLauncher::default(),
            validator: RecordingValidator::default(),
            outbox: Outbox::new(),
        }
    }

    pub fn ctx(&mut self) -> CombatContext<'_> {
        CombatContext {
            now: self.now,
            entity: &mut self.entity,
            resolver: &mut self.resolver,
            launcher: &mut self.launcher,
            validator: &mut self.validator,
            outbox: &mut self.outbox,
        }
    }

    /// Moves the clock forward one [`DT`] and returns the new time.
    pub fn advance_clock(&mut self) -> f64 {
        self.now += f64::from(DT);
        self.now
    }
}
