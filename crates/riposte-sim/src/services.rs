//! Stand-ins for the game-side collaborators of the combat core.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use glam::{Vec2, Vec3};
use riposte_combat::{
    ActionKind, ActionTiming, ActorId, AimPosition, AttackingData, CombatEntity, DamageInfo,
    DamageLauncher, DamageMap, Hand, HitBoxId, HitBoxResults, HitValidationRequest, HitValidator,
    LaunchRequest, MinMax, MovementRestriction, ScheduleKey, ScheduleResolver, WeaponSnapshot,
};

/// Animation set of the player's sword.
pub const SWORD_DATA_ID: i32 = 10;
/// Animation set of the monster's claw swipe.
pub const CLAW_DATA_ID: i32 = 100;

/// Sub-shot timings known to the game data.
pub fn sword_timing() -> ActionTiming {
    ActionTiming::new(vec![0.2, 0.2], 0.8)
}

pub fn claw_timing() -> ActionTiming {
    ActionTiming::new(vec![0.3, 0.3, 0.3], 1.2)
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A character with one weapon, or a bare-handed monster.
#[derive(Debug, Clone)]
pub struct SimEntity {
    data_id: i32,
    weapon: Option<WeaponSnapshot>,
    position: Vec3,
}

impl SimEntity {
    pub fn swordsman(position: Vec3) -> Self {
        Self {
            data_id: SWORD_DATA_ID,
            weapon: Some(WeaponSnapshot {
                item_id: 501,
                fire_spread: 2,
                fire_stagger: Vec2::new(0.5, 0.25),
                destroy_immediately_after_fired: false,
                charge_duration: 0.25,
            }),
            position,
        }
    }

    pub fn monster(position: Vec3) -> Self {
        Self {
            data_id: CLAW_DATA_ID,
            weapon: None,
            position,
        }
    }
}

impl CombatEntity for SimEntity {
    fn attacking_data(&self, hand: Hand) -> AttackingData {
        AttackingData {
            hand,
            kind: ActionKind::attack(hand),
            data_id: self.data_id,
            weapon: self.weapon.clone(),
            move_speed_rate: 0.6,
            movement_restriction: MovementRestriction {
                freeze_position: false,
                freeze_rotation: true,
            },
        }
    }

    fn available_weapon(&self, _hand: Hand) -> (Hand, Option<WeaponSnapshot>) {
        (Hand::Primary, self.weapon.clone())
    }

    fn weapon_damage(&self, weapon: Option<&WeaponSnapshot>) -> (DamageInfo, DamageMap) {
        let base = if weapon.is_some() { 12.0 } else { 20.0 };
        (
            DamageInfo {
                data_id: weapon.map_or(0, |w| w.item_id),
            },
            DamageMap::from([(0, MinMax { min: base, max: base * 1.5 })]),
        )
    }

    fn aim_position(&self) -> AimPosition {
        AimPosition {
            position: self.position,
            direction: Vec3::Z,
        }
    }

    fn animation_variants(&self, _kind: ActionKind, _data_id: i32) -> u32 {
        3
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Timing table whose entries become available after a load delay.
///
/// Each `(actor, key)` pair is counted separately, as if every animation
/// clip were loaded on first use.
#[derive(Debug, Clone, Default)]
pub struct LoadingResolver {
    table: HashMap<i32, ActionTiming>,
    load_polls: usize,
    polls: HashMap<(ActorId, ScheduleKey), usize>,
}

impl LoadingResolver {
    /// Answers after `load_polls` misses per key.
    pub fn new(load_polls: usize) -> Self {
        Self {
            load_polls,
            ..Self::default()
        }
    }

    pub fn with(mut self, data_id: i32, timing: ActionTiming) -> Self {
        self.table.insert(data_id, timing);
        self
    }
}

impl ScheduleResolver for LoadingResolver {
    fn poll_timing(&mut self, actor: ActorId, key: &ScheduleKey) -> Option<ActionTiming> {
        let polls = self.polls.entry((actor, *key)).or_insert(0);
        *polls += 1;
        if *polls <= self.load_polls {
            return None;
        }
        self.table.get(&key.data_id).cloned()
    }
}

// ---------------------------------------------------------------------------
// Launcher and validator
// ---------------------------------------------------------------------------

/// Per-actor counters shared with the report.
#[derive(Debug, Clone, Default)]
pub struct Tally(Arc<Mutex<BTreeMap<ActorId, usize>>>);

impl Tally {
    fn bump(&self, actor: ActorId) {
        if let Ok(mut counts) = self.0.lock() {
            *counts.entry(actor).or_insert(0) += 1;
        }
    }

    pub fn get(&self, actor: ActorId) -> usize {
        self.0
            .lock()
            .map(|c| c.get(&actor).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn snapshot(&self) -> BTreeMap<ActorId, usize> {
        self.0.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

/// Counts launched sub-shots per actor.
#[derive(Debug, Clone)]
pub struct TallyLauncher {
    peer: &'static str,
    tally: Tally,
    next_hit_box: u64,
}

impl TallyLauncher {
    pub fn new(peer: &'static str, tally: Tally) -> Self {
        Self {
            peer,
            tally,
            next_hit_box: 0,
        }
    }
}

impl DamageLauncher for TallyLauncher {
    fn launch(&mut self, request: &LaunchRequest<'_>) -> HitBoxResults {
        self.tally.bump(request.actor);
        self.next_hit_box += 1;
        tracing::trace!(
            peer = self.peer,
            actor = request.actor.0,
            seed = request.seed.0,
            x = request.stagger.x,
            y = request.stagger.y,
            "launch"
        );
        vec![HitBoxId(self.next_hit_box)]
    }
}

/// Counts shots registered for hit validation per actor.
#[derive(Debug, Clone, Default)]
pub struct TallyValidator {
    tally: Tally,
}

impl TallyValidator {
    pub fn new(tally: Tally) -> Self {
        Self { tally }
    }
}

impl HitValidator for TallyValidator {
    fn prepare(&mut self, request: &HitValidationRequest<'_>) {
        self.tally.bump(request.actor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loading_resolver_counts_per_key() {
        let mut resolver = LoadingResolver::new(2).with(SWORD_DATA_ID, sword_timing());
        let key = ScheduleKey {
            kind: ActionKind::AttackPrimary,
            data_id: SWORD_DATA_ID,
            animation_index: 0,
        };
        assert!(resolver.poll_timing(ActorId(1), &key).is_none());
        assert!(resolver.poll_timing(ActorId(1), &key).is_none());
        assert!(resolver.poll_timing(ActorId(1), &key).is_some());
        // Another actor loads its own clip.
        assert!(resolver.poll_timing(ActorId(2), &key).is_none());

        let unknown = ScheduleKey {
            data_id: CLAW_DATA_ID,
            ..key
        };
        for _ in 0..5 {
            assert!(resolver.poll_timing(ActorId(1), &unknown).is_none());
        }
    }

    #[test]
    fn test_tally_is_shared_between_clones() {
        let tally = Tally::default();
        let mut validator = TallyValidator::new(tally.clone());
        let info = DamageInfo::default();
        let damage = DamageMap::new();
        validator.prepare(&HitValidationRequest {
            damage_info: &info,
            seed: riposte_combat::ApplySeed(1),
            fire_spread: 0,
            actor: ActorId(4),
            damage: &damage,
            weapon: None,
            skill: None,
            skill_level: 0,
        });
        assert_eq!(tally.get(ActorId(4)), 1);
        assert_eq!(tally.snapshot().len(), 1);
    }
}
