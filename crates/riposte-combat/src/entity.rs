//! The character-side collaborator of the combat core.
//!
//! Character statistics, equipment and skills live outside this crate. The
//! core asks a [`CombatEntity`] for the data it needs to start, time and apply
//! an action, and tells it about the side effects it owns (buff callbacks,
//! ammo, discarding thrown weapons).

use crate::types::{
    ActionKind, AimPosition, DamageInfo, DamageMap, Hand, MovementRestriction, WeaponSnapshot,
};

/// Everything needed to start an attack with a hand.
#[derive(Debug, Clone, PartialEq)]
pub struct AttackingData {
    /// Hand that actually acts (the entity may redirect an empty hand).
    pub hand: Hand,
    /// Animation family.
    pub kind: ActionKind,
    /// Data id selecting the animation set (weapon type, monster id...).
    pub data_id: i32,
    /// Weapon held in `hand`, if any (monsters may attack bare).
    pub weapon: Option<WeaponSnapshot>,
    /// Move speed multiplier while the action runs.
    pub move_speed_rate: f32,
    /// Movement limits while the action runs.
    pub movement_restriction: MovementRestriction,
}

/// Everything needed to start charging with a hand.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeData {
    /// Hand that actually charges.
    pub hand: Hand,
    /// Hold time until the charged action is ready.
    pub duration: f32,
    /// Move speed multiplier while charging.
    pub move_speed_rate: f32,
    /// Movement limits while charging.
    pub movement_restriction: MovementRestriction,
}

/// Read-only description of a cue, handed to skill hooks.
#[derive(Debug, Clone, PartialEq)]
pub struct CueInfo<'a> {
    /// Acting hand.
    pub hand: Hand,
    /// Weapon in that hand.
    pub weapon: Option<&'a WeaponSnapshot>,
    /// Zero-based cue index.
    pub index: usize,
    /// Damage snapshot taken when the action started.
    pub damage: &'a DamageMap,
    /// Current aim.
    pub aim: AimPosition,
}

/// Character data and side effects consumed by the combat core.
pub trait CombatEntity {
    /// Weapon and animation data for an attack with `hand`.
    fn attacking_data(&self, hand: Hand) -> AttackingData;

    /// Weapon currently usable by `hand`, possibly redirected to the other hand.
    fn available_weapon(&self, hand: Hand) -> (Hand, Option<WeaponSnapshot>);

    /// Launch data and buffed damage amounts for `weapon`.
    fn weapon_damage(&self, weapon: Option<&WeaponSnapshot>) -> (DamageInfo, DamageMap);

    /// Current aim.
    fn aim_position(&self) -> AimPosition;

    /// Multiplier from attack-speed stats applied to animation playback.
    fn action_speed_rate(&self, _kind: ActionKind) -> f32 {
        1.0
    }

    /// Number of animation variants for `(kind, data_id)`.
    fn animation_variants(&self, _kind: ActionKind, _data_id: i32) -> u32 {
        1
    }

    /// Charge data for `hand`.
    fn charge_data(&self, hand: Hand) -> ChargeData {
        let (hand, weapon) = self.available_weapon(hand);
        ChargeData {
            hand,
            duration: weapon.map_or(0.0, |w| w.charge_duration),
            move_speed_rate: 1.0,
            movement_restriction: MovementRestriction::default(),
        }
    }

    /// Authority only: an attack started (buffs that react to attacking).
    fn on_attack_started(&mut self) {}

    /// Skill/buff hooks for a cue. Returning `true` replaces the default
    /// weapon attack for this cue.
    fn on_attack_cue(&mut self, _cue: &CueInfo<'_>) -> bool {
        false
    }

    /// Authority only: consume one round of ammo, returning bonus damage.
    fn consume_ammo(&mut self, _hand: Hand, _weapon: Option<&WeaponSnapshot>) -> Option<DamageMap> {
        None
    }

    /// Authority only: remove the weapon from `hand` after it was thrown.
    fn discard_weapon(&mut self, _hand: Hand) {}
}
