//! Shared data records: actor identity, hands, weapon snapshots, damage maps,
//! and aim data.
//!
//! These are the values the combat core passes through to its external
//! collaborators. The core never interprets damage amounts; it only combines
//! them (ammo bonuses) and forwards them.

use std::collections::BTreeMap;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Network-wide identifier of an actor capable of attacking or charging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u64);

/// Which equipped slot performs an action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hand {
    /// Main hand.
    #[default]
    Primary,
    /// Off hand.
    Secondary,
}

impl Hand {
    /// Builds a hand from the wire's `is_secondary_hand` flag.
    pub fn from_secondary_flag(is_secondary: bool) -> Self {
        if is_secondary {
            Self::Secondary
        } else {
            Self::Primary
        }
    }

    /// Returns `true` for [`Hand::Secondary`].
    pub fn is_secondary(self) -> bool {
        self == Self::Secondary
    }
}

/// Animation/action family driving an action session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// Weapon attack with the primary hand.
    AttackPrimary,
    /// Weapon attack with the secondary hand.
    AttackSecondary,
}

impl ActionKind {
    /// The attack family for `hand`.
    pub fn attack(hand: Hand) -> Self {
        match hand {
            Hand::Primary => Self::AttackPrimary,
            Hand::Secondary => Self::AttackSecondary,
        }
    }
}

// ---------------------------------------------------------------------------
// Weapons and damage
// ---------------------------------------------------------------------------

/// Immutable view of the weapon an action was started with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponSnapshot {
    /// Item data id.
    pub item_id: i32,
    /// Extra sub-shots per cue (`fire_spread + 1` launches in total).
    pub fire_spread: u8,
    /// Half-extent of the random stagger applied to each sub-shot.
    pub fire_stagger: Vec2,
    /// Remove the weapon from its hand after the action's cues fired.
    pub destroy_immediately_after_fired: bool,
    /// Hold time before a charged action is ready.
    pub charge_duration: f32,
}

impl Default for WeaponSnapshot {
    fn default() -> Self {
        Self {
            item_id: 0,
            fire_spread: 0,
            fire_stagger: Vec2::ZERO,
            destroy_immediately_after_fired: false,
            charge_duration: 0.0,
        }
    }
}

/// Externally defined launch data (melee sweep, missile, raycast...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DamageInfo {
    /// Data id understood by the damage launcher.
    pub data_id: i32,
}

/// Skill data reference passed through to launch/validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SkillRef {
    /// Skill data id.
    pub data_id: i32,
}

/// Damage element identifier.
pub type DamageElementId = u32;

/// Inclusive damage range.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MinMax {
    /// Lower bound.
    pub min: f32,
    /// Upper bound.
    pub max: f32,
}

/// Damage amounts per element. Ordered so iteration is identical everywhere.
pub type DamageMap = BTreeMap<DamageElementId, MinMax>;

/// Sums `extra` into `base` element by element.
pub fn combine_damages(mut base: DamageMap, extra: &DamageMap) -> DamageMap {
    for (element, amount) in extra {
        let entry = base.entry(*element).or_default();
        entry.min += amount.min;
        entry.max += amount.max;
    }
    base
}

/// Movement limits while an action or charge is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MovementRestriction {
    /// Translation is frozen.
    pub freeze_position: bool,
    /// Facing is frozen.
    pub freeze_rotation: bool,
}

// ---------------------------------------------------------------------------
// Aim
// ---------------------------------------------------------------------------

/// Where an actor was aiming when a cue fired.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AimPosition {
    /// Launch origin.
    pub position: Vec3,
    /// Normalized aim direction (zero when aiming at a point).
    pub direction: Vec3,
}
