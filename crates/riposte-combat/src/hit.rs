//! Attack application and the hit-validation handoff.
//!
//! For each cue the core launches `fire_spread + 1` sub-shots, each with a
//! stagger vector drawn from the cue's deterministic stream. On a server
//! acting for a remote client's actor, the shot is first registered with the
//! [`HitValidator`] so client-reported hits can be checked against it.

use glam::{Vec2, Vec3};

use crate::entity::CombatEntity;
use crate::role::ActorRole;
use crate::seed::{ApplySeed, ShotStream};
use crate::types::{
    ActorId, AimPosition, DamageInfo, DamageMap, Hand, SkillRef, WeaponSnapshot, combine_damages,
};

// ---------------------------------------------------------------------------
// External interfaces
// ---------------------------------------------------------------------------

/// Opaque identifier of a hit box spawned by a launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HitBoxId(pub u64);

/// Hit boxes produced by one launch. Forwarded, never interpreted.
pub type HitBoxResults = Vec<HitBoxId>;

/// One sub-shot handed to the damage launcher.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchRequest<'a> {
    /// Attacking actor.
    pub actor: ActorId,
    /// Acting hand.
    pub hand: Hand,
    /// Weapon in that hand.
    pub weapon: Option<&'a WeaponSnapshot>,
    /// Launch data.
    pub damage_info: &'a DamageInfo,
    /// Damage amounts, ammo bonus included.
    pub damage: &'a DamageMap,
    /// Skill driving the launch, if any.
    pub skill: Option<SkillRef>,
    /// Level of `skill`.
    pub skill_level: u16,
    /// Cue seed the launch derives its own randomness from.
    pub seed: ApplySeed,
    /// Aim at the cue.
    pub aim: AimPosition,
    /// Sub-shot offset.
    pub stagger: Vec3,
}

/// Registration of a shot for later hit validation.
#[derive(Debug, Clone, PartialEq)]
pub struct HitValidationRequest<'a> {
    /// Launch data.
    pub damage_info: &'a DamageInfo,
    /// Cue seed.
    pub seed: ApplySeed,
    /// Extra sub-shots.
    pub fire_spread: u8,
    /// Attacking actor.
    pub actor: ActorId,
    /// Damage amounts.
    pub damage: &'a DamageMap,
    /// Weapon used.
    pub weapon: Option<&'a WeaponSnapshot>,
    /// Skill used, if any.
    pub skill: Option<SkillRef>,
    /// Level of `skill`.
    pub skill_level: u16,
}

/// Spawns damage-dealing hit boxes.
pub trait DamageLauncher {
    /// Launches one sub-shot.
    fn launch(&mut self, request: &LaunchRequest<'_>) -> HitBoxResults;
}

/// Authoritative hit registration.
pub trait HitValidator {
    /// Records a shot so later client-asserted hits can be reconciled.
    fn prepare(&mut self, request: &HitValidationRequest<'_>);
}

// ---------------------------------------------------------------------------
// Attack application
// ---------------------------------------------------------------------------

/// Inputs for one cue's attack.
#[derive(Debug, Clone)]
pub struct AttackInput<'a> {
    /// Attacking actor.
    pub actor: ActorId,
    /// Acting hand.
    pub hand: Hand,
    /// Weapon in that hand.
    pub weapon: Option<&'a WeaponSnapshot>,
    /// Launch data.
    pub damage_info: &'a DamageInfo,
    /// Damage snapshot.
    pub damage: &'a DamageMap,
    /// Aim at the cue.
    pub aim: AimPosition,
    /// Cue seed.
    pub seed: ApplySeed,
}

/// What one cue's attack did.
#[derive(Debug, Clone, PartialEq)]
pub struct AttackReport {
    /// Cue seed used.
    pub seed: ApplySeed,
    /// Stagger of each sub-shot, in launch order.
    pub staggers: Vec<Vec3>,
    /// Hit boxes from every launch.
    pub hit_boxes: HitBoxResults,
    /// Whether the shot was registered for validation.
    pub validated: bool,
}

/// Applies one cue's attack as `role` sees it.
pub fn apply_attack(
    role: ActorRole,
    input: &AttackInput<'_>,
    entity: &mut dyn CombatEntity,
    launcher: &mut dyn DamageLauncher,
    validator: &mut dyn HitValidator,
) -> AttackReport {
    let mut damage = input.damage.clone();
    if role.is_authority()
        && let Some(bonus) = entity.consume_ammo(input.hand, input.weapon)
    {
        damage = combine_damages(damage, &bonus);
    }

    let (fire_spread, fire_stagger) = input
        .weapon
        .map_or((0, Vec2::ZERO), |w| (w.fire_spread, w.fire_stagger));

    let validated = role.registers_hit_validation();
    if validated {
        validator.prepare(&HitValidationRequest {
            damage_info: input.damage_info,
            seed: input.seed,
            fire_spread,
            actor: input.actor,
            damage: &damage,
            weapon: input.weapon,
            skill: None,
            skill_level: 0,
        });
    }

    let mut stream = ShotStream::new(input.seed);
    let mut staggers = Vec::with_capacity(usize::from(fire_spread) + 1);
    let mut hit_boxes = HitBoxResults::new();
    for _ in 0..=fire_spread {
        let stagger = stream.next_stagger(fire_stagger);
        hit_boxes.extend(launcher.launch(&LaunchRequest {
            actor: input.actor,
            hand: input.hand,
            weapon: input.weapon,
            damage_info: input.damage_info,
            damage: &damage,
            skill: None,
            skill_level: 0,
            seed: input.seed,
            aim: input.aim,
            stagger,
        }));
        staggers.push(stagger);
    }

    tracing::trace!(
        actor = input.actor.0,
        seed = input.seed.0,
        shots = staggers.len(),
        validated,
        "applied attack"
    );

    AttackReport {
        seed: input.seed,
        staggers,
        hit_boxes,
        validated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::staggers_for_cue;
    use crate::test_support::{Call, CallLog, MockEntity, RecordingLauncher, RecordingValidator};
    use crate::types::MinMax;

    fn weapon(spread: u8) -> WeaponSnapshot {
        WeaponSnapshot {
            item_id: 11,
            fire_spread: spread,
            fire_stagger: Vec2::new(1.0, 0.5),
            ..WeaponSnapshot::default()
        }
    }

    fn run(
        role: ActorRole,
        entity: &mut MockEntity,
        spread: u8,
    ) -> (AttackReport, RecordingLauncher, RecordingValidator) {
        let log = CallLog::default();
        let mut launcher = RecordingLauncher::with_log(log.clone());
        let mut validator = RecordingValidator::with_log(log);
        let w = weapon(spread);
        let info = DamageInfo { data_id: 2 };
        let mut damage = DamageMap::new();
        damage.insert(1, MinMax { min: 4.0, max: 8.0 });
        let input = AttackInput {
            actor: ActorId(1),
            hand: Hand::Primary,
            weapon: Some(&w),
            damage_info: &info,
            damage: &damage,
            aim: AimPosition::default(),
            seed: ApplySeed::for_cue(5, 1),
        };
        let report = apply_attack(role, &input, entity, &mut launcher, &mut validator);
        (report, launcher, validator)
    }

    #[test]
    fn test_spread_launches_one_plus_spread_shots() {
        let mut entity = MockEntity::default();
        let (report, launcher, _) = run(ActorRole::Observer, &mut entity, 3);
        assert_eq!(launcher.launches.len(), 4);
        let expected = staggers_for_cue(ApplySeed::for_cue(5, 1), 3, Vec2::new(1.0, 0.5));
        assert_eq!(report.staggers, expected);
        assert_eq!(launcher.launches[2].stagger, report.staggers[2]);
    }

    #[test]
    fn test_validation_registered_before_launch_on_proxy_only() {
        for role in [ActorRole::OwnerClient, ActorRole::ServerOwned, ActorRole::Observer] {
            let mut entity = MockEntity::default();
            let (report, _, validator) = run(role, &mut entity, 0);
            assert!(!report.validated);
            assert!(validator.prepared.is_empty());
        }

        let mut entity = MockEntity::default();
        let (report, launcher, validator) = run(ActorRole::ServerProxy, &mut entity, 1);
        assert!(report.validated);
        assert_eq!(validator.prepared.len(), 1);
        assert_eq!(validator.prepared[0].fire_spread, 1);
        assert_eq!(validator.prepared[0].seed, ApplySeed::for_cue(5, 1));
        assert_eq!(launcher.launches.len(), 2);
        assert_eq!(launcher.log.calls(), vec![Call::Prepare, Call::Launch, Call::Launch]);
    }

    #[test]
    fn test_ammo_bonus_only_on_authority() {
        let mut entity = MockEntity::default();
        entity.ammo_bonus = Some(DamageMap::from([(1, MinMax { min: 1.0, max: 1.0 })]));

        let (_, launcher, _) = run(ActorRole::OwnerClient, &mut entity, 0);
        assert_eq!(launcher.launches[0].damage[&1].min, 4.0);
        assert_eq!(entity.ammo_consumed, 0);

        let (_, launcher, _) = run(ActorRole::ServerOwned, &mut entity, 0);
        assert_eq!(launcher.launches[0].damage[&1].min, 5.0);
        assert_eq!(entity.ammo_consumed, 1);
    }

    #[test]
    fn test_bare_handed_attack_launches_once() {
        let mut entity = MockEntity::default();
        let mut launcher = RecordingLauncher::default();
        let mut validator = RecordingValidator::default();
        let info = DamageInfo::default();
        let damage = DamageMap::new();
        let input = AttackInput {
            actor: ActorId(9),
            hand: Hand::Secondary,
            weapon: None,
            damage_info: &info,
            damage: &damage,
            aim: AimPosition::default(),
            seed: ApplySeed(0),
        };
        let report = apply_attack(
            ActorRole::ServerOwned,
            &input,
            &mut entity,
            &mut launcher,
            &mut validator,
        );
        assert_eq!(report.staggers, vec![Vec3::ZERO]);
        assert_eq!(launcher.launches.len(), 1);
    }
}
