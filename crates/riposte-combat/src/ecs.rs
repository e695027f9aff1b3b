//! bevy_ecs integration.
//!
//! Each combat-capable entity carries a [`Combatant`]. External collaborators
//! shared by every actor live in the [`CombatServices`] resource. Transport
//! code fills [`CombatInbox`] and drains [`CombatOutbox`] around each run of
//! the [`combat_schedule`].

use std::collections::HashMap;

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::IntoSystemConfigs;

use crate::actor::CombatActor;
use crate::clock::SimTime;
use crate::context::CombatContext;
use crate::entity::CombatEntity;
use crate::hit::{DamageLauncher, HitValidator};
use crate::messages::{ActorMessage, CombatMessage, Outbox};
use crate::schedule::ScheduleResolver;
use crate::types::ActorId;

/// Combat state plus the character data it reads.
#[derive(Component)]
pub struct Combatant {
    /// Replicated combat state.
    pub actor: CombatActor,
    /// Character stats, equipment and hooks.
    pub entity: Box<dyn CombatEntity + Send + Sync>,
}

impl Combatant {
    pub fn new(actor: CombatActor, entity: impl CombatEntity + Send + Sync + 'static) -> Self {
        Self {
            actor,
            entity: Box::new(entity),
        }
    }
}

/// Collaborators shared by every combatant in a world.
#[derive(Resource)]
pub struct CombatServices {
    pub resolver: Box<dyn ScheduleResolver + Send + Sync>,
    pub launcher: Box<dyn DamageLauncher + Send + Sync>,
    pub validator: Box<dyn HitValidator + Send + Sync>,
}

/// Messages produced during the latest schedule run.
#[derive(Resource, Debug, Default)]
pub struct CombatOutbox(pub Outbox);

/// Messages received since the latest schedule run, in arrival order.
#[derive(Resource, Debug, Default)]
pub struct CombatInbox(pub Vec<ActorMessage>);

/// Delivers every inbox message to its combatant. Messages for unknown
/// actors are dropped.
pub fn deliver_inbound(
    time: Res<SimTime>,
    mut inbox: ResMut<CombatInbox>,
    mut services: ResMut<CombatServices>,
    mut outbox: ResMut<CombatOutbox>,
    mut combatants: Query<&mut Combatant>,
) {
    if inbox.0.is_empty() {
        return;
    }
    let mut by_actor: HashMap<ActorId, Vec<CombatMessage>> = HashMap::new();
    for envelope in inbox.0.drain(..) {
        by_actor
            .entry(envelope.actor)
            .or_default()
            .push(envelope.message);
    }

    let services = &mut *services;
    for mut combatant in &mut combatants {
        let combatant = &mut *combatant;
        let Some(messages) = by_actor.remove(&combatant.actor.id()) else {
            continue;
        };
        let mut ctx = CombatContext {
            now: time.now,
            entity: combatant.entity.as_mut(),
            resolver: services.resolver.as_mut(),
            launcher: services.launcher.as_mut(),
            validator: services.validator.as_mut(),
            outbox: &mut outbox.0,
        };
        for message in &messages {
            combatant.actor.handle(message, &mut ctx);
        }
    }

    for actor in by_actor.keys() {
        tracing::trace!(actor = actor.0, "combat message for unknown actor dropped");
    }
}

/// Advances every combatant by the tick length.
pub fn advance_combatants(
    time: Res<SimTime>,
    mut services: ResMut<CombatServices>,
    mut outbox: ResMut<CombatOutbox>,
    mut combatants: Query<&mut Combatant>,
) {
    let services = &mut *services;
    for mut combatant in &mut combatants {
        let combatant = &mut *combatant;
        let mut ctx = CombatContext {
            now: time.now,
            entity: combatant.entity.as_mut(),
            resolver: services.resolver.as_mut(),
            launcher: services.launcher.as_mut(),
            validator: services.validator.as_mut(),
            outbox: &mut outbox.0,
        };
        combatant.actor.tick(time.dt, &mut ctx);
    }
}

/// Inbound delivery followed by session advancement.
pub fn combat_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems((deliver_inbound, advance_combatants).chain());
    schedule
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::StartAction;
    use crate::role::ActorRole;
    use crate::schedule::{ActionTiming, StaticSchedules};
    use crate::test_support::{DT, MockEntity, RecordingLauncher, RecordingValidator};
    use crate::types::{ActionKind, Hand};
    use riposte_config::Config;

    fn world_with(role: ActorRole) -> World {
        let config = Config::default();
        let mut world = World::new();
        let timings = StaticSchedules::new().with(
            ActionKind::AttackPrimary,
            MockEntity::default().data_id,
            ActionTiming::new(vec![0.25, 0.25], 1.0),
        );
        world.insert_resource(CombatServices {
            resolver: Box::new(timings),
            launcher: Box::new(RecordingLauncher::default()),
            validator: Box::new(RecordingValidator::default()),
        });
        world.insert_resource(CombatOutbox::default());
        world.insert_resource(CombatInbox::default());
        world.insert_resource(SimTime::default());
        world.spawn(Combatant::new(
            CombatActor::new(ActorId(1), role, &config),
            MockEntity::default(),
        ));
        world
    }

    fn run_ticks(world: &mut World, schedule: &mut Schedule, ticks: usize) {
        for _ in 0..ticks {
            {
                let mut time = world.resource_mut::<SimTime>();
                time.dt = DT;
                time.now += f64::from(DT);
            }
            schedule.run(world);
        }
    }

    #[test]
    fn test_schedule_drives_proxy_session_to_completion() {
        let mut world = world_with(ActorRole::ServerProxy);
        let mut schedule = combat_schedule();

        world.resource_mut::<CombatInbox>().0.push(ActorMessage {
            actor: ActorId(1),
            message: CombatMessage::StartAction(StartAction {
                seed: 5,
                hand: Hand::Primary,
            }),
        });
        run_ticks(&mut world, &mut schedule, 1);
        assert!(world.resource::<CombatInbox>().0.is_empty());

        run_ticks(&mut world, &mut schedule, 100);
        let outbox = &world.resource::<CombatOutbox>().0;
        assert_eq!(outbox.triggers().count(), 2);

        let mut query = world.query::<&Combatant>();
        let combatant = query.single(&world);
        assert!(!combatant.actor.attack().is_acting());
    }

    #[test]
    fn test_messages_for_unknown_actors_are_dropped() {
        let mut world = world_with(ActorRole::ServerProxy);
        let mut schedule = combat_schedule();
        world.resource_mut::<CombatInbox>().0.push(ActorMessage {
            actor: ActorId(99),
            message: CombatMessage::StopCharge,
        });
        run_ticks(&mut world, &mut schedule, 1);
        assert!(world.resource::<CombatInbox>().0.is_empty());
        assert!(world.resource::<CombatOutbox>().0.is_empty());
    }
}
