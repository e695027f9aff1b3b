//! One simulated participant: an ECS world running the combat schedule.

use bevy_ecs::prelude::*;
use riposte_combat::{
    ActorId, ActorMessage, ActorRole, CombatActor, CombatContext, CombatInbox, CombatOutbox,
    CombatServices, Combatant, Outgoing, SimTime, combat_schedule,
};
use riposte_config::Config;

use crate::network::PeerId;
use crate::services::{LoadingResolver, SimEntity, Tally, TallyLauncher, TallyValidator};

/// A server or client with its own copy of every actor.
pub struct Peer {
    id: PeerId,
    name: &'static str,
    is_server: bool,
    world: World,
    schedule: Schedule,
    config: Config,
    launches: Tally,
    validations: Tally,
}

impl Peer {
    pub fn new(
        id: PeerId,
        name: &'static str,
        is_server: bool,
        config: &Config,
        resolver: LoadingResolver,
    ) -> Self {
        let launches = Tally::default();
        let validations = Tally::default();

        let mut world = World::new();
        world.insert_resource(SimTime::default());
        world.insert_resource(CombatInbox::default());
        world.insert_resource(CombatOutbox::default());
        world.insert_resource(CombatServices {
            resolver: Box::new(resolver),
            launcher: Box::new(TallyLauncher::new(name, launches.clone())),
            validator: Box::new(TallyValidator::new(validations.clone())),
        });

        Self {
            id,
            name,
            is_server,
            world,
            schedule: combat_schedule(),
            config: config.clone(),
            launches,
            validations,
        }
    }

    pub fn id(&self) -> PeerId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_server(&self) -> bool {
        self.is_server
    }

    /// Sub-shots launched per actor on this peer.
    pub fn launches(&self) -> &Tally {
        &self.launches
    }

    /// Shots registered for hit validation per actor on this peer.
    pub fn validations(&self) -> &Tally {
        &self.validations
    }

    /// Spawns a local copy of `actor`, resolving this peer's role for it.
    pub fn register(&mut self, actor: ActorId, owner: PeerId, owner_is_server: bool, entity: SimEntity) {
        let role = ActorRole::resolve(self.is_server, owner == self.id, owner_is_server);
        tracing::debug!(peer = self.name, actor = actor.0, ?role, "actor registered");
        self.world.spawn(Combatant::new(
            CombatActor::new(actor, role, &self.config),
            entity,
        ));
    }

    /// Runs `f` against a local actor with a context built from this peer's
    /// services. Returns `None` when the actor is not registered here.
    pub fn act<R>(
        &mut self,
        actor: ActorId,
        f: impl FnOnce(&mut CombatActor, &mut CombatContext<'_>) -> R,
    ) -> Option<R> {
        let now = self.world.resource::<SimTime>().now;
        self.world
            .resource_scope(|world, mut services: Mut<CombatServices>| {
                world.resource_scope(|world, mut outbox: Mut<CombatOutbox>| {
                    let mut query = world.query::<&mut Combatant>();
                    let mut combatant = query.iter_mut(world).find(|c| c.actor.id() == actor)?;
                    let combatant = &mut *combatant;
                    let services = &mut *services;
                    let mut ctx = CombatContext {
                        now,
                        entity: combatant.entity.as_mut(),
                        resolver: services.resolver.as_mut(),
                        launcher: services.launcher.as_mut(),
                        validator: services.validator.as_mut(),
                        outbox: &mut outbox.0,
                    };
                    Some(f(&mut combatant.actor, &mut ctx))
                })
            })
    }

    /// Reads a local actor.
    pub fn inspect<R>(&mut self, actor: ActorId, f: impl FnOnce(&CombatActor) -> R) -> Option<R> {
        let mut query = self.world.query::<&Combatant>();
        query
            .iter(&self.world)
            .find(|c| c.actor.id() == actor)
            .map(|c| f(&c.actor))
    }

    /// Whether any local actor is still running an action.
    pub fn is_busy(&mut self) -> bool {
        let mut query = self.world.query::<&Combatant>();
        query.iter(&self.world).any(|c| c.actor.attack().is_acting())
    }

    /// Publishes the clock, delivers `inbound` and runs the combat schedule.
    /// Returns every message produced since the previous tick.
    pub fn run_tick(&mut self, time: SimTime, inbound: Vec<ActorMessage>) -> Vec<Outgoing> {
        *self.world.resource_mut::<SimTime>() = time;
        self.world.resource_mut::<CombatInbox>().0.extend(inbound);
        self.schedule.run(&mut self.world);
        self.world.resource_mut::<CombatOutbox>().0.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{SWORD_DATA_ID, sword_timing};
    use glam::Vec3;
    use riposte_combat::Hand;

    fn peer(id: u8, is_server: bool) -> Peer {
        Peer::new(
            PeerId(id),
            "test",
            is_server,
            &Config::default(),
            LoadingResolver::new(0).with(SWORD_DATA_ID, sword_timing()),
        )
    }

    #[test]
    fn test_register_resolves_roles() {
        let mut server = peer(0, true);
        server.register(ActorId(1), PeerId(1), false, SimEntity::swordsman(Vec3::ZERO));
        server.register(ActorId(2), PeerId(0), true, SimEntity::monster(Vec3::ZERO));
        assert_eq!(server.inspect(ActorId(1), |a| a.role()), Some(ActorRole::ServerProxy));
        assert_eq!(server.inspect(ActorId(2), |a| a.role()), Some(ActorRole::ServerOwned));

        let mut client = peer(1, false);
        client.register(ActorId(1), PeerId(1), false, SimEntity::swordsman(Vec3::ZERO));
        client.register(ActorId(2), PeerId(0), true, SimEntity::monster(Vec3::ZERO));
        assert_eq!(client.inspect(ActorId(1), |a| a.role()), Some(ActorRole::OwnerClient));
        assert_eq!(client.inspect(ActorId(2), |a| a.role()), Some(ActorRole::Observer));
        assert!(client.inspect(ActorId(9), |a| a.role()).is_none());
    }

    #[test]
    fn test_owner_attack_sends_start_and_predicts_locally() {
        let mut client = peer(1, false);
        client.register(ActorId(1), PeerId(1), false, SimEntity::swordsman(Vec3::ZERO));

        let started = client.act(ActorId(1), |actor, ctx| {
            actor.attack_mut().attack_with_seed(7, Hand::Primary, ctx)
        });
        assert!(matches!(started, Some(Ok(_))));
        assert!(client.is_busy());

        let time = SimTime { now: 1.0 / 60.0, dt: 1.0 / 60.0 };
        let sent = client.run_tick(time, Vec::new());
        assert_eq!(sent.len(), 1);

        for i in 2..120 {
            let now = f64::from(i) / 60.0;
            client.run_tick(SimTime { now, dt: 1.0 / 60.0 }, Vec::new());
        }
        assert!(!client.is_busy());
        // Two cues, three sub-shots each.
        assert_eq!(client.launches().get(ActorId(1)), 6);
        assert_eq!(client.validations().get(ActorId(1)), 0);
    }
}
