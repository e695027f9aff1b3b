//! Loopback duel: one server, the swordsman's owning client and a bystander.
//!
//! The swordsman (owned by client 1) charges briefly and attacks at a fixed
//! cadence. The server runs a monster that swipes on its own. The bystander
//! never loaded the monster's animation data, so its sessions for the
//! monster always fall back to the default schedule.

use std::collections::BTreeMap;

use glam::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use riposte_combat::{
    ActorId, ActorMessage, Audience, Hand, SimClock, SimTime, generate_seed,
};
use riposte_config::Config;

use crate::network::{LinkConditions, LoopbackNetwork, NetStats, PeerId};
use crate::peer::Peer;
use crate::services::{
    CLAW_DATA_ID, LoadingResolver, SWORD_DATA_ID, SimEntity, claw_timing, sword_timing,
};

pub const SERVER: PeerId = PeerId(0);
pub const OWNER: PeerId = PeerId(1);
pub const BYSTANDER: PeerId = PeerId(2);

pub const SWORDSMAN: ActorId = ActorId(1);
pub const MONSTER: ActorId = ActorId(2);

/// Seconds between the swordsman's attacks.
const ATTACK_INTERVAL: f64 = 1.0;
/// Seconds the swordsman charges before each attack.
const CHARGE_LEAD: f64 = 0.25;
/// Seconds between monster swipes.
const SWIPE_INTERVAL: f64 = 1.5;
/// Longest extra time spent draining in-flight traffic after the run.
const MAX_DRAIN_SECS: f64 = 5.0;

/// Per-peer results.
#[derive(Debug, Clone)]
pub struct PeerReport {
    pub name: &'static str,
    pub launches: BTreeMap<ActorId, usize>,
    pub validations: BTreeMap<ActorId, usize>,
}

/// Results of a scenario run.
#[derive(Debug, Clone)]
pub struct SimReport {
    pub ticks: u64,
    pub sim_secs: f64,
    pub attacks_started: u32,
    pub swipes_started: u32,
    pub swipes_rejected: u32,
    pub net: NetStats,
    pub peers: Vec<PeerReport>,
}

impl SimReport {
    /// Launch count for `actor` on the named peer.
    pub fn launches(&self, peer: &str, actor: ActorId) -> usize {
        self.peers
            .iter()
            .find(|p| p.name == peer)
            .and_then(|p| p.launches.get(&actor).copied())
            .unwrap_or(0)
    }

    pub fn validations(&self, peer: &str, actor: ActorId) -> usize {
        self.peers
            .iter()
            .find(|p| p.name == peer)
            .and_then(|p| p.validations.get(&actor).copied())
            .unwrap_or(0)
    }
}

struct Cadence {
    next: f64,
    interval: f64,
}

impl Cadence {
    fn due(&mut self, now: f64) -> bool {
        if now + 1e-9 < self.next {
            return false;
        }
        self.next += self.interval;
        true
    }
}

fn build_peers(config: &Config) -> Vec<Peer> {
    let full = || {
        LoadingResolver::new(0)
            .with(SWORD_DATA_ID, sword_timing())
            .with(CLAW_DATA_ID, claw_timing())
    };
    let mut server = Peer::new(SERVER, "server", true, config, full());
    let mut owner = Peer::new(
        OWNER,
        "client1",
        false,
        config,
        LoadingResolver::new(3)
            .with(SWORD_DATA_ID, sword_timing())
            .with(CLAW_DATA_ID, claw_timing()),
    );
    let mut bystander = Peer::new(
        BYSTANDER,
        "client2",
        false,
        config,
        LoadingResolver::new(6).with(SWORD_DATA_ID, sword_timing()),
    );

    for peer in [&mut server, &mut owner, &mut bystander] {
        peer.register(SWORDSMAN, OWNER, false, SimEntity::swordsman(Vec3::ZERO));
        peer.register(MONSTER, SERVER, true, SimEntity::monster(Vec3::new(0.0, 0.0, 4.0)));
    }
    vec![server, owner, bystander]
}

fn receivers(from: &Peer, audience: Audience, peers: &[PeerId]) -> Vec<PeerId> {
    match (from.is_server(), audience) {
        (false, _) => vec![SERVER],
        (true, Audience::Observers) => peers.iter().copied().filter(|p| *p != SERVER).collect(),
        // The server is its own authority.
        (true, Audience::Authority) => Vec::new(),
    }
}

/// Runs the duel described by `config.sim`.
pub fn run(config: &Config) -> SimReport {
    let sim = &config.sim;
    let mut clock = SimClock::with_tick_rate(sim.tick_rate);
    let mut network = LoopbackNetwork::new(LinkConditions::from_config(sim), sim.rng_seed);
    let mut seeds = ChaCha8Rng::seed_from_u64(sim.rng_seed.wrapping_add(1));
    let mut peers = build_peers(config);
    let peer_ids: Vec<PeerId> = peers.iter().map(Peer::id).collect();

    let duration = f64::from(sim.duration_secs.max(0.0));
    let mut charges = Cadence {
        next: 0.5 - CHARGE_LEAD,
        interval: ATTACK_INTERVAL,
    };
    let mut attacks = Cadence {
        next: 0.5,
        interval: ATTACK_INTERVAL,
    };
    let mut swipes = Cadence {
        next: 0.75,
        interval: SWIPE_INTERVAL,
    };

    let mut attacks_started = 0u32;
    let mut swipes_started = 0u32;
    let mut swipes_rejected = 0u32;

    tracing::info!(
        duration,
        latency_ms = sim.latency_ms,
        jitter_ms = sim.jitter_ms,
        loss = sim.unreliable_loss,
        "scenario started"
    );

    loop {
        clock.step();
        let time = SimTime::from_clock(&clock);
        let now = time.now;
        let acting = now <= duration;

        if !acting {
            let idle = network.in_flight() == 0 && peers.iter_mut().all(|p| !p.is_busy());
            if idle || now > duration + MAX_DRAIN_SECS {
                break;
            }
        }

        for peer in &mut peers {
            let inbound: Vec<ActorMessage> = network.receive(peer.id(), now);

            if acting && peer.id() == OWNER && attacks_started < sim.attacks {
                if charges.due(now) {
                    peer.act(SWORDSMAN, |actor, ctx| {
                        actor.charge_mut().start_charge(Hand::Primary, ctx)
                    });
                }
                if attacks.due(now) {
                    let seed = generate_seed(&mut seeds);
                    let started = peer.act(SWORDSMAN, |actor, ctx| {
                        actor.charge_mut().stop_charge(ctx);
                        actor.attack_mut().attack_with_seed(seed, Hand::Primary, ctx)
                    });
                    if let Some(Err(e)) = started {
                        tracing::warn!("swordsman attack rejected: {e}");
                    }
                    attacks_started += 1;
                }
            }

            if acting && peer.id() == SERVER && swipes.due(now) {
                let seed = generate_seed(&mut seeds);
                let started = peer.act(MONSTER, |actor, ctx| {
                    actor.attack_mut().attack_with_seed(seed, Hand::Primary, ctx)
                });
                match started {
                    Some(Ok(_)) => swipes_started += 1,
                    Some(Err(e)) => {
                        swipes_rejected += 1;
                        tracing::debug!("monster swipe rejected: {e}");
                    }
                    None => {}
                }
            }

            for outgoing in peer.run_tick(time, inbound) {
                for to in receivers(peer, outgoing.audience, &peer_ids) {
                    if let Err(e) = network.send(peer.id(), to, &outgoing, now) {
                        tracing::warn!(from = peer.name(), "failed to encode message: {e}");
                    }
                }
            }
        }
    }

    let report = SimReport {
        ticks: clock.total_ticks(),
        sim_secs: clock.now(),
        attacks_started,
        swipes_started,
        swipes_rejected,
        net: network.stats(),
        peers: peers
            .iter()
            .map(|p| PeerReport {
                name: p.name(),
                launches: p.launches().snapshot(),
                validations: p.validations().snapshot(),
            })
            .collect(),
    };
    tracing::info!(ticks = report.ticks, sim_secs = report.sim_secs, "scenario finished");
    report
}
