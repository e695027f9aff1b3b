//! In-memory transport with a link conditioner.
//!
//! Unreliable packets may be lost and arrive out of order under jitter.
//! Reliable-ordered packets are never lost and never overtake each other on
//! one link, but may be delivered twice.

use std::collections::HashMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use riposte_combat::{
    ActorMessage, Delivery, MessageError, Outgoing, deserialize_message, serialize_message,
};
use riposte_config::SimConfig;

/// A participant on the loopback network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(pub u8);

/// Link conditions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkConditions {
    /// One-way delay in seconds.
    pub latency: f64,
    /// Extra random delay in `0..=jitter` seconds.
    pub jitter: f64,
    /// Loss probability for unreliable packets.
    pub loss: f32,
    /// Duplicate probability for reliable packets.
    pub duplicate: f32,
}

impl LinkConditions {
    pub fn from_config(sim: &SimConfig) -> Self {
        Self {
            latency: f64::from(sim.latency_ms) / 1000.0,
            jitter: f64::from(sim.jitter_ms) / 1000.0,
            loss: sim.unreliable_loss.clamp(0.0, 1.0),
            duplicate: sim.duplicate_rate.clamp(0.0, 1.0),
        }
    }

    /// A perfect link with fixed latency.
    pub fn ideal(latency: f64) -> Self {
        Self {
            latency,
            jitter: 0.0,
            loss: 0.0,
            duplicate: 0.0,
        }
    }
}

/// Traffic counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetStats {
    pub sent: usize,
    pub delivered: usize,
    pub lost: usize,
    pub duplicated: usize,
    pub corrupt: usize,
}

#[derive(Debug)]
struct InFlight {
    to: PeerId,
    deliver_at: f64,
    order: u64,
    bytes: Vec<u8>,
}

/// Packets in flight between peers.
pub struct LoopbackNetwork {
    rng: ChaCha8Rng,
    conditions: LinkConditions,
    in_flight: Vec<InFlight>,
    reliable_tail: HashMap<(PeerId, PeerId), f64>,
    next_order: u64,
    stats: NetStats,
}

impl LoopbackNetwork {
    pub fn new(conditions: LinkConditions, rng_seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(rng_seed),
            conditions,
            in_flight: Vec::new(),
            reliable_tail: HashMap::new(),
            next_order: 0,
            stats: NetStats::default(),
        }
    }

    pub fn stats(&self) -> NetStats {
        self.stats
    }

    /// Packets not yet delivered.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Sends `outgoing` from `from` to `to` at simulation time `now`.
    pub fn send(
        &mut self,
        from: PeerId,
        to: PeerId,
        outgoing: &Outgoing,
        now: f64,
    ) -> Result<(), MessageError> {
        let bytes = serialize_message(&outgoing.envelope)?;
        self.stats.sent += 1;

        let mut deliver_at = now + self.delay();
        match outgoing.delivery {
            Delivery::Unreliable => {
                if self.rng.random::<f32>() < self.conditions.loss {
                    self.stats.lost += 1;
                    tracing::trace!(from = from.0, to = to.0, "unreliable packet lost");
                    return Ok(());
                }
            }
            Delivery::ReliableOrdered => {
                let tail = self.reliable_tail.entry((from, to)).or_insert(0.0);
                deliver_at = deliver_at.max(*tail);
                *tail = deliver_at;
                if self.rng.random::<f32>() < self.conditions.duplicate {
                    self.stats.duplicated += 1;
                    self.push(to, deliver_at, bytes.clone());
                }
            }
        }
        self.push(to, deliver_at, bytes);
        Ok(())
    }

    /// Removes and decodes every packet for `to` due by `now`, in delivery
    /// order.
    pub fn receive(&mut self, to: PeerId, now: f64) -> Vec<ActorMessage> {
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.in_flight.len() {
            if self.in_flight[i].to == to && self.in_flight[i].deliver_at <= now {
                due.push(self.in_flight.swap_remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by(|a, b| {
            a.deliver_at
                .total_cmp(&b.deliver_at)
                .then(a.order.cmp(&b.order))
        });

        let mut messages = Vec::with_capacity(due.len());
        for packet in due {
            match deserialize_message(&packet.bytes) {
                Ok(message) => {
                    self.stats.delivered += 1;
                    messages.push(message);
                }
                Err(e) => {
                    self.stats.corrupt += 1;
                    tracing::warn!(to = to.0, "dropping undecodable packet: {e}");
                }
            }
        }
        messages
    }

    fn delay(&mut self) -> f64 {
        let jitter = if self.conditions.jitter > 0.0 {
            self.rng.random_range(0.0..=self.conditions.jitter)
        } else {
            0.0
        };
        self.conditions.latency + jitter
    }

    fn push(&mut self, to: PeerId, deliver_at: f64, bytes: Vec<u8>) {
        self.in_flight.push(InFlight {
            to,
            deliver_at,
            order: self.next_order,
            bytes,
        });
        self.next_order += 1;
    }
}
