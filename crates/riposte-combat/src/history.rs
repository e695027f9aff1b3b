//! Per-actor trigger bookkeeping on the replay side.
//!
//! [`TriggerHistory`] counts how many cues of each seed were applied so
//! duplicates and stale events become no-ops. [`PendingTriggerQueue`] holds
//! events that arrived before the local session for their seed knew its
//! schedule length; it is bounded both in time and in size.

use std::collections::{HashMap, VecDeque};

use riposte_config::ReplicationConfig;

use crate::messages::TriggerEvent;
use crate::seed::CorrelationSeed;

// ---------------------------------------------------------------------------
// TriggerHistory
// ---------------------------------------------------------------------------

/// Progress of one action instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Cues applied so far.
    pub triggered_count: usize,
    /// Cues the schedule has.
    pub schedule_length: usize,
}

impl HistoryEntry {
    /// No further cue may be applied.
    pub fn is_exhausted(&self) -> bool {
        self.triggered_count >= self.schedule_length
    }
}

/// Outcome of [`TriggerHistory::try_advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Apply cue `index`; the count was incremented.
    Applied {
        /// Zero-based index of the cue to apply.
        index: usize,
    },
    /// Every cue was already applied.
    Exhausted,
    /// No entry for the seed yet.
    Missing,
}

/// Applied-cue counters keyed by correlation seed.
#[derive(Debug, Clone, Default)]
pub struct TriggerHistory {
    entries: HashMap<CorrelationSeed, HistoryEntry>,
}

impl TriggerHistory {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts counting for `seed`. An entry that still expects cues is kept,
    /// so a repeated start for the same action cannot rewind its count.
    /// Returns `false` in that case.
    pub fn begin(&mut self, seed: CorrelationSeed, schedule_length: usize) -> bool {
        if self.entries.get(&seed).is_some_and(|e| !e.is_exhausted()) {
            return false;
        }
        self.entries.insert(
            seed,
            HistoryEntry {
                triggered_count: 0,
                schedule_length,
            },
        );
        true
    }

    /// Claims the next cue index for `seed`.
    pub fn try_advance(&mut self, seed: CorrelationSeed) -> Advance {
        let Some(entry) = self.entries.get_mut(&seed) else {
            return Advance::Missing;
        };
        if entry.is_exhausted() {
            return Advance::Exhausted;
        }
        let index = entry.triggered_count;
        entry.triggered_count += 1;
        Advance::Applied { index }
    }

    /// Entry for `seed`, if any.
    pub fn get(&self, seed: CorrelationSeed) -> Option<&HistoryEntry> {
        self.entries.get(&seed)
    }

    /// Forgets `seed`.
    pub fn remove(&mut self, seed: CorrelationSeed) -> Option<HistoryEntry> {
        self.entries.remove(&seed)
    }

    /// Number of tracked seeds.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no seed is tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forgets every seed.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

// ---------------------------------------------------------------------------
// PendingTriggerQueue
// ---------------------------------------------------------------------------

/// Outcome of [`PendingTriggerQueue::park`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParkOutcome {
    /// The event was queued.
    Queued,
    /// The event was queued after evicting the oldest seed.
    EvictedOldest {
        /// Seed whose events were discarded.
        evicted: CorrelationSeed,
    },
    /// The seed already holds the maximum number of events.
    DroppedFull,
}

#[derive(Debug, Clone)]
struct PendingSeed {
    seed: CorrelationSeed,
    first_arrival: f64,
    events: Vec<TriggerEvent>,
}

/// Trigger events waiting for a history entry, oldest seed first.
#[derive(Debug, Clone)]
pub struct PendingTriggerQueue {
    seeds: VecDeque<PendingSeed>,
    ttl_secs: f64,
    max_seeds: usize,
    max_events_per_seed: usize,
}

impl PendingTriggerQueue {
    /// Creates a queue with the limits in `cfg`.
    pub fn new(cfg: &ReplicationConfig) -> Self {
        Self {
            seeds: VecDeque::new(),
            ttl_secs: f64::from(cfg.pending_ttl_secs),
            max_seeds: cfg.pending_max_seeds,
            max_events_per_seed: cfg.pending_max_events_per_seed,
        }
    }

    /// Queues `event` for `seed`, received at simulation time `now`.
    pub fn park(&mut self, seed: CorrelationSeed, event: TriggerEvent, now: f64) -> ParkOutcome {
        if let Some(pending) = self.seeds.iter_mut().find(|p| p.seed == seed) {
            if pending.events.len() >= self.max_events_per_seed {
                return ParkOutcome::DroppedFull;
            }
            pending.events.push(event);
            return ParkOutcome::Queued;
        }

        if self.max_seeds == 0 || self.max_events_per_seed == 0 {
            return ParkOutcome::DroppedFull;
        }

        let mut outcome = ParkOutcome::Queued;
        if self.seeds.len() >= self.max_seeds
            && let Some(oldest) = self.seeds.pop_front()
        {
            tracing::debug!(seed = oldest.seed, "pending trigger seed evicted");
            outcome = ParkOutcome::EvictedOldest {
                evicted: oldest.seed,
            };
        }
        self.seeds.push_back(PendingSeed {
            seed,
            first_arrival: now,
            events: vec![event],
        });
        outcome
    }

    /// Removes and returns the events for `seed` in arrival order.
    pub fn take(&mut self, seed: CorrelationSeed) -> Vec<TriggerEvent> {
        match self.seeds.iter().position(|p| p.seed == seed) {
            Some(pos) => self
                .seeds
                .remove(pos)
                .map(|p| p.events)
                .unwrap_or_default(),
            None => Vec::new(),
        }
    }

    /// Discards the events for `seed`. Returns `true` if any were queued.
    pub fn remove(&mut self, seed: CorrelationSeed) -> bool {
        !self.take(seed).is_empty()
    }

    /// Drops seeds whose first event is older than the TTL. Returns them.
    pub fn sweep(&mut self, now: f64) -> Vec<CorrelationSeed> {
        let ttl = self.ttl_secs;
        let mut expired = Vec::new();
        self.seeds.retain(|p| {
            let keep = now - p.first_arrival <= ttl;
            if !keep {
                expired.push(p.seed);
            }
            keep
        });
        for seed in &expired {
            tracing::debug!(seed, "pending trigger events expired");
        }
        expired
    }

    /// Number of queued events for `seed`.
    pub fn event_count(&self, seed: CorrelationSeed) -> usize {
        self.seeds
            .iter()
            .find(|p| p.seed == seed)
            .map_or(0, |p| p.events.len())
    }

    /// Number of seeds with queued events.
    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    /// Discards everything.
    pub fn clear(&mut self) {
        self.seeds.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AimPosition;

    fn event(seed: CorrelationSeed, x: f32) -> TriggerEvent {
        TriggerEvent {
            seed,
            is_secondary_hand: false,
            is_skill_driven: false,
            aim: AimPosition {
                position: glam::Vec3::new(x, 0.0, 0.0),
                ..AimPosition::default()
            },
        }
    }

    fn limits(max_seeds: usize, max_events_per_seed: usize) -> ReplicationConfig {
        ReplicationConfig {
            pending_ttl_secs: 3.0,
            pending_max_seeds: max_seeds,
            pending_max_events_per_seed: max_events_per_seed,
        }
    }

    #[test]
    fn test_history_counts_to_schedule_length() {
        let mut history = TriggerHistory::new();
        assert_eq!(history.try_advance(4), Advance::Missing);

        history.begin(4, 2);
        assert_eq!(history.try_advance(4), Advance::Applied { index: 0 });
        assert_eq!(history.try_advance(4), Advance::Applied { index: 1 });
        assert_eq!(history.try_advance(4), Advance::Exhausted);
        assert_eq!(history.try_advance(4), Advance::Exhausted);
        assert_eq!(history.get(4).map(|e| e.triggered_count), Some(2));
    }

    #[test]
    fn test_begin_keeps_live_entry_and_reopens_exhausted_one() {
        let mut history = TriggerHistory::new();
        assert!(history.begin(5, 3));
        assert_eq!(history.try_advance(5), Advance::Applied { index: 0 });

        // Same action announced again.
        assert!(!history.begin(5, 3));
        assert_eq!(history.try_advance(5), Advance::Applied { index: 1 });
        assert_eq!(history.try_advance(5), Advance::Applied { index: 2 });

        // A finished action may be followed by a new one with the same seed.
        assert!(history.begin(5, 1));
        assert_eq!(history.try_advance(5), Advance::Applied { index: 0 });
    }

    #[test]
    fn test_history_seeds_are_independent() {
        let mut history = TriggerHistory::new();
        history.begin(1, 1);
        history.begin(2, 1);
        assert_eq!(history.try_advance(1), Advance::Applied { index: 0 });
        assert_eq!(history.try_advance(2), Advance::Applied { index: 0 });
        history.remove(1);
        assert_eq!(history.try_advance(1), Advance::Missing);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_pending_preserves_arrival_order() {
        let mut queue = PendingTriggerQueue::new(&limits(4, 8));
        for x in [1.0, 2.0, 3.0] {
            assert_eq!(queue.park(9, event(9, x), 0.0), ParkOutcome::Queued);
        }
        let drained: Vec<f32> = queue.take(9).iter().map(|e| e.aim.position.x).collect();
        assert_eq!(drained, vec![1.0, 2.0, 3.0]);
        assert!(queue.take(9).is_empty());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_pending_ttl_expiry() {
        let mut queue = PendingTriggerQueue::new(&limits(4, 8));
        queue.park(1, event(1, 0.0), 0.0);
        queue.park(2, event(2, 0.0), 2.0);
        assert!(queue.sweep(3.0).is_empty());
        assert_eq!(queue.sweep(3.5), vec![1]);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.sweep(10.0), vec![2]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_pending_seed_cap_evicts_oldest() {
        let mut queue = PendingTriggerQueue::new(&limits(2, 8));
        queue.park(1, event(1, 0.0), 0.0);
        queue.park(2, event(2, 0.0), 0.1);
        assert_eq!(
            queue.park(3, event(3, 0.0), 0.2),
            ParkOutcome::EvictedOldest { evicted: 1 }
        );
        assert_eq!(queue.event_count(1), 0);
        assert_eq!(queue.event_count(3), 1);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_pending_event_cap_drops_newest() {
        let mut queue = PendingTriggerQueue::new(&limits(2, 2));
        queue.park(5, event(5, 1.0), 0.0);
        queue.park(5, event(5, 2.0), 0.0);
        assert_eq!(queue.park(5, event(5, 3.0), 0.0), ParkOutcome::DroppedFull);
        assert_eq!(queue.event_count(5), 2);

        let mut disabled = PendingTriggerQueue::new(&limits(0, 2));
        assert_eq!(disabled.park(5, event(5, 1.0), 0.0), ParkOutcome::DroppedFull);
        assert!(disabled.is_empty());
    }

    #[test]
    fn test_remove_reports_whether_anything_was_queued() {
        let mut queue = PendingTriggerQueue::new(&limits(2, 2));
        assert!(!queue.remove(3));
        queue.park(3, event(3, 0.0), 0.0);
        assert!(queue.remove(3));
    }
}
