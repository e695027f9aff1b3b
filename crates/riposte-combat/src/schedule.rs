//! Action timing: trigger offsets, total duration and animation selection.
//!
//! Timing comes from an external [`ScheduleResolver`] that may not have the
//! data ready yet (animation clips still loading). Sessions poll it once per
//! tick for a bounded time and then fall back to [`fallback_timing`].

use std::collections::HashMap;

use riposte_config::{CombatConfig, FallbackCuePolicy};

use crate::seed::{CorrelationSeed, animation_variant};
use crate::types::{ActionKind, ActorId};

// ---------------------------------------------------------------------------
// Timing records
// ---------------------------------------------------------------------------

/// Identifies the animation whose timing a session needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScheduleKey {
    /// Animation family.
    pub kind: ActionKind,
    /// Data id selecting the animation set.
    pub data_id: i32,
    /// Variant within the set.
    pub animation_index: u32,
}

/// Trigger schedule and duration of one animation.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionTiming {
    /// Delay before each cue, relative to the previous cue.
    pub trigger_offsets: Vec<f32>,
    /// Length of the whole action at speed 1.
    pub total_duration: f32,
    /// Playback multiplier baked into the animation.
    pub speed_rate: f32,
}

impl ActionTiming {
    /// Builds a timing at speed 1.
    pub fn new(trigger_offsets: Vec<f32>, total_duration: f32) -> Self {
        Self {
            trigger_offsets,
            total_duration,
            speed_rate: 1.0,
        }
    }

    /// A timing is usable once it has cues and a non-negative length.
    pub fn is_resolved(&self) -> bool {
        !self.trigger_offsets.is_empty() && self.total_duration >= 0.0
    }
}

/// Source of animation timings.
pub trait ScheduleResolver {
    /// Returns the timing for `key` if it is available this tick.
    fn poll_timing(&mut self, actor: ActorId, key: &ScheduleKey) -> Option<ActionTiming>;
}

/// Resolver answering from a fixed table keyed by `(kind, data_id)`.
///
/// Every animation variant of a set shares one timing.
#[derive(Debug, Clone, Default)]
pub struct StaticSchedules {
    timings: HashMap<(ActionKind, i32), ActionTiming>,
}

impl StaticSchedules {
    /// Creates an empty table. Every poll misses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `timing` for `(kind, data_id)`.
    pub fn insert(&mut self, kind: ActionKind, data_id: i32, timing: ActionTiming) {
        self.timings.insert((kind, data_id), timing);
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, kind: ActionKind, data_id: i32, timing: ActionTiming) -> Self {
        self.insert(kind, data_id, timing);
        self
    }
}

impl ScheduleResolver for StaticSchedules {
    fn poll_timing(&mut self, _actor: ActorId, key: &ScheduleKey) -> Option<ActionTiming> {
        self.timings.get(&(key.kind, key.data_id)).cloned()
    }
}

// ---------------------------------------------------------------------------
// Fallback
// ---------------------------------------------------------------------------

/// Schedule substituted when the resolver does not answer in time.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackTiming {
    /// Cue offsets.
    pub trigger_offsets: Vec<f32>,
    /// Duration left to play, the setup wait already deducted.
    pub remaining: f32,
    /// Nominal action length used for `last_action_end`.
    pub total_duration: f32,
}

/// The fallback schedule for `cfg`.
pub fn fallback_timing(cfg: &CombatConfig) -> FallbackTiming {
    let trigger_offsets = match cfg.fallback_cue_policy {
        FallbackCuePolicy::SingleCue => vec![cfg.default_trigger_duration],
        FallbackCuePolicy::NoCue => Vec::new(),
    };
    FallbackTiming {
        trigger_offsets,
        remaining: cfg.default_total_duration - cfg.state_setup_delay,
        total_duration: cfg.default_total_duration,
    }
}

// ---------------------------------------------------------------------------
// Animation selection
// ---------------------------------------------------------------------------

/// Picks the animation variant for successive attacks of one actor.
///
/// In sequential mode variants cycle `0, 1, 2...` and restart when the actor
/// paused longer than the reset delay, the variant count was reached, or the
/// animation set changed. In randomized mode the variant is derived from the
/// correlation seed so every participant plays the same one.
#[derive(Debug, Clone, Default)]
pub struct AnimationPicker {
    next_index: u32,
    last_data_id: i32,
}

impl AnimationPicker {
    /// Creates a picker that starts at variant 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Chooses the variant for an action starting at `now`.
    pub fn pick(
        &mut self,
        cfg: &CombatConfig,
        now: f64,
        last_action_end: f64,
        data_id: i32,
        variants: u32,
        seed: CorrelationSeed,
    ) -> u32 {
        let variants = variants.max(1);
        if now - last_action_end > f64::from(cfg.animation_reset_delay)
            || self.next_index >= variants
            || self.last_data_id != data_id
        {
            self.next_index = 0;
        }
        let sequential = self.next_index;
        self.next_index += 1;
        self.last_data_id = data_id;

        if cfg.randomize_animation {
            animation_variant(seed, variants)
        } else {
            sequential
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequential_cfg() -> CombatConfig {
        CombatConfig {
            randomize_animation: false,
            ..CombatConfig::default()
        }
    }

    #[test]
    fn test_fallback_single_cue_matches_legacy_defaults() {
        let fallback = fallback_timing(&CombatConfig::default());
        assert_eq!(fallback.trigger_offsets, vec![1.0]);
        assert_eq!(fallback.remaining, 1.0);
        assert_eq!(fallback.total_duration, 2.0);
    }

    #[test]
    fn test_fallback_no_cue_policy() {
        let cfg = CombatConfig {
            fallback_cue_policy: FallbackCuePolicy::NoCue,
            ..CombatConfig::default()
        };
        let fallback = fallback_timing(&cfg);
        assert!(fallback.trigger_offsets.is_empty());
        assert_eq!(fallback.remaining, 1.0);
    }

    #[test]
    fn test_timing_resolution_requires_cues() {
        assert!(ActionTiming::new(vec![0.2], 1.0).is_resolved());
        assert!(!ActionTiming::new(Vec::new(), 1.0).is_resolved());
        assert!(!ActionTiming::new(vec![0.2], -1.0).is_resolved());
    }

    #[test]
    fn test_static_schedules_ignore_variant() {
        let mut table = StaticSchedules::new().with(
            ActionKind::AttackPrimary,
            4,
            ActionTiming::new(vec![0.25, 0.25], 1.0),
        );
        let key = ScheduleKey {
            kind: ActionKind::AttackPrimary,
            data_id: 4,
            animation_index: 2,
        };
        assert!(table.poll_timing(ActorId(1), &key).is_some());
        let other = ScheduleKey { data_id: 5, ..key };
        assert!(table.poll_timing(ActorId(1), &other).is_none());
    }

    #[test]
    fn test_sequential_pick_cycles_and_resets() {
        let cfg = sequential_cfg();
        let mut picker = AnimationPicker::new();
        assert_eq!(picker.pick(&cfg, 0.0, 0.0, 1, 3, 0), 0);
        assert_eq!(picker.pick(&cfg, 1.0, 1.0, 1, 3, 0), 1);
        assert_eq!(picker.pick(&cfg, 2.0, 2.0, 1, 3, 0), 2);
        // Wraps after the last variant.
        assert_eq!(picker.pick(&cfg, 3.0, 3.0, 1, 3, 0), 0);
        // Long pause restarts the combo.
        assert_eq!(picker.pick(&cfg, 10.0, 3.0, 1, 3, 0), 0);
        assert_eq!(picker.pick(&cfg, 10.5, 10.5, 1, 3, 0), 1);
        // A different animation set restarts too.
        assert_eq!(picker.pick(&cfg, 11.0, 11.0, 2, 3, 0), 0);
    }

    #[test]
    fn test_randomized_pick_follows_seed() {
        let cfg = CombatConfig::default();
        let mut a = AnimationPicker::new();
        let mut b = AnimationPicker::new();
        for seed in [0u8, 17, 200] {
            let va = a.pick(&cfg, 0.0, 0.0, 1, 4, seed);
            let vb = b.pick(&cfg, 5.0, 0.0, 1, 4, seed);
            assert_eq!(va, vb);
            assert!(va < 4);
        }
    }
}
