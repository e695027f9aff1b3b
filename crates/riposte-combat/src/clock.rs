//! Fixed-rate simulation clock shared by every action session.
//!
//! Sessions never read wall-clock time. They are advanced by the `dt` of each
//! simulation tick and compare against [`SimClock::now`], so waits resume
//! deterministically relative to elapsed simulation time.

use bevy_ecs::prelude::*;

/// Default simulation tick rate in Hz.
pub const DEFAULT_TICK_RATE: u32 = 60;

/// Accumulates real elapsed time and yields discrete simulation ticks.
#[derive(Debug, Clone)]
pub struct SimClock {
    accumulator_secs: f64,
    tick_duration_secs: f64,
    total_ticks: u64,
}

impl SimClock {
    /// Creates a clock at [`DEFAULT_TICK_RATE`].
    pub fn new() -> Self {
        Self::with_tick_rate(DEFAULT_TICK_RATE)
    }

    /// Creates a clock with a custom tick rate. A rate of zero is treated as 1 Hz.
    pub fn with_tick_rate(hz: u32) -> Self {
        Self {
            accumulator_secs: 0.0,
            tick_duration_secs: 1.0 / f64::from(hz.max(1)),
            total_ticks: 0,
        }
    }

    /// Accumulates elapsed time and returns the number of ticks to process.
    pub fn accumulate(&mut self, dt_secs: f64) -> u32 {
        self.accumulator_secs += dt_secs;
        let mut ticks = 0u32;
        while self.accumulator_secs >= self.tick_duration_secs {
            self.accumulator_secs -= self.tick_duration_secs;
            self.total_ticks += 1;
            ticks += 1;
        }
        ticks
    }

    /// Advances exactly one tick, ignoring the accumulator.
    pub fn step(&mut self) {
        self.total_ticks += 1;
    }

    /// Simulation time in seconds: ticks elapsed times tick duration.
    pub fn now(&self) -> f64 {
        self.total_ticks as f64 * self.tick_duration_secs
    }

    /// Returns the tick duration in seconds.
    pub fn tick_duration_secs(&self) -> f64 {
        self.tick_duration_secs
    }

    /// Returns the total number of ticks processed since creation.
    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Current simulation time, published to ECS systems once per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Resource)]
pub struct SimTime {
    /// Simulation time at the end of this tick, in seconds.
    pub now: f64,
    /// Length of this tick, in seconds.
    pub dt: f32,
}

impl SimTime {
    /// Snapshot of `clock` after its latest tick.
    pub fn from_clock(clock: &SimClock) -> Self {
        Self {
            now: clock.now(),
            dt: clock.tick_duration_secs() as f32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_60hz() {
        let mut clock = SimClock::new();
        let dt = clock.tick_duration_secs();
        for _ in 0..60 {
            assert_eq!(clock.accumulate(dt), 1);
        }
        assert_eq!(clock.total_ticks(), 60);
        assert!((clock.now() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_ticks_accumulate() {
        let mut clock = SimClock::with_tick_rate(10);
        assert_eq!(clock.accumulate(0.04), 0);
        assert_eq!(clock.accumulate(0.07), 1);
        assert_eq!(clock.accumulate(0.25), 2);
        assert_eq!(clock.total_ticks(), 3);
    }

    #[test]
    fn test_zero_rate_does_not_divide_by_zero() {
        let clock = SimClock::with_tick_rate(0);
        assert_eq!(clock.tick_duration_secs(), 1.0);
    }

    #[test]
    fn test_sim_time_snapshot() {
        let mut clock = SimClock::with_tick_rate(4);
        clock.step();
        clock.step();
        let time = SimTime::from_clock(&clock);
        assert_eq!(time.now, 0.5);
        assert_eq!(time.dt, 0.25);
    }
}
