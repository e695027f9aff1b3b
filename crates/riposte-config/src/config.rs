//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Action timing and anti-cheat settings.
    pub combat: CombatConfig,
    /// Trigger replication buffer limits.
    pub replication: ReplicationConfig,
    /// Loopback simulation settings (demo binary only).
    pub sim: SimConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// What an action session does when its schedule never arrives.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum FallbackCuePolicy {
    /// Substitute one cue at `default_trigger_duration`.
    #[default]
    SingleCue,
    /// Substitute an empty schedule; the action only waits out its duration.
    NoCue,
}

/// Action timing configuration. All durations are in simulation seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CombatConfig {
    /// Assumed total action length while the real one is unknown.
    pub default_total_duration: f32,
    /// Offset of the single fallback cue.
    pub default_trigger_duration: f32,
    /// Longest wait for the schedule resolver before falling back.
    pub state_setup_delay: f32,
    /// How far before `last_action_end` a start request may arrive.
    pub speed_hack_tolerance: f32,
    /// Idle time after which sequential animation selection restarts at 0.
    pub animation_reset_delay: f32,
    /// Pick animation variants at random instead of cycling through them.
    pub randomize_animation: bool,
    /// Fallback schedule shape.
    pub fallback_cue_policy: FallbackCuePolicy,
}

/// Pending trigger queue limits for out-of-order replication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReplicationConfig {
    /// Seconds a parked trigger queue survives without a matching session.
    pub pending_ttl_secs: f32,
    /// Maximum number of seeds with parked events per actor.
    pub pending_max_seeds: usize,
    /// Maximum parked events for a single seed.
    pub pending_max_events_per_seed: usize,
}

/// Loopback simulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    /// Fixed simulation tick rate (Hz).
    pub tick_rate: u32,
    /// Total simulated time in seconds.
    pub duration_secs: f32,
    /// One-way base latency in milliseconds.
    pub latency_ms: u32,
    /// Maximum extra random delay in milliseconds.
    pub jitter_ms: u32,
    /// Probability that an unreliable message is lost (0.0 - 1.0).
    pub unreliable_loss: f32,
    /// Probability that a reliable message is delivered twice (0.0 - 1.0).
    pub duplicate_rate: f32,
    /// Number of attacks the owning client performs.
    pub attacks: u32,
    /// Seed for the simulated network.
    pub rng_seed: u64,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Write JSON logs next to the config file.
    pub log_to_file: bool,
}

// --- Default implementations ---

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            default_total_duration: 2.0,
            default_trigger_duration: 1.0,
            state_setup_delay: 1.0,
            speed_hack_tolerance: 0.05,
            animation_reset_delay: 2.0,
            randomize_animation: true,
            fallback_cue_policy: FallbackCuePolicy::SingleCue,
        }
    }
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            pending_ttl_secs: 3.0,
            pending_max_seeds: 32,
            pending_max_events_per_seed: 16,
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            duration_secs: 6.0,
            latency_ms: 80,
            jitter_ms: 30,
            unreliable_loss: 0.1,
            duplicate_rate: 0.05,
            attacks: 5,
            rng_seed: 7,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_to_file: false,
        }
    }
}

/// Per-user configuration directory (`<config_dir>/riposte`).
pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|d| d.join("riposte"))
        .ok_or(ConfigError::NoConfigDir)
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
