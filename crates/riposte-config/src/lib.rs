//! Configuration system for the Riposte combat core.
//!
//! Provides runtime-tunable action timings, replication buffer limits and
//! loopback simulation settings that persist to disk as RON files. Supports
//! CLI overrides via clap, hot-reload detection, and forward/backward
//! compatible serialization.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CombatConfig, Config, DebugConfig, FallbackCuePolicy, ReplicationConfig, SimConfig,
    default_config_dir,
};
pub use error::ConfigError;
