//! Command-line argument parsing for the loopback simulation.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Riposte command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "riposte-sim", about = "Loopback combat replication simulation")]
pub struct CliArgs {
    /// Simulated seconds to run.
    #[arg(long)]
    pub duration: Option<f32>,

    /// Number of attacks the owning client performs.
    #[arg(long)]
    pub attacks: Option<u32>,

    /// One-way network latency in milliseconds.
    #[arg(long)]
    pub latency_ms: Option<u32>,

    /// Maximum jitter in milliseconds.
    #[arg(long)]
    pub jitter_ms: Option<u32>,

    /// Loss probability for unreliable messages.
    #[arg(long)]
    pub loss: Option<f32>,

    /// Network RNG seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(d) = args.duration {
            self.sim.duration_secs = d;
        }
        if let Some(n) = args.attacks {
            self.sim.attacks = n;
        }
        if let Some(ms) = args.latency_ms {
            self.sim.latency_ms = ms;
        }
        if let Some(ms) = args.jitter_ms {
            self.sim.jitter_ms = ms;
        }
        if let Some(p) = args.loss {
            self.sim.unreliable_loss = p.clamp(0.0, 1.0);
        }
        if let Some(seed) = args.seed {
            self.sim.rng_seed = seed;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
