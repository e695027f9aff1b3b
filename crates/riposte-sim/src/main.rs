//! Loopback combat replication simulation.
//!
//! Runs one server and two clients in a single process over a conditioned
//! in-memory network, then prints how many sub-shots each participant
//! launched per actor. Configuration is loaded from `config.ron` and can be
//! overridden via CLI flags, e.g.
//! `cargo run -p riposte-sim -- --latency-ms 150 --loss 0.2`.

mod network;
mod peer;
mod scenario;
mod services;

use clap::Parser;
use riposte_config::{CliArgs, Config, default_config_dir};
use tracing::info;

fn main() {
    let args = CliArgs::parse();

    // Resolve config directory
    let config_dir = match args.config.clone() {
        Some(dir) => dir,
        None => match default_config_dir() {
            Ok(dir) => dir,
            Err(e) => {
                eprintln!("{e}, using ./riposte");
                std::path::PathBuf::from("riposte")
            }
        },
    };

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    riposte_log::init_logging(Some(&log_dir), Some(&config));

    let report = scenario::run(&config);

    info!(
        ticks = report.ticks,
        sim_secs = report.sim_secs,
        attacks = report.attacks_started,
        swipes = report.swipes_started,
        rejected = report.swipes_rejected,
        "run complete"
    );
    info!(
        sent = report.net.sent,
        delivered = report.net.delivered,
        lost = report.net.lost,
        duplicated = report.net.duplicated,
        corrupt = report.net.corrupt,
        "network"
    );
    for peer in &report.peers {
        for (actor, launches) in &peer.launches {
            let validations = peer.validations.get(actor).copied().unwrap_or(0);
            info!(peer = peer.name, actor = actor.0, launches, validations, "shots");
        }
    }
}
