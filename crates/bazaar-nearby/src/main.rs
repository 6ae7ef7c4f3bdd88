//! bazaar-nearby: run the UniBazaar nearby-presence loop locally.
//!
//! Starts a tracker for the local user plus a handful of simulated peers
//! on one in-memory registry, then logs the online-peer view as it
//! changes until the run time is up or Ctrl-C is pressed.

mod logging;
mod simulation;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use bazaar_common::{ConfigError, UserId};
use bazaar_config::BazaarConfig;
use bazaar_presence::{Identity, Position, SystemClock, TrackerConfig};
use clap::Parser;

use crate::logging::LogControl;
use crate::simulation::{describe, Simulation, SimulationPlan};

#[derive(Parser)]
#[command(name = "bazaar-nearby", about = "Simulate UniBazaar nearby presence on a local registry")]
struct Args {
    /// Config file to use instead of the platform default.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// User id for the local user. A fresh one is generated if omitted.
    #[arg(long)]
    user_id: Option<String>,

    /// Display name shown on the local user's marker.
    #[arg(long, default_value = "Me")]
    name: String,

    /// Contact address shown to peers.
    #[arg(long)]
    contact: Option<String>,

    /// Number of simulated online peers.
    #[arg(long, default_value_t = 3)]
    peers: usize,

    /// Number of stale records seeded into the registry.
    #[arg(long, default_value_t = 1)]
    stale: usize,

    /// Seconds to run before stopping. 0 runs until Ctrl-C.
    #[arg(long, default_value_t = 90)]
    duration: u64,

    /// Seed for the simulated walks.
    #[arg(long)]
    seed: Option<u64>,

    /// Log filter used when RUST_LOG is not set (e.g. "debug").
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log = logging::init(args.log_level.as_deref());

    let loaded = match &args.config {
        Some(path) => bazaar_config::load_config_from(path),
        None => bazaar_config::load_config(),
    };

    match run(args, loaded, &log).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "bazaar-nearby failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(
    args: Args,
    loaded: Result<BazaarConfig, ConfigError>,
    log: &LogControl,
) -> bazaar_common::Result<()> {
    let config = match loaded {
        Ok(config) => config,
        // An explicitly requested file must load.
        Err(e) if args.config.is_some() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load config, using defaults");
            BazaarConfig::default()
        }
    };
    log.apply_config_level(config.logging.level);

    let mut identity = match args.user_id {
        Some(id) => Identity::new(id),
        None => Identity::new(UserId::generate()),
    }
    .with_display_name(&args.name);
    if let Some(contact) = &args.contact {
        identity = identity.with_contact(contact);
    }

    let plan = SimulationPlan {
        center: Position::new(config.map.default_latitude, config.map.default_longitude),
        peers: args.peers,
        stale: args.stale,
        tracker: TrackerConfig {
            heartbeat_interval: config.presence.heartbeat_interval(),
            online_window: config.presence.online_window(),
            min_move_meters: config.presence.min_move_meters,
        },
        seed: args.seed,
    };

    let sim = Simulation::start(identity, &plan, Arc::new(SystemClock)).await?;

    let circle_max_m = config.map.accuracy_circle_max_m;
    let _feed = sim.watch(move |view| {
        tracing::info!(online = view.len(), "{}", describe(&view, circle_max_m));
    });

    let duration = args.duration;
    let run_time = async move {
        match duration {
            0 => std::future::pending::<()>().await,
            secs => tokio::time::sleep(Duration::from_secs(secs)).await,
        }
    };
    tokio::select! {
        _ = run_time => tracing::info!("Run time elapsed"),
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => tracing::info!("Interrupted"),
            Err(e) => tracing::warn!(error = %e, "Ctrl-C handler failed, stopping"),
        },
    }

    sim.stop();
    tracing::info!(
        user = sim.me().identity().label(),
        peers = sim.peers().len(),
        records = sim.store().len().await,
        "Presence tracking stopped"
    );
    Ok(())
}
