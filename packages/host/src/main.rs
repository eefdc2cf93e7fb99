//! `sushi-host`: standalone stand-in for the 3D host application.
//!
//! Starts the bridge, then drives the host-thread drain from a timer loop
//! the way the host's own scheduler would. Useful for trying the desktop
//! client without the real host running.

use std::path::Path;
use std::time::{Duration, Instant};

use api::{BridgeConfig, BridgeService, global_service};
use clap::{Parser, ValueEnum};
use dispatch::{
    DrainConfig, ImportResult, ImporterRegistry, LOG_TARGET, MainThreadDrain, TimerLoop,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Run the import bridge with a logging importer.
#[derive(Debug, Parser)]
#[command(name = "sushi-host", version, about)]
struct Args {
    /// Listen on this loopback port instead of the configured one.
    #[arg(long)]
    port: Option<u16>,

    /// Drain poll interval while jobs are arriving (milliseconds).
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,

    /// Exit after this many seconds instead of running until killed.
    #[arg(long)]
    run_for: Option<u64>,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Stand-in scene importer: checks the file is readable and logs its size.
fn log_import(path: &Path) -> ImportResult {
    let size = std::fs::metadata(path)?.len();
    tracing::info!(target: LOG_TARGET, path = %path.display(), bytes = size, "Loading scene");
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logging(args.log_format);

    let owned;
    let service: &BridgeService = match args.port {
        Some(port) => {
            let config = BridgeConfig::from_env()
                .unwrap_or_else(|e| {
                    tracing::warn!(target: LOG_TARGET, "{}; using defaults", e);
                    BridgeConfig::default()
                })
                .with_port(port);
            owned = BridgeService::new(config);
            &owned
        }
        None => global_service(),
    };

    // A failed start is logged by the service; the host keeps running.
    let _ = service.start();

    let active = Duration::from_millis(args.poll_ms.max(1));
    let config = DrainConfig::default()
        .with_active_interval(active)
        .with_idle_interval(active.max(DrainConfig::default().idle_interval));
    let drain = MainThreadDrain::new(service.queue(), ImporterRegistry::scenes(log_import))
        .with_config(config);

    let timers = TimerLoop::new();
    let control = drain.attach(&timers);

    match args.run_for {
        Some(secs) => timers.run_until(Instant::now() + Duration::from_secs(secs)),
        None => timers.run_to_completion(),
    }

    control.detach();
    service.stop();
}
