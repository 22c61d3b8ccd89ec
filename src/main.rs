//! Off-grid controller: main entry point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                   Adapters (outer ring)                    │
//! │                                                            │
//! │  HardwareAdapter       LogEventSink     ConfigFile         │
//! │  (Sensor+Actuator)     (EventSink)      (ConfigPort)       │
//! │  RpiBus · relay pin                                        │
//! │                                                            │
//! │  ─────────────── Port Trait Boundary ───────────────       │
//! │                                                            │
//! │  ┌──────────────────────────────────────────────────┐      │
//! │  │            AppService (pure logic)               │      │
//! │  │  FSM · Fault supervisor                          │      │
//! │  └──────────────────────────────────────────────────┘      │
//! │                                                            │
//! │  runner::run (poll loop) · SIGINT/SIGTERM → cancel         │
//! └────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;

use offgrid::adapters::config_file::ConfigFile;
use offgrid::adapters::hardware::HardwareAdapter;
use offgrid::adapters::log_sink::LogEventSink;
use offgrid::adapters::rpi::{RpiBus, claim_relay_pin};
use offgrid::app::ports::ConfigPort;
use offgrid::app::service::AppService;
use offgrid::config::SystemConfig;
use offgrid::drivers::relay::RelayDriver;
use offgrid::logging;
use offgrid::runner::{self, Cadence};
use offgrid::sensors::SensorHub;

/// Battery/mains source controller for the off-grid 12V bus.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// JSON configuration file (missing file = built-in defaults).
    #[arg(short, long, default_value = "/etc/offgrid/config.json")]
    config: PathBuf,

    /// Print the default configuration as JSON and exit.
    #[arg(long)]
    print_default_config: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.print_default_config {
        println!("{}", serde_json::to_string_pretty(&SystemConfig::default())?);
        return Ok(());
    }

    // ── 1. Logging ────────────────────────────────────────────
    logging::init();
    info!("offgrid v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Configuration ──────────────────────────────────────
    let config = ConfigFile::new(&cli.config)
        .load()
        .with_context(|| format!("loading {}", cli.config.display()))?;
    info!(
        "switching at {:.2} V, back to battery at {:.2} V",
        config.battery_low_v,
        config.thresholds().recover_v()
    );

    // ── 3. Peripherals (fatal on failure) ─────────────────────
    let bus = RpiBus::open(config.i2c_bus)
        .with_context(|| format!("opening /dev/i2c-{}", config.i2c_bus))?;
    let pin = claim_relay_pin(config.relay_gpio)
        .with_context(|| format!("claiming relay GPIO {}", config.relay_gpio))?;
    let hub = SensorHub::new(bus, &config).context("configuring MCP3424 converters")?;
    let relay = RelayDriver::new(pin, config.relay_battery_level);

    let mut hw = HardwareAdapter::new(hub, relay);
    let mut sink = LogEventSink::new();
    let mut app = AppService::new(&config);

    // ── 4. Shutdown signals ───────────────────────────────────
    let cancel = CancellationToken::new();
    let mut sigint = signal(SignalKind::interrupt()).context("installing SIGINT handler")?;
    let mut sigterm = signal(SignalKind::terminate()).context("installing SIGTERM handler")?;
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            tokio::select! {
                _ = sigint.recv() => info!("Received SIGINT."),
                _ = sigterm.recv() => info!("Received SIGTERM."),
            }
            cancel.cancel();
        }
    });

    // ── 5. Run ────────────────────────────────────────────────
    app.start(&mut hw, &mut sink);
    runner::run(
        &mut app,
        &mut hw,
        &mut sink,
        Cadence::from_config(&config),
        &cancel,
    )
    .await;

    // ── 6. Release ────────────────────────────────────────────
    if let Err(e) = app.shutdown(&mut hw, &mut sink) {
        error!("relay release failed: {e}");
        return Err(e).context("releasing relay to safe source");
    }
    drop(hw);
    info!("bus closed, exiting");
    Ok(())
}
