//! vibscope - Main Entry Point
//!
//! Headless front end for the acquisition core: connects to the sensor,
//! streams one axis for a fixed duration, stops (freezing the view on the
//! newest data) and prints the per-axis readings.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vibscope::backend::{list_ports, AcquisitionWorker, SerialTransport, Transport, WorkerReport};
use vibscope::config::{default_config_path, AppConfig, LoggingConfig};
use vibscope::sink::{LogBuffer, TracingSink};
use vibscope::types::Axis;

#[derive(Parser, Debug)]
#[command(name = "vibscope", version, about = "Stream and inspect LH-ST vibration sensor data")]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Serial port to open
    #[arg(long)]
    port: Option<String>,

    /// Baud rate
    #[arg(long)]
    baud: Option<u32>,

    /// Axis to acquire
    #[arg(long, default_value = "x")]
    axis: Axis,

    /// Seconds to acquire before stopping
    #[arg(long, default_value_t = 5.0)]
    duration: f64,

    /// List serial ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Use the built-in simulated sensor
    #[arg(long)]
    simulate: bool,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,
}

fn init_tracing(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let (file_layer, guard) = match &logging.file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_else(|| "vibscope.log".into());
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,vibscope=debug")),
        )
        .with(fmt::layer())
        .with(file_layer)
        .init();

    guard
}

/// Load the config at the default location
///
/// A broken file falls back to defaults. The warning is returned instead of
/// logged since tracing is not installed yet.
fn load_default_config(path: Option<&Path>) -> (AppConfig, Option<String>) {
    let Some(path) = path else {
        return (AppConfig::default(), None);
    };
    match AppConfig::load_if_exists(path) {
        Ok(config) => (config, None),
        Err(e) => (
            AppConfig::default(),
            Some(format!("Failed to load config, using defaults: {}", e)),
        ),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<(AppConfig, Option<String>)> {
    let (mut config, warning) = match &cli.config {
        Some(path) => (AppConfig::load(path)?, None),
        None => load_default_config(default_config_path().as_deref()),
    };

    if let Some(port) = &cli.port {
        config.serial.port_name = Some(port.clone());
    }
    if let Some(baud) = cli.baud {
        config.serial.baud_rate = baud;
    }

    config.validate()?;
    Ok((config, warning))
}

fn parse_duration(secs: f64) -> anyhow::Result<Duration> {
    Duration::try_from_secs_f64(secs)
        .map_err(|_| anyhow::anyhow!("--duration must be a non-negative number of seconds"))
}

fn open_transport(config: &AppConfig, simulate: bool) -> anyhow::Result<Box<dyn Transport>> {
    if simulate {
        #[cfg(feature = "simulated-sensor")]
        {
            return Ok(Box::new(vibscope::backend::SimulatedSensor::default()));
        }
        #[cfg(not(feature = "simulated-sensor"))]
        bail!("--simulate requires building with the `simulated-sensor` feature");
    }

    let transport = SerialTransport::open(&config.serial).context("Failed to connect")?;
    Ok(Box::new(transport))
}

fn print_report(report: &WorkerReport, log: &LogBuffer) {
    println!("Transport:  {} ({})", report.transport, report.status);
    for axis in [Axis::X, Axis::Y, Axis::Z] {
        if let Some(reading) = report.readings.get(axis) {
            println!(
                "{} axis:     {:+.3} g  amplitude {:.3} g",
                axis, reading.value, reading.amplitude
            );
        }
    }
    println!(
        "History:    {} points, viewport {}..{} ({})",
        report.history_len, report.viewport.0, report.viewport.1, report.viewport_mode
    );
    println!(
        "Decoder:    {} frames, {} bytes dropped",
        report.decode_stats.frames, report.decode_stats.dropped_bytes
    );
    println!("Log:");
    for entry in log.entries().collect::<Vec<_>>().into_iter().rev() {
        println!("  {}", entry);
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.list_ports {
        for port in list_ports()? {
            println!("{}", port);
        }
        return Ok(());
    }

    let (config, warning) = load_config(&cli)?;
    let _guard = init_tracing(&config.logging);

    tracing::info!("Starting vibscope");
    if let Some(warning) = warning {
        tracing::warn!("{}", warning);
    }
    if cli.config.is_none() {
        if let Some(path) = default_config_path() {
            tracing::debug!("Config location: {:?}", path);
        }
    }

    if !cli.axis.is_measurable() {
        bail!("--axis must be one of x, y, z");
    }
    let duration = parse_duration(cli.duration)?;

    let transport = open_transport(&config, cli.simulate)?;
    let mut log = LogBuffer::new(config.logging.log_capacity);
    let mut render = TracingSink::default();
    let (worker, handle) = AcquisitionWorker::new(config, transport, &mut render, &mut log);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build runtime")?;

    let axis = cli.axis;
    let report = runtime.block_on(async move {
        let driver = async {
            handle.start_axis(axis);
            tokio::time::sleep(duration).await;
            handle.stop_all();
            // Give the sensor a moment to act on STOP before closing.
            tokio::time::sleep(Duration::from_millis(50)).await;
            handle.disconnect();
        };
        let (report, ()) = tokio::join!(worker.run(), driver);
        report
    })?;

    tracing::info!("Rendered {} frames", render.frames());

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, &log);
    }

    Ok(())
}
