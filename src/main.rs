//! gpuwatch - live GPU telemetry dashboard.
//!
//! Samples accelerator telemetry on a fixed cadence and renders per-device
//! panels with trend sparklines, a system panel and a process table.
//!
//! Usage:
//!   gpuwatch                 # 0.5s cycle, auto backend
//!   gpuwatch 2               # 2s cycle
//!   gpuwatch -b smi          # force the query-tool backend
//!   gpuwatch -b mock         # synthetic data, no GPU required

use tikv_jemallocator::Jemalloc;
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use gpuwatch::collector::{MockSource, NvmlSource, SmiSource, TelemetrySource};
use gpuwatch::history::DEFAULT_CAPACITY;
use gpuwatch::tui::{App, AppError};

/// Default cycle period in seconds: up to two repaints per second.
const DEFAULT_INTERVAL: f64 = 0.5;

/// Telemetry backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Try the native library first, fall back to the query tool.
    Auto,
    /// Native NVML bindings.
    Nvml,
    /// The nvidia-smi query tool.
    Smi,
    /// Synthetic data for testing the dashboard without a GPU.
    Mock,
}

/// Live GPU telemetry dashboard.
#[derive(Parser)]
#[command(name = "gpuwatch", about = "Live GPU telemetry dashboard", version)]
struct Args {
    /// Update interval in seconds (default: 0.5). Fractional values accepted.
    #[arg(value_name = "INTERVAL")]
    interval: Option<f64>,

    /// Telemetry backend.
    #[arg(short, long, value_enum, default_value_t = Backend::Auto)]
    backend: Backend,

    /// Trend history length in samples, per metric.
    #[arg(long, default_value_t = DEFAULT_CAPACITY, value_name = "SAMPLES")]
    history: usize,

    /// Path to the query tool used by the smi backend.
    #[arg(long, default_value = "nvidia-smi", value_name = "PATH")]
    smi_path: String,

    /// Write diagnostic logs to this file (stdout belongs to the dashboard).
    #[arg(long, value_name = "PATH")]
    log_file: Option<String>,
}

/// Initializes the tracing subscriber writing to the given file.
/// Without a log file, diagnostics are dropped rather than corrupting the
/// alternate screen.
fn init_logging(path: &str) -> Result<(), String> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| format!("cannot open log file '{}': {}", path, e))?;

    let filter = EnvFilter::from_default_env()
        .add_directive("gpuwatch=debug".parse().unwrap());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Arc::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();
    Ok(())
}

/// Picks the telemetry source. `auto` probes the native library and falls
/// back to the query tool when it is unavailable.
fn select_source(args: &Args) -> Box<dyn TelemetrySource> {
    match args.backend {
        Backend::Nvml => Box::new(NvmlSource::new()),
        Backend::Smi => Box::new(SmiSource::new(&args.smi_path)),
        Backend::Mock => Box::new(MockSource::typical_system()),
        Backend::Auto => {
            let mut nvml = NvmlSource::new();
            match nvml.discover() {
                Ok(_) => Box::new(nvml),
                Err(e) => {
                    tracing::debug!("native backend unavailable ({}), using query tool", e);
                    Box::new(SmiSource::new(&args.smi_path))
                }
            }
        }
    }
}

fn main() {
    let args = Args::parse();

    if let Some(ref path) = args.log_file
        && let Err(e) = init_logging(path)
    {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    let interval = args.interval.unwrap_or(DEFAULT_INTERVAL);
    if !interval.is_finite() || interval <= 0.0 {
        eprintln!("Error: interval must be a positive number of seconds");
        std::process::exit(1);
    }
    if args.history == 0 {
        eprintln!("Error: history must be at least 1 sample");
        std::process::exit(1);
    }

    let source = select_source(&args);
    let app = App::new(source, args.history);

    match app.run(Duration::from_secs_f64(interval)) {
        Ok(()) => {}
        Err(AppError::Backend(e)) => {
            eprintln!("Error initializing GPU monitoring: {}", e);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error running TUI: {}", e);
            std::process::exit(1);
        }
    }
}
