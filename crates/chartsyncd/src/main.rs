//! chartsyncd - runs collector jobs and streams charts and metrics.
//!
//! Jobs are read from a YAML file. Chart definitions and per-cycle snapshots
//! are written to stdout as JSON lines; logs go to stderr.

use tikv_jemallocator::Jemalloc;
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod config;
mod job;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::JobFile;
use crate::job::{Job, Scheduler};

/// Metrics collection daemon.
#[derive(Parser)]
#[command(name = "chartsyncd", about = "Metrics collection daemon", version)]
struct Args {
    /// Path to the job file.
    #[arg(short, long, default_value = "chartsync.yaml")]
    config: PathBuf,

    /// Run every job once and exit.
    #[arg(long)]
    once: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber on stderr.
/// Default level is INFO. Use -q for quiet mode (errors only).
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for krate in ["chartsyncd", "chartsync_core"] {
        if let Ok(directive) = format!("{}={}", krate, level).parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    info!("chartsyncd {} starting", env!("CARGO_PKG_VERSION"));

    let file = match JobFile::load(&args.config) {
        Ok(file) => file,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    info!("Loaded {} job(s) from {}", file.jobs.len(), args.config.display());

    let mut scheduler = Scheduler::new();
    let now = Instant::now();
    for cfg in &file.jobs {
        let every = cfg.module.update_every();
        scheduler.start(Job::new(cfg.name.as_str(), cfg.module.build(), every, now));
    }
    if scheduler.is_empty() {
        error!("No job started");
        return ExitCode::FAILURE;
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.once {
        let result = scheduler.run_due(Instant::now(), &mut out);
        scheduler.cleanup();
        return match result.and_then(|_| out.flush()) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!("Failed to write output: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    // Setup graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    info!("Running {} job(s)", scheduler.len());
    let mut code = ExitCode::SUCCESS;
    while running.load(Ordering::SeqCst) {
        match scheduler.run_due(Instant::now(), &mut out) {
            Ok(ran) => debug!("Ran {} job(s)", ran),
            Err(e) => {
                // Output closed: nobody is reading anymore.
                error!("Failed to write output: {}", e);
                code = ExitCode::FAILURE;
                break;
            }
        }

        let Some(next) = scheduler.next_due() else {
            break;
        };
        // Sleep with periodic checks for shutdown signal
        let sleep_interval = Duration::from_millis(100);
        let mut remaining = next.saturating_duration_since(Instant::now());
        while remaining > Duration::ZERO && running.load(Ordering::SeqCst) {
            let sleep_time = remaining.min(sleep_interval);
            std::thread::sleep(sleep_time);
            remaining = remaining.saturating_sub(sleep_time);
        }
    }

    info!("Shutting down...");
    scheduler.cleanup();
    info!("chartsyncd stopped");
    code
}
