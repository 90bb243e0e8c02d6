// ABOUTME: Dining table demo - runs a pairlock session from flags, env, or a JSON config.
// ABOUTME: Stops cleanly on Ctrl-C and prints a per-agent report.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pairlock::prelude::*;

// ============================================================================
// Arguments
// ============================================================================

/// Run N agents around a ring of N shared resources.
#[derive(Debug, Parser)]
#[command(name = "dinner", version)]
struct Args {
    /// JSON config file; flags and PAIRLOCK_* variables override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of agents (and resources).
    #[arg(long)]
    agents: Option<usize>,

    /// Meals per agent; runs until Ctrl-C when omitted.
    #[arg(long)]
    iterations: Option<u64>,

    /// Think phase in milliseconds.
    #[arg(long)]
    think_ms: Option<u64>,

    /// Eat phase in milliseconds.
    #[arg(long)]
    eat_ms: Option<u64>,

    /// Give up an acquire after this many milliseconds and think again.
    #[arg(long)]
    acquire_timeout_ms: Option<u64>,

    /// Print the final report as JSON. Implies --quiet.
    #[arg(long)]
    json: bool,

    /// Skip the per-event lines and print only the report.
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    /// Defaults < config file < environment < flags.
    fn load_config(&self) -> Result<SessionConfig> {
        let config = match &self.config {
            Some(path) => SessionConfig::from_file(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => SessionConfig::default(),
        };
        let mut config = config.with_env()?;

        if let Some(agents) = self.agents {
            config.agents = agents;
        }
        if let Some(iterations) = self.iterations {
            config.iterations = Some(iterations);
        }
        if let Some(think_ms) = self.think_ms {
            config.think_ms = think_ms;
        }
        if let Some(eat_ms) = self.eat_ms {
            config.eat_ms = eat_ms;
        }
        if let Some(timeout) = self.acquire_timeout_ms {
            config.acquire_timeout_ms = Some(timeout);
        }

        config.validate()?;
        Ok(config)
    }

    /// Event lines would break the JSON document on stdout.
    fn print_events(&self) -> bool {
        !self.quiet && !self.json
    }
}

// ============================================================================
// Event Printer
// ============================================================================

/// Writes one line per ring event to stdout.
///
/// Write errors are dropped: a closed pipe must not unwind an agent.
struct PrintObserver;

impl RingObserver for PrintObserver {
    fn on_event(&self, event: &RingEvent) {
        let _ = writeln!(std::io::stdout().lock(), "{}", event);
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.load_config()?;
    let workload = config.workload();

    let session = if args.print_events() {
        Session::start_with_observer(&config, workload, Arc::new(PrintObserver))?
    } else {
        Session::start(&config, workload)?
    };

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut ticker = tokio::time::interval(Duration::from_millis(50));

    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                result.context("failed to listen for Ctrl-C")?;
                tracing::info!("interrupted, stopping agents");
                session.stop();
                break;
            }
            _ = ticker.tick() => {
                if session.is_finished() {
                    break;
                }
            }
        }
    }

    let report = tokio::task::spawn_blocking(move || session.join()).await??;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report);
    }

    Ok(())
}
