use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use gimps_lite::config::RunnerConfig;
use gimps_lite::runner::Runner;
use gimps_lite::shutdown::install_shutdown_handler;
use gimps_lite::worker::{CheckRequest, MersenneExecutor, Verdict};

#[derive(Parser, Debug)]
#[command(name = "gimps-lite")]
#[command(version)]
#[command(about = "A lease-based task broker for distributed Mersenne-prime checking")]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the broker with a local worker pool until the backlog drains
    Run(RunArgs),

    /// Check a single exponent without going through the broker
    Check(CheckArgs),
}

// =============================================================================
// Run Arguments
// =============================================================================

#[derive(Parser, Debug)]
struct RunArgs {
    /// Path to the task source (one Mersenne exponent per line)
    #[arg(long)]
    source: PathBuf,

    /// Number of local worker loops
    #[arg(long, default_value = "4")]
    workers: usize,

    /// Lease time-to-live in seconds
    #[arg(long, default_value = "60")]
    lease_ttl_secs: u64,

    /// Sweep interval in seconds
    #[arg(long, default_value = "5")]
    sweep_interval_secs: u64,

    /// Worker poll interval in milliseconds
    #[arg(long, default_value = "500")]
    poll_interval_ms: u64,

    /// Append completed check reports to this file (one JSON object per line)
    #[arg(long)]
    results: Option<PathBuf>,
}

// =============================================================================
// Check Arguments
// =============================================================================

#[derive(Parser, Debug)]
struct CheckArgs {
    /// The Mersenne exponent to check
    exponent: u64,

    /// Output format
    #[arg(long, short = 'o', default_value = "table")]
    output: OutputFormat,
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

// =============================================================================
// Broker Implementation
// =============================================================================

async fn run_broker(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = RunnerConfig::default()
        .with_lease_ttl(Duration::from_secs(args.lease_ttl_secs))
        .with_sweep_interval(Duration::from_secs(args.sweep_interval_secs))
        .with_poll_interval(Duration::from_millis(args.poll_interval_ms))
        .with_workers(args.workers);
    if let Some(results) = args.results {
        config = config.with_results_path(results);
    }

    let runner = Runner::new(config)?;
    let loaded = runner.load_tasks(&args.source).await?;

    tracing::info!(
        tasks = loaded,
        workers = args.workers,
        lease_ttl_secs = args.lease_ttl_secs,
        sweep_interval_secs = args.sweep_interval_secs,
        source = %args.source.display(),
        "Starting gimps-lite broker"
    );

    let shutdown = install_shutdown_handler();
    let status = runner.run(shutdown).await;

    tracing::info!(
        completed = status.completed,
        ready = status.ready,
        leased = status.leased,
        "Broker stopped"
    );

    Ok(())
}

// =============================================================================
// Check Command
// =============================================================================

fn run_check(args: CheckArgs) -> Result<(), Box<dyn std::error::Error>> {
    let executor = MersenneExecutor::new();
    let report = executor.check(CheckRequest {
        exponent: args.exponent,
    });

    match args.output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Table => {
            println!("Exponent: {}", report.exponent);
            println!("Verdict:  {}", report.verdict);
            if report.verdict == Verdict::MersennePrime {
                if let Some(parity) = report.perfect_number_parity {
                    println!(
                        "Perfect:  2^{} * (2^{} - 1) is an {} perfect number",
                        report.exponent - 1,
                        report.exponent,
                        parity
                    );
                }
            }
            println!("Elapsed:  {} ms", report.elapsed_ms);
        }
    }
    Ok(())
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    match args.command {
        Commands::Run(run_args) => {
            run_broker(run_args).await?;
        }
        Commands::Check(check_args) => {
            run_check(check_args)?;
        }
    }

    Ok(())
}
