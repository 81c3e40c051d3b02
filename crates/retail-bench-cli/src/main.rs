mod commands;
mod input;
mod output;
mod settings;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::aggregate::AggregateArgs;
use commands::analyze::AnalyzeArgs;
use commands::compare::CompareArgs;
use commands::metrics::MetricsArgs;
use commands::peers::PeersArgs;
use commands::trend::{HistoricalTrendArgs, TrendArgs};
use retail_bench_core::benchmarks::IntelligentDefaults;

/// Retail benchmarking and competitive positioning
#[derive(Parser)]
#[command(
    name = "rbench",
    version,
    about = "Retail benchmarking and competitive positioning",
    long_about = "A CLI for benchmarking a retailer's performance against industry data \
                  with decimal precision. Computes tenant metrics, aggregates published \
                  benchmarks, projects trends, synthesises peer cohorts and classifies \
                  performance."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Engine configuration file (also read from RBENCH_* environment variables)
    #[arg(long, global = true, env = "RBENCH_CONFIG")]
    config: Option<String>,

    /// JSON/YAML file replacing the built-in intelligent-default benchmarks
    #[arg(long, global = true)]
    defaults: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate a tenant's six performance metrics from sales and inventory rows
    Metrics(MetricsArgs),
    /// Aggregate published benchmark records into one benchmark per metric
    Aggregate(AggregateArgs),
    /// Fit a linear trend to a series and project it forward
    Trend(TrendArgs),
    /// Project next-period benchmarks from historical records
    HistoricalTrend(HistoricalTrendArgs),
    /// Generate a synthetic peer cohort
    Peers(PeersArgs),
    /// Compare one metric against its benchmark
    Compare(CompareArgs),
    /// Run a full benchmarking analysis over an offline dataset
    Analyze(AnalyzeArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("retail_bench_core=warn,rbench=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_defaults(path: Option<&str>) -> Result<Option<IntelligentDefaults>, Box<dyn std::error::Error>> {
    path.map(input::file::read_json::<IntelligentDefaults>).transpose()
}

fn run(cli: Cli) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let defaults = load_defaults(cli.defaults.as_deref())?;
    match cli.command {
        Commands::Version => Ok(serde_json::json!({ "rbench": env!("CARGO_PKG_VERSION") })),
        Commands::Metrics(args) => commands::metrics::run_metrics(args),
        Commands::Aggregate(args) => commands::aggregate::run_aggregate(args, defaults),
        Commands::Trend(args) => commands::trend::run_trend(args),
        Commands::HistoricalTrend(args) => commands::trend::run_historical_trend(args),
        Commands::Peers(args) => commands::peers::run_peers(args),
        Commands::Compare(args) => commands::compare::run_compare(args),
        Commands::Analyze(args) => {
            let config = settings::load_engine_config(cli.config.as_deref())?;
            commands::analyze::run_analyze(args, config, defaults)
        }
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if matches!(cli.command, Commands::Version) {
        println!("rbench {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let format = cli.output.clone();
    match run(cli) {
        Ok(value) => {
            output::format_output(&format, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
