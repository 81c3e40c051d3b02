use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use retail_bench_core::benchmarks::PercentileSet;
use retail_bench_core::comparison::{self, BenchmarkReference, ComparisonInput};
use retail_bench_core::MetricType;

use crate::input;

/// Arguments for comparing one metric against its benchmark
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct CompareArgs {
    /// Path to JSON/YAML comparison input
    #[arg(long)]
    pub input: Option<String>,

    /// Metric name: revenue, profit, margin, turnover, volume, growth
    #[arg(long)]
    pub metric: Option<MetricType>,

    /// Tenant's current value
    #[arg(long)]
    pub current: Option<Decimal>,

    /// Benchmark (median) value
    #[arg(long)]
    pub benchmark: Option<Decimal>,

    /// 25th percentile; with --p50, --p75 and --p90 enables percentile classification
    #[arg(long)]
    pub p25: Option<Decimal>,

    #[arg(long)]
    pub p50: Option<Decimal>,

    #[arg(long)]
    pub p75: Option<Decimal>,

    #[arg(long)]
    pub p90: Option<Decimal>,
}

pub fn run_compare(args: CompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let cmp_input: ComparisonInput = if args.input.is_some() || args.metric.is_none() {
        input::load(&args.input, "comparison input")?
    } else {
        let percentiles = match (args.p25, args.p50, args.p75, args.p90) {
            (Some(p25), Some(p50), Some(p75), Some(p90)) => Some(PercentileSet {
                percentile_25: p25,
                percentile_50: p50,
                percentile_75: p75,
                percentile_90: p90,
            }),
            (None, None, None, None) => None,
            _ => return Err("Give all of --p25, --p50, --p75 and --p90, or none of them".into()),
        };
        ComparisonInput {
            metric: args.metric.ok_or("--metric is required (or provide --input)")?,
            current_value: args.current.ok_or("--current is required (or provide --input)")?,
            benchmark: BenchmarkReference {
                value: args.benchmark.ok_or("--benchmark is required (or provide --input)")?,
                percentiles,
            },
        }
    };

    let result = comparison::compare_metric(&cmp_input)?;
    Ok(serde_json::to_value(result)?)
}
