use chrono::{DateTime, Utc};
use clap::Args;
use serde_json::Value;

use retail_bench_core::benchmarks::{self, AggregationInput, IntelligentDefaults};

use crate::input;

/// Arguments for benchmark aggregation
#[derive(Args)]
pub struct AggregateArgs {
    /// Path to JSON/YAML file with benchmark records
    #[arg(long)]
    pub input: Option<String>,

    /// Override the benchmark type: industry_standard, category_average, best_performer
    #[arg(long = "type")]
    pub benchmark_type: Option<String>,

    /// Override the aggregation timestamp (RFC 3339)
    #[arg(long)]
    pub as_of: Option<DateTime<Utc>>,
}

pub fn run_aggregate(
    args: AggregateArgs,
    defaults: Option<IntelligentDefaults>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut agg_input: AggregationInput = input::load(&args.input, "aggregation input")?;
    if let Some(ref name) = args.benchmark_type {
        agg_input.benchmark_type = super::parse_benchmark_type(name)?;
    }
    if let Some(as_of) = args.as_of {
        agg_input.as_of = as_of;
    }
    if agg_input.defaults.is_none() {
        agg_input.defaults = defaults;
    }

    let result = benchmarks::aggregate_benchmarks(&agg_input)?;
    Ok(serde_json::to_value(result)?)
}
