use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use retail_bench_core::metrics::{self, MetricsInput};

use crate::input;

/// Arguments for tenant metric calculation
#[derive(Args)]
pub struct MetricsArgs {
    /// Path to JSON/YAML file with tenant, sales and inventory rows
    #[arg(long)]
    pub input: Option<String>,

    /// Override the reference date for the default trailing window (YYYY-MM-DD)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

pub fn run_metrics(args: MetricsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut metrics_input: MetricsInput = input::load(&args.input, "metrics input")?;
    if let Some(as_of) = args.as_of {
        metrics_input.as_of = as_of;
    }

    let result = metrics::calculate_metrics(&metrics_input)?;
    Ok(serde_json::to_value(result)?)
}
