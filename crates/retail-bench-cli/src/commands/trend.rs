use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use retail_bench_core::trends::{self, HistoricalTrendInput, TrendInput};

use crate::input;

/// Arguments for fitting a trend to a single series
#[derive(Args)]
pub struct TrendArgs {
    /// Path to JSON/YAML file with a `series` array
    #[arg(long)]
    pub input: Option<String>,

    /// Comma-separated observations, oldest first (e.g. "24.0,24.5,25.1")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub series: Option<Vec<Decimal>>,

    /// Periods past the last observation to project
    #[arg(long, default_value = "1")]
    pub steps_ahead: u32,
}

/// Arguments for projecting benchmark history forward
#[derive(Args)]
pub struct HistoricalTrendArgs {
    /// Path to JSON/YAML file with history records and current metrics
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_trend(args: TrendArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let trend_input = if let Some(series) = args.series {
        TrendInput {
            series,
            steps_ahead: args.steps_ahead,
        }
    } else {
        input::load(&args.input, "trend input")?
    };

    let result = trends::analyze_trend(&trend_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_historical_trend(args: HistoricalTrendArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let history_input: HistoricalTrendInput = input::load(&args.input, "historical trend input")?;
    let result = trends::project_historical_trends(&history_input)?;
    Ok(serde_json::to_value(result)?)
}
