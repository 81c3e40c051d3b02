use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use retail_bench_core::comparison::PerformanceCategory;
use retail_bench_core::peers::PeerCohort;
use retail_bench_core::{MetricMap, MetricType};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_metrics(input_json: String) -> NapiResult<String> {
    let input: retail_bench_core::metrics::MetricsInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = retail_bench_core::metrics::calculate_metrics(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

#[napi]
pub fn aggregate_benchmarks(input_json: String) -> NapiResult<String> {
    let input: retail_bench_core::benchmarks::AggregationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        retail_bench_core::benchmarks::aggregate_benchmarks(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Trends
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_trend(input_json: String) -> NapiResult<String> {
    let input: retail_bench_core::trends::TrendInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = retail_bench_core::trends::analyze_trend(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn historical_trends(input_json: String) -> NapiResult<String> {
    let input: retail_bench_core::trends::HistoricalTrendInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        retail_bench_core::trends::project_historical_trends(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Peers
// ---------------------------------------------------------------------------

#[napi]
pub fn synthesize_peers(input_json: String) -> NapiResult<String> {
    let input: retail_bench_core::peers::PeerInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        retail_bench_core::peers::synthesize_peer_cohort(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct PeerComparisonInput {
    current_metrics: MetricMap,
    cohort: PeerCohort,
}

#[napi]
pub fn compare_with_peers(input_json: String) -> NapiResult<String> {
    let input: PeerComparisonInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        retail_bench_core::comparison::compare_with_peers(&input.current_metrics, &input.cohort);
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

#[napi]
pub fn compare_metric(input_json: String) -> NapiResult<String> {
    let input: retail_bench_core::comparison::ComparisonInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = retail_bench_core::comparison::compare_metric(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Guidance lines for a metric in a performance band, e.g.
/// `recommendations("margin", "below_average")`.
#[napi]
pub fn recommendations(metric: String, category: String) -> NapiResult<Vec<String>> {
    let metric: MetricType = metric.parse().map_err(to_napi_error)?;
    let category: PerformanceCategory =
        serde_json::from_value(serde_json::Value::String(category)).map_err(to_napi_error)?;
    Ok(retail_bench_core::comparison::recommendations(metric, category))
}
