use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

use super::recommendations::recommendations;
use crate::benchmarks::records::{AggregatedBenchmark, BenchmarkRecord, PercentileSet};
use crate::types::{percent_of, round_dp, with_metadata, ComputationOutput, MetricType, Percent};
use crate::BenchmarkResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Performance band, worst first so that `Ord` follows quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceCategory {
    Poor,
    BelowAverage,
    Average,
    AboveAverage,
    Excellent,
}

impl PerformanceCategory {
    /// Fixed percentile-rank anchor reported for the band.
    pub fn percentile_anchor(&self) -> Decimal {
        match self {
            PerformanceCategory::Excellent => dec!(95),
            PerformanceCategory::AboveAverage => dec!(82),
            PerformanceCategory::Average => dec!(62),
            PerformanceCategory::BelowAverage => dec!(37),
            PerformanceCategory::Poor => dec!(15),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceCategory::Excellent => "excellent",
            PerformanceCategory::AboveAverage => "above_average",
            PerformanceCategory::Average => "average",
            PerformanceCategory::BelowAverage => "below_average",
            PerformanceCategory::Poor => "poor",
        }
    }
}

impl fmt::Display for PerformanceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationBasis {
    /// Bracketed against a full 25/50/75/90 set
    Percentile,
    /// Thresholds on current / benchmark
    Ratio,
}

/// The figure a current value is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkReference {
    pub value: Decimal,
    /// Only a complete set from one distribution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentiles: Option<PercentileSet>,
}

impl BenchmarkReference {
    pub fn ratio_only(value: Decimal) -> Self {
        Self {
            value,
            percentiles: None,
        }
    }
}

/// Brackets scaled from the consensus value carry no distribution, so only
/// observed sets and the default tables take the percentile path.
impl From<&AggregatedBenchmark> for BenchmarkReference {
    fn from(b: &AggregatedBenchmark) -> Self {
        let percentiles = if b.percentiles_observed || b.is_default() {
            Some(b.percentile_set())
        } else {
            None
        };
        Self {
            value: b.value,
            percentiles,
        }
    }
}

impl From<&BenchmarkRecord> for BenchmarkReference {
    fn from(r: &BenchmarkRecord) -> Self {
        Self {
            value: r.value,
            percentiles: r.percentile_set(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub metric_type: MetricType,
    pub current_value: Decimal,
    pub benchmark_value: Decimal,
    pub relative_performance_pct: Percent,
    /// 0-100
    pub percentile_rank: Decimal,
    pub performance_category: PerformanceCategory,
    /// How far below the benchmark, never negative
    pub improvement_gap: Decimal,
    pub recommendations: Vec<String>,
    pub classification_basis: ClassificationBasis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSummary {
    /// Mean relative performance across the compared metrics
    pub overall_score: Percent,
    pub above_benchmark: usize,
    pub below_benchmark: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_metric: Option<MetricType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom_metric: Option<MetricType>,
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

fn classify_by_percentiles(current: Decimal, set: &PercentileSet) -> PerformanceCategory {
    let set = set.sorted();
    if current >= set.percentile_90 {
        PerformanceCategory::Excellent
    } else if current >= set.percentile_75 {
        PerformanceCategory::AboveAverage
    } else if current >= set.percentile_50 {
        PerformanceCategory::Average
    } else if current >= set.percentile_25 {
        PerformanceCategory::BelowAverage
    } else {
        PerformanceCategory::Poor
    }
}

fn classify_by_ratio(current: Decimal, benchmark: Decimal) -> PerformanceCategory {
    if benchmark <= Decimal::ZERO {
        return PerformanceCategory::Average;
    }
    let relative = percent_of(current, benchmark);
    if relative >= dec!(120) {
        PerformanceCategory::Excellent
    } else if relative >= dec!(110) {
        PerformanceCategory::AboveAverage
    } else if relative >= dec!(90) {
        PerformanceCategory::Average
    } else if relative >= dec!(70) {
        PerformanceCategory::BelowAverage
    } else {
        PerformanceCategory::Poor
    }
}

/// Compare one metric against its benchmark.
///
/// A full percentile set takes precedence over the ratio thresholds.
pub fn compare(metric: MetricType, current: Decimal, reference: &BenchmarkReference) -> ComparisonResult {
    let (category, basis) = match &reference.percentiles {
        Some(set) => (classify_by_percentiles(current, set), ClassificationBasis::Percentile),
        None => (classify_by_ratio(current, reference.value), ClassificationBasis::Ratio),
    };

    ComparisonResult {
        metric_type: metric,
        current_value: current,
        benchmark_value: reference.value,
        relative_performance_pct: round_dp(percent_of(current, reference.value), 2),
        percentile_rank: category.percentile_anchor(),
        performance_category: category,
        improvement_gap: round_dp((reference.value - current).max(Decimal::ZERO), 2),
        recommendations: recommendations(metric, category),
        classification_basis: basis,
    }
}

pub fn summarize(results: &[ComparisonResult]) -> BenchmarkSummary {
    if results.is_empty() {
        return BenchmarkSummary {
            overall_score: Decimal::ZERO,
            above_benchmark: 0,
            below_benchmark: 0,
            top_metric: None,
            bottom_metric: None,
        };
    }

    let total: Decimal = results.iter().map(|r| r.relative_performance_pct).sum();
    let overall_score = round_dp(total / Decimal::from(results.len() as u64), 2);

    // Ties resolve to the metric listed first
    let mut top = &results[0];
    let mut bottom = &results[0];
    for r in &results[1..] {
        if r.relative_performance_pct > top.relative_performance_pct {
            top = r;
        }
        if r.relative_performance_pct < bottom.relative_performance_pct {
            bottom = r;
        }
    }

    BenchmarkSummary {
        overall_score,
        above_benchmark: results
            .iter()
            .filter(|r| r.current_value > r.benchmark_value)
            .count(),
        below_benchmark: results
            .iter()
            .filter(|r| r.current_value < r.benchmark_value)
            .count(),
        top_metric: Some(top.metric_type),
        bottom_metric: Some(bottom.metric_type),
    }
}

// ---------------------------------------------------------------------------
// Envelope function
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonInput {
    pub metric: MetricType,
    pub current_value: Decimal,
    pub benchmark: BenchmarkReference,
}

pub fn compare_metric(input: &ComparisonInput) -> BenchmarkResult<ComputationOutput<ComparisonResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.benchmark.value <= Decimal::ZERO {
        warnings.push("Benchmark value is not positive; relative performance reported as 0".into());
    }
    if input.benchmark.percentiles.is_none() {
        warnings.push("No complete percentile set; classified by ratio thresholds".into());
    }

    let result = compare(input.metric, input.current_value, &input.benchmark);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Percentile-bracket classification with ratio-threshold fallback",
        &serde_json::json!({
            "percentile_anchors": { "excellent": 95, "above_average": 82, "average": 62,
                                    "below_average": 37, "poor": 15 },
            "ratio_thresholds_pct": { "excellent": 120, "above_average": 110, "average": 90,
                                      "below_average": 70 },
        }),
        warnings,
        elapsed,
        result,
    ))
}
