use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::debug;

use super::regression::{fit_trend, TrendDirection};
use crate::benchmarks::records::BenchmarkRecord;
use crate::benchmarks::synonyms::SynonymTable;
use crate::types::{round_dp, with_metadata, ComputationOutput, MetricMap, MetricType};
use crate::BenchmarkResult;

/// Fewer points than this and the regression is not trusted.
pub const MIN_HISTORY_POINTS: usize = 3;

const FALLBACK_CONFIDENCE: Decimal = dec!(0.4);
const MIN_CONFIDENCE: Decimal = dec!(0.3);
const MAX_CONFIDENCE: Decimal = dec!(0.95);

/// Ratio of last period's benchmark to the tenant's current value, used when
/// there is not enough history to regress on.
pub fn historical_multiplier(metric: MetricType) -> Decimal {
    match metric {
        MetricType::Revenue => dec!(0.92),
        MetricType::Profit => dec!(0.90),
        MetricType::Margin => dec!(0.97),
        MetricType::Turnover => dec!(0.95),
        MetricType::Volume => dec!(0.93),
        MetricType::Growth => dec!(0.85),
    }
}

/// Next-period benchmark projection for one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalTrend {
    pub metric: MetricType,
    pub value: Decimal,
    pub trend: TrendDirection,
    pub confidence: Decimal,
    pub data_points: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slope: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r_squared: Option<Decimal>,
}

/// Project each metric's benchmark one period ahead from its history.
///
/// History is grouped through the synonym table and ordered by
/// `period_start_date`. Metrics with fewer than [`MIN_HISTORY_POINTS`]
/// points fall back to `current × historical_multiplier`. Every metric is
/// present in the result.
pub fn historical_trends(
    history: &[BenchmarkRecord],
    current: &MetricMap,
    synonyms: &SynonymTable,
) -> BTreeMap<MetricType, HistoricalTrend> {
    let mut grouped: BTreeMap<MetricType, Vec<&BenchmarkRecord>> = BTreeMap::new();
    for record in history {
        if let Some(metric) = synonyms.resolve(&record.metric_name) {
            grouped.entry(metric).or_default().push(record);
        }
    }

    MetricType::ALL
        .into_iter()
        .map(|metric| {
            let mut points = grouped.remove(&metric).unwrap_or_default();
            points.sort_by_key(|r| r.period_start_date);
            let series: Vec<Decimal> = points.iter().map(|r| r.value).collect();
            let current_value = current.get(&metric).copied().unwrap_or(Decimal::ZERO);
            (metric, project_metric(metric, &series, current_value))
        })
        .collect()
}

fn project_metric(metric: MetricType, series: &[Decimal], current: Decimal) -> HistoricalTrend {
    if series.len() < MIN_HISTORY_POINTS {
        debug!(
            metric = %metric,
            points = series.len(),
            "insufficient history, applying fixed multiplier"
        );
        return HistoricalTrend {
            metric,
            value: current * historical_multiplier(metric),
            trend: TrendDirection::InsufficientData,
            confidence: FALLBACK_CONFIDENCE,
            data_points: series.len(),
            slope: None,
            r_squared: None,
        };
    }

    let fit = fit_trend(series);
    // Benchmarks are non-negative; a steep decline projects to zero, not below.
    let projected = fit.project(series.len(), 1).max(Decimal::ZERO);
    HistoricalTrend {
        metric,
        value: round_dp(projected, 4),
        trend: fit.direction(series),
        confidence: round_dp(fit.r_squared.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE), 4),
        data_points: series.len(),
        slope: Some(round_dp(fit.slope, 6)),
        r_squared: Some(round_dp(fit.r_squared, 6)),
    }
}

// ---------------------------------------------------------------------------
// Envelope function
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalTrendInput {
    #[serde(default)]
    pub history: Vec<BenchmarkRecord>,
    pub current_metrics: MetricMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synonyms: Option<SynonymTable>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalTrendOutput {
    pub trends: BTreeMap<MetricType, HistoricalTrend>,
    /// Metrics projected by multiplier rather than regression
    pub fallback_metrics: Vec<MetricType>,
}

pub fn project_historical_trends(
    input: &HistoricalTrendInput,
) -> BenchmarkResult<ComputationOutput<HistoricalTrendOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let synonyms = input.synonyms.clone().unwrap_or_default();
    let trends = historical_trends(&input.history, &input.current_metrics, &synonyms);
    let fallback_metrics: Vec<MetricType> = trends
        .values()
        .filter(|t| t.trend == TrendDirection::InsufficientData)
        .map(|t| t.metric)
        .collect();

    if !fallback_metrics.is_empty() {
        let names: Vec<&str> = fallback_metrics.iter().map(|m| m.as_str()).collect();
        warnings.push(format!(
            "Fewer than {MIN_HISTORY_POINTS} historical points for {}; fixed multipliers applied",
            names.join(", ")
        ));
    }
    for metric in MetricType::ALL {
        if !input.current_metrics.contains_key(&metric) {
            warnings.push(format!("No current value for {metric}; treated as 0"));
        }
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "One-period-ahead OLS projection of historical benchmark series",
        &serde_json::json!({
            "min_points": MIN_HISTORY_POINTS,
            "confidence": "min(0.95, max(0.3, r_squared)); 0.4 on fallback",
            "synonym_version": synonyms.version,
            "history_records": input.history.len(),
        }),
        warnings,
        elapsed,
        HistoricalTrendOutput {
            trends,
            fallback_metrics,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmarks::records::{BenchmarkSource, DataQuality, Region};
    use crate::types::zeroed_metric_map;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn point(name: &str, month: u32, value: Decimal) -> BenchmarkRecord {
        BenchmarkRecord {
            metric_name: name.into(),
            value,
            percentile_25: None,
            percentile_50: None,
            percentile_75: None,
            percentile_90: None,
            sample_size: 200,
            priority_weight: Decimal::ONE,
            data_quality: DataQuality::Verified,
            source: BenchmarkSource::GovernmentStatistics,
            region: Region::National,
            period_start_date: NaiveDate::from_ymd_opt(2024, month, 1).unwrap(),
            expiry_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            is_active: true,
            category: None,
        }
    }

    #[test]
    fn test_empty_growth_history_uses_multiplier() {
        let mut current = zeroed_metric_map();
        current.insert(MetricType::Growth, dec!(18.3));
        let trends = historical_trends(&[], &current, &SynonymTable::builtin());
        let growth = &trends[&MetricType::Growth];
        assert_eq!(growth.value, dec!(15.555));
        assert_eq!(growth.trend, TrendDirection::InsufficientData);
        assert_eq!(growth.confidence, dec!(0.4));
        assert_eq!(trends.len(), 6);
    }

    #[test]
    fn test_regression_path_orders_by_period_and_projects() {
        // Supplied out of order; synonyms fold into margin
        let history = vec![
            point("gross_margin", 3, dec!(24)),
            point("margin", 1, dec!(22)),
            point("profit margin", 2, dec!(23)),
            point("net_margin", 4, dec!(25)),
        ];
        let trends = historical_trends(&history, &zeroed_metric_map(), &SynonymTable::builtin());
        let margin = &trends[&MetricType::Margin];
        assert_eq!(margin.value, dec!(26));
        assert_eq!(margin.trend, TrendDirection::Increasing);
        assert_eq!(margin.confidence, dec!(0.95));
        assert_eq!(margin.data_points, 4);
        assert_eq!(margin.slope, Some(dec!(1)));
    }

    #[test]
    fn test_national_revenue_history_projects() {
        let history = vec![
            point("revenue", 1, dec!(1000000000000000)),
            point("revenue", 2, dec!(2000000000000000)),
            point("revenue", 3, dec!(3000000000000000)),
        ];
        let trends = historical_trends(&history, &zeroed_metric_map(), &SynonymTable::builtin());
        let revenue = &trends[&MetricType::Revenue];
        assert_eq!(revenue.value, dec!(4000000000000000));
        assert_eq!(revenue.trend, TrendDirection::Increasing);
        assert_eq!(revenue.r_squared, Some(Decimal::ONE));
    }

    #[test]
    fn test_two_points_still_fall_back() {
        let history = vec![point("revenue", 1, dec!(100)), point("revenue", 2, dec!(110))];
        let mut current = zeroed_metric_map();
        current.insert(MetricType::Revenue, dec!(1000));
        let trends = historical_trends(&history, &current, &SynonymTable::builtin());
        let revenue = &trends[&MetricType::Revenue];
        assert_eq!(revenue.value, dec!(920));
        assert_eq!(revenue.data_points, 2);
        assert_eq!(revenue.slope, None);
    }

    #[test]
    fn test_low_fit_confidence_floored() {
        let history = vec![
            point("turnover", 1, dec!(5)),
            point("turnover", 2, dec!(9)),
            point("turnover", 3, dec!(4)),
            point("turnover", 4, dec!(8)),
            point("turnover", 5, dec!(5)),
        ];
        let trends = historical_trends(&history, &zeroed_metric_map(), &SynonymTable::builtin());
        assert_eq!(trends[&MetricType::Turnover].confidence, dec!(0.3));
    }

    #[test]
    fn test_steep_decline_projects_to_zero() {
        let history = vec![
            point("volume", 1, dec!(30)),
            point("volume", 2, dec!(15)),
            point("volume", 3, dec!(1)),
        ];
        let trends = historical_trends(&history, &zeroed_metric_map(), &SynonymTable::builtin());
        assert_eq!(trends[&MetricType::Volume].value, Decimal::ZERO);
        assert_eq!(trends[&MetricType::Volume].trend, TrendDirection::Decreasing);
    }

    #[test]
    fn test_envelope_lists_fallback_metrics() {
        let out = project_historical_trends(&HistoricalTrendInput {
            history: vec![
                point("revenue", 1, dec!(100)),
                point("revenue", 2, dec!(110)),
                point("revenue", 3, dec!(120)),
            ],
            current_metrics: zeroed_metric_map(),
            synonyms: None,
        })
        .unwrap();
        assert_eq!(out.result.fallback_metrics.len(), 5);
        assert!(!out.result.fallback_metrics.contains(&MetricType::Revenue));
        assert_eq!(out.result.trends[&MetricType::Revenue].value, dec!(130));
        assert_eq!(out.warnings.len(), 1);
    }
}
