use chrono::{Duration, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::BenchmarkError;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Percentages expressed as percentages (25.8 = 25.8%), the unit every
/// benchmark record and report in this engine uses.
pub type Percent = Decimal;

/// The closed set of business metrics the engine benchmarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    Revenue,
    Profit,
    Margin,
    Turnover,
    Volume,
    Growth,
}

impl MetricType {
    pub const ALL: [MetricType; 6] = [
        MetricType::Revenue,
        MetricType::Profit,
        MetricType::Margin,
        MetricType::Turnover,
        MetricType::Volume,
        MetricType::Growth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Revenue => "revenue",
            MetricType::Profit => "profit",
            MetricType::Margin => "margin",
            MetricType::Turnover => "turnover",
            MetricType::Volume => "volume",
            MetricType::Growth => "growth",
        }
    }

    /// Human label used in recommendations and insights.
    pub fn label(&self) -> &'static str {
        match self {
            MetricType::Revenue => "Revenue",
            MetricType::Profit => "Profit",
            MetricType::Margin => "Profit margin",
            MetricType::Turnover => "Inventory turnover",
            MetricType::Volume => "Sales volume",
            MetricType::Growth => "Revenue growth",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parse of canonical metric names. Free-text synonyms from benchmark
/// feeds go through the aggregator's synonym table instead.
impl FromStr for MetricType {
    type Err = BenchmarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        MetricType::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| {
                BenchmarkError::invalid("metric", format!("Unsupported metric '{}'", s.trim()))
            })
    }
}

/// One value per metric, ordered by metric.
pub type MetricMap = BTreeMap<MetricType, Decimal>;

/// A map holding zero for every metric.
pub fn zeroed_metric_map() -> MetricMap {
    MetricType::ALL.into_iter().map(|m| (m, Decimal::ZERO)).collect()
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, BenchmarkError> {
        let range = DateRange { start, end };
        range.validate()?;
        Ok(range)
    }

    /// The `days`-long window ending on `end` (inclusive).
    pub fn trailing_days(end: NaiveDate, days: u32) -> Result<Self, BenchmarkError> {
        let span = i64::from(days.max(1)) - 1;
        let start = shift_back(end, span)?;
        Ok(DateRange { start, end })
    }

    pub fn validate(&self) -> Result<(), BenchmarkError> {
        if self.start > self.end {
            return Err(BenchmarkError::invalid(
                "date_range",
                format!("start {} is after end {}", self.start, self.end),
            ));
        }
        Ok(())
    }

    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// The period of identical length immediately before this one.
    pub fn preceding(&self) -> Result<Self, BenchmarkError> {
        let end = shift_back(self.start, 1)?;
        let start = shift_back(end, self.len_days() - 1)?;
        Ok(DateRange { start, end })
    }
}

fn shift_back(date: NaiveDate, days: i64) -> Result<NaiveDate, BenchmarkError> {
    date.checked_sub_signed(Duration::days(days)).ok_or_else(|| {
        BenchmarkError::invalid(
            "date_range",
            format!("{days} days before {date} is outside the supported calendar"),
        )
    })
}

/// Optional location / category slicing of transactional data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DimensionFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
}

/// Coarse business-size classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeTier {
    Small,
    Medium,
    Large,
}

impl fmt::Display for SizeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeTier::Small => f.write_str("small"),
            SizeTier::Medium => f.write_str("medium"),
            SizeTier::Large => f.write_str("large"),
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

/// Round half away from zero to `dp` places.
pub fn round_dp(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// `numerator / denominator * 100`, or zero when the denominator is not positive.
pub fn percent_of(numerator: Decimal, denominator: Decimal) -> Percent {
    if denominator <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        numerator / denominator * Decimal::ONE_HUNDRED
    }
}
