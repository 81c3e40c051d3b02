use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::MetricType;

// ---------------------------------------------------------------------------
// Record attributes
// ---------------------------------------------------------------------------

/// Provenance quality of a benchmark record, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataQuality {
    Verified,
    Preliminary,
    Estimated,
}

impl DataQuality {
    /// Higher is better.
    pub fn rank(&self) -> u8 {
        match self {
            DataQuality::Verified => 3,
            DataQuality::Preliminary => 2,
            DataQuality::Estimated => 1,
        }
    }
}

/// Publisher of a benchmark record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BenchmarkSource {
    #[serde(rename = "government-stat")]
    GovernmentStatistics,
    #[serde(rename = "trade-association")]
    TradeAssociation,
    #[serde(rename = "market-estimate")]
    MarketEstimate,
    #[serde(rename = "industry-report")]
    IndustryReport,
    #[serde(rename = "internal-survey")]
    InternalSurvey,
}

/// Geographic coverage of a benchmark record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    National,
    Regional,
    Provincial,
    City,
}

/// The kind of benchmark a tenant is compared against. Each kind carries
/// its own eligibility policy and intelligent-default table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchmarkType {
    IndustryStandard,
    CategoryAverage,
    BestPerformer,
}

impl BenchmarkType {
    pub const ALL: [BenchmarkType; 3] = [
        BenchmarkType::IndustryStandard,
        BenchmarkType::CategoryAverage,
        BenchmarkType::BestPerformer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BenchmarkType::IndustryStandard => "industry_standard",
            BenchmarkType::CategoryAverage => "category_average",
            BenchmarkType::BestPerformer => "best_performer",
        }
    }
}

impl fmt::Display for BenchmarkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Stored record
// ---------------------------------------------------------------------------

fn default_priority_weight() -> Decimal {
    Decimal::ONE
}

fn default_active() -> bool {
    true
}

/// A single external data point for one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    /// Free-text metric name as published, e.g. "gross_margin"
    pub metric_name: String,
    pub value: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentile_25: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentile_50: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentile_75: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentile_90: Option<Decimal>,
    /// Number of businesses behind the figure
    #[serde(default)]
    pub sample_size: u32,
    /// Editorial weight, must be positive
    #[serde(default = "default_priority_weight")]
    pub priority_weight: Decimal,
    pub data_quality: DataQuality,
    pub source: BenchmarkSource,
    pub region: Region,
    pub period_start_date: NaiveDate,
    pub expiry_date: NaiveDate,
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Retail category the figure describes, when not market-wide
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl BenchmarkRecord {
    /// All four percentile brackets, when the record publishes a full set.
    pub fn percentile_set(&self) -> Option<PercentileSet> {
        Some(PercentileSet {
            percentile_25: self.percentile_25?,
            percentile_50: self.percentile_50?,
            percentile_75: self.percentile_75?,
            percentile_90: self.percentile_90?,
        })
    }

    pub fn is_expired(&self, as_of: NaiveDate) -> bool {
        self.expiry_date <= as_of
    }
}

/// A coherent 25/50/75/90 percentile set from a single distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PercentileSet {
    pub percentile_25: Decimal,
    pub percentile_50: Decimal,
    pub percentile_75: Decimal,
    pub percentile_90: Decimal,
}

impl PercentileSet {
    /// The set with brackets in ascending order.
    pub fn sorted(&self) -> PercentileSet {
        let mut v = [
            self.percentile_25,
            self.percentile_50,
            self.percentile_75,
            self.percentile_90,
        ];
        v.sort();
        PercentileSet {
            percentile_25: v[0],
            percentile_50: v[1],
            percentile_75: v[2],
            percentile_90: v[3],
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregated result
// ---------------------------------------------------------------------------

/// Quality label of an aggregated benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateQuality {
    /// Every contributing record verified
    Verified,
    /// Verified and unverified records combined
    Mixed,
    Preliminary,
    Estimated,
    /// No eligible data; intelligent default substituted
    Default,
}

impl AggregateQuality {
    pub fn from_records<'a>(qualities: impl IntoIterator<Item = &'a DataQuality>) -> Self {
        let (mut total, mut verified, mut preliminary) = (0usize, 0usize, 0usize);
        for q in qualities {
            total += 1;
            match q {
                DataQuality::Verified => verified += 1,
                DataQuality::Preliminary => preliminary += 1,
                DataQuality::Estimated => {}
            }
        }
        if total == 0 {
            AggregateQuality::Default
        } else if verified == total {
            AggregateQuality::Verified
        } else if verified > 0 {
            AggregateQuality::Mixed
        } else if preliminary > 0 {
            AggregateQuality::Preliminary
        } else {
            AggregateQuality::Estimated
        }
    }
}

/// Consensus benchmark for one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedBenchmark {
    pub metric_type: MetricType,
    /// Weighted mean of eligible record values
    pub value: Decimal,
    pub percentile_25: Decimal,
    pub percentile_50: Decimal,
    pub percentile_75: Decimal,
    pub percentile_90: Decimal,
    /// Sum of contributing sample sizes
    pub sample_size: u64,
    /// Number of records combined
    pub source_count: usize,
    pub data_quality: AggregateQuality,
    pub last_updated: DateTime<Utc>,
    /// False when any bracket was scaled from the consensus value
    pub percentiles_observed: bool,
}

impl AggregatedBenchmark {
    pub fn percentile_set(&self) -> PercentileSet {
        PercentileSet {
            percentile_25: self.percentile_25,
            percentile_50: self.percentile_50,
            percentile_75: self.percentile_75,
            percentile_90: self.percentile_90,
        }
    }

    pub fn is_default(&self) -> bool {
        self.data_quality == AggregateQuality::Default
    }
}
