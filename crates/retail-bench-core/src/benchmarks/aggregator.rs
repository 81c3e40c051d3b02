use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;
use tracing::warn;

use super::defaults::IntelligentDefaults;
use super::records::{
    AggregateQuality, AggregatedBenchmark, BenchmarkRecord, BenchmarkType, DataQuality,
};
use super::synonyms::SynonymTable;
use crate::types::{round_dp, with_metadata, ComputationOutput, MetricType};
use crate::BenchmarkResult;

/// Ratios applied to the consensus value for percentile brackets the
/// representative record does not publish (p25, p50, p75, p90).
const FALLBACK_PERCENTILE_RATIOS: [Decimal; 4] = [dec!(0.75), dec!(1.00), dec!(1.25), dec!(1.50)];

// ---------------------------------------------------------------------------
// Eligibility policy
// ---------------------------------------------------------------------------

/// Which records a benchmark type is allowed to draw on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationPolicy {
    pub accepted_quality: Vec<DataQuality>,
    pub min_sample_size: u32,
    /// Use each record's percentile-90 as its effective value and rank
    /// representatives by it
    pub prefer_top_decile: bool,
}

impl AggregationPolicy {
    pub fn for_type(benchmark_type: BenchmarkType) -> Self {
        match benchmark_type {
            BenchmarkType::IndustryStandard => AggregationPolicy {
                accepted_quality: vec![DataQuality::Verified],
                min_sample_size: 100,
                prefer_top_decile: false,
            },
            BenchmarkType::CategoryAverage => AggregationPolicy {
                accepted_quality: vec![DataQuality::Verified, DataQuality::Preliminary],
                min_sample_size: 0,
                prefer_top_decile: false,
            },
            BenchmarkType::BestPerformer => AggregationPolicy {
                accepted_quality: vec![DataQuality::Verified, DataQuality::Preliminary],
                min_sample_size: 0,
                prefer_top_decile: true,
            },
        }
    }

    pub fn accepts(&self, record: &BenchmarkRecord, as_of: NaiveDate) -> bool {
        record.is_active
            && !record.is_expired(as_of)
            && self.accepted_quality.contains(&record.data_quality)
            && record.sample_size >= self.min_sample_size
            && record.priority_weight > Decimal::ZERO
    }

    fn effective_value(&self, record: &BenchmarkRecord) -> Decimal {
        if self.prefer_top_decile {
            record.percentile_90.unwrap_or(record.value)
        } else {
            record.value
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Aggregation result with the diagnostics behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationReport {
    pub benchmark_type: BenchmarkType,
    pub benchmarks: BTreeMap<MetricType, AggregatedBenchmark>,
    /// Records that passed the eligibility policy
    pub eligible_records: usize,
    /// Published metric names with no synonym mapping
    pub discarded_names: Vec<String>,
    /// Metrics filled from the intelligent-default table
    pub defaulted_metrics: Vec<MetricType>,
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// Combines raw benchmark records into one consensus figure per metric.
#[derive(Debug, Clone, Default)]
pub struct BenchmarkAggregator {
    synonyms: SynonymTable,
    defaults: IntelligentDefaults,
}

/// `priority_weight × log10(sample_size + 1)`: rewards sample size with
/// diminishing returns so one huge low-priority survey cannot dominate.
pub fn record_weight(record: &BenchmarkRecord) -> Decimal {
    let samples = Decimal::from(u64::from(record.sample_size) + 1);
    record.priority_weight * samples.checked_log10().unwrap_or(Decimal::ZERO)
}

impl BenchmarkAggregator {
    pub fn new(synonyms: SynonymTable, defaults: IntelligentDefaults) -> Self {
        Self { synonyms, defaults }
    }

    pub fn synonyms(&self) -> &SynonymTable {
        &self.synonyms
    }

    pub fn defaults(&self) -> &IntelligentDefaults {
        &self.defaults
    }

    /// One aggregated benchmark per metric; all six are always present.
    pub fn aggregate(
        &self,
        records: &[BenchmarkRecord],
        benchmark_type: BenchmarkType,
        as_of: DateTime<Utc>,
    ) -> BTreeMap<MetricType, AggregatedBenchmark> {
        self.aggregate_with_report(records, benchmark_type, as_of)
            .benchmarks
    }

    /// The intelligent-default table alone, for when records are unavailable.
    pub fn defaults_only(
        &self,
        benchmark_type: BenchmarkType,
        as_of: DateTime<Utc>,
    ) -> BTreeMap<MetricType, AggregatedBenchmark> {
        self.defaults.all_for(benchmark_type, as_of)
    }

    pub fn aggregate_with_report(
        &self,
        records: &[BenchmarkRecord],
        benchmark_type: BenchmarkType,
        as_of: DateTime<Utc>,
    ) -> AggregationReport {
        let policy = AggregationPolicy::for_type(benchmark_type);
        let as_of_date = as_of.date_naive();

        let mut groups: BTreeMap<MetricType, Vec<&BenchmarkRecord>> = BTreeMap::new();
        let mut discarded: BTreeSet<String> = BTreeSet::new();
        let mut eligible_records = 0usize;

        for record in records.iter().filter(|r| policy.accepts(r, as_of_date)) {
            eligible_records += 1;
            match self.synonyms.resolve(&record.metric_name) {
                Some(metric) => groups.entry(metric).or_default().push(record),
                None => {
                    discarded.insert(record.metric_name.clone());
                }
            }
        }

        for name in &discarded {
            warn!(
                metric_name = %name,
                synonym_version = self.synonyms.version,
                "discarding benchmark records with unmapped metric name"
            );
        }

        let mut benchmarks = BTreeMap::new();
        let mut defaulted_metrics = Vec::new();
        for metric in MetricType::ALL {
            let aggregated = match groups.get(&metric) {
                Some(group) if !group.is_empty() => aggregate_group(metric, group, &policy, as_of),
                _ => {
                    defaulted_metrics.push(metric);
                    self.defaults.benchmark(benchmark_type, metric, as_of)
                }
            };
            benchmarks.insert(metric, aggregated);
        }

        AggregationReport {
            benchmark_type,
            benchmarks,
            eligible_records,
            discarded_names: discarded.into_iter().collect(),
            defaulted_metrics,
        }
    }
}

fn aggregate_group(
    metric: MetricType,
    group: &[&BenchmarkRecord],
    policy: &AggregationPolicy,
    as_of: DateTime<Utc>,
) -> AggregatedBenchmark {
    let weighted: Vec<(Decimal, Decimal)> = group
        .iter()
        .map(|r| (policy.effective_value(r), record_weight(r)))
        .collect();
    let total_weight: Decimal = weighted.iter().map(|(_, w)| *w).sum();

    let value = if total_weight > Decimal::ZERO {
        weighted.iter().map(|(v, w)| *v * *w).sum::<Decimal>() / total_weight
    } else {
        // Every record has sample_size 0: weight by priority alone
        let total_priority: Decimal = group.iter().map(|r| r.priority_weight).sum();
        group
            .iter()
            .map(|r| policy.effective_value(r) * r.priority_weight)
            .sum::<Decimal>()
            / total_priority
    };
    let value = round_dp(value, 4);

    let representative = group
        .iter()
        .copied()
        .max_by(|a, b| {
            a.data_quality
                .rank()
                .cmp(&b.data_quality.rank())
                .then_with(|| policy.effective_value(a).cmp(&policy.effective_value(b)))
        });

    let published = [
        representative.and_then(|r| r.percentile_25),
        representative.and_then(|r| r.percentile_50),
        representative.and_then(|r| r.percentile_75),
        representative.and_then(|r| r.percentile_90),
    ];
    let percentiles_observed = published.iter().all(Option::is_some);
    let brackets: Vec<Decimal> = published
        .iter()
        .zip(FALLBACK_PERCENTILE_RATIOS)
        .map(|(p, ratio)| p.unwrap_or_else(|| round_dp(value * ratio, 4)))
        .collect();

    AggregatedBenchmark {
        metric_type: metric,
        value,
        percentile_25: brackets[0],
        percentile_50: brackets[1],
        percentile_75: brackets[2],
        percentile_90: brackets[3],
        sample_size: group.iter().map(|r| u64::from(r.sample_size)).sum(),
        source_count: group.len(),
        data_quality: AggregateQuality::from_records(group.iter().map(|r| &r.data_quality)),
        last_updated: as_of,
        percentiles_observed,
    }
}

// ---------------------------------------------------------------------------
// Envelope function
// ---------------------------------------------------------------------------

/// Input for aggregating a supplied record set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationInput {
    pub benchmark_type: BenchmarkType,
    pub as_of: DateTime<Utc>,
    #[serde(default)]
    pub records: Vec<BenchmarkRecord>,
    /// Replacement intelligent-default table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<IntelligentDefaults>,
}

pub fn aggregate_benchmarks(
    input: &AggregationInput,
) -> BenchmarkResult<ComputationOutput<AggregationReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let aggregator = BenchmarkAggregator::new(
        SynonymTable::builtin(),
        input.defaults.clone().unwrap_or_default(),
    );
    let report = aggregator.aggregate_with_report(&input.records, input.benchmark_type, input.as_of);

    for name in &report.discarded_names {
        warnings.push(format!("Unmapped metric name '{name}' discarded"));
    }
    if !report.defaulted_metrics.is_empty() {
        let names: Vec<&str> = report.defaulted_metrics.iter().map(|m| m.as_str()).collect();
        warnings.push(format!(
            "No eligible records for {}; intelligent defaults substituted",
            names.join(", ")
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Quality and sample-size weighted benchmark aggregation (priority × log10(n + 1))",
        &serde_json::json!({
            "benchmark_type": input.benchmark_type,
            "as_of": input.as_of,
            "records": input.records.len(),
            "policy": AggregationPolicy::for_type(input.benchmark_type),
            "synonym_version": aggregator.synonyms().version,
        }),
        warnings,
        elapsed,
        report,
    ))
}
