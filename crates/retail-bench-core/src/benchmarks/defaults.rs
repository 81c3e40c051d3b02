use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::records::{AggregateQuality, AggregatedBenchmark, BenchmarkType};
use crate::types::MetricType;

/// Fallback figure for one metric when no eligible benchmark data exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultBenchmark {
    pub value: Decimal,
    pub percentile_25: Decimal,
    pub percentile_50: Decimal,
    pub percentile_75: Decimal,
    pub percentile_90: Decimal,
}

impl DefaultBenchmark {
    const fn new(value: Decimal, p25: Decimal, p50: Decimal, p75: Decimal, p90: Decimal) -> Self {
        DefaultBenchmark {
            value,
            percentile_25: p25,
            percentile_50: p50,
            percentile_75: p75,
            percentile_90: p90,
        }
    }

    pub fn to_aggregated(&self, metric: MetricType, as_of: DateTime<Utc>) -> AggregatedBenchmark {
        AggregatedBenchmark {
            metric_type: metric,
            value: self.value,
            percentile_25: self.percentile_25,
            percentile_50: self.percentile_50,
            percentile_75: self.percentile_75,
            percentile_90: self.percentile_90,
            sample_size: 0,
            source_count: 0,
            data_quality: AggregateQuality::Default,
            last_updated: as_of,
            percentiles_observed: false,
        }
    }
}

/// Intelligent-default table, keyed by benchmark type then metric.
///
/// Injected into the aggregator rather than held as a global so deployments
/// can ship market-specific tables. Entries missing from an injected table
/// fall through to the built-in figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntelligentDefaults {
    pub table: BTreeMap<BenchmarkType, BTreeMap<MetricType, DefaultBenchmark>>,
}

impl Default for IntelligentDefaults {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_entry(benchmark_type: BenchmarkType, metric: MetricType) -> DefaultBenchmark {
    use BenchmarkType::*;
    use MetricType::*;
    match (benchmark_type, metric) {
        (CategoryAverage, Revenue) => DefaultBenchmark::new(
            dec!(600000000),
            dec!(350000000),
            dec!(600000000),
            dec!(950000000),
            dec!(1500000000),
        ),
        (CategoryAverage, Profit) => DefaultBenchmark::new(
            dec!(150000000),
            dec!(80000000),
            dec!(150000000),
            dec!(250000000),
            dec!(400000000),
        ),
        (CategoryAverage, Margin) => {
            DefaultBenchmark::new(dec!(24.5), dec!(17.0), dec!(24.5), dec!(31.0), dec!(38.0))
        }
        (CategoryAverage, Turnover) => {
            DefaultBenchmark::new(dec!(6.0), dec!(3.8), dec!(6.0), dec!(8.5), dec!(11.0))
        }
        (CategoryAverage, Volume) => DefaultBenchmark::new(
            dec!(45000),
            dec!(20000),
            dec!(45000),
            dec!(80000),
            dec!(130000),
        ),
        (CategoryAverage, Growth) => {
            DefaultBenchmark::new(dec!(8.0), dec!(2.0), dec!(8.0), dec!(14.0), dec!(22.0))
        }

        (IndustryStandard, Revenue) => DefaultBenchmark::new(
            dec!(750000000),
            dec!(400000000),
            dec!(750000000),
            dec!(1200000000),
            dec!(2000000000),
        ),
        (IndustryStandard, Profit) => DefaultBenchmark::new(
            dec!(193500000),
            dec!(100000000),
            dec!(193500000),
            dec!(330000000),
            dec!(540000000),
        ),
        (IndustryStandard, Margin) => {
            DefaultBenchmark::new(dec!(25.8), dec!(18.5), dec!(25.8), dec!(33.1), dec!(40.2))
        }
        (IndustryStandard, Turnover) => {
            DefaultBenchmark::new(dec!(8.0), dec!(5.0), dec!(8.0), dec!(11.0), dec!(14.5))
        }
        (IndustryStandard, Volume) => DefaultBenchmark::new(
            dec!(60000),
            dec!(28000),
            dec!(60000),
            dec!(100000),
            dec!(160000),
        ),
        (IndustryStandard, Growth) => {
            DefaultBenchmark::new(dec!(10.0), dec!(3.0), dec!(10.0), dec!(16.5), dec!(24.0))
        }

        (BestPerformer, Revenue) => DefaultBenchmark::new(
            dec!(2500000000),
            dec!(1500000000),
            dec!(2500000000),
            dec!(3800000000),
            dec!(5500000000),
        ),
        (BestPerformer, Profit) => DefaultBenchmark::new(
            dec!(800000000),
            dec!(450000000),
            dec!(800000000),
            dec!(1250000000),
            dec!(1900000000),
        ),
        (BestPerformer, Margin) => {
            DefaultBenchmark::new(dec!(38.0), dec!(30.0), dec!(38.0), dec!(45.0), dec!(52.0))
        }
        (BestPerformer, Turnover) => {
            DefaultBenchmark::new(dec!(12.0), dec!(9.0), dec!(12.0), dec!(15.0), dec!(19.0))
        }
        (BestPerformer, Volume) => DefaultBenchmark::new(
            dec!(180000),
            dec!(110000),
            dec!(180000),
            dec!(260000),
            dec!(360000),
        ),
        (BestPerformer, Growth) => {
            DefaultBenchmark::new(dec!(22.0), dec!(15.0), dec!(22.0), dec!(30.0), dec!(40.0))
        }
    }
}

impl IntelligentDefaults {
    pub fn builtin() -> Self {
        let table = BenchmarkType::ALL
            .into_iter()
            .map(|bt| {
                let metrics = MetricType::ALL
                    .into_iter()
                    .map(|m| (m, builtin_entry(bt, m)))
                    .collect();
                (bt, metrics)
            })
            .collect();
        IntelligentDefaults { table }
    }

    pub fn get(&self, benchmark_type: BenchmarkType, metric: MetricType) -> DefaultBenchmark {
        self.table
            .get(&benchmark_type)
            .and_then(|m| m.get(&metric))
            .copied()
            .unwrap_or_else(|| builtin_entry(benchmark_type, metric))
    }

    pub fn benchmark(
        &self,
        benchmark_type: BenchmarkType,
        metric: MetricType,
        as_of: DateTime<Utc>,
    ) -> AggregatedBenchmark {
        self.get(benchmark_type, metric).to_aggregated(metric, as_of)
    }

    /// The full default table for one benchmark type, used on the degraded path.
    pub fn all_for(
        &self,
        benchmark_type: BenchmarkType,
        as_of: DateTime<Utc>,
    ) -> BTreeMap<MetricType, AggregatedBenchmark> {
        MetricType::ALL
            .into_iter()
            .map(|m| (m, self.benchmark(benchmark_type, m, as_of)))
            .collect()
    }
}
