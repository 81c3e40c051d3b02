pub mod aggregator;
#[cfg(feature = "service")]
pub mod cache;
pub mod defaults;
pub mod records;
pub mod repository;
pub mod synonyms;

use std::collections::BTreeMap;

use crate::types::MetricType;

/// One aggregated benchmark per metric.
pub type BenchmarkSet = BTreeMap<MetricType, records::AggregatedBenchmark>;

pub use aggregator::{
    aggregate_benchmarks, record_weight, AggregationInput, AggregationPolicy, AggregationReport,
    BenchmarkAggregator,
};
pub use defaults::{DefaultBenchmark, IntelligentDefaults};
pub use records::{
    AggregateQuality, AggregatedBenchmark, BenchmarkRecord, BenchmarkSource, BenchmarkType,
    DataQuality, PercentileSet, Region,
};
pub use repository::{BenchmarkRepository, EligibleBenchmarkQuery, InMemoryBenchmarkRepository};
pub use synonyms::{SynonymTable, SYNONYM_TABLE_VERSION};
#[cfg(feature = "service")]
pub use cache::{
    BenchmarkCache, CacheKey, CachedBenchmarks, InMemoryBenchmarkCache, BENCHMARK_CACHE_TTL,
};
