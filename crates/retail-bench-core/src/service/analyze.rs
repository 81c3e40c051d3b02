use chrono::{DateTime, Duration as DateDuration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};

use super::config::EngineConfig;
use crate::benchmarks::aggregator::{AggregationPolicy, BenchmarkAggregator};
use crate::benchmarks::cache::{BenchmarkCache, CacheKey, BENCHMARK_CACHE_TTL};
use crate::benchmarks::records::{BenchmarkSource, BenchmarkType, Region};
use crate::benchmarks::repository::{BenchmarkRepository, EligibleBenchmarkQuery};
use crate::benchmarks::BenchmarkSet;
use crate::comparison::engine::{compare, summarize, BenchmarkReference, BenchmarkSummary, ComparisonResult};
use crate::comparison::peer::{compare_with_peers, PeerComparison};
use crate::error::BenchmarkError;
use crate::metrics::calculator::MetricCalculator;
use crate::metrics::source::TransactionSource;
use crate::peers::source::{CharacteristicsSource, TenantCharacteristics};
use crate::peers::synthesizer::PeerSynthesizer;
use crate::trends::historical::{historical_trends, HistoricalTrend};
use crate::types::{with_metadata, ComputationOutput, DateRange, DimensionFilters, MetricMap, MetricType};
use crate::BenchmarkResult;

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

fn default_benchmark_type() -> BenchmarkType {
    BenchmarkType::IndustryStandard
}

/// One benchmarking request for one tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkingRequest {
    pub tenant_id: String,
    #[serde(default = "default_benchmark_type")]
    pub benchmark_type: BenchmarkType,
    /// Canonical metric names; empty means all six
    #[serde(default)]
    pub metrics: Vec<String>,
    /// Defaults to the configured trailing window ending today
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    #[serde(default)]
    pub filters: DimensionFilters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
    /// Empty means any publisher
    #[serde(default)]
    pub sources: Vec<BenchmarkSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub include_peers: bool,
    #[serde(default)]
    pub include_historical: bool,
}

impl BenchmarkingRequest {
    pub fn new(tenant_id: impl Into<String>, benchmark_type: BenchmarkType) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            benchmark_type,
            metrics: Vec::new(),
            date_range: None,
            filters: DimensionFilters::default(),
            region: None,
            sources: Vec::new(),
            category: None,
            include_peers: false,
            include_historical: false,
        }
    }

    /// Requested metrics in canonical order, duplicates removed.
    pub fn parsed_metrics(&self) -> BenchmarkResult<Vec<MetricType>> {
        if self.metrics.is_empty() {
            return Ok(MetricType::ALL.to_vec());
        }
        let mut parsed = self
            .metrics
            .iter()
            .map(|name| name.parse::<MetricType>())
            .collect::<BenchmarkResult<Vec<_>>>()?;
        parsed.sort();
        parsed.dedup();
        Ok(parsed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkingResponse {
    pub tenant_id: String,
    pub benchmark_type: BenchmarkType,
    pub date_range: DateRange,
    pub current_metrics: MetricMap,
    pub benchmarks: BenchmarkSet,
    pub data: Vec<ComparisonResult>,
    pub summary: BenchmarkSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_comparison: Option<PeerComparison>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_trends: Option<BTreeMap<MetricType, HistoricalTrend>>,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Orchestrates metric computation, benchmark aggregation and comparison.
///
/// Collaborator failures in the benchmark, peer and history stages degrade
/// to defaults with a warning. Only invalid input and metric computation
/// failures abort a request.
#[derive(Clone)]
pub struct BenchmarkingService {
    calculator: MetricCalculator,
    repository: Arc<dyn BenchmarkRepository>,
    cache: Arc<dyn BenchmarkCache>,
    characteristics: Arc<dyn CharacteristicsSource>,
    aggregator: BenchmarkAggregator,
    synthesizer: PeerSynthesizer,
    config: EngineConfig,
}

impl BenchmarkingService {
    pub fn new(
        transactions: Arc<dyn TransactionSource>,
        repository: Arc<dyn BenchmarkRepository>,
        cache: Arc<dyn BenchmarkCache>,
        characteristics: Arc<dyn CharacteristicsSource>,
        config: EngineConfig,
    ) -> Self {
        let synthesizer = match config.peer_seed {
            Some(seed) => PeerSynthesizer::new().with_seed(seed),
            None => PeerSynthesizer::new(),
        };
        Self {
            calculator: MetricCalculator::new(transactions),
            repository,
            cache,
            characteristics,
            aggregator: BenchmarkAggregator::default(),
            synthesizer,
            config,
        }
    }

    /// Replace the aggregator, e.g. to inject a market-specific default table.
    pub fn with_aggregator(mut self, aggregator: BenchmarkAggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[instrument(
        skip(self, request),
        fields(tenant_id = %request.tenant_id, benchmark_type = %request.benchmark_type)
    )]
    pub async fn analyze(
        &self,
        request: &BenchmarkingRequest,
        today: NaiveDate,
    ) -> BenchmarkResult<ComputationOutput<BenchmarkingResponse>> {
        let start = Instant::now();
        let mut warnings: Vec<String> = Vec::new();

        self.config.validate()?;
        if request.tenant_id.trim().is_empty() {
            return Err(BenchmarkError::invalid("tenant_id", "Tenant id must not be empty"));
        }
        let metrics = request.parsed_metrics()?;
        let range = match request.date_range {
            Some(r) => {
                r.validate()?;
                r
            }
            None => DateRange::trailing_days(today, self.config.default_lookback_days)?,
        };
        let as_of = start_of_day(today);

        let current = self
            .calculator
            .calculate(&request.tenant_id, &range, &request.filters)
            .await
            .map_err(BenchmarkError::into_analysis_failure)?;

        let benchmarks = self
            .load_benchmarks(request, today, as_of, &mut warnings)
            .await;

        let data: Vec<ComparisonResult> = metrics
            .iter()
            .map(|metric| {
                let value = current.get(metric).copied().unwrap_or_default();
                let reference = benchmarks
                    .get(metric)
                    .map(BenchmarkReference::from)
                    .unwrap_or_else(|| {
                        BenchmarkReference::from(&self.aggregator.defaults().benchmark(
                            request.benchmark_type,
                            *metric,
                            as_of,
                        ))
                    });
                compare(*metric, value, &reference)
            })
            .collect();
        let summary = summarize(&data);

        let peer_comparison = if request.include_peers {
            let characteristics = self.load_characteristics(&request.tenant_id, &mut warnings).await;
            let cohort = self.synthesizer.synthesize(characteristics.as_ref(), &current);
            Some(compare_with_peers(&current, &cohort))
        } else {
            None
        };

        let historical = if request.include_historical {
            Some(self.load_historical(request.benchmark_type, today, &current, &mut warnings).await)
        } else {
            None
        };

        let response = BenchmarkingResponse {
            tenant_id: request.tenant_id.clone(),
            benchmark_type: request.benchmark_type,
            date_range: range,
            current_metrics: current,
            benchmarks,
            data,
            summary,
            peer_comparison,
            historical_trends: historical,
        };

        let elapsed = start.elapsed().as_micros() as u64;
        Ok(with_metadata(
            "Weighted benchmark aggregation with percentile classification and synthetic peer ranking",
            &serde_json::json!({
                "benchmark_type": request.benchmark_type,
                "as_of": today,
                "policy": AggregationPolicy::for_type(request.benchmark_type),
                "repository_timeout_ms": self.config.repository_timeout_ms,
                "cache_ttl_secs": BENCHMARK_CACHE_TTL.as_secs(),
                "synonym_version": self.aggregator.synonyms().version,
            }),
            warnings,
            elapsed,
            response,
        ))
    }

    async fn with_deadline<T, F>(&self, operation: &str, fut: F) -> BenchmarkResult<T>
    where
        F: Future<Output = BenchmarkResult<T>>,
    {
        match tokio::time::timeout(self.config.repository_timeout(), fut).await {
            Ok(result) => result,
            Err(_) => Err(BenchmarkError::Timeout {
                operation: operation.to_string(),
                timeout_ms: self.config.repository_timeout_ms,
            }),
        }
    }

    /// Cache, then repository, then intelligent defaults.
    async fn load_benchmarks(
        &self,
        request: &BenchmarkingRequest,
        today: NaiveDate,
        as_of: DateTime<Utc>,
        warnings: &mut Vec<String>,
    ) -> BenchmarkSet {
        let policy = AggregationPolicy::for_type(request.benchmark_type);
        let query = EligibleBenchmarkQuery {
            is_active: true,
            data_quality: policy.accepted_quality.clone(),
            region: request.region,
            sources: request.sources.clone(),
            min_sample_size: policy.min_sample_size,
            not_expired_as_of: today,
            category: request.category.clone(),
        };
        let key = CacheKey::for_query(request.benchmark_type, &query);

        match self.cache.get(&key).await {
            Ok(Some(hit)) => {
                debug!(signature = %key.signature, "benchmark cache hit");
                return hit;
            }
            Ok(None) => debug!(signature = %key.signature, "benchmark cache miss"),
            Err(e) => {
                warn!(error = %e, "benchmark cache read failed; continuing uncached");
                warnings.push(format!("Benchmark cache unavailable: {e}"));
            }
        }

        let records = match self
            .with_deadline("find_eligible", self.repository.find_eligible(&query))
            .await
        {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "benchmark repository unavailable; using intelligent defaults");
                warnings.push(format!(
                    "Benchmark data unavailable ({e}); intelligent defaults used"
                ));
                return self.aggregator.defaults_only(request.benchmark_type, as_of);
            }
        };

        let report = self
            .aggregator
            .aggregate_with_report(&records, request.benchmark_type, as_of);
        for name in &report.discarded_names {
            warnings.push(format!("Unmapped benchmark metric '{name}' discarded"));
        }
        if !report.defaulted_metrics.is_empty() {
            let names: Vec<&str> = report.defaulted_metrics.iter().map(|m| m.as_str()).collect();
            warnings.push(format!(
                "No eligible benchmark records for {}; intelligent defaults used",
                names.join(", ")
            ));
        }

        if let Err(e) = self
            .cache
            .set(key, report.benchmarks.clone(), BENCHMARK_CACHE_TTL)
            .await
        {
            warn!(error = %e, "benchmark cache write failed");
            warnings.push(format!("Benchmark cache unavailable: {e}"));
        }
        report.benchmarks
    }

    async fn load_characteristics(
        &self,
        tenant_id: &str,
        warnings: &mut Vec<String>,
    ) -> Option<TenantCharacteristics> {
        match self
            .with_deadline("characteristics", self.characteristics.characteristics(tenant_id))
            .await
        {
            Ok(Some(c)) => Some(c),
            Ok(None) => {
                warnings.push("No tenant characteristics on record; peers scaled from own revenue".into());
                None
            }
            Err(e) => {
                warn!(error = %e, "characteristics lookup failed; using fallback peers");
                warnings.push(format!(
                    "Tenant characteristics unavailable ({e}); peers scaled from own revenue"
                ));
                None
            }
        }
    }

    async fn load_historical(
        &self,
        benchmark_type: BenchmarkType,
        today: NaiveDate,
        current: &MetricMap,
        warnings: &mut Vec<String>,
    ) -> BTreeMap<MetricType, HistoricalTrend> {
        let since = today
            .checked_sub_signed(DateDuration::days(i64::from(self.config.history_lookback_days)))
            .unwrap_or(NaiveDate::MIN);
        let qualities = AggregationPolicy::for_type(benchmark_type).accepted_quality;
        let history = match self
            .with_deadline(
                "find_historical",
                self.repository.find_historical(since, &qualities),
            )
            .await
        {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "historical benchmarks unavailable; projecting from current values");
                warnings.push(format!(
                    "Historical benchmarks unavailable ({e}); fixed multipliers applied"
                ));
                Vec::new()
            }
        };
        historical_trends(&history, current, self.aggregator.synonyms())
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}
