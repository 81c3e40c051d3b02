use chrono::{NaiveDate, Utc};
use clap::Args;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use retail_bench_core::benchmarks::{
    BenchmarkAggregator, BenchmarkRecord, InMemoryBenchmarkCache, InMemoryBenchmarkRepository,
    IntelligentDefaults, SynonymTable,
};
use retail_bench_core::metrics::{InMemoryTransactionSource, InventorySnapshot, SaleTransaction};
use retail_bench_core::peers::{InMemoryCharacteristicsSource, TenantCharacteristics};
use retail_bench_core::service::{BenchmarkingRequest, BenchmarkingService, EngineConfig};

use crate::input;

/// Arguments for a full benchmarking analysis
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Path to JSON/YAML dataset: request, transactions, inventory, records, characteristics
    #[arg(long)]
    pub input: Option<String>,

    /// Include the synthetic peer comparison
    #[arg(long)]
    pub peers: bool,

    /// Include historical trend projections
    #[arg(long)]
    pub historical: bool,

    /// Override the benchmark type: industry_standard, category_average, best_performer
    #[arg(long = "type")]
    pub benchmark_type: Option<String>,

    /// Analysis date (YYYY-MM-DD); defaults to today (UTC)
    #[arg(long)]
    pub today: Option<NaiveDate>,
}

/// Everything one offline analysis needs, in a single document.
#[derive(Debug, Deserialize)]
struct AnalysisDataset {
    request: BenchmarkingRequest,
    #[serde(default)]
    today: Option<NaiveDate>,
    #[serde(default)]
    transactions: Vec<SaleTransaction>,
    #[serde(default)]
    inventory: Vec<InventorySnapshot>,
    #[serde(default)]
    records: Vec<BenchmarkRecord>,
    #[serde(default)]
    characteristics: Vec<TenantCharacteristics>,
}

pub fn run_analyze(
    args: AnalyzeArgs,
    config: EngineConfig,
    defaults: Option<IntelligentDefaults>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let dataset: AnalysisDataset = input::load(&args.input, "analysis dataset")?;

    let mut request = dataset.request;
    request.include_peers |= args.peers;
    request.include_historical |= args.historical;
    if let Some(ref name) = args.benchmark_type {
        request.benchmark_type = super::parse_benchmark_type(name)?;
    }
    let today = args
        .today
        .or(dataset.today)
        .unwrap_or_else(|| Utc::now().date_naive());

    info!(
        tenant_id = %request.tenant_id,
        transactions = dataset.transactions.len(),
        records = dataset.records.len(),
        "running offline analysis"
    );

    let mut service = BenchmarkingService::new(
        Arc::new(InMemoryTransactionSource::new(dataset.transactions, dataset.inventory)),
        Arc::new(InMemoryBenchmarkRepository::new(dataset.records)),
        Arc::new(InMemoryBenchmarkCache::new()),
        Arc::new(InMemoryCharacteristicsSource::new(dataset.characteristics)),
        config,
    );
    if let Some(defaults) = defaults {
        service = service.with_aggregator(BenchmarkAggregator::new(SynonymTable::builtin(), defaults));
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_time()
        .build()?;
    let result = runtime.block_on(service.analyze(&request, today))?;
    Ok(serde_json::to_value(result)?)
}
