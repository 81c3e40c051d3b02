use chrono::NaiveDate;
use retail_bench_core::benchmarks::{
    BenchmarkRecord, BenchmarkSource, BenchmarkType, DataQuality, InMemoryBenchmarkCache,
    InMemoryBenchmarkRepository, Region,
};
use retail_bench_core::metrics::{InMemoryTransactionSource, InventorySnapshot, SaleTransaction};
use retail_bench_core::peers::{IndustryPattern, InMemoryCharacteristicsSource, TenantCharacteristics};
use retail_bench_core::service::{BenchmarkingRequest, BenchmarkingService, EngineConfig};
use retail_bench_core::trends::TrendDirection;
use retail_bench_core::MetricType;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn sale(date: NaiveDate, qty: Decimal, price: Decimal, cost: Decimal) -> SaleTransaction {
    SaleTransaction {
        tenant_id: "toko-sinar".into(),
        date,
        location_id: Some("loc-1".into()),
        category_id: Some("groceries".into()),
        product_id: None,
        quantity: qty,
        unit_price: price,
        unit_cost: cost,
    }
}

fn history(name: &str, month: u32, value: Decimal) -> BenchmarkRecord {
    BenchmarkRecord {
        metric_name: name.into(),
        value,
        percentile_25: None,
        percentile_50: None,
        percentile_75: None,
        percentile_90: None,
        sample_size: 250,
        priority_weight: Decimal::ONE,
        data_quality: DataQuality::Verified,
        source: BenchmarkSource::GovernmentStatistics,
        region: Region::National,
        period_start_date: d(2024, month, 1),
        expiry_date: d(2026, 1, 1),
        is_active: true,
        category: None,
    }
}

fn service() -> BenchmarkingService {
    let transactions = InMemoryTransactionSource::new(
        vec![
            sale(d(2024, 2, 14), dec!(12000), dec!(25000), dec!(18500)),
            sale(d(2024, 4, 2), dec!(9000), dec!(26000), dec!(19000)),
            sale(d(2023, 9, 20), dec!(15000), dec!(24000), dec!(18000)),
        ],
        vec![
            InventorySnapshot {
                tenant_id: "toko-sinar".into(),
                date: d(2024, 3, 1),
                location_id: Some("loc-1".into()),
                category_id: None,
                value: dec!(40000000),
            },
            InventorySnapshot {
                tenant_id: "toko-sinar".into(),
                date: d(2024, 6, 1),
                location_id: Some("loc-1".into()),
                category_id: None,
                value: dec!(44000000),
            },
        ],
    );
    let repository = InMemoryBenchmarkRepository::new(vec![
        history("margin", 1, dec!(24.0)),
        history("margin", 2, dec!(24.5)),
        history("margin", 3, dec!(25.0)),
        history("margin", 4, dec!(25.5)),
        history("revenue", 2, dec!(700000000)),
    ]);
    let characteristics = InMemoryCharacteristicsSource::new(vec![TenantCharacteristics {
        tenant_id: "toko-sinar".into(),
        primary_category: Some("Grocery & Fresh Food".into()),
        size_tier: None,
        location_count: 1,
        product_count: 340,
    }]);

    BenchmarkingService::new(
        Arc::new(transactions),
        Arc::new(repository),
        Arc::new(InMemoryBenchmarkCache::new()),
        Arc::new(characteristics),
        EngineConfig {
            peer_seed: Some(2024),
            ..EngineConfig::default()
        },
    )
}

#[tokio::test]
async fn test_full_request_with_peers_and_history() {
    let mut request = BenchmarkingRequest::new("toko-sinar", BenchmarkType::IndustryStandard);
    request.include_peers = true;
    request.include_historical = true;
    request.region = Some(Region::National);

    let out = service().analyze(&request, d(2024, 7, 1)).await.unwrap();
    let response = out.result;

    assert_eq!(response.data.len(), 6);
    assert_eq!(response.current_metrics.len(), 6);
    assert!(response.current_metrics.values().all(|v| *v >= Decimal::ZERO));

    let peers = response.peer_comparison.expect("peer block requested");
    assert_eq!(peers.ranking.peer_count, 50);
    assert_eq!(peers.cohort_analysis.pattern, IndustryPattern::Food);
    assert!(!peers.cohort_analysis.synthetic_fallback);
    assert!(peers.ranking.percentile >= Decimal::ZERO && peers.ranking.percentile <= dec!(100));
    assert!(!peers.insights.is_empty());

    let trends = response.historical_trends.expect("history block requested");
    assert_eq!(trends[&MetricType::Margin].trend, TrendDirection::Increasing);
    assert_eq!(trends[&MetricType::Margin].value, dec!(26));
    assert_eq!(trends[&MetricType::Revenue].trend, TrendDirection::InsufficientData);

    assert!(response.summary.top_metric.is_some());
}

#[tokio::test]
async fn test_filters_narrow_metrics() {
    let mut request = BenchmarkingRequest::new("toko-sinar", BenchmarkType::CategoryAverage);
    request.filters.location_id = Some("loc-2".into());
    request.metrics = vec!["revenue".into(), "volume".into()];

    let out = service().analyze(&request, d(2024, 7, 1)).await.unwrap();
    assert_eq!(out.result.data.len(), 2);
    assert_eq!(out.result.current_metrics[&MetricType::Revenue], Decimal::ZERO);
}

#[tokio::test]
async fn test_same_seed_same_peer_ranking() {
    let mut request = BenchmarkingRequest::new("toko-sinar", BenchmarkType::BestPerformer);
    request.include_peers = true;
    let svc = service();
    let a = svc.analyze(&request, d(2024, 7, 1)).await.unwrap();
    let b = svc.analyze(&request, d(2024, 7, 1)).await.unwrap();
    assert_eq!(a.result.peer_comparison, b.result.peer_comparison);
}
