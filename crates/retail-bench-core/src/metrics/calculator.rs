use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use super::source::{InMemoryTransactionSource, InventorySnapshot, SaleTransaction, TransactionSource};
use crate::error::BenchmarkError;
use crate::types::{
    percent_of, round_dp, with_metadata, ComputationOutput, DateRange, DimensionFilters, MetricMap,
    MetricType, Money,
};
use crate::BenchmarkResult;

pub const DEFAULT_LOOKBACK_DAYS: u32 = 365;

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Compute all six metrics from the current period's sale lines, the
/// preceding period's revenue and the period's average inventory value.
///
/// Every metric is present in the result and floored at zero.
pub fn compute_metrics(
    lines: &[SaleTransaction],
    previous_revenue: Money,
    average_inventory: Money,
) -> MetricMap {
    let revenue: Decimal = lines.iter().map(|l| l.quantity * l.unit_price).sum();
    let profit: Decimal = lines
        .iter()
        .map(|l| l.quantity * (l.unit_price - l.unit_cost))
        .sum();
    let volume: Decimal = lines.iter().map(|l| l.quantity).sum();

    let margin = percent_of(profit, revenue);

    // Cost of goods sold over average stock
    let cogs = revenue - profit;
    let turnover = if average_inventory > Decimal::ZERO {
        cogs / average_inventory
    } else {
        Decimal::ZERO
    };

    let growth = if previous_revenue > Decimal::ZERO {
        (revenue - previous_revenue) / previous_revenue * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    };

    let raw = [
        (MetricType::Revenue, revenue),
        (MetricType::Profit, profit),
        (MetricType::Margin, margin),
        (MetricType::Turnover, turnover),
        (MetricType::Volume, volume),
        (MetricType::Growth, growth),
    ];

    raw.into_iter()
        .map(|(metric, value)| {
            let value = round_dp(value, 2);
            if value < Decimal::ZERO {
                debug!(%metric, %value, "negative metric floored at zero");
                (metric, Decimal::ZERO)
            } else {
                (metric, value)
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Store-backed calculator
// ---------------------------------------------------------------------------

/// Computes a tenant's current-period metrics from a [`TransactionSource`].
#[derive(Clone)]
pub struct MetricCalculator {
    source: Arc<dyn TransactionSource>,
}

impl MetricCalculator {
    pub fn new(source: Arc<dyn TransactionSource>) -> Self {
        Self { source }
    }

    /// All six metrics for `tenant_id` over `range`. Store failures propagate;
    /// the map is only returned once every metric is computed.
    pub async fn calculate(
        &self,
        tenant_id: &str,
        range: &DateRange,
        filters: &DimensionFilters,
    ) -> BenchmarkResult<MetricMap> {
        validate_tenant(tenant_id)?;
        range.validate()?;

        let previous_range = range.preceding()?;
        let lines = self.source.sale_lines(tenant_id, range, filters).await?;
        let previous = self
            .source
            .sale_lines(tenant_id, &previous_range, filters)
            .await?;
        let average_inventory = self
            .source
            .average_inventory_value(tenant_id, range, filters)
            .await?;

        let previous_revenue: Decimal = previous.iter().map(|l| l.quantity * l.unit_price).sum();
        debug!(
            tenant_id,
            lines = lines.len(),
            previous_lines = previous.len(),
            "computing tenant metrics"
        );
        Ok(compute_metrics(&lines, previous_revenue, average_inventory))
    }
}

fn validate_tenant(tenant_id: &str) -> BenchmarkResult<()> {
    if tenant_id.trim().is_empty() {
        return Err(BenchmarkError::invalid("tenant_id", "Tenant id must not be empty"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Envelope function
// ---------------------------------------------------------------------------

/// Input for a self-contained metric calculation over supplied rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsInput {
    pub tenant_id: String,
    /// Defaults to the trailing 365 days ending on `as_of`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    /// Reference date for the default range
    pub as_of: NaiveDate,
    #[serde(default)]
    pub filters: DimensionFilters,
    #[serde(default)]
    pub sales: Vec<SaleTransaction>,
    #[serde(default)]
    pub inventory: Vec<InventorySnapshot>,
}

/// Metric calculation output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsOutput {
    pub tenant_id: String,
    pub date_range: DateRange,
    pub previous_range: DateRange,
    pub metrics: MetricMap,
    pub transaction_count: usize,
}

pub fn calculate_metrics(input: &MetricsInput) -> BenchmarkResult<ComputationOutput<MetricsOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_tenant(&input.tenant_id)?;
    let range = match input.date_range {
        Some(r) => {
            r.validate()?;
            r
        }
        None => DateRange::trailing_days(input.as_of, DEFAULT_LOOKBACK_DAYS)?,
    };

    let store = InMemoryTransactionSource::new(input.sales.clone(), input.inventory.clone());
    let lines = store.lines_in(&input.tenant_id, &range, &input.filters);
    let previous_range = range.preceding()?;
    let previous_revenue: Decimal = store
        .lines_in(&input.tenant_id, &previous_range, &input.filters)
        .iter()
        .map(|l| l.quantity * l.unit_price)
        .sum();
    let average_inventory = store.average_inventory_in(&input.tenant_id, &range, &input.filters);

    if lines.is_empty() {
        warnings.push("No sale transactions in range; metrics default to zero".to_string());
    }
    if average_inventory <= Decimal::ZERO {
        warnings.push("No inventory snapshots in range; turnover set to 0".to_string());
    }
    if previous_revenue <= Decimal::ZERO {
        warnings.push("Preceding period has no revenue; growth set to 0".to_string());
    }

    let output = MetricsOutput {
        tenant_id: input.tenant_id.clone(),
        date_range: range,
        previous_range,
        metrics: compute_metrics(&lines, previous_revenue, average_inventory),
        transaction_count: lines.len(),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Tenant Business Metrics (revenue, profit, margin, turnover, volume, growth)",
        &serde_json::json!({
            "tenant_id": input.tenant_id,
            "date_range": range,
            "filters": input.filters,
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sale(date: NaiveDate, qty: Decimal, price: Decimal, cost: Decimal) -> SaleTransaction {
        SaleTransaction {
            tenant_id: "tenant-a".into(),
            date,
            location_id: Some("loc-1".into()),
            category_id: Some("cat-1".into()),
            product_id: None,
            quantity: qty,
            unit_price: price,
            unit_cost: cost,
        }
    }

    #[test]
    fn test_empty_lines_give_all_zero_metrics() {
        let metrics = compute_metrics(&[], Decimal::ZERO, Decimal::ZERO);
        assert_eq!(metrics.len(), 6);
        for metric in MetricType::ALL {
            assert_eq!(metrics[&metric], Decimal::ZERO);
        }
    }

    #[test]
    fn test_known_answer_metrics() {
        let lines = vec![
            sale(d(2024, 1, 5), dec!(10), dec!(100), dec!(60)),
            sale(d(2024, 2, 5), dec!(5), dec!(200), dec!(150)),
        ];
        // revenue 2000, profit 400+250 = 650, cogs 1350
        let metrics = compute_metrics(&lines, dec!(1600), dec!(450));
        assert_eq!(metrics[&MetricType::Revenue], dec!(2000));
        assert_eq!(metrics[&MetricType::Profit], dec!(650));
        assert_eq!(metrics[&MetricType::Volume], dec!(15));
        assert_eq!(metrics[&MetricType::Margin], dec!(32.5));
        assert_eq!(metrics[&MetricType::Turnover], dec!(3));
        assert_eq!(metrics[&MetricType::Growth], dec!(25));
    }

    #[test]
    fn test_margin_rounds_to_two_places() {
        let lines = vec![sale(d(2024, 1, 5), dec!(1), dec!(850000000), dec!(630750000))];
        let metrics = compute_metrics(&lines, Decimal::ZERO, Decimal::ZERO);
        assert_eq!(metrics[&MetricType::Profit], dec!(219250000));
        assert_eq!(metrics[&MetricType::Margin], dec!(25.79));
    }

    #[test]
    fn test_losses_and_declines_floor_at_zero() {
        let lines = vec![sale(d(2024, 1, 5), dec!(10), dec!(50), dec!(80))];
        let metrics = compute_metrics(&lines, dec!(5000), dec!(100));
        assert_eq!(metrics[&MetricType::Profit], Decimal::ZERO);
        assert_eq!(metrics[&MetricType::Margin], Decimal::ZERO);
        assert_eq!(metrics[&MetricType::Growth], Decimal::ZERO);
        assert!(metrics.values().all(|v| *v >= Decimal::ZERO));
    }

    #[tokio::test]
    async fn test_calculator_uses_preceding_period_for_growth() {
        let store = InMemoryTransactionSource::new(
            vec![
                sale(d(2024, 6, 1), dec!(10), dec!(30), dec!(20)),
                // preceding 31-day window: 2024-05-01 ..= 2024-05-31
                sale(d(2024, 5, 15), dec!(10), dec!(20), dec!(10)),
                // outside both windows
                sale(d(2023, 1, 1), dec!(999), dec!(1), dec!(1)),
            ],
            vec![],
        );
        let calc = MetricCalculator::new(Arc::new(store));
        let range = DateRange::new(d(2024, 6, 1), d(2024, 7, 1)).unwrap();
        let metrics = calc
            .calculate("tenant-a", &range, &DimensionFilters::default())
            .await
            .unwrap();
        assert_eq!(metrics[&MetricType::Revenue], dec!(300));
        assert_eq!(metrics[&MetricType::Growth], dec!(50));
        assert_eq!(metrics[&MetricType::Turnover], Decimal::ZERO);
    }

    struct FailingSource;

    #[async_trait]
    impl TransactionSource for FailingSource {
        async fn sale_lines(
            &self,
            _tenant_id: &str,
            _range: &DateRange,
            _filters: &DimensionFilters,
        ) -> BenchmarkResult<Vec<SaleTransaction>> {
            Err(BenchmarkError::DataAccess("sales table unavailable".into()))
        }

        async fn average_inventory_value(
            &self,
            _tenant_id: &str,
            _range: &DateRange,
            _filters: &DimensionFilters,
        ) -> BenchmarkResult<Money> {
            Ok(Decimal::ZERO)
        }
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let calc = MetricCalculator::new(Arc::new(FailingSource));
        let range = DateRange::new(d(2024, 1, 1), d(2024, 12, 31)).unwrap();
        let err = calc
            .calculate("tenant-a", &range, &DimensionFilters::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BenchmarkError::DataAccess(_)));
    }

    #[test]
    fn test_envelope_defaults_to_trailing_year() {
        let input = MetricsInput {
            tenant_id: "tenant-a".into(),
            date_range: None,
            as_of: d(2024, 12, 31),
            filters: DimensionFilters::default(),
            sales: vec![sale(d(2024, 3, 1), dec!(2), dec!(10), dec!(4))],
            inventory: vec![],
        };
        let out = calculate_metrics(&input).unwrap();
        assert_eq!(out.result.date_range.len_days(), 365);
        assert_eq!(out.result.metrics[&MetricType::Revenue], dec!(20));
        assert_eq!(out.result.transaction_count, 1);
        assert!(!out.warnings.is_empty());
    }

    #[test]
    fn test_envelope_rejects_blank_tenant() {
        let input = MetricsInput {
            tenant_id: "  ".into(),
            date_range: None,
            as_of: d(2024, 12, 31),
            filters: DimensionFilters::default(),
            sales: vec![],
            inventory: vec![],
        };
        assert!(matches!(
            calculate_metrics(&input),
            Err(BenchmarkError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_envelope_rejects_range_with_no_preceding_period() {
        let input = MetricsInput {
            tenant_id: "tenant-a".into(),
            date_range: Some(DateRange::new(NaiveDate::MIN, d(2024, 1, 31)).unwrap()),
            as_of: d(2024, 12, 31),
            filters: DimensionFilters::default(),
            sales: vec![sale(d(2024, 1, 15), dec!(1), dec!(10), dec!(4))],
            inventory: vec![],
        };
        match calculate_metrics(&input) {
            Err(BenchmarkError::InvalidInput { field, .. }) => assert_eq!(field, "date_range"),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }
}
