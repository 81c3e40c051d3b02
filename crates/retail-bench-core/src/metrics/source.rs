use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{DateRange, DimensionFilters, Money};
use crate::BenchmarkResult;

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// A single sale line as returned by the transactional store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleTransaction {
    pub tenant_id: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    /// Units sold
    pub quantity: Decimal,
    /// Selling price per unit
    pub unit_price: Money,
    /// Cost per unit
    pub unit_cost: Money,
}

/// Stock valuation at a point in time for one location / category slice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventorySnapshot {
    pub tenant_id: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    /// Inventory value at cost
    pub value: Money,
}

// ---------------------------------------------------------------------------
// Store contract
// ---------------------------------------------------------------------------

/// Read access to a tenant's transactional data.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// Sale lines for the tenant inside `range` matching `filters`.
    async fn sale_lines(
        &self,
        tenant_id: &str,
        range: &DateRange,
        filters: &DimensionFilters,
    ) -> BenchmarkResult<Vec<SaleTransaction>>;

    /// Mean inventory value over `range`; zero when nothing was recorded.
    async fn average_inventory_value(
        &self,
        tenant_id: &str,
        range: &DateRange,
        filters: &DimensionFilters,
    ) -> BenchmarkResult<Money>;
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Transaction store over plain vectors, used by the CLI and tests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryTransactionSource {
    #[serde(default)]
    pub sales: Vec<SaleTransaction>,
    #[serde(default)]
    pub inventory: Vec<InventorySnapshot>,
}

fn matches_dimension(value: &Option<String>, wanted: &Option<String>) -> bool {
    match wanted {
        Some(w) => value.as_deref() == Some(w.as_str()),
        None => true,
    }
}

impl InMemoryTransactionSource {
    pub fn new(sales: Vec<SaleTransaction>, inventory: Vec<InventorySnapshot>) -> Self {
        Self { sales, inventory }
    }

    pub fn lines_in(
        &self,
        tenant_id: &str,
        range: &DateRange,
        filters: &DimensionFilters,
    ) -> Vec<SaleTransaction> {
        self.sales
            .iter()
            .filter(|s| s.tenant_id == tenant_id && range.contains(s.date))
            .filter(|s| matches_dimension(&s.location_id, &filters.location_id))
            .filter(|s| matches_dimension(&s.category_id, &filters.category_id))
            .cloned()
            .collect()
    }

    /// Snapshots are summed per date across slices, then averaged across dates.
    pub fn average_inventory_in(
        &self,
        tenant_id: &str,
        range: &DateRange,
        filters: &DimensionFilters,
    ) -> Money {
        let mut per_date: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
        for snap in self
            .inventory
            .iter()
            .filter(|s| s.tenant_id == tenant_id && range.contains(s.date))
            .filter(|s| matches_dimension(&s.location_id, &filters.location_id))
            .filter(|s| matches_dimension(&s.category_id, &filters.category_id))
        {
            *per_date.entry(snap.date).or_insert(Decimal::ZERO) += snap.value;
        }
        if per_date.is_empty() {
            return Decimal::ZERO;
        }
        let total: Decimal = per_date.values().copied().sum();
        total / Decimal::from(per_date.len() as u64)
    }
}

#[async_trait]
impl TransactionSource for InMemoryTransactionSource {
    async fn sale_lines(
        &self,
        tenant_id: &str,
        range: &DateRange,
        filters: &DimensionFilters,
    ) -> BenchmarkResult<Vec<SaleTransaction>> {
        Ok(self.lines_in(tenant_id, range, filters))
    }

    async fn average_inventory_value(
        &self,
        tenant_id: &str,
        range: &DateRange,
        filters: &DimensionFilters,
    ) -> BenchmarkResult<Money> {
        Ok(self.average_inventory_in(tenant_id, range, filters))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    fn snapshot(date: NaiveDate, location: &str, value: Decimal) -> InventorySnapshot {
        InventorySnapshot {
            tenant_id: "t1".into(),
            date,
            location_id: Some(location.into()),
            category_id: None,
            value,
        }
    }

    #[test]
    fn test_average_inventory_sums_slices_per_date() {
        let store = InMemoryTransactionSource::new(
            vec![],
            vec![
                snapshot(d(1, 1), "a", dec!(100)),
                snapshot(d(1, 1), "b", dec!(50)),
                snapshot(d(2, 1), "a", dec!(250)),
            ],
        );
        let range = DateRange::new(d(1, 1), d(12, 31)).unwrap();
        let avg = store.average_inventory_in("t1", &range, &DimensionFilters::default());
        assert_eq!(avg, dec!(200));
    }

    #[test]
    fn test_location_filter_applies_to_inventory() {
        let store = InMemoryTransactionSource::new(
            vec![],
            vec![snapshot(d(1, 1), "a", dec!(100)), snapshot(d(1, 1), "b", dec!(50))],
        );
        let range = DateRange::new(d(1, 1), d(1, 31)).unwrap();
        let filters = DimensionFilters {
            location_id: Some("b".into()),
            category_id: None,
        };
        assert_eq!(store.average_inventory_in("t1", &range, &filters), dec!(50));
        assert_eq!(
            store.average_inventory_in("other", &range, &filters),
            Decimal::ZERO
        );
    }
}
