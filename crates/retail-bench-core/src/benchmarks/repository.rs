use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::records::{BenchmarkRecord, BenchmarkSource, DataQuality, Region};
use crate::BenchmarkResult;

/// Filters for the eligible-record query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EligibleBenchmarkQuery {
    pub is_active: bool,
    pub data_quality: Vec<DataQuality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
    /// Empty means any source
    #[serde(default)]
    pub sources: Vec<BenchmarkSource>,
    #[serde(default)]
    pub min_sample_size: u32,
    pub not_expired_as_of: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl EligibleBenchmarkQuery {
    pub fn matches(&self, record: &BenchmarkRecord) -> bool {
        record.is_active == self.is_active
            && self.data_quality.contains(&record.data_quality)
            && self.region.map_or(true, |r| r == record.region)
            && (self.sources.is_empty() || self.sources.contains(&record.source))
            && record.sample_size >= self.min_sample_size
            && !record.is_expired(self.not_expired_as_of)
            && match (&self.category, &record.category) {
                (Some(wanted), Some(have)) => wanted.eq_ignore_ascii_case(have),
                // market-wide records apply to every category
                (Some(_), None) => true,
                (None, _) => true,
            }
    }
}

/// Read-only access to stored benchmark records. The engine never writes.
#[async_trait]
pub trait BenchmarkRepository: Send + Sync {
    async fn find_eligible(&self, query: &EligibleBenchmarkQuery) -> BenchmarkResult<Vec<BenchmarkRecord>>;

    /// Records whose period starts on or after `since`, ordered by
    /// `period_start_date`.
    async fn find_historical(
        &self,
        since: NaiveDate,
        data_quality: &[DataQuality],
    ) -> BenchmarkResult<Vec<BenchmarkRecord>>;
}

/// Repository over an in-memory record list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryBenchmarkRepository {
    pub records: Vec<BenchmarkRecord>,
}

impl InMemoryBenchmarkRepository {
    pub fn new(records: Vec<BenchmarkRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl BenchmarkRepository for InMemoryBenchmarkRepository {
    async fn find_eligible(&self, query: &EligibleBenchmarkQuery) -> BenchmarkResult<Vec<BenchmarkRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|r| query.matches(r))
            .cloned()
            .collect())
    }

    async fn find_historical(
        &self,
        since: NaiveDate,
        data_quality: &[DataQuality],
    ) -> BenchmarkResult<Vec<BenchmarkRecord>> {
        let mut out: Vec<BenchmarkRecord> = self
            .records
            .iter()
            .filter(|r| r.period_start_date >= since && data_quality.contains(&r.data_quality))
            .cloned()
            .collect();
        out.sort_by_key(|r| r.period_start_date);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn record(start: NaiveDate, region: Region, quality: DataQuality) -> BenchmarkRecord {
        BenchmarkRecord {
            metric_name: "revenue".into(),
            value: dec!(100),
            percentile_25: None,
            percentile_50: None,
            percentile_75: None,
            percentile_90: None,
            sample_size: 150,
            priority_weight: dec!(1),
            data_quality: quality,
            source: BenchmarkSource::TradeAssociation,
            region,
            period_start_date: start,
            expiry_date: d(2026, 1),
            is_active: true,
            category: None,
        }
    }

    fn query() -> EligibleBenchmarkQuery {
        EligibleBenchmarkQuery {
            is_active: true,
            data_quality: vec![DataQuality::Verified],
            region: Some(Region::National),
            sources: vec![],
            min_sample_size: 100,
            not_expired_as_of: d(2025, 1),
            category: Some("food".into()),
        }
    }

    #[tokio::test]
    async fn test_find_eligible_applies_filters() {
        let mut food = record(d(2024, 1), Region::National, DataQuality::Verified);
        food.category = Some("Food".into());
        let mut fashion = record(d(2024, 1), Region::National, DataQuality::Verified);
        fashion.category = Some("fashion".into());
        let repo = InMemoryBenchmarkRepository::new(vec![
            food,
            fashion,
            record(d(2024, 1), Region::National, DataQuality::Verified),
            record(d(2024, 1), Region::City, DataQuality::Verified),
            record(d(2024, 1), Region::National, DataQuality::Estimated),
        ]);
        let found = repo.find_eligible(&query()).await.unwrap();
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn test_find_historical_is_ordered() {
        let repo = InMemoryBenchmarkRepository::new(vec![
            record(d(2024, 3), Region::National, DataQuality::Verified),
            record(d(2023, 1), Region::National, DataQuality::Verified),
            record(d(2024, 1), Region::National, DataQuality::Verified),
            record(d(2024, 2), Region::National, DataQuality::Estimated),
        ]);
        let found = repo
            .find_historical(d(2023, 6), &[DataQuality::Verified])
            .await
            .unwrap();
        let starts: Vec<NaiveDate> = found.iter().map(|r| r.period_start_date).collect();
        assert_eq!(starts, vec![d(2024, 1), d(2024, 3)]);
    }
}
