use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::SizeTier;
use crate::BenchmarkResult;

fn default_location_count() -> u32 {
    1
}

/// What the engine knows about a tenant's business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantCharacteristics {
    pub tenant_id: String,
    /// Free-text primary retail category, e.g. "Fresh Food & Grocery"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_category: Option<String>,
    /// Declared tier; derived from revenue when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_tier: Option<SizeTier>,
    #[serde(default = "default_location_count")]
    pub location_count: u32,
    #[serde(default)]
    pub product_count: u32,
}

/// Lookup of tenant characteristics. `Ok(None)` means the tenant is unknown.
#[async_trait]
pub trait CharacteristicsSource: Send + Sync {
    async fn characteristics(&self, tenant_id: &str) -> BenchmarkResult<Option<TenantCharacteristics>>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryCharacteristicsSource {
    tenants: HashMap<String, TenantCharacteristics>,
}

impl InMemoryCharacteristicsSource {
    pub fn new(tenants: impl IntoIterator<Item = TenantCharacteristics>) -> Self {
        Self {
            tenants: tenants
                .into_iter()
                .map(|c| (c.tenant_id.clone(), c))
                .collect(),
        }
    }
}

#[async_trait]
impl CharacteristicsSource for InMemoryCharacteristicsSource {
    async fn characteristics(&self, tenant_id: &str) -> BenchmarkResult<Option<TenantCharacteristics>> {
        Ok(self.tenants.get(tenant_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lookup() {
        let source = InMemoryCharacteristicsSource::new(vec![TenantCharacteristics {
            tenant_id: "t-1".into(),
            primary_category: Some("bakery".into()),
            size_tier: None,
            location_count: 2,
            product_count: 80,
        }]);
        assert!(source.characteristics("t-1").await.unwrap().is_some());
        assert!(source.characteristics("t-2").await.unwrap().is_none());
    }

    #[test]
    fn test_deserialize_minimal() {
        let c: TenantCharacteristics = serde_json::from_str(r#"{"tenant_id":"t-9"}"#).unwrap();
        assert_eq!(c.location_count, 1);
        assert_eq!(c.primary_category, None);
    }
}
