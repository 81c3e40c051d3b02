use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::MetricType;

/// Bumped whenever a built-in synonym is added, removed or remapped.
pub const SYNONYM_TABLE_VERSION: u32 = 1;

const BUILTIN_SYNONYMS: &[(&str, MetricType)] = &[
    ("revenue", MetricType::Revenue),
    ("total_revenue", MetricType::Revenue),
    ("sales", MetricType::Revenue),
    ("net_sales", MetricType::Revenue),
    ("gross_sales", MetricType::Revenue),
    ("sales_revenue", MetricType::Revenue),
    ("annual_revenue", MetricType::Revenue),
    ("profit", MetricType::Profit),
    ("gross_profit", MetricType::Profit),
    ("net_profit", MetricType::Profit),
    ("operating_profit", MetricType::Profit),
    ("margin", MetricType::Margin),
    ("gross_margin", MetricType::Margin),
    ("profit_margin", MetricType::Margin),
    ("net_margin", MetricType::Margin),
    ("gross_margin_pct", MetricType::Margin),
    ("turnover", MetricType::Turnover),
    ("inventory_turnover", MetricType::Turnover),
    ("stock_turnover", MetricType::Turnover),
    ("inventory_turns", MetricType::Turnover),
    ("volume", MetricType::Volume),
    ("sales_volume", MetricType::Volume),
    ("units_sold", MetricType::Volume),
    ("quantity_sold", MetricType::Volume),
    ("growth", MetricType::Growth),
    ("revenue_growth", MetricType::Growth),
    ("sales_growth", MetricType::Growth),
    ("yoy_growth", MetricType::Growth),
    ("growth_rate", MetricType::Growth),
];

/// Versioned lookup from published metric names to [`MetricType`].
///
/// Names are normalised before lookup (trimmed, lowercased, `-` and spaces
/// folded to `_`). There is no fuzzy matching: a name missing from the table
/// is unmapped and its record is discarded by the aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynonymTable {
    pub version: u32,
    pub entries: BTreeMap<String, MetricType>,
}

impl Default for SynonymTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SynonymTable {
    pub fn builtin() -> Self {
        SynonymTable {
            version: SYNONYM_TABLE_VERSION,
            entries: BUILTIN_SYNONYMS
                .iter()
                .map(|(name, metric)| (name.to_string(), *metric))
                .collect(),
        }
    }

    pub fn normalize(name: &str) -> String {
        name.trim()
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c == '-' || c.is_whitespace() { '_' } else { c })
            .collect()
    }

    pub fn resolve(&self, name: &str) -> Option<MetricType> {
        self.entries.get(&Self::normalize(name)).copied()
    }

    /// Add or remap a synonym; the caller owns versioning of extended tables.
    pub fn with_entry(mut self, name: &str, metric: MetricType) -> Self {
        self.entries.insert(Self::normalize(name), metric);
        self
    }
}
