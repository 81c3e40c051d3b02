use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::SizeTier;

/// Broad retail industry a tenant's peers are modelled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndustryPattern {
    Food,
    Fashion,
    Electronics,
    General,
}

/// Distribution parameters for one industry pattern.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatternProfile {
    /// Gross margin %, normally distributed
    pub margin_mean: f64,
    pub margin_std_dev: f64,
    pub turnover_range: (f64, f64),
    /// Year-on-year revenue growth %
    pub growth_range: (f64, f64),
    /// Annual revenue band of a small business; larger tiers scale it
    pub revenue_band: (Decimal, Decimal),
    pub average_unit_price: Decimal,
}

const FOOD_KEYWORDS: &[&str] = &[
    "food", "grocery", "beverage", "bakery", "restaurant", "cafe", "coffee", "snack", "f&b",
    "fnb", "minimarket", "culinary",
];
const FASHION_KEYWORDS: &[&str] = &[
    "fashion", "apparel", "clothing", "garment", "shoe", "footwear", "boutique", "textile",
    "accessories", "jewelry",
];
const ELECTRONICS_KEYWORDS: &[&str] = &[
    "electronic", "gadget", "phone", "mobile", "computer", "laptop", "appliance", "camera",
];

impl IndustryPattern {
    pub const ALL: [IndustryPattern; 4] = [
        IndustryPattern::Food,
        IndustryPattern::Fashion,
        IndustryPattern::Electronics,
        IndustryPattern::General,
    ];

    /// Keyword match on a free-text category; anything unrecognised is general.
    pub fn classify(category: Option<&str>) -> Self {
        let Some(category) = category else {
            return IndustryPattern::General;
        };
        let lower = category.to_ascii_lowercase();
        let hit = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));
        if hit(FOOD_KEYWORDS) {
            IndustryPattern::Food
        } else if hit(FASHION_KEYWORDS) {
            IndustryPattern::Fashion
        } else if hit(ELECTRONICS_KEYWORDS) {
            IndustryPattern::Electronics
        } else {
            IndustryPattern::General
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IndustryPattern::Food => "food",
            IndustryPattern::Fashion => "fashion",
            IndustryPattern::Electronics => "electronics",
            IndustryPattern::General => "general",
        }
    }

    pub fn profile(&self) -> PatternProfile {
        match self {
            IndustryPattern::Food => PatternProfile {
                margin_mean: 22.0,
                margin_std_dev: 6.0,
                turnover_range: (8.0, 18.0),
                growth_range: (2.0, 15.0),
                revenue_band: (dec!(150000000), dec!(600000000)),
                average_unit_price: dec!(25000),
            },
            IndustryPattern::Fashion => PatternProfile {
                margin_mean: 45.0,
                margin_std_dev: 10.0,
                turnover_range: (3.0, 7.0),
                growth_range: (-5.0, 20.0),
                revenue_band: (dec!(200000000), dec!(800000000)),
                average_unit_price: dec!(150000),
            },
            IndustryPattern::Electronics => PatternProfile {
                margin_mean: 18.0,
                margin_std_dev: 5.0,
                turnover_range: (4.0, 9.0),
                growth_range: (0.0, 18.0),
                revenue_band: (dec!(400000000), dec!(1500000000)),
                average_unit_price: dec!(1500000),
            },
            IndustryPattern::General => PatternProfile {
                margin_mean: 28.0,
                margin_std_dev: 8.0,
                turnover_range: (5.0, 10.0),
                growth_range: (0.0, 14.0),
                revenue_band: (dec!(150000000), dec!(700000000)),
                average_unit_price: dec!(50000),
            },
        }
    }
}

impl fmt::Display for IndustryPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn tier_multiplier(tier: SizeTier) -> Decimal {
    match tier {
        SizeTier::Small => dec!(1),
        SizeTier::Medium => dec!(8),
        SizeTier::Large => dec!(40),
    }
}

impl PatternProfile {
    /// Revenue band for `tier`: the small band times the tier multiplier.
    pub fn tier_band(&self, tier: SizeTier) -> (Decimal, Decimal) {
        let m = tier_multiplier(tier);
        (self.revenue_band.0 * m, self.revenue_band.1 * m)
    }

    /// Tier whose band ceiling first covers `revenue`.
    pub fn tier_for_revenue(&self, revenue: Decimal) -> SizeTier {
        if revenue <= self.tier_band(SizeTier::Small).1 {
            SizeTier::Small
        } else if revenue <= self.tier_band(SizeTier::Medium).1 {
            SizeTier::Medium
        } else {
            SizeTier::Large
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_classification() {
        assert_eq!(IndustryPattern::classify(Some("Fresh Food & Grocery")), IndustryPattern::Food);
        assert_eq!(IndustryPattern::classify(Some("Women's Apparel")), IndustryPattern::Fashion);
        assert_eq!(IndustryPattern::classify(Some("Mobile Phones")), IndustryPattern::Electronics);
        assert_eq!(IndustryPattern::classify(Some("Hardware store")), IndustryPattern::General);
        assert_eq!(IndustryPattern::classify(None), IndustryPattern::General);
    }

    #[test]
    fn test_tier_bands_scale() {
        let food = IndustryPattern::Food.profile();
        assert_eq!(food.tier_band(SizeTier::Medium), (dec!(1200000000), dec!(4800000000)));
        assert_eq!(food.tier_band(SizeTier::Large).1, dec!(24000000000));
    }

    #[test]
    fn test_tier_for_revenue() {
        let general = IndustryPattern::General.profile();
        assert_eq!(general.tier_for_revenue(dec!(500000000)), SizeTier::Small);
        assert_eq!(general.tier_for_revenue(dec!(2000000000)), SizeTier::Medium);
        assert_eq!(general.tier_for_revenue(dec!(9000000000)), SizeTier::Large);
    }

    #[test]
    fn test_profiles_are_well_formed() {
        for pattern in IndustryPattern::ALL {
            let p = pattern.profile();
            assert!(p.turnover_range.0 < p.turnover_range.1);
            assert!(p.growth_range.0 < p.growth_range.1);
            assert!(p.revenue_band.0 < p.revenue_band.1);
            assert!(p.margin_std_dev > 0.0);
        }
    }
}
