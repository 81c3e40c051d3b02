use super::engine::PerformanceCategory;
use crate::types::MetricType;

const MAINTAIN: &str = "Maintain current strategy and keep monitoring against the benchmark";

/// Canned guidance for a metric in a performance band. Never empty.
pub fn recommendations(metric: MetricType, category: PerformanceCategory) -> Vec<String> {
    use MetricType::*;
    use PerformanceCategory::*;

    let lines: &[&str] = match (metric, category) {
        (Revenue, Poor | BelowAverage) => &[
            "Review pricing against local competitors and adjust slow-moving lines",
            "Run targeted promotions on high-margin categories to lift basket size",
            "Extend opening hours or sales channels where footfall supports it",
        ],
        (Revenue, Excellent | AboveAverage) => &[
            "Protect revenue leadership by securing supply for best-selling lines",
            "Consider expanding into adjacent categories or locations",
        ],
        (Profit, Poor | BelowAverage) => &[
            "Renegotiate supplier terms on the highest-volume products",
            "Cut operating costs that do not drive sales",
            "Shift promotional spend toward higher-margin products",
        ],
        (Profit, Excellent | AboveAverage) => &[
            "Reinvest surplus profit in inventory for proven sellers",
        ],
        (Margin, Poor | BelowAverage) => &[
            "Audit discounting; margins trail the benchmark",
            "Source alternative suppliers for low-margin best sellers",
            "Review product mix and delist items selling below target margin",
        ],
        (Margin, Excellent | AboveAverage) => &[
            "Margins lead the market; watch that pricing does not suppress volume",
        ],
        (Turnover, Poor | BelowAverage) => &[
            "Reduce stock levels on slow-moving items",
            "Use clearance pricing on aged inventory",
            "Tighten reorder points using recent sales velocity",
        ],
        (Turnover, Excellent | AboveAverage) => &[
            "Fast stock rotation; check safety stock to avoid stock-outs on key items",
        ],
        (Volume, Poor | BelowAverage) => &[
            "Broaden the assortment in categories with proven demand",
            "Use bundles and multi-buy offers to lift units per transaction",
        ],
        (Volume, Excellent | AboveAverage) => &[
            "High unit volume; negotiate volume discounts with suppliers",
        ],
        (Growth, Poor | BelowAverage) => &[
            "Growth lags the market; identify categories losing share",
            "Invest in customer retention and repeat-purchase programmes",
        ],
        (Growth, Excellent | AboveAverage) => &[
            "Strong growth; make sure working capital and stock keep pace",
        ],
        (_, Average) => &[],
    };

    if lines.is_empty() {
        vec![MAINTAIN.to_string()]
    } else {
        lines.iter().map(|s| s.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_pair_has_guidance() {
        let categories = [
            PerformanceCategory::Poor,
            PerformanceCategory::BelowAverage,
            PerformanceCategory::Average,
            PerformanceCategory::AboveAverage,
            PerformanceCategory::Excellent,
        ];
        for metric in MetricType::ALL {
            for category in categories {
                assert!(!recommendations(metric, category).is_empty(), "{metric}/{category}");
            }
        }
    }

    #[test]
    fn test_average_falls_back_to_maintain() {
        assert_eq!(
            recommendations(MetricType::Margin, PerformanceCategory::Average),
            vec![MAINTAIN.to_string()]
        );
    }
}
