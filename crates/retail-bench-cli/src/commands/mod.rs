pub mod aggregate;
pub mod analyze;
pub mod compare;
pub mod metrics;
pub mod peers;
pub mod trend;

use retail_bench_core::benchmarks::BenchmarkType;
use serde_json::Value;

/// Parse a snake_case benchmark type name from a flag.
pub(crate) fn parse_benchmark_type(name: &str) -> Result<BenchmarkType, Box<dyn std::error::Error>> {
    serde_json::from_value(Value::String(name.trim().to_lowercase())).map_err(|_| {
        format!(
            "Unknown benchmark type '{}'. Use: industry_standard, category_average, best_performer",
            name
        )
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_benchmark_type_flag_parsing() {
        assert_eq!(
            parse_benchmark_type(" Category_Average ").unwrap(),
            BenchmarkType::CategoryAverage
        );
        assert!(parse_benchmark_type("median").is_err());
    }
}
