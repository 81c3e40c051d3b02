use thiserror::Error;

#[derive(Debug, Error)]
pub enum BenchmarkError {
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Data access failure: {0}")]
    DataAccess(String),

    #[error("Timeout: {operation} did not complete within {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("Cache failure: {0}")]
    Cache(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Benchmarking analysis failed: {source}")]
    AnalysisFailed {
        #[source]
        source: Box<BenchmarkError>,
    },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl BenchmarkError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        BenchmarkError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Wrap an error as the generic analysis failure, keeping the root cause.
    /// Validation errors pass through untouched so callers still see them.
    pub fn into_analysis_failure(self) -> Self {
        match self {
            e @ BenchmarkError::InvalidInput { .. } => e,
            e @ BenchmarkError::AnalysisFailed { .. } => e,
            other => BenchmarkError::AnalysisFailed {
                source: Box::new(other),
            },
        }
    }

    /// True for failures of an external collaborator (store, cache, deadline).
    pub fn is_data_access(&self) -> bool {
        matches!(
            self,
            BenchmarkError::DataAccess(_)
                | BenchmarkError::Timeout { .. }
                | BenchmarkError::Cache(_)
        )
    }
}

impl From<serde_json::Error> for BenchmarkError {
    fn from(e: serde_json::Error) -> Self {
        BenchmarkError::SerializationError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_analysis_failure_preserves_root_cause() {
        let err = BenchmarkError::DataAccess("connection refused".into()).into_analysis_failure();
        assert!(err.to_string().starts_with("Benchmarking analysis failed"));
        let source = err.source().expect("root cause kept");
        assert!(source.to_string().contains("connection refused"));
    }

    #[test]
    fn test_validation_errors_are_not_wrapped() {
        let err = BenchmarkError::invalid("metrics", "unsupported metric 'ebitda'").into_analysis_failure();
        assert!(matches!(err, BenchmarkError::InvalidInput { .. }));
    }

    #[test]
    fn test_data_access_classification() {
        assert!(BenchmarkError::Cache("down".into()).is_data_access());
        assert!(BenchmarkError::Timeout {
            operation: "find_eligible".into(),
            timeout_ms: 10
        }
        .is_data_access());
        assert!(!BenchmarkError::InsufficientData("empty".into()).is_data_access());
    }
}
