pub mod engine;
#[cfg(feature = "peers")]
pub mod peer;
pub mod recommendations;

pub use engine::{
    compare, compare_metric, summarize, BenchmarkReference, BenchmarkSummary, ClassificationBasis,
    ComparisonInput, ComparisonResult, PerformanceCategory,
};
#[cfg(feature = "peers")]
pub use peer::{compare_with_peers, CohortAnalysis, GrowthComparison, PeerComparison, PeerRanking};
pub use recommendations::recommendations;
