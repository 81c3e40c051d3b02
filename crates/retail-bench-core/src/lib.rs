pub mod error;
pub mod types;

pub mod benchmarks;
pub mod comparison;
pub mod metrics;
pub mod trends;

#[cfg(feature = "peers")]
pub mod peers;

#[cfg(feature = "service")]
pub mod service;

pub use error::BenchmarkError;
pub use types::*;

/// Standard result type for all benchmarking operations
pub type BenchmarkResult<T> = Result<T, BenchmarkError>;
