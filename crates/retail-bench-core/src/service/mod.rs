pub mod analyze;
pub mod config;

pub use analyze::{BenchmarkingRequest, BenchmarkingResponse, BenchmarkingService};
pub use config::EngineConfig;
