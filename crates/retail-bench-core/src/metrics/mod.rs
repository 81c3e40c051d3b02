pub mod calculator;
pub mod source;

pub use calculator::{calculate_metrics, compute_metrics, MetricCalculator, MetricsInput, MetricsOutput};
pub use source::{InMemoryTransactionSource, InventorySnapshot, SaleTransaction, TransactionSource};
