pub mod historical;
pub mod regression;

pub use historical::{
    historical_multiplier, historical_trends, project_historical_trends, HistoricalTrend,
    HistoricalTrendInput, HistoricalTrendOutput, MIN_HISTORY_POINTS,
};
pub use regression::{analyze_trend, fit_trend, TrendDirection, TrendFit, TrendInput, TrendOutput};
