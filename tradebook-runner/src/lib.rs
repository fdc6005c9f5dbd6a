//! Tradebook Runner: metrics aggregation, configuration, loading, reports.
//!
//! This crate builds on `tradebook-core` to provide:
//! - Extended performance metrics over reconciled positions
//! - Legacy buy/sell-pair metrics
//! - TOML configuration with validation
//! - Trade-action loading from JSON or CSV
//! - Per-backtest metrics in parallel
//! - Fingerprinted reports with JSON/CSV export

pub mod batch;
pub mod config;
pub mod export;
pub mod legacy;
pub mod loader;
pub mod metrics;
pub mod report;

pub use batch::{compute_by_backtest, group_by_backtest, BacktestGroups, BacktestMetrics};
pub use config::{
    ConfigError, MetricsConfig, DEFAULT_INITIAL_CAPITAL, DEFAULT_PRICE_TOLERANCE_PERCENT,
};
pub use export::{export_equity_csv, export_positions_csv, load_report, save_report, ExportError};
pub use legacy::calculate_trade_metrics;
pub use loader::{load_actions, LoadError};
pub use metrics::{
    calculate_trade_metrics_extended, drawdown_stats, equity_curve, metrics_from_positions,
    DrawdownStats, TradeMetrics, TradeMetricsExtended,
};
pub use report::{input_hash, MetricsReport, SCHEMA_VERSION};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn metrics_are_send_sync() {
        assert_send::<TradeMetricsExtended>();
        assert_sync::<TradeMetricsExtended>();
        assert_send::<BacktestMetrics>();
        assert_sync::<BacktestMetrics>();
    }

    #[test]
    fn config_is_send_sync() {
        assert_send::<MetricsConfig>();
        assert_sync::<MetricsConfig>();
    }

    #[test]
    fn report_is_send_sync() {
        assert_send::<MetricsReport>();
        assert_sync::<MetricsReport>();
    }
}
