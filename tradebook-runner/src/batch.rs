//! Per-backtest metrics computed in parallel.
//!
//! A trade log often mixes several backtests. Each backtest is reconciled
//! on its own; the computation shares nothing, so groups fan out across
//! rayon's pool.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tradebook_core::{BacktestId, TradeAction};

use crate::config::MetricsConfig;
use crate::metrics::{calculate_trade_metrics_extended, TradeMetricsExtended};

/// Metrics for one backtest. `backtest_id` is `None` for actions that
/// carried no backtest id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestMetrics {
    pub backtest_id: Option<BacktestId>,
    pub action_count: usize,
    pub metrics: TradeMetricsExtended,
}

/// Actions keyed by backtest id; `None` collects actions without one.
pub type BacktestGroups = BTreeMap<Option<BacktestId>, Vec<TradeAction>>;

/// Split `actions` by backtest id, preserving input order within a group.
pub fn group_by_backtest(actions: &[TradeAction]) -> BacktestGroups {
    let mut groups = BacktestGroups::new();
    for action in actions {
        groups
            .entry(action.backtest_id.clone())
            .or_default()
            .push(action.clone());
    }
    groups
}

/// Metrics for every backtest in `actions`, ordered by backtest id
/// (actions without an id first).
pub fn compute_by_backtest(
    actions: &[TradeAction],
    config: &MetricsConfig,
) -> Vec<BacktestMetrics> {
    let groups: Vec<(Option<BacktestId>, Vec<TradeAction>)> =
        group_by_backtest(actions).into_iter().collect();

    groups
        .into_par_iter()
        .map(|(backtest_id, group)| BacktestMetrics {
            action_count: group.len(),
            metrics: calculate_trade_metrics_extended(&group, config),
            backtest_id,
        })
        .collect()
}
