//! Performance metrics: pure functions from positions to statistics.
//!
//! Conventions shared by every function here:
//! - rates are percentages in the 0–100 range
//! - ratios over an empty subset are 0
//! - standard deviations are population (divide by N)
//! - Sharpe and Sortino are annualised by √252 over per-trade % returns

use serde::{Deserialize, Serialize};
use tradebook_core::{
    match_positions, unbounded, CloseReasonType, CompletedPosition, PositionSide, TradeAction,
};

use crate::config::MetricsConfig;

const ANNUALIZATION_PERIODS: f64 = 252.0;

/// Headline statistics over completed trades.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeMetrics {
    // ── Counts ──
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,

    // ── PnL ──
    #[serde(rename = "totalPnL")]
    pub total_pnl: f64,
    #[serde(rename = "totalPnLPercentage", with = "unbounded")]
    pub total_pnl_percentage: f64,
    #[serde(rename = "averagePnL")]
    pub average_pnl: f64,
    pub average_win: f64,
    pub average_loss: f64,
    pub best_trade: f64,
    pub worst_trade: f64,
    /// `f64::INFINITY` when there are profits and no losses.
    #[serde(with = "unbounded")]
    pub profit_factor: f64,

    // ── Risk-adjusted ──
    // NaN-prone: a zero entry price makes its trade's return non-finite.
    #[serde(with = "unbounded")]
    pub sharpe_ratio: f64,
    #[serde(with = "unbounded")]
    pub sortino_ratio: f64,

    // ── Drawdown ──
    pub max_drawdown: f64,
    #[serde(with = "unbounded")]
    pub max_drawdown_percentage: f64,
    pub average_drawdown: f64,

    // ── Totals ──
    pub total_profit: f64,
    /// Gross loss as a positive number.
    pub total_loss: f64,
    pub expectancy: f64,
}

/// [`TradeMetrics`] plus exit-type, direction, risk/reward and duration
/// breakdowns. Serializes as one flat record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeMetricsExtended {
    #[serde(flatten)]
    pub base: TradeMetrics,

    // ── Exit type ──
    pub tp_hit_rate: f64,
    pub sl_hit_rate: f64,
    pub manual_close_rate: f64,
    pub open_positions_count: usize,
    pub average_risk_reward: f64,
    pub win_rate_tp_hit: f64,
    pub win_rate_sl_hit: f64,
    pub win_rate_manual: f64,

    // ── Direction ──
    pub long_positions: usize,
    pub short_positions: usize,
    pub long_win_rate: f64,
    pub short_win_rate: f64,

    // ── Duration ──
    pub average_trade_duration_hours: f64,
    pub average_win_duration_hours: f64,
    pub average_loss_duration_hours: f64,
}

/// The three numbers per trade the headline statistics need.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeOutcome {
    pub pnl: f64,
    pub pnl_percentage: f64,
    pub is_win: bool,
}

impl From<&CompletedPosition> for TradeOutcome {
    fn from(p: &CompletedPosition) -> Self {
        Self {
            pnl: p.pnl,
            pnl_percentage: p.pnl_percentage,
            is_win: p.is_win,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawdownStats {
    pub max_drawdown: f64,
    /// Max drawdown relative to the peak it fell from, in percent.
    pub max_drawdown_percentage: f64,
    /// Mean of the strictly positive drawdown observations.
    pub average_drawdown: f64,
}

// ─── Entry points ───────────────────────────────────────────────────

/// Match `actions` into positions and compute every metric.
///
/// Never fails: empty or unmatched input yields an all-zero record.
pub fn calculate_trade_metrics_extended(
    actions: &[TradeAction],
    config: &MetricsConfig,
) -> TradeMetricsExtended {
    let positions = match_positions(actions, config.current_price, config.tolerance_fraction());
    metrics_from_positions(&positions, config.initial_capital)
}

/// Compute every metric from already-matched positions.
///
/// Open positions are only counted; all ratios use closed ones.
pub fn metrics_from_positions(
    positions: &[CompletedPosition],
    initial_capital: f64,
) -> TradeMetricsExtended {
    let completed: Vec<&CompletedPosition> = positions.iter().filter(|p| p.is_closed()).collect();
    let open_positions_count = positions.len() - completed.len();

    if completed.is_empty() {
        return TradeMetricsExtended {
            open_positions_count,
            ..Default::default()
        };
    }

    let outcomes: Vec<TradeOutcome> = completed.iter().map(|p| TradeOutcome::from(*p)).collect();
    let base = base_metrics(&outcomes, initial_capital);
    let total = completed.len() as f64;

    let by_reason = |kind: CloseReasonType| -> Vec<&CompletedPosition> {
        completed
            .iter()
            .copied()
            .filter(|p| p.close_reason.kind == kind)
            .collect()
    };
    let tp_hits = by_reason(CloseReasonType::TpHit);
    let sl_hits = by_reason(CloseReasonType::SlHit);
    let manual = by_reason(CloseReasonType::Manual);

    let (longs, shorts): (Vec<&CompletedPosition>, Vec<&CompletedPosition>) = completed
        .iter()
        .copied()
        .partition(|p| p.direction == PositionSide::Long);

    let risk_rewards: Vec<f64> = completed.iter().map(|p| p.actual_risk_reward).collect();

    TradeMetricsExtended {
        base,
        tp_hit_rate: tp_hits.len() as f64 / total * 100.0,
        sl_hit_rate: sl_hits.len() as f64 / total * 100.0,
        manual_close_rate: manual.len() as f64 / total * 100.0,
        open_positions_count,
        average_risk_reward: mean(&risk_rewards),
        win_rate_tp_hit: win_rate_pct(&tp_hits),
        win_rate_sl_hit: win_rate_pct(&sl_hits),
        win_rate_manual: win_rate_pct(&manual),
        long_positions: longs.len(),
        short_positions: shorts.len(),
        long_win_rate: win_rate_pct(&longs),
        short_win_rate: win_rate_pct(&shorts),
        average_trade_duration_hours: average_duration(completed.iter().copied()),
        average_win_duration_hours: average_duration(
            completed.iter().copied().filter(|p| p.is_win),
        ),
        average_loss_duration_hours: average_duration(
            completed.iter().copied().filter(|p| !p.is_win),
        ),
    }
}

/// Headline statistics over trade outcomes in the order they closed.
pub fn base_metrics(outcomes: &[TradeOutcome], initial_capital: f64) -> TradeMetrics {
    if outcomes.is_empty() {
        return TradeMetrics::default();
    }

    let total_trades = outcomes.len();
    let winning_trades = outcomes.iter().filter(|o| o.is_win).count();
    let losing_trades = total_trades - winning_trades;

    let pnls: Vec<f64> = outcomes.iter().map(|o| o.pnl).collect();
    let win_pnls: Vec<f64> = outcomes.iter().filter(|o| o.is_win).map(|o| o.pnl).collect();
    let loss_pnls: Vec<f64> = outcomes.iter().filter(|o| !o.is_win).map(|o| o.pnl).collect();

    let total_pnl: f64 = pnls.iter().sum();
    let total_profit: f64 = win_pnls.iter().sum();
    let total_loss = loss_pnls.iter().sum::<f64>().abs();

    let returns: Vec<f64> = outcomes.iter().map(|o| o.pnl_percentage).collect();
    let drawdown = drawdown_stats(&equity_curve_from_pnls(pnls.iter().copied(), initial_capital));

    TradeMetrics {
        total_trades,
        winning_trades,
        losing_trades,
        win_rate: winning_trades as f64 / total_trades as f64 * 100.0,
        total_pnl,
        total_pnl_percentage: total_pnl / initial_capital * 100.0,
        average_pnl: total_pnl / total_trades as f64,
        average_win: mean(&win_pnls),
        average_loss: mean(&loss_pnls),
        best_trade: pnls.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        worst_trade: pnls.iter().copied().fold(f64::INFINITY, f64::min),
        profit_factor: profit_factor(total_profit, total_loss),
        sharpe_ratio: sharpe_ratio(&returns),
        sortino_ratio: sortino_ratio(&returns),
        max_drawdown: drawdown.max_drawdown,
        max_drawdown_percentage: drawdown.max_drawdown_percentage,
        average_drawdown: drawdown.average_drawdown,
        total_profit,
        total_loss,
        expectancy: total_pnl / total_trades as f64,
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Gross profit / gross loss (both positive).
///
/// `f64::INFINITY` with profit and no loss, 0 when both are zero.
pub fn profit_factor(total_profit: f64, total_loss: f64) -> f64 {
    if total_loss > 0.0 {
        total_profit / total_loss
    } else if total_profit > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}

/// Annualised Sharpe ratio over per-trade % returns.
///
/// mean / population std × √252, 0 when the std is zero.
pub fn sharpe_ratio(returns: &[f64]) -> f64 {
    let std = population_std_dev(returns);
    if std > 0.0 {
        mean(returns) / std * ANNUALIZATION_PERIODS.sqrt()
    } else {
        0.0
    }
}

/// Annualised Sortino ratio over per-trade % returns.
///
/// Downside deviation is the root mean square of the negative returns only
/// (target 0); with no negative returns the ratio is 0.
pub fn sortino_ratio(returns: &[f64]) -> f64 {
    let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    if downside.is_empty() {
        return 0.0;
    }
    let downside_mean_square = downside.iter().map(|r| r * r).sum::<f64>() / downside.len() as f64;
    let downside_deviation = downside_mean_square.sqrt();
    if downside_deviation > 0.0 {
        mean(returns) / downside_deviation * ANNUALIZATION_PERIODS.sqrt()
    } else {
        0.0
    }
}

/// Equity curve over the closed positions, in the order given.
///
/// Starts at `initial_capital`, so it is one longer than the number of
/// closed positions.
pub fn equity_curve(positions: &[CompletedPosition], initial_capital: f64) -> Vec<f64> {
    equity_curve_from_pnls(
        positions.iter().filter(|p| p.is_closed()).map(|p| p.pnl),
        initial_capital,
    )
}

pub fn equity_curve_from_pnls(
    pnls: impl IntoIterator<Item = f64>,
    initial_capital: f64,
) -> Vec<f64> {
    let mut curve = vec![initial_capital];
    let mut equity = initial_capital;
    for pnl in pnls {
        equity += pnl;
        curve.push(equity);
    }
    curve
}

/// Walk an equity curve tracking the running peak.
///
/// The percentage reported is the max drawdown's own, relative to the peak
/// at that point, not the largest percentage seen.
pub fn drawdown_stats(curve: &[f64]) -> DrawdownStats {
    let Some(&first) = curve.first() else {
        return DrawdownStats::default();
    };

    let mut peak = first;
    let mut stats = DrawdownStats::default();
    let mut positive: Vec<f64> = Vec::new();

    for &equity in &curve[1..] {
        if equity > peak {
            peak = equity;
        }
        let drawdown = peak - equity;
        if drawdown > stats.max_drawdown {
            stats.max_drawdown = drawdown;
            stats.max_drawdown_percentage = drawdown / peak * 100.0;
        }
        if drawdown > 0.0 {
            positive.push(drawdown);
        }
    }

    stats.average_drawdown = mean(&positive);
    stats
}

// ─── Helpers ────────────────────────────────────────────────────────

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Standard deviation dividing by N.
pub(crate) fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

fn win_rate_pct(positions: &[&CompletedPosition]) -> f64 {
    if positions.is_empty() {
        return 0.0;
    }
    positions.iter().filter(|p| p.is_win).count() as f64 / positions.len() as f64 * 100.0
}

fn average_duration<'a>(positions: impl Iterator<Item = &'a CompletedPosition>) -> f64 {
    let hours: Vec<f64> = positions.filter_map(|p| p.duration_hours).collect();
    mean(&hours)
}
