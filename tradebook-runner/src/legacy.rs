//! Legacy long-only metrics.
//!
//! Older backtests recorded round trips as a `buy` followed by a `sell`
//! rather than entry + `close`. This pairs them FIFO as long trades and
//! reports the headline [`TradeMetrics`] only. Prefer
//! [`calculate_trade_metrics_extended`](crate::metrics::calculate_trade_metrics_extended)
//! for anything recorded with close actions.

use std::collections::VecDeque;

use tradebook_core::{ActionKind, TradeAction};

use crate::metrics::{base_metrics, TradeMetrics, TradeOutcome};

/// Pair buys with later sells, oldest buy first, and compute metrics.
///
/// Buys without a non-zero price and size are ignored; sells with no
/// queued buy and all `close` actions are ignored.
pub fn calculate_trade_metrics(actions: &[TradeAction], initial_capital: f64) -> TradeMetrics {
    base_metrics(&pair_buys_and_sells(actions), initial_capital)
}

fn pair_buys_and_sells(actions: &[TradeAction]) -> Vec<TradeOutcome> {
    let mut sorted: Vec<&TradeAction> = actions.iter().collect();
    sorted.sort_by_key(|a| a.datetime);

    let mut open_buys: VecDeque<(f64, f64)> = VecDeque::new();
    let mut outcomes = Vec::new();

    for action in sorted {
        match action.trade_action {
            ActionKind::Buy => {
                let size = action.size_or_zero();
                if action.price != 0.0 && size != 0.0 {
                    open_buys.push_back((action.price, size));
                }
            }
            ActionKind::Sell => {
                let Some((entry_price, size)) = open_buys.pop_front() else {
                    continue;
                };
                let pnl = (action.price - entry_price) * size;
                outcomes.push(TradeOutcome {
                    pnl,
                    pnl_percentage: (action.price - entry_price) / entry_price * 100.0,
                    is_win: pnl > 0.0,
                });
            }
            ActionKind::Close | ActionKind::Unknown => {}
        }
    }

    outcomes
}
