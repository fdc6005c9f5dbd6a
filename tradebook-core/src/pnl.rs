//! Directional PnL and TP/SL risk figures for a single position.

use crate::domain::{PositionSide, TradeAction};

/// Realised (or marked) profit of a position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionPnl {
    pub pnl: f64,
    pub pnl_percentage: f64,
    /// Strictly positive PnL. A flat trade is a loss.
    pub is_win: bool,
}

/// Risk figures derived from the entry's TP/SL levels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskProfile {
    pub entry_tp: f64,
    pub entry_sl: f64,
    pub potential_profit: f64,
    pub potential_loss: f64,
    /// potential_profit / potential_loss, 0 when there is no loss leg.
    pub actual_risk_reward: f64,
}

/// PnL of `entry` exited at `exit_price`.
pub fn position_pnl(entry: &TradeAction, side: PositionSide, exit_price: f64) -> PositionPnl {
    let entry_price = entry.price;
    let size = entry.size_or_zero();

    let move_in_favor = match side {
        PositionSide::Long => exit_price - entry_price,
        PositionSide::Short => entry_price - exit_price,
    };

    let pnl = move_in_favor * size;
    PositionPnl {
        pnl,
        pnl_percentage: move_in_favor / entry_price * 100.0,
        is_win: pnl > 0.0,
    }
}

/// Potential profit/loss at the entry's TP/SL, with the same sign
/// convention as [`position_pnl`]. Missing levels count as 0.
pub fn risk_profile(entry: &TradeAction, side: PositionSide) -> RiskProfile {
    let entry_price = entry.price;
    let size = entry.size_or_zero();
    let entry_tp = entry.tp_or_zero();
    let entry_sl = entry.sl_or_zero();

    let (potential_profit, potential_loss) = match side {
        PositionSide::Long => (
            (entry_tp - entry_price) * size,
            ((entry_sl - entry_price) * size).abs(),
        ),
        PositionSide::Short => (
            (entry_price - entry_tp) * size,
            ((entry_price - entry_sl) * size).abs(),
        ),
    };

    let actual_risk_reward = if potential_loss > 0.0 {
        potential_profit / potential_loss
    } else {
        0.0
    };

    RiskProfile {
        entry_tp,
        entry_sl,
        potential_profit,
        potential_loss,
        actual_risk_reward,
    }
}
