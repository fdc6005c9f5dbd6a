//! TradeAction: a raw buy/sell/close event as recorded by a backtest.

use super::ids::{ActionId, BacktestId};
use super::position::PositionSide;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a trade action does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Opens a long position.
    Buy,
    /// Opens a short position.
    Sell,
    /// Terminates a previously opened position.
    Close,
    /// Any other action string. Ignored by matching.
    #[serde(other)]
    Unknown,
}

impl ActionKind {
    /// Side of the position this action opens, `None` for non-entries.
    pub fn entry_side(self) -> Option<PositionSide> {
        match self {
            ActionKind::Buy => Some(PositionSide::Long),
            ActionKind::Sell => Some(PositionSide::Short),
            ActionKind::Close | ActionKind::Unknown => None,
        }
    }

    pub fn is_entry(self) -> bool {
        self.entry_side().is_some()
    }
}

/// A single trade action.
///
/// `tp`, `sl` and `size` are nullable in storage. They stay `Option` here so
/// the classifier can tell "not set" from zero; arithmetic goes through the
/// `*_or_zero` accessors, which are the one place the default-to-zero rule
/// is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeAction {
    pub id: ActionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backtest_id: Option<BacktestId>,
    pub datetime: DateTime<Utc>,
    pub trade_action: ActionKind,
    /// On a close: the entry price of the position it claims to close.
    #[serde(default)]
    pub entry_price: Option<f64>,
    /// Execution price of this action.
    pub price: f64,
    #[serde(default)]
    pub tp: Option<f64>,
    #[serde(default)]
    pub sl: Option<f64>,
    #[serde(default)]
    pub size: Option<f64>,
}

impl TradeAction {
    pub fn new(
        id: impl Into<ActionId>,
        datetime: DateTime<Utc>,
        trade_action: ActionKind,
        price: f64,
    ) -> Self {
        Self {
            id: id.into(),
            backtest_id: None,
            datetime,
            trade_action,
            entry_price: None,
            price,
            tp: None,
            sl: None,
            size: None,
        }
    }

    pub fn with_entry_price(mut self, entry_price: f64) -> Self {
        self.entry_price = Some(entry_price);
        self
    }

    pub fn with_tp(mut self, tp: f64) -> Self {
        self.tp = Some(tp);
        self
    }

    pub fn with_sl(mut self, sl: f64) -> Self {
        self.sl = Some(sl);
        self
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_backtest(mut self, backtest_id: impl Into<BacktestId>) -> Self {
        self.backtest_id = Some(backtest_id.into());
        self
    }

    pub fn is_entry(&self) -> bool {
        self.trade_action.is_entry()
    }

    pub fn is_close(&self) -> bool {
        self.trade_action == ActionKind::Close
    }

    pub fn size_or_zero(&self) -> f64 {
        self.size.unwrap_or(0.0)
    }

    pub fn tp_or_zero(&self) -> f64 {
        self.tp.unwrap_or(0.0)
    }

    pub fn sl_or_zero(&self) -> f64 {
        self.sl.unwrap_or(0.0)
    }
}
