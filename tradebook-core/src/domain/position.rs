//! CompletedPosition: a matched round trip (or a still-open entry).

use super::action::TradeAction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Long,
    Short,
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionSide::Long => write!(f, "long"),
            PositionSide::Short => write!(f, "short"),
        }
    }
}

/// How a position ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReasonType {
    TpHit,
    SlHit,
    Manual,
    Open,
}

impl CloseReasonType {
    pub fn as_str(self) -> &'static str {
        match self {
            CloseReasonType::TpHit => "tp_hit",
            CloseReasonType::SlHit => "sl_hit",
            CloseReasonType::Manual => "manual",
            CloseReasonType::Open => "open",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Certain,
    Likely,
    Uncertain,
}

impl Confidence {
    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::Certain => "certain",
            Confidence::Likely => "likely",
            Confidence::Uncertain => "uncertain",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloseReason {
    #[serde(rename = "type")]
    pub kind: CloseReasonType,
    pub confidence: Confidence,
    pub description: String,
}

/// Which matching tier paired the close with its entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchTier {
    /// Within the caller's price tolerance; oldest candidate wins.
    Exact,
    /// Relaxed fallback band; nearest price wins.
    Closest,
}

impl MatchTier {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchTier::Exact => "exact",
            MatchTier::Closest => "closest",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchInfo {
    pub tier: MatchTier,
    /// |close.entry_price − entry.price| / entry.price × 100.
    #[serde(with = "crate::unbounded")]
    pub price_distance_pct: f64,
}

/// A position reconstructed from one entry action and, if it was closed,
/// the close action matched to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedPosition {
    // ── Actions ──
    pub entry_action: TradeAction,
    pub close_action: Option<TradeAction>,
    pub direction: PositionSide,
    pub close_reason: CloseReason,

    // ── PnL ──
    pub pnl: f64,
    /// NaN or infinite when the entry price is zero.
    #[serde(with = "crate::unbounded")]
    pub pnl_percentage: f64,
    pub is_win: bool,

    // ── Timing ──
    pub entry_date: DateTime<Utc>,
    pub exit_date: Option<DateTime<Utc>>,
    pub duration_hours: Option<f64>,

    // ── Risk ──
    pub entry_tp: f64,
    pub entry_sl: f64,
    pub potential_profit: f64,
    pub potential_loss: f64,
    pub actual_risk_reward: f64,

    /// `None` for open positions.
    pub match_info: Option<MatchInfo>,
}

impl CompletedPosition {
    pub fn is_closed(&self) -> bool {
        self.close_action.is_some()
    }

    pub fn is_open(&self) -> bool {
        self.close_action.is_none()
    }

    pub fn exit_price(&self) -> Option<f64> {
        self.close_action.as_ref().map(|c| c.price)
    }
}
