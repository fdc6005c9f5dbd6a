//! Tradebook Core: trade actions, position matching, close classification, PnL.
//!
//! This crate turns a raw, unordered list of buy/sell/close actions into
//! round-trip positions:
//! - Domain types (trade actions, positions, close reasons)
//! - Position matcher with a ranked exact → closest strategy ladder
//! - Close-reason classifier (TP hit, SL hit, manual)
//! - Directional PnL and TP/SL risk figures
//!
//! Everything here is synchronous and pure: no I/O, no shared state.

pub mod classify;
pub mod domain;
pub mod matching;
pub mod pnl;
pub mod unbounded;

pub use classify::detect_close_reason;
pub use domain::{
    ActionId, ActionKind, BacktestId, CloseReason, CloseReasonType, CompletedPosition,
    Confidence, MatchInfo, MatchTier, PositionSide, TradeAction,
};
pub use matching::{match_positions, reconcile, PositionMatcher, Reconciliation};
