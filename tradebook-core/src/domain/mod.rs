//! Domain types: trade actions in, positions out.

pub mod action;
pub mod ids;
pub mod position;

pub use action::{ActionKind, TradeAction};
pub use ids::{ActionId, BacktestId};
pub use position::{
    CloseReason, CloseReasonType, CompletedPosition, Confidence, MatchInfo, MatchTier,
    PositionSide,
};
