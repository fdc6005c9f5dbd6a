//! Position matching: pairs close actions with the entries they close.
//!
//! Pure function over the action list: sort chronologically, split entries
//! from closes, then walk the closes oldest first and let the ranked
//! strategies pick an eligible entry for each. Entries never consumed become
//! open positions.

pub mod strategy;

pub use strategy::{
    default_strategies, price_distance_pct, ClosestPrice, ExactPrice, MatchStrategy, Selection,
    CLOSEST_MATCH_BAND_PCT,
};

use crate::classify::detect_close_reason;
use crate::domain::{
    ActionId, CloseReason, CloseReasonType, CompletedPosition, Confidence, MatchInfo, MatchTier,
    PositionSide, TradeAction,
};
use crate::pnl::{position_pnl, risk_profile};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Result of a matching pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    /// Closed positions in close order, followed by open positions in entry order.
    pub positions: Vec<CompletedPosition>,
    /// Closes that found no entry and were dropped, in chronological order.
    pub unmatched_closes: Vec<ActionId>,
}

impl Reconciliation {
    pub fn closed(&self) -> impl Iterator<Item = &CompletedPosition> {
        self.positions.iter().filter(|p| p.is_closed())
    }

    pub fn open(&self) -> impl Iterator<Item = &CompletedPosition> {
        self.positions.iter().filter(|p| p.is_open())
    }
}

/// An entry action together with the side it opens.
#[derive(Debug, Clone, Copy)]
struct Entry<'a> {
    action: &'a TradeAction,
    side: PositionSide,
}

/// Matches closes to entries with an ordered list of strategies.
pub struct PositionMatcher {
    /// Fraction used by the classifier (and by the default exact tier).
    tolerance: f64,
    strategies: Vec<Box<dyn MatchStrategy>>,
}

impl PositionMatcher {
    /// Default ladder: exact within `tolerance`, then closest within 1%.
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            strategies: default_strategies(tolerance),
        }
    }

    pub fn with_strategies(tolerance: f64, strategies: Vec<Box<dyn MatchStrategy>>) -> Self {
        Self {
            tolerance,
            strategies,
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Reconstruct positions from an unordered action list.
    ///
    /// `current_price` marks open positions; without it (or when it is zero)
    /// they are marked at their own entry price.
    pub fn reconcile(&self, actions: &[TradeAction], current_price: Option<f64>) -> Reconciliation {
        let mut sorted: Vec<&TradeAction> = actions.iter().collect();
        sorted.sort_by_key(|a| a.datetime);

        let mut entries: Vec<Entry<'_>> = Vec::new();
        let mut closes: Vec<&TradeAction> = Vec::new();
        for action in sorted {
            if let Some(side) = action.trade_action.entry_side() {
                entries.push(Entry { action, side });
            } else if action.is_close() {
                closes.push(action);
            } else {
                debug!(id = %action.id, "ignoring trade action of unknown kind");
            }
        }

        let mut matched = vec![false; entries.len()];
        let mut positions = Vec::with_capacity(entries.len());
        let mut unmatched_closes = Vec::new();

        for close in closes {
            match self.find_matching_entry(close, &entries, &matched) {
                Some((index, match_info)) => {
                    matched[index] = true;
                    positions.push(build_closed_position(
                        entries[index],
                        close,
                        match_info,
                        self.tolerance,
                    ));
                }
                None => {
                    warn!(
                        id = %close.id,
                        datetime = %close.datetime,
                        entry_price = ?close.entry_price,
                        "unmatched close action dropped"
                    );
                    unmatched_closes.push(close.id.clone());
                }
            }
        }

        let mark = current_price.filter(|p| *p != 0.0 && !p.is_nan());
        let open_count = matched.iter().filter(|m| !**m).count();
        if open_count > 0 {
            match mark {
                Some(price) => info!(open_count, price, "positions still open"),
                None => info!(open_count, "positions still open, valued at entry price"),
            }
        }
        for (entry, _) in entries.iter().zip(&matched).filter(|(_, m)| !**m) {
            positions.push(build_open_position(*entry, mark));
        }

        Reconciliation {
            positions,
            unmatched_closes,
        }
    }

    /// Index of the entry `close` closes, if any.
    ///
    /// Eligible entries are unmatched and strictly earlier than the close.
    fn find_matching_entry(
        &self,
        close: &TradeAction,
        entries: &[Entry<'_>],
        matched: &[bool],
    ) -> Option<(usize, MatchInfo)> {
        let eligible: Vec<usize> = entries
            .iter()
            .enumerate()
            .filter(|(i, e)| !matched[*i] && e.action.datetime < close.datetime)
            .map(|(i, _)| i)
            .collect();

        if eligible.is_empty() {
            warn!(
                id = %close.id,
                datetime = %close.datetime,
                "no unmatched entries found before close"
            );
            return None;
        }

        let Some(target) = close.entry_price else {
            warn!(id = %close.id, "close action has no entry_price to match on");
            return None;
        };

        let candidates: Vec<&TradeAction> = eligible.iter().map(|&i| entries[i].action).collect();

        for strategy in &self.strategies {
            let Some(pick) = strategy.select(target, &candidates) else {
                continue;
            };
            let Some(entry) = candidates.get(pick.index) else {
                continue;
            };
            let info = MatchInfo {
                tier: strategy.tier(),
                price_distance_pct: pick.price_distance_pct,
            };
            if info.tier != MatchTier::Exact {
                info!(
                    close_id = %close.id,
                    datetime = %close.datetime,
                    close_entry_price = target,
                    entry_price = entry.price,
                    diff_pct = pick.price_distance_pct,
                    tier = info.tier.as_str(),
                    "using relaxed match for close"
                );
            }
            return Some((eligible[pick.index], info));
        }

        warn!(
            id = %close.id,
            datetime = %close.datetime,
            entry_price = target,
            checked = candidates.len(),
            "no matching entry found for close"
        );
        for sample in candidates.iter().take(3) {
            debug!(
                id = %sample.id,
                price = sample.price,
                datetime = %sample.datetime,
                "sample unmatched entry"
            );
        }
        None
    }
}

/// Match `actions` with the default ladder and return every position.
///
/// `tolerance` is a fraction (0.001 = 0.1%).
pub fn match_positions(
    actions: &[TradeAction],
    current_price: Option<f64>,
    tolerance: f64,
) -> Vec<CompletedPosition> {
    reconcile(actions, current_price, tolerance).positions
}

/// Like [`match_positions`] but also reports dropped closes.
pub fn reconcile(
    actions: &[TradeAction],
    current_price: Option<f64>,
    tolerance: f64,
) -> Reconciliation {
    PositionMatcher::new(tolerance).reconcile(actions, current_price)
}

fn build_closed_position(
    entry: Entry<'_>,
    close: &TradeAction,
    match_info: MatchInfo,
    tolerance: f64,
) -> CompletedPosition {
    let pnl = position_pnl(entry.action, entry.side, close.price);
    let risk = risk_profile(entry.action, entry.side);
    let close_reason =
        detect_close_reason(close.price, entry.action.tp, entry.action.sl, tolerance);

    let held = close.datetime - entry.action.datetime;
    let duration_hours = held.num_milliseconds() as f64 / 3_600_000.0;

    CompletedPosition {
        entry_action: entry.action.clone(),
        close_action: Some(close.clone()),
        direction: entry.side,
        close_reason,
        pnl: pnl.pnl,
        pnl_percentage: pnl.pnl_percentage,
        is_win: pnl.is_win,
        entry_date: entry.action.datetime,
        exit_date: Some(close.datetime),
        duration_hours: Some(duration_hours),
        entry_tp: risk.entry_tp,
        entry_sl: risk.entry_sl,
        potential_profit: risk.potential_profit,
        potential_loss: risk.potential_loss,
        actual_risk_reward: risk.actual_risk_reward,
        match_info: Some(match_info),
    }
}

fn build_open_position(entry: Entry<'_>, mark: Option<f64>) -> CompletedPosition {
    let exit_price = mark.unwrap_or(entry.action.price);
    let pnl = position_pnl(entry.action, entry.side, exit_price);
    let risk = risk_profile(entry.action, entry.side);

    let description = match mark {
        Some(price) => format!("Open position (valued at {price})"),
        None => "Open position".to_string(),
    };

    CompletedPosition {
        entry_action: entry.action.clone(),
        close_action: None,
        direction: entry.side,
        close_reason: CloseReason {
            kind: CloseReasonType::Open,
            confidence: Confidence::Certain,
            description,
        },
        pnl: pnl.pnl,
        pnl_percentage: pnl.pnl_percentage,
        is_win: pnl.is_win,
        entry_date: entry.action.datetime,
        exit_date: None,
        duration_hours: None,
        entry_tp: risk.entry_tp,
        entry_sl: risk.entry_sl,
        potential_profit: risk.potential_profit,
        potential_loss: risk.potential_loss,
        actual_risk_reward: risk.actual_risk_reward,
        match_info: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ActionKind;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(hours: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap() + Duration::hours(hours)
    }

    fn buy(id: &str, hours: i64, price: f64) -> TradeAction {
        TradeAction::new(id, at(hours), ActionKind::Buy, price).with_size(1.0)
    }

    fn sell(id: &str, hours: i64, price: f64) -> TradeAction {
        TradeAction::new(id, at(hours), ActionKind::Sell, price).with_size(1.0)
    }

    fn close(id: &str, hours: i64, entry_price: f64, price: f64) -> TradeAction {
        TradeAction::new(id, at(hours), ActionKind::Close, price).with_entry_price(entry_price)
    }

    #[test]
    fn unordered_input_is_sorted_before_matching() {
        let actions = vec![close("c1", 5, 100.0, 110.0), buy("e1", 1, 100.0)];
        let rec = reconcile(&actions, None, 0.001);
        assert_eq!(rec.positions.len(), 1);
        let p = &rec.positions[0];
        assert!(p.is_closed());
        assert_eq!(p.entry_action.id, ActionId::from("e1"));
        assert_eq!(p.duration_hours, Some(4.0));
        assert_eq!(p.match_info.map(|m| m.tier), Some(MatchTier::Exact));
    }

    #[test]
    fn fifo_among_exact_matches() {
        let actions = vec![
            buy("e1", 0, 100.0),
            buy("e2", 1, 101.0),
            close("c1", 2, 100.05, 105.0),
        ];
        // 1% tolerance puts both entries inside the exact tier.
        let rec = reconcile(&actions, None, 0.01);
        assert_eq!(rec.closed().count(), 1);
        let closed = rec.closed().next().unwrap();
        assert_eq!(closed.entry_action.id, ActionId::from("e1"));
        let open: Vec<_> = rec.open().collect();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].entry_action.id, ActionId::from("e2"));
    }

    #[test]
    fn close_before_every_entry_is_dropped() {
        let actions = vec![close("c1", 0, 100.0, 101.0), buy("e1", 1, 100.0)];
        let rec = reconcile(&actions, None, 0.001);
        assert_eq!(rec.closed().count(), 0);
        assert_eq!(rec.unmatched_closes, vec![ActionId::from("c1")]);
        assert_eq!(rec.open().count(), 1);
    }

    #[test]
    fn simultaneous_entry_is_not_eligible() {
        let actions = vec![buy("e1", 3, 100.0), close("c1", 3, 100.0, 101.0)];
        let rec = reconcile(&actions, None, 0.001);
        assert_eq!(rec.closed().count(), 0);
        assert_eq!(rec.unmatched_closes.len(), 1);
    }

    #[test]
    fn entry_matched_at_most_once() {
        let actions = vec![
            buy("e1", 0, 100.0),
            close("c1", 1, 100.0, 102.0),
            close("c2", 2, 100.0, 103.0),
        ];
        let rec = reconcile(&actions, None, 0.001);
        assert_eq!(rec.closed().count(), 1);
        assert_eq!(rec.unmatched_closes, vec![ActionId::from("c2")]);
    }

    #[test]
    fn closest_tier_used_when_exact_fails() {
        let actions = vec![
            buy("e1", 0, 100.0),
            buy("e2", 1, 100.7),
            close("c1", 2, 100.5, 104.0),
        ];
        let rec = reconcile(&actions, None, 0.001);
        let closed = rec.closed().next().unwrap();
        assert_eq!(closed.entry_action.id, ActionId::from("e2"));
        let info = closed.match_info.unwrap();
        assert_eq!(info.tier, MatchTier::Closest);
        assert!(info.price_distance_pct > 0.1 && info.price_distance_pct < 0.25);
    }

    #[test]
    fn no_candidate_within_band_drops_close() {
        let actions = vec![buy("e1", 0, 100.0), close("c1", 1, 150.0, 151.0)];
        let rec = reconcile(&actions, None, 0.001);
        assert_eq!(rec.closed().count(), 0);
        assert_eq!(rec.open().count(), 1);
        assert_eq!(rec.unmatched_closes.len(), 1);
    }

    #[test]
    fn close_without_entry_price_is_dropped() {
        let mut c = close("c1", 1, 100.0, 101.0);
        c.entry_price = None;
        let actions = vec![buy("e1", 0, 100.0), c];
        let rec = reconcile(&actions, None, 0.001);
        assert_eq!(rec.unmatched_closes.len(), 1);
    }

    #[test]
    fn open_positions_marked_at_current_price() {
        let actions = vec![buy("e1", 0, 100.0).with_size(2.0), sell("e2", 1, 50.0)];
        let positions = match_positions(&actions, Some(110.0), 0.001);
        assert_eq!(positions.len(), 2);
        assert!((positions[0].pnl - 20.0).abs() < 1e-10);
        assert_eq!(positions[0].close_reason.kind, CloseReasonType::Open);
        assert_eq!(
            positions[0].close_reason.description,
            "Open position (valued at 110)"
        );
        assert!((positions[1].pnl - (-60.0)).abs() < 1e-10);
        assert_eq!(positions[1].direction, PositionSide::Short);
        assert!(positions[1].duration_hours.is_none());
        assert!(positions[1].match_info.is_none());
    }

    #[test]
    fn open_positions_without_price_have_zero_pnl() {
        let actions = vec![buy("e1", 0, 100.0)];
        for mark in [None, Some(0.0)] {
            let positions = match_positions(&actions, mark, 0.001);
            assert_eq!(positions[0].pnl, 0.0);
            assert!(!positions[0].is_win);
            assert_eq!(positions[0].close_reason.description, "Open position");
        }
    }

    #[test]
    fn closed_position_carries_classification_and_risk() {
        let entry = sell("e1", 0, 100.0)
            .with_size(10.0)
            .with_tp(90.0)
            .with_sl(105.0);
        let actions = vec![entry, close("c1", 6, 100.0, 90.0)];
        let positions = match_positions(&actions, None, 0.001);
        let p = &positions[0];
        assert_eq!(p.direction, PositionSide::Short);
        assert_eq!(p.close_reason.kind, CloseReasonType::TpHit);
        assert_eq!(p.close_reason.confidence, Confidence::Certain);
        assert!((p.pnl - 100.0).abs() < 1e-10);
        assert!((p.potential_profit - 100.0).abs() < 1e-10);
        assert!((p.potential_loss - 50.0).abs() < 1e-10);
        assert!((p.actual_risk_reward - 2.0).abs() < 1e-10);
        assert_eq!(p.exit_price(), Some(90.0));
    }

    #[test]
    fn unknown_actions_are_ignored() {
        let hold = TradeAction::new("h1", at(0), ActionKind::Unknown, 100.0);
        let positions = match_positions(&[hold], None, 0.001);
        assert!(positions.is_empty());
    }

    #[test]
    fn custom_ladder_without_fallback() {
        let actions = vec![buy("e1", 0, 100.0), close("c1", 1, 100.5, 101.0)];
        let matcher = PositionMatcher::with_strategies(
            0.001,
            vec![Box::new(ExactPrice { tolerance: 0.001 })],
        );
        let rec = matcher.reconcile(&actions, None);
        assert_eq!(rec.closed().count(), 0);
        assert_eq!(matcher.tolerance(), 0.001);
    }
}
