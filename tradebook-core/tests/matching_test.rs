//! Matcher behaviour through the public API.

use chrono::{DateTime, Duration, TimeZone, Utc};
use tradebook_core::{
    match_positions, reconcile, ActionId, ActionKind, CloseReasonType, Confidence, MatchTier,
    PositionSide, TradeAction,
};

fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 13, 30, 0).unwrap() + Duration::minutes(minutes)
}

fn entry(id: &str, kind: ActionKind, minutes: i64, price: f64, size: f64) -> TradeAction {
    TradeAction::new(id, at(minutes), kind, price).with_size(size)
}

fn close(id: &str, minutes: i64, entry_price: f64, price: f64) -> TradeAction {
    TradeAction::new(id, at(minutes), ActionKind::Close, price).with_entry_price(entry_price)
}

#[test]
fn earlier_entry_wins_even_when_later_fits_better() {
    let actions = vec![
        entry("a", ActionKind::Buy, 0, 100.0, 1.0),
        entry("b", ActionKind::Buy, 10, 101.0, 1.0),
        close("x", 20, 100.05, 102.0),
    ];
    // 1% tolerance: both entries qualify for the exact tier.
    let positions = match_positions(&actions, None, 0.01);
    let closed: Vec<_> = positions.iter().filter(|p| p.is_closed()).collect();
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].entry_action.id, ActionId::from("a"));
}

#[test]
fn close_older_than_all_entries_matches_nothing() {
    let actions = vec![
        close("x", 0, 100.0, 101.0),
        entry("a", ActionKind::Buy, 5, 100.0, 1.0),
        entry("b", ActionKind::Sell, 6, 100.0, 1.0),
    ];
    let rec = reconcile(&actions, None, 0.001);
    assert_eq!(rec.closed().count(), 0);
    assert_eq!(rec.open().count(), 2);
    assert_eq!(rec.unmatched_closes, vec![ActionId::from("x")]);
}

#[test]
fn short_and_long_pnl_signs() {
    let short = vec![
        entry("s", ActionKind::Sell, 0, 100.0, 10.0),
        close("sc", 60, 100.0, 90.0),
    ];
    let p = &match_positions(&short, None, 0.001)[0];
    assert_eq!(p.direction, PositionSide::Short);
    assert!((p.pnl - 100.0).abs() < 1e-10);
    assert!((p.pnl_percentage - 10.0).abs() < 1e-10);
    assert!(p.is_win);

    let long = vec![
        entry("l", ActionKind::Buy, 0, 100.0, 10.0),
        close("lc", 60, 100.0, 90.0),
    ];
    let p = &match_positions(&long, None, 0.001)[0];
    assert_eq!(p.direction, PositionSide::Long);
    assert!((p.pnl - (-100.0)).abs() < 1e-10);
    assert!(!p.is_win);
}

#[test]
fn interleaved_long_and_short_book() {
    let actions = vec![
        entry("l1", ActionKind::Buy, 0, 200.0, 1.0)
            .with_tp(210.0)
            .with_sl(195.0),
        entry("s1", ActionKind::Sell, 5, 205.0, 2.0)
            .with_tp(195.0)
            .with_sl(208.0),
        close("c-s1", 30, 205.0, 208.0),
        close("c-l1", 90, 200.0, 210.1),
    ];
    let rec = reconcile(&actions, None, 0.001);
    assert!(rec.unmatched_closes.is_empty());
    assert_eq!(rec.positions.len(), 2);

    // Close order: the short closes first.
    let short = &rec.positions[0];
    assert_eq!(short.entry_action.id, ActionId::from("s1"));
    assert_eq!(short.close_reason.kind, CloseReasonType::SlHit);
    assert!((short.pnl - (-6.0)).abs() < 1e-10);

    let long = &rec.positions[1];
    assert_eq!(long.entry_action.id, ActionId::from("l1"));
    assert_eq!(long.close_reason.kind, CloseReasonType::TpHit);
    assert_eq!(long.close_reason.confidence, Confidence::Certain);
    assert_eq!(long.duration_hours, Some(1.5));
    assert_eq!(long.match_info.unwrap().tier, MatchTier::Exact);
}

#[test]
fn matching_is_idempotent() {
    let actions = vec![
        entry("a", ActionKind::Buy, 0, 100.0, 1.0),
        entry("b", ActionKind::Sell, 1, 100.3, 1.0),
        close("x", 2, 100.2, 99.0),
        close("y", 3, 100.0, 98.0),
    ];
    let first = reconcile(&actions, Some(97.0), 0.001);
    let second = reconcile(&actions, Some(97.0), 0.001);
    assert_eq!(first, second);
}
