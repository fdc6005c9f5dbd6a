//! Criterion benchmarks for the matcher hot path.
//!
//! Benchmarks:
//! 1. Full reconcile over synthetic books of increasing size
//! 2. Close classification in isolation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tradebook_core::{detect_close_reason, reconcile, ActionKind, TradeAction};

// ── Helpers ──────────────────────────────────────────────────────────

/// Alternating long/short entries, each closed a few steps later at a
/// price wobbling around its target. Roughly one in five entries is left
/// open so the fallback tier and the open pass both get exercised.
fn make_actions(n_entries: usize) -> Vec<TradeAction> {
    let base = chrono::Utc::now();
    let mut actions = Vec::with_capacity(n_entries * 2);
    for i in 0..n_entries {
        let price = 100.0 + (i as f64 * 0.1).sin() * 10.0;
        let kind = if i % 2 == 0 {
            ActionKind::Buy
        } else {
            ActionKind::Sell
        };
        actions.push(
            TradeAction::new(
                format!("e{i}"),
                base + chrono::Duration::minutes(i as i64 * 10),
                kind,
                price,
            )
            .with_size(1.0)
            .with_tp(price * 1.01)
            .with_sl(price * 0.99),
        );
        if i % 5 != 4 {
            let drift = if i % 3 == 0 { 1.002 } else { 1.0 };
            actions.push(
                TradeAction::new(
                    format!("c{i}"),
                    base + chrono::Duration::minutes(i as i64 * 10 + 35),
                    ActionKind::Close,
                    price * 1.01,
                )
                .with_entry_price(price * drift),
            );
        }
    }
    actions
}

// ── 1. Reconcile ─────────────────────────────────────────────────────

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");
    for &n in &[100usize, 1_000, 3_000] {
        let actions = make_actions(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &actions, |b, actions| {
            b.iter(|| reconcile(black_box(actions), Some(100.0), 0.001))
        });
    }
    group.finish();
}

// ── 2. Classification ────────────────────────────────────────────────

fn bench_classify(c: &mut Criterion) {
    c.bench_function("detect_close_reason", |b| {
        b.iter(|| {
            detect_close_reason(
                black_box(100.4),
                black_box(Some(101.0)),
                black_box(Some(99.0)),
                0.001,
            )
        })
    });
}

criterion_group!(benches, bench_reconcile, bench_classify);
criterion_main!(benches);
