//! One complete metrics run: inputs fingerprint, positions, curve, metrics.

use serde::{Deserialize, Serialize};
use tradebook_core::{ActionId, CompletedPosition, PositionMatcher, TradeAction};

use crate::config::MetricsConfig;
use crate::metrics::{equity_curve, metrics_from_positions, TradeMetricsExtended};

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsReport {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// BLAKE3 of the canonical JSON of the input actions.
    pub input_hash: String,
    pub config: MetricsConfig,
    pub metrics: TradeMetricsExtended,
    pub positions: Vec<CompletedPosition>,
    pub unmatched_closes: Vec<ActionId>,
    /// Equity after each closed position, seeded with the initial capital.
    pub equity_curve: Vec<f64>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl MetricsReport {
    /// Reconcile `actions` once and derive everything from that pass, so the
    /// positions, curve and metrics in the report always agree.
    pub fn build(actions: &[TradeAction], config: &MetricsConfig) -> Self {
        let rec = PositionMatcher::new(config.tolerance_fraction())
            .reconcile(actions, config.current_price);
        let metrics = metrics_from_positions(&rec.positions, config.initial_capital);
        let equity_curve = equity_curve(&rec.positions, config.initial_capital);

        Self {
            schema_version: SCHEMA_VERSION,
            input_hash: input_hash(actions),
            config: *config,
            metrics,
            positions: rec.positions,
            unmatched_closes: rec.unmatched_closes,
            equity_curve,
        }
    }
}

/// Content hash of the actions as given (order-sensitive).
pub fn input_hash(actions: &[TradeAction]) -> String {
    let mut hasher = blake3::Hasher::new();
    for action in actions {
        // TradeAction serialization cannot fail: plain fields, string keys.
        if let Ok(bytes) = serde_json::to_vec(action) {
            hasher.update(&bytes);
        }
        hasher.update(b"\n");
    }
    hasher.finalize().to_hex().to_string()
}
