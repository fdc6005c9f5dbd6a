//! Close-reason classification.
//!
//! Infers why a position closed by comparing the close price with the
//! take-profit and stop-loss levels set on its entry. Heuristic only: the
//! trade log does not record the reason.

use crate::domain::{CloseReason, CloseReasonType, Confidence};

/// Band, in percent of the level, inside which the nearer of TP/SL is
/// reported as a `likely` hit. Independent of the caller's tolerance.
///
/// The distance is divided by the level, not by the close price. The two
/// differ near the edge: a close at 101 against a TP of 100 is 1% of the
/// level (outside the band, manual) but only 0.99% of the close price.
pub const LIKELY_BAND_PCT: f64 = 1.0;

/// Classify a close.
///
/// `tolerance` is a fraction (0.001 = 0.1%) applied relative to each level.
/// Priority: TP within tolerance, SL within tolerance, nearer level within
/// [`LIKELY_BAND_PCT`], otherwise a manual exit.
pub fn detect_close_reason(
    close_price: f64,
    entry_tp: Option<f64>,
    entry_sl: Option<f64>,
    tolerance: f64,
) -> CloseReason {
    if let Some(tp) = entry_tp {
        if (close_price - tp).abs() <= tp * tolerance {
            return CloseReason {
                kind: CloseReasonType::TpHit,
                confidence: Confidence::Certain,
                description: "Take profit hit".into(),
            };
        }
    }

    if let Some(sl) = entry_sl {
        if (close_price - sl).abs() <= sl * tolerance {
            return CloseReason {
                kind: CloseReasonType::SlHit,
                confidence: Confidence::Certain,
                description: "Stop loss hit".into(),
            };
        }
    }

    // TP listed first so it wins a distance tie.
    let nearest = [
        entry_tp.map(|tp| (CloseReasonType::TpHit, tp, (close_price - tp).abs())),
        entry_sl.map(|sl| (CloseReasonType::SlHit, sl, (close_price - sl).abs())),
    ]
    .into_iter()
    .flatten()
    .min_by(|a, b| a.2.total_cmp(&b.2));

    if let Some((kind, level, distance)) = nearest {
        // Relative to the level, like the tolerance check above.
        let percent_off = distance / level.abs() * 100.0;
        if percent_off < LIKELY_BAND_PCT {
            let label = match kind {
                CloseReasonType::TpHit => "take profit",
                _ => "stop loss",
            };
            return CloseReason {
                kind,
                confidence: Confidence::Likely,
                description: format!("Probably {label} ({percent_off:.2}% off)"),
            };
        }
    }

    CloseReason {
        kind: CloseReasonType::Manual,
        confidence: Confidence::Uncertain,
        description: "Manual close or signal-based exit".into(),
    }
}
