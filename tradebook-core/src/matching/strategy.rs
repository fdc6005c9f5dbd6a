//! Ranked entry-selection strategies.
//!
//! Each strategy looks at the eligible entries for one close (unmatched,
//! strictly earlier, in chronological order) and either picks one or
//! declines. The matcher tries them in order and commits the first pick.

use crate::domain::{MatchTier, TradeAction};

/// Fallback band for [`ClosestPrice`], in percent. Deliberately separate from
/// the caller's tolerance, which only governs the exact tier.
pub const CLOSEST_MATCH_BAND_PCT: f64 = 1.0;

/// A strategy's pick: index into the candidate slice plus its distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub index: usize,
    pub price_distance_pct: f64,
}

pub trait MatchStrategy: Send + Sync {
    fn tier(&self) -> MatchTier;

    /// Pick an entry for a close reporting `close_entry_price`.
    ///
    /// `candidates` is in chronological order.
    fn select(&self, close_entry_price: f64, candidates: &[&TradeAction]) -> Option<Selection>;
}

/// Relative distance between a close's recorded entry price and a
/// candidate's execution price, in percent of the candidate price.
pub fn price_distance_pct(close_entry_price: f64, entry_price: f64) -> f64 {
    (close_entry_price - entry_price).abs() / entry_price * 100.0
}

/// Oldest candidate within the caller's tolerance (FIFO).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExactPrice {
    /// Fraction, e.g. 0.001 for 0.1%.
    pub tolerance: f64,
}

impl MatchStrategy for ExactPrice {
    fn tier(&self) -> MatchTier {
        MatchTier::Exact
    }

    fn select(&self, close_entry_price: f64, candidates: &[&TradeAction]) -> Option<Selection> {
        let tolerance_pct = self.tolerance * 100.0;
        candidates.iter().enumerate().find_map(|(index, entry)| {
            let price_distance_pct = price_distance_pct(close_entry_price, entry.price);
            (price_distance_pct <= tolerance_pct).then_some(Selection {
                index,
                price_distance_pct,
            })
        })
    }
}

/// Nearest candidate within a fixed band; ties go to the oldest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestPrice {
    pub band_pct: f64,
}

impl Default for ClosestPrice {
    fn default() -> Self {
        Self {
            band_pct: CLOSEST_MATCH_BAND_PCT,
        }
    }
}

impl MatchStrategy for ClosestPrice {
    fn tier(&self) -> MatchTier {
        MatchTier::Closest
    }

    fn select(&self, close_entry_price: f64, candidates: &[&TradeAction]) -> Option<Selection> {
        candidates
            .iter()
            .enumerate()
            .map(|(index, entry)| Selection {
                index,
                price_distance_pct: price_distance_pct(close_entry_price, entry.price),
            })
            .filter(|s| s.price_distance_pct <= self.band_pct)
            // min_by keeps the first of equal elements, i.e. the oldest.
            .min_by(|a, b| a.price_distance_pct.total_cmp(&b.price_distance_pct))
    }
}

/// The standard ladder: exact within `tolerance`, then closest within 1%.
pub fn default_strategies(tolerance: f64) -> Vec<Box<dyn MatchStrategy>> {
    vec![
        Box::new(ExactPrice { tolerance }),
        Box::new(ClosestPrice::default()),
    ]
}
