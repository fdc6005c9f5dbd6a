//! Trade-action loading from JSON or CSV exports.
//!
//! JSON: an array of trade-action objects as stored.
//! CSV: header `id,datetime,trade_action,entry_price,price,tp,sl,size`
//! with an optional `backtest_id` column; empty cells are missing values.

use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tradebook_core::{ActionId, ActionKind, BacktestId, TradeAction};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid trade-action JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid trade-action CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("unsupported file extension for {0} (expected .json or .csv)")]
    UnsupportedFormat(String),
}

/// Load actions from `path`, choosing the format by extension.
pub fn load_actions(path: &Path) -> Result<Vec<TradeAction>, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let io_err = |source| LoadError::Io {
        path: path.display().to_string(),
        source,
    };

    match ext.as_deref() {
        Some("json") => {
            let content = std::fs::read_to_string(path).map_err(io_err)?;
            parse_json(&content)
        }
        Some("csv") => {
            let file = std::fs::File::open(path).map_err(io_err)?;
            parse_csv(file)
        }
        _ => Err(LoadError::UnsupportedFormat(path.display().to_string())),
    }
}

pub fn parse_json(content: &str) -> Result<Vec<TradeAction>, LoadError> {
    Ok(serde_json::from_str(content)?)
}

/// One CSV row. Ids are read as the cell text: the csv deserializer would
/// otherwise infer `007` as the integer 7.
#[derive(Debug, Deserialize)]
struct CsvRow {
    id: String,
    #[serde(default)]
    backtest_id: Option<String>,
    datetime: DateTime<Utc>,
    trade_action: ActionKind,
    entry_price: Option<f64>,
    price: f64,
    tp: Option<f64>,
    sl: Option<f64>,
    size: Option<f64>,
}

impl From<CsvRow> for TradeAction {
    fn from(row: CsvRow) -> Self {
        Self {
            id: ActionId(row.id),
            backtest_id: row.backtest_id.map(BacktestId),
            datetime: row.datetime,
            trade_action: row.trade_action,
            entry_price: row.entry_price,
            price: row.price,
            tp: row.tp,
            sl: row.sl,
            size: row.size,
        }
    }
}

pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<TradeAction>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut actions = Vec::new();
    for record in rdr.deserialize::<CsvRow>() {
        actions.push(record?.into());
    }
    Ok(actions)
}
