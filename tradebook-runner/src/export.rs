//! Report export: JSON plus CSV trade log and equity curve.
//!
//! `save_report` writes one directory per run:
//! - `report.json`: the full [`MetricsReport`]
//! - `positions.csv`: one row per position, open ones included
//! - `equity.csv`: the equity curve the drawdown was measured on
//!
//! Reports carry a `schemaVersion`; newer versions are rejected on load.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tradebook_core::CompletedPosition;

use crate::report::{MetricsReport, SCHEMA_VERSION};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported schema version {found} (max supported: {SCHEMA_VERSION})")]
    SchemaVersion { found: u32 },
}

// ─── JSON ───────────────────────────────────────────────────────────

pub fn export_json(report: &MetricsReport) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Parse a report, rejecting schema versions newer than this build knows.
pub fn import_json(json: &str) -> Result<MetricsReport, ExportError> {
    let report: MetricsReport = serde_json::from_str(json)?;
    if report.schema_version > SCHEMA_VERSION {
        return Err(ExportError::SchemaVersion {
            found: report.schema_version,
        });
    }
    Ok(report)
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Positions as a CSV trade log. Open positions leave the exit columns,
/// duration and match tier empty.
pub fn export_positions_csv(positions: &[CompletedPosition]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "entry_id",
        "exit_id",
        "direction",
        "entry_date",
        "exit_date",
        "entry_price",
        "exit_price",
        "size",
        "pnl",
        "pnl_percentage",
        "close_reason",
        "confidence",
        "match_tier",
        "duration_hours",
        "risk_reward",
    ])?;

    for p in positions {
        let close = p.close_action.as_ref();
        wtr.write_record([
            p.entry_action.id.to_string(),
            close.map(|c| c.id.to_string()).unwrap_or_default(),
            p.direction.to_string(),
            p.entry_date.to_rfc3339(),
            p.exit_date.map(|d| d.to_rfc3339()).unwrap_or_default(),
            format!("{:.6}", p.entry_action.price),
            p.exit_price().map(|v| format!("{v:.6}")).unwrap_or_default(),
            format!("{:.6}", p.entry_action.size_or_zero()),
            format!("{:.2}", p.pnl),
            format!("{:.4}", p.pnl_percentage),
            p.close_reason.kind.as_str().to_string(),
            p.close_reason.confidence.as_str().to_string(),
            p.match_info
                .map(|m| m.tier.as_str().to_string())
                .unwrap_or_default(),
            p.duration_hours.map(|h| format!("{h:.2}")).unwrap_or_default(),
            format!("{:.4}", p.actual_risk_reward),
        ])?;
    }

    finish(wtr)
}

/// Equity curve as `step,equity`; step 0 is the initial capital.
pub fn export_equity_csv(equity_curve: &[f64]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["step", "equity"])?;
    for (i, eq) in equity_curve.iter().enumerate() {
        wtr.write_record([i.to_string(), format!("{eq:.2}")])?;
    }
    finish(wtr)
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let data = wtr
        .into_inner()
        .map_err(|e| ExportError::Csv(csv::Error::from(e.into_error())))?;
    // Every field written above is a Rust `String`, so the buffer is UTF-8.
    Ok(String::from_utf8_lossy(&data).into_owned())
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write the report bundle into `output_dir`, creating it if needed.
/// Returns `output_dir`.
pub fn save_report(report: &MetricsReport, output_dir: &Path) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(output_dir).map_err(|source| io_error(output_dir, source))?;

    write(output_dir.join("report.json"), export_json(report)?)?;
    write(output_dir.join("positions.csv"), export_positions_csv(&report.positions)?)?;
    write(output_dir.join("equity.csv"), export_equity_csv(&report.equity_curve)?)?;

    tracing::info!(dir = %output_dir.display(), positions = report.positions.len(), "report saved");
    Ok(output_dir.to_path_buf())
}

/// Load `report.json` from a directory written by [`save_report`].
pub fn load_report(dir: &Path) -> Result<MetricsReport, ExportError> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path).map_err(|source| io_error(&path, source))?;
    import_json(&json)
}

fn write(path: PathBuf, contents: String) -> Result<(), ExportError> {
    std::fs::write(&path, contents).map_err(|source| io_error(&path, source))
}

fn io_error(path: &Path, source: std::io::Error) -> ExportError {
    ExportError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MetricsConfig;
    use chrono::{Duration, TimeZone, Utc};
    use tradebook_core::{ActionKind, TradeAction};

    fn actions() -> Vec<TradeAction> {
        let base = Utc.with_ymd_and_hms(2024, 6, 3, 13, 0, 0).unwrap();
        vec![
            TradeAction::new("e1", base, ActionKind::Sell, 200.0)
                .with_size(2.0)
                .with_tp(190.0)
                .with_sl(205.0),
            TradeAction::new("c1", base + Duration::hours(3), ActionKind::Close, 190.0)
                .with_entry_price(200.0),
            TradeAction::new("e2", base + Duration::hours(4), ActionKind::Buy, 50.0).with_size(1.0),
        ]
    }

    fn report() -> MetricsReport {
        MetricsReport::build(&actions(), &MetricsConfig::default().with_initial_capital(1_000.0))
    }

    #[test]
    fn positions_csv_rows() {
        let csv = export_positions_csv(&report().positions).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("entry_id,exit_id,direction"));

        assert!(lines[1].starts_with("e1,c1,short,"));
        assert!(lines[1].contains(",20.00,"));
        assert!(lines[1].contains(",tp_hit,certain,exact,3.00,"));

        // Open position: no exit id, no tier.
        assert!(lines[2].starts_with("e2,,long,"));
        assert!(lines[2].contains(",open,certain,,,"));
    }

    #[test]
    fn equity_csv() {
        let csv = export_equity_csv(&[1_000.0, 1_020.0]).unwrap();
        assert_eq!(csv, "step,equity\n0,1000.00\n1,1020.00\n");
    }

    #[test]
    fn save_and_load_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("run");
        let report = report();

        let written = save_report(&report, &out).unwrap();
        assert_eq!(written, out);
        for name in ["report.json", "positions.csv", "equity.csv"] {
            assert!(out.join(name).exists(), "{name} missing");
        }

        let loaded = load_report(&out).unwrap();
        assert_eq!(loaded.input_hash, report.input_hash);
        assert_eq!(loaded.positions.len(), 2);
    }

    #[test]
    fn zero_price_entry_reloads() {
        let base = Utc.with_ymd_and_hms(2024, 6, 4, 9, 0, 0).unwrap();
        let mut actions = actions();
        actions.push(TradeAction::new("e0", base, ActionKind::Buy, 0.0).with_size(1.0));

        // Unmarked: valued at its own zero price, return 0 / 0.
        let report = MetricsReport::build(&actions, &MetricsConfig::default());
        let dir = tempfile::tempdir().unwrap();
        save_report(&report, dir.path()).unwrap();
        let loaded = load_report(dir.path()).unwrap();
        let zero = loaded
            .positions
            .iter()
            .find(|p| p.entry_action.id.0 == "e0")
            .unwrap();
        assert!(zero.pnl_percentage.is_nan());
        assert_eq!(loaded.positions.len(), report.positions.len());

        // Marked above zero: infinite return.
        let marked = MetricsConfig::default().with_current_price(10.0);
        let report = MetricsReport::build(&actions, &marked);
        let json = export_json(&report).unwrap();
        let back = import_json(&json).unwrap();
        let zero = back
            .positions
            .iter()
            .find(|p| p.entry_action.id.0 == "e0")
            .unwrap();
        assert_eq!(zero.pnl_percentage, f64::INFINITY);
    }

    #[test]
    fn future_schema_rejected() {
        let mut value = serde_json::to_value(report()).unwrap();
        value["schemaVersion"] = serde_json::json!(SCHEMA_VERSION + 1);
        let err = import_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, ExportError::SchemaVersion { .. }));
    }

    #[test]
    fn missing_report_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load_report(dir.path()), Err(ExportError::Io { .. })));
    }
}
