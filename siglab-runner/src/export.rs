//! Reporting and export: JSON, CSV, and Markdown artifact generation.
//!
//! - **JSON**: full round-trip serialization of an `AnalysisReport` with
//!   schema versioning
//! - **CSV**: backtest trade list and screener results
//! - **Markdown**: human-readable single-symbol report
//!
//! Reports newer than `SCHEMA_VERSION` are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use siglab_core::{CrossDirection, SignalStatus, TradeRecord};

use crate::analysis::{AnalysisReport, SCHEMA_VERSION};
use crate::screener::ScreenRow;

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize an `AnalysisReport` to pretty JSON.
pub fn export_report_json(report: &AnalysisReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize AnalysisReport to JSON")
}

/// Deserialize an `AnalysisReport` from JSON, rejecting unknown schema versions.
pub fn import_report_json(json: &str) -> Result<AnalysisReport> {
    let report: AnalysisReport =
        serde_json::from_str(json).context("failed to deserialize AnalysisReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export backtest trades.
///
/// Columns: signal_kind, date, entry_price, exit_price, return_pct.
/// `date` is the entry date; `return_pct` is formatted like `5.00%`.
pub fn export_trades_csv(trades: &[TradeRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["signal_kind", "date", "entry_price", "exit_price", "return_pct"])?;

    for t in trades {
        wtr.write_record(&[
            t.signal_kind.label().to_string(),
            t.entry_date.to_string(),
            format!("{:.2}", t.entry_price),
            format!("{:.2}", t.exit_price),
            t.return_pct_display(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export screener rows. Columns: code, signals.
pub fn export_screen_csv(rows: &[ScreenRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["code", "signals"])?;
    for row in rows {
        wtr.write_record(&[row.symbol.clone(), row.signals_cell()])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the artifact set for one analysis.
///
/// Creates `{symbol}_{date}/` under `output_dir` containing:
/// - `report.json`: the full `AnalysisReport`
/// - `trades.csv`: backtest trades (header only when no backtest ran)
/// - `report.md`: the Markdown summary
///
/// Returns the path to the created directory.
pub fn save_artifacts(report: &AnalysisReport, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!("{}_{}", report.symbol, report.date.format("%Y%m%d"));
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("report.json"), export_report_json(report)?)?;

    let trades = report
        .backtest
        .as_ref()
        .map(|b| b.trades.as_slice())
        .unwrap_or(&[]);
    std::fs::write(run_dir.join("trades.csv"), export_trades_csv(trades)?)?;
    std::fs::write(run_dir.join("report.md"), render_markdown(report))?;

    Ok(run_dir)
}

/// Load an `AnalysisReport` from an artifact directory's report.json.
pub fn load_artifacts(dir: &Path) -> Result<AnalysisReport> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_report_json(&json)
}

// ─── Markdown report ────────────────────────────────────────────────

/// Markdown summary of one analysis.
pub fn render_markdown(report: &AnalysisReport) -> String {
    let mut md = String::with_capacity(2048);
    let snap = &report.snapshot;
    let f4 = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |x| format!("{x:.4}"));

    md.push_str(&format!("# {} {}\n\n", report.symbol, report.date));
    md.push_str(&format!("Close: **{:.2}**\n\n", report.close));

    md.push_str("## Indicators\n\n| Indicator | Value |\n|---|---|\n");
    for (window, value) in &snap.ma {
        md.push_str(&format!("| MA{window} | {} |\n", f4(*value)));
    }
    md.push_str(&format!("| DIF | {} |\n", f4(snap.dif)));
    md.push_str(&format!("| DEA | {} |\n", f4(snap.dea)));
    md.push_str(&format!("| MACD | {} |\n", f4(snap.macd_hist)));
    md.push_str(&format!("| RSI{} | {} |\n", report.config.rsi_window, f4(snap.rsi)));

    md.push_str("\n## Signals\n\n| Signal | Status | Detail |\n|---|---|---|\n");
    for s in &report.signals {
        let status = match s.status {
            SignalStatus::Holds => "**holds**",
            SignalStatus::NotHeld => "no",
            SignalStatus::InsufficientData => "n/a",
        };
        md.push_str(&format!("| {} | {status} | {} |\n", s.name, s.explanation));
    }

    if let Some(bt) = &report.backtest {
        md.push_str(&format!(
            "\n## Backtest ({}, {} bars, hold {})\n\n",
            bt.signal.label(),
            bt.usable_bars,
            bt.holding_days
        ));
        md.push_str("| Direction | Count | Win rate | Mean return |\n|---|---|---|---|\n");
        for dir in CrossDirection::ALL {
            let s = bt.summary_for(dir);
            md.push_str(&format!(
                "| {} | {} | {} | {:.2}% |\n",
                dir.label(),
                s.occurrence_count,
                s.win_rate_pct(),
                s.mean_return * 100.0
            ));
        }
        if bt.skipped_triggers > 0 {
            md.push_str(&format!(
                "\n{} trigger(s) skipped (unpriceable entry).\n",
                bt.skipped_triggers
            ));
        }
    }

    let short_hash: String = report.config_hash.chars().take(12).collect();
    md.push_str(&format!(
        "\n---\nconfig `{short_hash}`, schema v{}\n",
        report.schema_version
    ));
    md
}
