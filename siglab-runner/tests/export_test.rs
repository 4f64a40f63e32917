//! Integration tests for report and screen export.

use siglab_core::domain::{bars_from_closes, Series};
use siglab_core::AnalysisConfig;
use siglab_runner::{
    analyze, export_report_json, export_screen_csv, export_trades_csv, import_report_json,
    load_artifacts, render_markdown, save_artifacts, AnalysisReport, AnalyzeOptions,
    ScreenOutcome, ScreenRow, SCHEMA_VERSION,
};

fn report() -> AnalysisReport {
    let mut closes: Vec<f64> = (0..30).map(|i| 20.0 - 0.1 * i as f64).collect();
    closes.extend(std::iter::repeat(30.0).take(10));
    let s = Series::new("600000", bars_from_closes(&closes)).unwrap();
    let mut cfg = AnalysisConfig::default();
    cfg.backtest.lookback = 40;
    analyze(&s, &cfg, &AnalyzeOptions::default()).unwrap()
}

// ─── JSON ───────────────────────────────────────────────────────────

#[test]
fn json_roundtrip_preserves_report() {
    let original = report();
    let json = export_report_json(&original).unwrap();
    let restored = import_report_json(&json).unwrap();

    assert_eq!(restored.schema_version, SCHEMA_VERSION);
    assert_eq!(restored.symbol, original.symbol);
    assert_eq!(restored.signals, original.signals);
    assert_eq!(restored.config, original.config);
    assert_eq!(restored.config_hash, original.config_hash);
    assert_eq!(
        restored.backtest.as_ref().map(|b| b.trades.len()),
        original.backtest.as_ref().map(|b| b.trades.len())
    );
}

#[test]
fn json_rejects_newer_schema() {
    let mut r = report();
    r.schema_version = SCHEMA_VERSION + 1;
    let json = export_report_json(&r).unwrap();
    let msg = import_report_json(&json).unwrap_err().to_string();
    assert!(msg.contains("unsupported schema version"));
}

#[test]
fn json_rejects_garbage() {
    assert!(import_report_json("{\"symbol\": 1}").is_err());
}

// ─── CSV ────────────────────────────────────────────────────────────

#[test]
fn trades_csv_for_backtest() {
    let r = report();
    let csv = export_trades_csv(&r.backtest.unwrap().trades).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "signal_kind,date,entry_price,exit_price,return_pct");
    assert_eq!(lines[1], "bullish crossover,2024-02-01,30.00,30.00,0.00%");
}

#[test]
fn screen_csv_joins_signals_and_marks_errors() {
    let rows = vec![
        ScreenRow {
            symbol: "000001".into(),
            outcome: ScreenOutcome::Signals(vec![
                "MA5_cross_above_MA10".into(),
                "volume_breakout".into(),
            ]),
        },
        ScreenRow {
            symbol: "000002".into(),
            outcome: ScreenOutcome::Failed("symbol not found: 000002".into()),
        },
    ];
    let csv = export_screen_csv(&rows).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "code,signals");
    assert_eq!(lines[1], "000001,MA5_cross_above_MA10;volume_breakout");
    assert_eq!(lines[2], "000002,error: symbol not found: 000002");
}

// ─── Artifacts ──────────────────────────────────────────────────────

#[test]
fn artifacts_roundtrip_through_directory() {
    let dir = tempfile::tempdir().unwrap();
    let r = report();
    let run_dir = save_artifacts(&r, dir.path()).unwrap();

    assert!(run_dir.ends_with("600000_20240210"));
    assert!(run_dir.join("trades.csv").exists());
    assert!(run_dir.join("report.md").exists());
    let loaded = load_artifacts(&run_dir).unwrap();
    assert_eq!(loaded.config_hash, r.config_hash);
}

#[test]
fn markdown_has_sections() {
    let md = render_markdown(&report());
    assert!(md.starts_with("# 600000 2024-02-10"));
    assert!(md.contains("## Indicators"));
    assert!(md.contains("## Signals"));
    assert!(md.contains("## Backtest (MACD"));
    assert!(md.contains("| bullish crossover | 1 | 0.00% |"));
}
