//! SigLab Runner: request orchestration on top of `siglab-core`.
//!
//! This crate provides:
//! - The single-symbol analysis pipeline with schema-versioned reports
//! - TOML file configuration
//! - A parallel multi-symbol screener
//! - JSON, CSV and Markdown export
//! - Prompt construction and a chat client for AI commentary

pub mod analysis;
pub mod commentary;
pub mod config;
pub mod export;
pub mod screener;

pub use analysis::{
    analyze, config_hash, AnalysisError, AnalysisReport, AnalyzeOptions, RecentClose, SCHEMA_VERSION,
};
pub use commentary::{
    build_prompt, comment_on, ChatClient, ChatPrompt, CommentaryConfig, CommentaryError,
    TextGenerator,
};
pub use config::{ConfigFileError, DataConfig, ScreenConfig, SiglabConfig};
pub use export::{
    export_report_json, export_screen_csv, export_trades_csv, import_report_json, load_artifacts,
    render_markdown, save_artifacts,
};
pub use screener::{parse_symbols, screen, ScreenOutcome, ScreenRow};
