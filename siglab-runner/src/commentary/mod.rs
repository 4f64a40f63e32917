//! AI commentary: turn an analysis report into a prompt and ask a
//! chat-completion service for a short buy / sell / hold opinion.
//!
//! Runs strictly after the core analysis. The API key is always explicit
//! configuration; nothing here reads the environment.

pub mod client;
pub mod prompt;

pub use client::{ChatClient, CommentaryConfig};
pub use prompt::{build_prompt, ChatMessage, ChatPrompt};

use thiserror::Error;

use crate::analysis::AnalysisReport;

/// Errors from the commentary layer.
#[derive(Debug, Error)]
pub enum CommentaryError {
    #[error("no API key configured (set commentary.api_key or OPENAI_API_KEY)")]
    MissingApiKey,

    #[error("API key rejected (HTTP 401): {body}")]
    Unauthorized { body: String },

    #[error("chat service returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected response format: {0}")]
    ResponseFormat(String),

    #[error("chat service returned no content")]
    EmptyResponse,

    #[error("commentary failed after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },
}

/// Anything that can answer a chat prompt with text.
///
/// `ChatClient` is the network implementation; tests plug in canned ones.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &ChatPrompt) -> Result<String, CommentaryError>;
}

/// Build the prompt for `report` and ask `generator` for commentary.
pub fn comment_on(
    report: &AnalysisReport,
    generator: &dyn TextGenerator,
) -> Result<String, CommentaryError> {
    let prompt = build_prompt(report);
    tracing::debug!(
        symbol = %report.symbol,
        prompt_chars = prompt.user.chars().count(),
        "requesting commentary"
    );
    generator.generate(&prompt)
}
