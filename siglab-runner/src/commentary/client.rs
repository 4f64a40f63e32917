//! Blocking chat-completion client with fixed-delay retries.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::prompt::{ChatMessage, ChatPrompt};
use super::{CommentaryError, TextGenerator};

/// Chat service settings. Every field is optional in TOML.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentaryConfig {
    pub base_url: String,
    pub model: String,
    /// Never written back out.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
    pub timeout_secs: u64,
    /// Closes quoted in the prompt.
    pub recent_closes: usize,
    pub temperature: Option<f64>,
}

impl Default for CommentaryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            api_key: None,
            max_attempts: 3,
            retry_delay_secs: 2,
            timeout_secs: 60,
            recent_closes: 30,
            temperature: None,
        }
    }
}

impl fmt::Debug for CommentaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommentaryConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("max_attempts", &self.max_attempts)
            .field("retry_delay_secs", &self.retry_delay_secs)
            .field("timeout_secs", &self.timeout_secs)
            .field("recent_closes", &self.recent_closes)
            .field("temperature", &self.temperature)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// OpenAI-compatible `/chat/completions` client.
pub struct ChatClient {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: Option<f64>,
    max_attempts: u32,
    retry_delay: Duration,
}

impl ChatClient {
    pub fn new(config: &CommentaryConfig) -> Result<Self, CommentaryError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(CommentaryError::MissingApiKey)?
            .to_string();
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CommentaryError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_attempts: config.max_attempts.max(1),
            retry_delay: Duration::from_secs(config.retry_delay_secs),
        })
    }

    /// Override the delay between attempts.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// One request; the error variant says whether another attempt can help.
    fn attempt(&self, body: &ChatRequest<'_>) -> Result<String, Attempt> {
        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .map_err(|e| Attempt::Retry(CommentaryError::Transport(e.to_string())))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            let body = resp.text().unwrap_or_default();
            return Err(Attempt::Fatal(CommentaryError::Unauthorized { body }));
        }
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(Attempt::Retry(CommentaryError::HttpStatus {
                status: status.as_u16(),
                body,
            }));
        }

        let parsed: ChatResponse = resp
            .json()
            .map_err(|e| Attempt::Retry(CommentaryError::ResponseFormat(e.to_string())))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(Attempt::Fatal(CommentaryError::EmptyResponse))
    }
}

enum Attempt {
    Retry(CommentaryError),
    Fatal(CommentaryError),
}

impl TextGenerator for ChatClient {
    fn generate(&self, prompt: &ChatPrompt) -> Result<String, CommentaryError> {
        let body = ChatRequest {
            model: &self.model,
            messages: prompt.messages(),
            temperature: self.temperature,
        };

        let mut last_error = None;
        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                std::thread::sleep(self.retry_delay);
            }
            tracing::debug!(url = %self.endpoint(), model = %self.model, attempt, "chat request");

            match self.attempt(&body) {
                Ok(text) => return Ok(text),
                Err(Attempt::Fatal(e)) => return Err(e),
                Err(Attempt::Retry(e)) => {
                    tracing::warn!(attempt, max = self.max_attempts, error = %e, "chat request failed");
                    last_error = Some(e);
                }
            }
        }

        Err(CommentaryError::RetriesExhausted {
            attempts: self.max_attempts,
            last: last_error.map(|e| e.to_string()).unwrap_or_default(),
        })
    }
}
