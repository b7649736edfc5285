//! Oracle adapter — invokes one external classification oracle.
//!
//! Every supported provider exposes an OpenAI-compatible chat-completions
//! endpoint, so a single `ChatOracle` covers them all; which provider a
//! given instance talks to is configuration, not code. The rest of the core
//! sees only the `ClassificationOracle` capability: given `(text, context,
//! credential)`, produce a command or a transport failure. Failures are
//! values, never panics — the orchestrator turns them into "try the next
//! oracle".

use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use super::config::ProviderConfig;
use super::errors::OracleFailure;
use super::prompt;
use crate::classify::response_parser::parse_command_reply;
use crate::classify::types::EditCommand;

// ─── Constants ───────────────────────────────────────────────────────────────

/// TCP connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Total request timeout for classification calls.
const CLASSIFY_TIMEOUT: Duration = Duration::from_secs(30);

/// Total request timeout for lightweight connectivity checks.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Capability ──────────────────────────────────────────────────────────────

/// The classification-oracle capability.
///
/// One method, one network call, one structured result. Implementations
/// must not mutate shared state.
pub trait ClassificationOracle: Send + Sync {
    /// Stable provider key (matches the registry descriptor name).
    fn name(&self) -> &str;

    /// Human-readable label attached to results.
    fn display_name(&self) -> &str;

    /// Classify `(text, context)` using `credential`.
    fn classify<'a>(
        &'a self,
        text: &'a str,
        context: &'a str,
        credential: &'a str,
    ) -> BoxFuture<'a, Result<EditCommand, OracleFailure>>;

    /// Probe endpoint reachability without consuming model tokens.
    ///
    /// Implementations without a transport report unreachable.
    fn health_check<'a>(&'a self, credential: &'a str) -> BoxFuture<'a, bool> {
        let _ = credential;
        futures::future::ready(false).boxed()
    }
}

// ─── Wire Types ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    choices: Vec<ReplyChoice>,
}

#[derive(Debug, Deserialize)]
struct ReplyChoice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

// ─── ChatOracle ──────────────────────────────────────────────────────────────

/// An oracle speaking the OpenAI-style chat-completions wire format.
pub struct ChatOracle {
    name: String,
    display_name: String,
    http: HttpClient,
    base_url: String,
    model: String,
}

impl ChatOracle {
    /// Build an oracle for one configured provider.
    pub fn from_provider_config(name: &str, cfg: &ProviderConfig) -> Result<Self, OracleFailure> {
        let http = HttpClient::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(CLASSIFY_TIMEOUT)
            .build()
            .map_err(|e| OracleFailure::ConnectionFailed {
                endpoint: cfg.base_url.clone(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            name: name.to_string(),
            display_name: cfg.display_name.clone(),
            http,
            base_url: cfg.base_url.clone(),
            model: cfg.model.clone(),
        })
    }

    /// One classification request against this provider.
    async fn request_classification(
        &self,
        text: &str,
        context: &str,
        credential: &str,
    ) -> Result<EditCommand, OracleFailure> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                WireMessage {
                    role: "system",
                    content: prompt::system_prompt(),
                },
                WireMessage {
                    role: "user",
                    content: prompt::user_message(text, context),
                },
            ],
            temperature: 0.1,
            max_tokens: 512,
            stream: false,
        };

        tracing::debug!(
            provider = %self.name,
            url = %url,
            model = %self.model,
            text_chars = text.chars().count(),
            context_chars = context.chars().count(),
            "oracle classification request"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(credential)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OracleFailure::Timeout {
                        duration_secs: CLASSIFY_TIMEOUT.as_secs(),
                    }
                } else {
                    OracleFailure::ConnectionFailed {
                        endpoint: url.clone(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(OracleFailure::HttpStatus {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let body_text = response
            .text()
            .await
            .map_err(|e| OracleFailure::MalformedReply {
                raw_reply: String::new(),
                reason: format!("failed to read response body: {e}"),
            })?;

        let reply = extract_reply_text(&body_text)?;
        let mut command = parse_command_reply(&reply)?;

        // Traceability: label the result with the oracle that produced it.
        command.provider = Some(self.display_name.clone());
        let suffix = format!(" [via {}]", self.display_name);
        command.explanation = Some(match command.explanation.take() {
            Some(expl) => format!("{expl}{suffix}"),
            None => suffix.trim_start().to_string(),
        });

        Ok(command)
    }

    /// Check whether the provider endpoint is reachable.
    ///
    /// Lightweight request, short timeout, does not consume model tokens.
    async fn probe_health(&self, credential: &str) -> bool {
        let url = format!("{}/models", self.base_url);
        match self
            .http
            .get(&url)
            .bearer_auth(credential)
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}

impl ClassificationOracle for ChatOracle {
    fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn classify<'a>(
        &'a self,
        text: &'a str,
        context: &'a str,
        credential: &'a str,
    ) -> BoxFuture<'a, Result<EditCommand, OracleFailure>> {
        self.request_classification(text, context, credential).boxed()
    }

    fn health_check<'a>(&'a self, credential: &'a str) -> BoxFuture<'a, bool> {
        self.probe_health(credential).boxed()
    }
}

// ─── Reply Body Extraction ───────────────────────────────────────────────────

/// Pull the assistant message text out of a chat-completions response body.
fn extract_reply_text(body: &str) -> Result<String, OracleFailure> {
    let reply: ChatReply =
        serde_json::from_str(body).map_err(|e| OracleFailure::MalformedReply {
            raw_reply: body.to_string(),
            reason: format!("invalid response JSON: {e}"),
        })?;

    reply
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| OracleFailure::MalformedReply {
            raw_reply: body.to_string(),
            reason: "response carries no message content".into(),
        })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
