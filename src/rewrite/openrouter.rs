//! OpenRouter chat completions client.

use crate::config::RewriteConfig;
use crate::error::{Result, ToneTwistError};
use crate::persona::PersonaProfile;
use crate::rewrite::StyleRewriter;
use crate::rewrite::prompt::{build_prompt, clean_output};
use serde::{Deserialize, Serialize};

const PROVIDER: &str = "OpenRouter";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Style rewriter backed by an OpenRouter-hosted model.
#[derive(Debug, Clone)]
pub struct OpenRouterRewriter {
    client: reqwest::Client,
    config: RewriteConfig,
}

impl OpenRouterRewriter {
    pub fn new(config: &RewriteConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Share an existing HTTP client (connection pool) with other providers.
    pub fn with_client(client: reqwest::Client, config: &RewriteConfig) -> Self {
        Self {
            client,
            config: config.clone(),
        }
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
        }
    }
}

#[async_trait::async_trait]
impl StyleRewriter for OpenRouterRewriter {
    async fn rewrite(&self, text: &str, persona: &PersonaProfile) -> Result<String> {
        if text.trim().is_empty() {
            return Err(ToneTwistError::validation(
                "Missing text or style in request body.",
            ));
        }
        let api_key = self.config.api_key.as_deref().ok_or_else(|| ToneTwistError::Config {
            message: "OpenRouter API key not configured (OPENROUTER_API_KEY)".to_string(),
        })?;

        let prompt = build_prompt(text, persona);
        tracing::debug!(persona = persona.key, model = %self.config.model, "Sending rewrite request");

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .header("HTTP-Referer", &self.config.site_url)
            .header("X-Title", &self.config.site_name)
            .json(&self.request_body(&prompt))
            .send()
            .await
            .map_err(|e| ToneTwistError::Transport {
                provider: PROVIDER,
                message: e.without_url().to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ToneTwistError::Transport {
            provider: PROVIDER,
            message: format!("failed to read response: {}", e.without_url()),
        })?;

        if !status.is_success() {
            tracing::error!(status = status.as_u16(), body = %body, "Rewrite request failed");
            return Err(ToneTwistError::Upstream {
                provider: PROVIDER,
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let styled = parse_chat_response(&body)?;
        tracing::debug!(chars = styled.len(), "Rewrite finished");
        Ok(styled)
    }

    fn name(&self) -> &str {
        "openrouter"
    }
}

/// Pull the first choice's content out of a completion and clean it.
///
/// A body that is not a completion is an upstream fault; a missing choice
/// or content that is empty after cleaning is no usable result.
pub fn parse_chat_response(body: &str) -> Result<String> {
    let response: ChatResponse = serde_json::from_str(body).map_err(|e| {
        tracing::error!(error = %e, body = %body, "Could not parse completion response");
        ToneTwistError::Upstream {
            provider: PROVIDER,
            status: 502,
            message: format!("unexpected response format: {e}"),
        }
    })?;

    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .unwrap_or_default();

    let cleaned = clean_output(&content);
    if cleaned.is_empty() {
        tracing::error!(body = %body, "Could not extract styled text from completion");
        return Err(ToneTwistError::EmptyResult { provider: PROVIDER });
    }
    Ok(cleaned)
}

/// `error.message` from a JSON error body, or the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")?
                .get("message")?
                .as_str()
                .filter(|message| !message.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            let raw = body.trim();
            if raw.is_empty() {
                "Unknown error".to_string()
            } else {
                raw.to_string()
            }
        })
}
