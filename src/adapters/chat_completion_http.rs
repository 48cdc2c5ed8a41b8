//! OpenAI-compatible chat completion client using reqwest.

use std::time::Duration;

use reqwest::Proxy;
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::domain::AppError;
use crate::domain::configuration::ApiConfig;
use crate::ports::TextGenerator;

const CHAT_COMPLETIONS_PATH: &str = "chat/completions";
const OPENROUTER_HOST: &str = "openrouter.ai";
const OPENROUTER_REFERER: &str = "https://github.com/docfill/docfill";
const OPENROUTER_TITLE: &str = "docfill";

/// HTTP transport for chat completion endpoints.
///
/// Every failure is logged and reported as an empty response.
#[derive(Clone)]
pub struct ChatCompletionClient {
    endpoint: Url,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
    temperature: f32,
    client: Client,
}

impl std::fmt::Debug for ChatCompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl ChatCompletionClient {
    /// Build a client from API configuration, including timeout and proxies.
    pub fn new(config: &ApiConfig) -> Result<Self, AppError> {
        config.validate()?;
        // Only configured proxies apply; the loader already folds HTTP(S)_PROXY into them.
        let mut builder =
            Client::builder().timeout(Duration::from_secs(config.timeout_secs)).no_proxy();
        if let Some(proxy) = &config.http_proxy {
            builder = builder.proxy(Proxy::http(proxy).map_err(|e| {
                AppError::InvalidConfig(format!("Invalid HTTP proxy '{}': {}", proxy, e))
            })?);
        }
        if let Some(proxy) = &config.https_proxy {
            builder = builder.proxy(Proxy::https(proxy).map_err(|e| {
                AppError::InvalidConfig(format!("Invalid HTTPS proxy '{}': {}", proxy, e))
            })?);
        }
        let client = builder.build().map_err(|e| {
            AppError::config_error(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self {
            endpoint: chat_endpoint(&config.api_url)?,
            api_key: config.api_key.clone().filter(|key| !key.trim().is_empty()),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            client,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn send_request(&self, prompt: &str) -> Result<String, AppError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.header(AUTHORIZATION, format!("Bearer {}", key));
        }
        if self.endpoint.host_str().is_some_and(|host| host.ends_with(OPENROUTER_HOST)) {
            request = request.header("HTTP-Referer", OPENROUTER_REFERER).header("X-Title", OPENROUTER_TITLE);
        }

        let response = request
            .send()
            .map_err(|e| AppError::Generation(format!("HTTP request failed: {}", e)))?;
        let status = response.status();
        let body_text = response.text().unwrap_or_default();

        if !status.is_success() {
            let message = extract_error_message(&body_text).unwrap_or(body_text);
            return Err(AppError::Generation(format!("HTTP {}: {}", status.as_u16(), message)));
        }

        let parsed: ChatResponse = serde_json::from_str(&body_text)
            .map_err(|e| AppError::Generation(format!("Failed to parse response: {}", e)))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::Generation("No message content in response".into()))
    }
}

impl TextGenerator for ChatCompletionClient {
    fn generate(&self, prompt: &str) -> String {
        debug!(endpoint = %self.endpoint, chars = prompt.chars().count(), "requesting completion");
        match self.send_request(prompt) {
            Ok(content) => content,
            Err(err) => {
                warn!(error = %err, "text generation failed");
                String::new()
            }
        }
    }
}

/// `<base>/chat/completions`, unless the base already points there.
pub fn chat_endpoint(base: &Url) -> Result<Url, AppError> {
    if base.path().trim_end_matches('/').ends_with(CHAT_COMPLETIONS_PATH) {
        return Ok(base.clone());
    }
    let joined = format!("{}/{}", base.as_str().trim_end_matches('/'), CHAT_COMPLETIONS_PATH);
    Url::parse(&joined)
        .map_err(|e| AppError::InvalidConfig(format!("Invalid API URL '{}': {}", base, e)))
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
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
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

fn extract_error_message(body: &str) -> Option<String> {
    if body.trim().is_empty() {
        return None;
    }

    let parsed = serde_json::from_str::<serde_json::Value>(body).ok()?;

    if let Some(msg) = parsed
        .get("error")
        .and_then(|error| error.get("message"))
        .and_then(|message| message.as_str())
    {
        return Some(msg.to_string());
    }

    parsed.get("message").and_then(|message| message.as_str()).map(ToOwned::to_owned)
}
