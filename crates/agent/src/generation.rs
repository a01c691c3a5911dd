use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::warn;

use showhome_core::config::{GenerationConfig, GenerationProvider};

/// One structured call to the generation service: a named prompt template
/// already rendered to its final text.
#[derive(Clone, Debug)]
pub struct GenerationRequest {
    pub prompt_name: &'static str,
    pub prompt: String,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("prompt template `{prompt_name}` failed to render: {detail}")]
    Template { prompt_name: &'static str, detail: String },
    #[error("generation transport failure: {0}")]
    Transport(String),
    #[error("generation service returned malformed output: {0}")]
    MalformedResponse(String),
    #[error("generation output did not satisfy the `{prompt_name}` contract: {detail}")]
    Contract { prompt_name: &'static str, detail: String },
}

/// Boundary to the hosted text-generation service. Implementations send a
/// rendered prompt and return the model's JSON object.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate_json(&self, request: GenerationRequest) -> Result<Value, GenerationError>;
}

/// HTTP client for OpenAI-, Anthropic-, and Ollama-style chat APIs.
///
/// The request timeout comes from configuration and is never shorter than
/// the provider default; transport failures are retried up to
/// `max_retries` times, everything else fails through.
pub struct HttpGenerationClient {
    client: Client,
    provider: GenerationProvider,
    base_url: String,
    model: String,
    api_key: Option<SecretString>,
    max_retries: u32,
}

impl HttpGenerationClient {
    pub fn new(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| GenerationError::Transport(error.to_string()))?;

        Ok(Self {
            client,
            provider: config.provider,
            base_url: base_url_for(config),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            max_retries: config.max_retries,
        })
    }

    fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        match self.provider {
            GenerationProvider::OpenAi => format!("{base}/v1/chat/completions"),
            GenerationProvider::Anthropic => format!("{base}/v1/messages"),
            GenerationProvider::Ollama => format!("{base}/api/chat"),
        }
    }

    fn request_body(&self, prompt: &str) -> Value {
        match self.provider {
            GenerationProvider::OpenAi => json!({
                "model": self.model,
                "messages": [{"role": "user", "content": prompt}],
                "response_format": {"type": "json_object"},
            }),
            GenerationProvider::Anthropic => json!({
                "model": self.model,
                "max_tokens": 1024,
                "messages": [{"role": "user", "content": prompt}],
            }),
            GenerationProvider::Ollama => json!({
                "model": self.model,
                "messages": [{"role": "user", "content": prompt}],
                "format": "json",
                "stream": false,
            }),
        }
    }

    async fn send_once(&self, prompt: &str) -> Result<Value, GenerationError> {
        let mut request = self.client.post(self.endpoint()).json(&self.request_body(prompt));

        if let Some(api_key) = &self.api_key {
            request = match self.provider {
                GenerationProvider::Anthropic => request
                    .header("x-api-key", api_key.expose_secret())
                    .header("anthropic-version", "2023-06-01"),
                GenerationProvider::OpenAi | GenerationProvider::Ollama => {
                    request.bearer_auth(api_key.expose_secret())
                }
            };
        }

        let response = request
            .send()
            .await
            .map_err(|error| GenerationError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::Transport(format!(
                "generation endpoint returned status {status}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|error| GenerationError::MalformedResponse(error.to_string()))?;

        let content = extract_message_text(self.provider, &body)?;
        parse_structured_content(&content)
    }
}

#[async_trait]
impl GenerationClient for HttpGenerationClient {
    async fn generate_json(&self, request: GenerationRequest) -> Result<Value, GenerationError> {
        let mut attempt = 0u32;
        loop {
            match self.send_once(&request.prompt).await {
                Ok(value) => return Ok(value),
                Err(GenerationError::Transport(detail)) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        event_name = "generation.retry",
                        prompt_name = request.prompt_name,
                        attempt,
                        error = %detail,
                        "generation transport failed, retrying"
                    );
                }
                Err(error) => return Err(error),
            }
        }
    }
}

fn base_url_for(config: &GenerationConfig) -> String {
    if let Some(base_url) = &config.base_url {
        return base_url.clone();
    }
    match config.provider {
        GenerationProvider::OpenAi => "https://api.openai.com".to_string(),
        GenerationProvider::Anthropic => "https://api.anthropic.com".to_string(),
        GenerationProvider::Ollama => "http://localhost:11434".to_string(),
    }
}

/// Pull the assistant text out of the provider's response envelope.
fn extract_message_text(
    provider: GenerationProvider,
    body: &Value,
) -> Result<String, GenerationError> {
    let text = match provider {
        GenerationProvider::OpenAi => {
            body.pointer("/choices/0/message/content").and_then(Value::as_str)
        }
        GenerationProvider::Anthropic => body.pointer("/content/0/text").and_then(Value::as_str),
        GenerationProvider::Ollama => body.pointer("/message/content").and_then(Value::as_str),
    };

    text.map(str::to_string).ok_or_else(|| {
        GenerationError::MalformedResponse(
            "response envelope carried no message text".to_string(),
        )
    })
}

/// The prompts demand a JSON object; anything the model wraps around it
/// (whitespace, code fences) is tolerated, anything else is malformed.
fn parse_structured_content(content: &str) -> Result<Value, GenerationError> {
    let trimmed = content.trim().trim_start_matches("```json").trim_matches('`').trim();
    serde_json::from_str::<Value>(trimmed).map_err(|error| {
        GenerationError::MalformedResponse(format!("message text is not a JSON object: {error}"))
    })
}
