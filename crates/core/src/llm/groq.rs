use crate::config::Settings;
use crate::llm::chat::{self, ChatCompletionRequest};
use crate::llm::error::BackendError;
use crate::llm::{Backend, TextBackend};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;

const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_MODEL: &str = "mixtral-8x7b-32768";

/// Fast hosted inference over raw HTTP, used by the accounting agent.
#[derive(Debug, Clone)]
pub struct GroqClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl GroqClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.backend_timeout())
            .build()
            .context("failed to build Groq http client")?;

        Ok(Self {
            http,
            api_key: settings.groq_api_key.clone(),
            base_url: settings
                .groq_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: settings
                .groq_model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn headers(&self, api_key: &str) -> Result<HeaderMap, BackendError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
            BackendError::Transport {
                backend: Backend::Groq,
                message: format!("invalid GROQ_API_KEY header value: {e}"),
            }
        })?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[async_trait::async_trait]
impl TextBackend for GroqClient {
    fn backend(&self) -> Backend {
        Backend::Groq
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        let api_key = self.api_key.as_deref().ok_or(BackendError::MissingApiKey {
            backend: Backend::Groq,
            env_var: "GROQ_API_KEY",
        })?;

        let body = serde_json::to_vec(&ChatCompletionRequest::single_turn(&self.model, prompt))
            .map_err(|e| BackendError::Decode {
                backend: Backend::Groq,
                message: e.to_string(),
            })?;

        let res = self
            .http
            .post(self.url())
            .headers(self.headers(api_key)?)
            .body(body)
            .send()
            .await
            .map_err(|e| BackendError::transport(Backend::Groq, &e))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| BackendError::transport(Backend::Groq, &e))?;

        // Anything but a plain 200 is an API error, distinct from connection failures.
        if status != StatusCode::OK {
            return Err(BackendError::Status {
                backend: Backend::Groq,
                status: status.as_u16(),
                body: text,
            });
        }

        chat::first_choice_text(Backend::Groq, &text)
    }
}
