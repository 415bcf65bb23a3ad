use crate::config::Settings;
use crate::llm::chat::{self, ChatCompletionRequest};
use crate::llm::error::BackendError;
use crate::llm::{Backend, TextBackend};
use anyhow::Context;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4";

/// Hosted general-purpose chat model, used by the research agent.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.backend_timeout())
            .build()
            .context("failed to build OpenAI http client")?;

        Ok(Self {
            http,
            api_key: settings.openai_api_key.clone(),
            base_url: settings
                .openai_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: settings
                .openai_model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl TextBackend for OpenAiClient {
    fn backend(&self) -> Backend {
        Backend::OpenAi
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(BackendError::MissingApiKey {
                backend: Backend::OpenAi,
                env_var: "OPENAI_API_KEY",
            })?;

        let res = self
            .http
            .post(self.url())
            .bearer_auth(api_key)
            .json(&ChatCompletionRequest::single_turn(&self.model, prompt))
            .send()
            .await
            .map_err(|e| BackendError::transport(Backend::OpenAi, &e))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| BackendError::transport(Backend::OpenAi, &e))?;
        if !status.is_success() {
            return Err(BackendError::Status {
                backend: Backend::OpenAi,
                status: status.as_u16(),
                body,
            });
        }

        chat::first_choice_text(Backend::OpenAi, &body)
    }
}
