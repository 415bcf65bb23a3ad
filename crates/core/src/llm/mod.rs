pub mod chat;
pub mod error;
pub mod fallback;
pub mod groq;
pub mod ollama;
pub mod openai;

use crate::config::Settings;
use crate::llm::error::BackendError;
use std::fmt;
use std::sync::Arc;

pub use fallback::fallback_text;

pub const DEFAULT_RECOMMENDATION_MODEL: &str = "mistral";
pub const DEFAULT_BLOG_MODEL: &str = "llama3";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    OpenAi,
    Groq,
    Ollama,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Backend::OpenAi => "OpenAI",
            Backend::Groq => "Groq",
            Backend::Ollama => "Ollama",
        })
    }
}

#[async_trait::async_trait]
pub trait TextBackend: Send + Sync {
    fn backend(&self) -> Backend;

    fn model(&self) -> &str;

    /// Human-readable name reported as `backend_used`.
    fn label(&self) -> String {
        format!("{} {}", self.backend(), self.model())
    }

    /// Single-turn generation. Transport and HTTP failures come back as `Err`, never as a panic.
    async fn generate(&self, prompt: &str) -> Result<String, BackendError>;

    /// Same as [`TextBackend::generate`], with failures rendered as error-tagged text.
    async fn generate_text(&self, prompt: &str) -> String {
        error::tag_errors(self.generate(prompt).await)
    }
}

/// The backend each agent role talks to. Built once and shared read-only.
#[derive(Clone)]
pub struct BackendClients {
    pub research: Arc<dyn TextBackend>,
    pub accounting: Arc<dyn TextBackend>,
    pub recommendation: Arc<dyn TextBackend>,
    pub blog: Arc<dyn TextBackend>,
}

impl BackendClients {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let recommendation_model = settings
            .ollama_recommendation_model
            .clone()
            .unwrap_or_else(|| DEFAULT_RECOMMENDATION_MODEL.to_string());
        let blog_model = settings
            .ollama_blog_model
            .clone()
            .unwrap_or_else(|| DEFAULT_BLOG_MODEL.to_string());

        Ok(Self {
            research: Arc::new(openai::OpenAiClient::from_settings(settings)?),
            accounting: Arc::new(groq::GroqClient::from_settings(settings)?),
            recommendation: Arc::new(ollama::OllamaClient::from_settings(
                settings,
                recommendation_model,
            )?),
            blog: Arc::new(ollama::OllamaClient::from_settings(settings, blog_model)?),
        })
    }
}

/// Result of sending one prompt to a role's backend.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendCheck {
    pub role: &'static str,
    pub label: String,
    pub reply: String,
}

impl BackendCheck {
    pub fn healthy(&self) -> bool {
        !error::is_error_tagged(&self.reply)
    }
}

impl BackendClients {
    pub fn by_role(&self) -> [(&'static str, &Arc<dyn TextBackend>); 4] {
        [
            ("research", &self.research),
            ("accounting", &self.accounting),
            ("recommendation", &self.recommendation),
            ("blog", &self.blog),
        ]
    }

    /// Sends `prompt` to every role's backend in turn and reports what came back.
    pub async fn check(&self, prompt: &str) -> Vec<BackendCheck> {
        let mut checks = Vec::with_capacity(4);
        for (role, backend) in self.by_role() {
            let reply = backend.generate_text(prompt).await;
            let check = BackendCheck {
                role,
                label: backend.label(),
                reply,
            };
            if check.healthy() {
                tracing::info!(role, backend = %check.label, "backend reachable");
            } else {
                tracing::warn!(role, backend = %check.label, reply = %check.reply, "backend check failed");
            }
            checks.push(check);
        }
        checks
    }
}

impl fmt::Debug for BackendClients {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendClients")
            .field("research", &self.research.label())
            .field("accounting", &self.accounting.label())
            .field("recommendation", &self.recommendation.label())
            .field("blog", &self.blog.label())
            .finish()
    }
}
