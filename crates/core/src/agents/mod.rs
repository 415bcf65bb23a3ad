pub mod accounting;
pub mod blog;
pub mod recommendation;
pub mod research;

use crate::domain::report::AgentResult;
use crate::llm::{fallback_text, TextBackend};
use std::fmt;

pub use accounting::AccountingAgent;
pub use blog::BlogAgent;
pub use recommendation::RecommendationAgent;
pub use research::ResearchAgent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Research,
    Accounting,
    Recommendation,
    Blog,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Research => "research",
            Role::Accounting => "accounting",
            Role::Recommendation => "recommendation",
            Role::Blog => "blog",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text returned by a role's backend, or its canned replacement.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Generated {
    pub text: String,
    pub fell_back: bool,
}

pub(crate) async fn generate_or_fallback(
    backend: &dyn TextBackend,
    role: Role,
    ticker: &str,
    prompt: &str,
) -> Generated {
    match backend.generate(prompt).await {
        Ok(text) => Generated {
            text,
            fell_back: false,
        },
        Err(err) => {
            tracing::warn!(
                %ticker,
                %role,
                backend = %err.backend(),
                error = %err,
                "backend call failed; using fallback text"
            );
            Generated {
                text: fallback_text(ticker, role.as_str()),
                fell_back: true,
            }
        }
    }
}

/// Turns an agent's internal error into the `success: false` result.
pub(crate) fn into_result(role: Role, ticker: &str, res: anyhow::Result<AgentResult>) -> AgentResult {
    res.unwrap_or_else(|err| {
        tracing::error!(%ticker, %role, error = %err, "agent run failed");
        AgentResult::failed(ticker, format!("{err:#}"))
    })
}
