use crate::llm::Backend;

/// Substring every error-tagged backend text contains.
pub const ERROR_MARKER: &str = "Error";

/// Failure of a single backend call. `Display` yields the error-tagged text
/// (`"Groq API Error: ..."`) callers detect with [`is_error_tagged`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    #[error("{backend} Error: {env_var} is not set")]
    MissingApiKey {
        backend: Backend,
        env_var: &'static str,
    },

    #[error("{backend} Connection Error: {message}")]
    Transport { backend: Backend, message: String },

    #[error("{backend} API Error: HTTP {status}: {body}")]
    Status {
        backend: Backend,
        status: u16,
        body: String,
    },

    #[error("{backend} Error: unexpected response: {message}")]
    Decode { backend: Backend, message: String },
}

impl BackendError {
    pub fn backend(&self) -> Backend {
        match self {
            BackendError::MissingApiKey { backend, .. }
            | BackendError::Transport { backend, .. }
            | BackendError::Status { backend, .. }
            | BackendError::Decode { backend, .. } => *backend,
        }
    }

    pub(crate) fn transport(backend: Backend, err: &reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("request timed out: {err}")
        } else {
            err.to_string()
        };
        BackendError::Transport { backend, message }
    }
}

/// Collapse a backend result into plain text, tagging failures.
pub fn tag_errors(result: Result<String, BackendError>) -> String {
    match result {
        Ok(text) => text,
        Err(err) => err.to_string(),
    }
}

pub fn is_error_tagged(text: &str) -> bool {
    text.contains(ERROR_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_carries_the_marker() {
        let errors = [
            BackendError::MissingApiKey {
                backend: Backend::OpenAi,
                env_var: "OPENAI_API_KEY",
            },
            BackendError::Transport {
                backend: Backend::Groq,
                message: "connection refused".to_string(),
            },
            BackendError::Status {
                backend: Backend::Groq,
                status: 429,
                body: "rate limited".to_string(),
            },
            BackendError::Decode {
                backend: Backend::Ollama,
                message: "missing field `response`".to_string(),
            },
        ];
        for err in errors {
            assert!(is_error_tagged(&tag_errors(Err(err))));
        }
    }

    #[test]
    fn status_and_transport_are_tagged_differently() {
        let status = BackendError::Status {
            backend: Backend::Groq,
            status: 500,
            body: "oops".to_string(),
        };
        let transport = BackendError::Transport {
            backend: Backend::Groq,
            message: "timed out".to_string(),
        };
        assert_eq!(status.to_string(), "Groq API Error: HTTP 500: oops");
        assert_eq!(transport.to_string(), "Groq Connection Error: timed out");
    }

    #[test]
    fn successful_text_passes_through() {
        assert_eq!(tag_errors(Ok("fine".to_string())), "fine");
        assert!(!is_error_tagged("fine"));
    }
}
