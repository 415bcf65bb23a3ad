use crate::config::Settings;
use crate::llm::error::BackendError;
use crate::llm::{Backend, TextBackend};
use anyhow::Context;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Local Ollama server. One instance per model; the recommendation and blog agents each get one.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn from_settings(settings: &Settings, model: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.backend_timeout())
            .build()
            .context("failed to build Ollama http client")?;

        Ok(Self {
            http,
            base_url: settings
                .ollama_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: model.into(),
        })
    }

    fn url(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl TextBackend for OllamaClient {
    fn backend(&self) -> Backend {
        Backend::Ollama
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        let req = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let res = self
            .http
            .post(self.url())
            .json(&req)
            .send()
            .await
            .map_err(|e| BackendError::transport(Backend::Ollama, &e))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| BackendError::transport(Backend::Ollama, &e))?;
        if status != StatusCode::OK {
            return Err(BackendError::Status {
                backend: Backend::Ollama,
                status: status.as_u16(),
                body: text,
            });
        }

        parse_generate_response(&text)
    }
}

fn parse_generate_response(body: &str) -> Result<String, BackendError> {
    serde_json::from_str::<GenerateResponse>(body)
        .map(|r| r.response)
        .map_err(|e| BackendError::Decode {
            backend: Backend::Ollama,
            message: e.to_string(),
        })
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::{self, Request, Response};
    use serde_json::json;

    #[test]
    fn request_is_non_streaming() {
        let req = GenerateRequest {
            model: "mistral",
            prompt: "Recommend AAPL",
            stream: false,
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"model": "mistral", "prompt": "Recommend AAPL", "stream": false})
        );
    }

    #[test]
    fn parses_response_field() {
        let body = json!({
            "model": "llama3",
            "created_at": "2026-10-19T10:00:00Z",
            "response": "# AAPL\n\nBlog body",
            "done": true
        })
        .to_string();
        assert_eq!(parse_generate_response(&body).unwrap(), "# AAPL\n\nBlog body");
    }

    #[test]
    fn missing_response_field_is_tagged() {
        let err = parse_generate_response(r#"{"done": true}"#).unwrap_err();
        assert!(err.to_string().starts_with("Ollama Error: unexpected response"));
    }

    #[tokio::test]
    async fn server_down_is_a_connection_error() {
        let settings = Settings {
            ollama_base_url: Some("http://127.0.0.1:9".to_string()),
            backend_timeout_secs: Some(2),
            ..Default::default()
        };
        let client = OllamaClient::from_settings(&settings, "mistral").unwrap();
        let text = client.generate_text("hi").await;
        assert!(text.starts_with("Ollama Connection Error: "), "{text}");
        assert_eq!(client.label(), "Ollama mistral");
    }

    fn client_for(base_url: &str, model: &str) -> OllamaClient {
        let settings = Settings {
            ollama_base_url: Some(base_url.to_string()),
            backend_timeout_secs: Some(5),
            ..Default::default()
        };
        OllamaClient::from_settings(&settings, model).unwrap()
    }

    #[tokio::test]
    async fn ok_response_field_is_returned() {
        let server = test_server::serve(|req: &Request| {
            if req.path() == "/api/generate" {
                Response::new(200, json!({"response": "BUY with high confidence", "done": true}).to_string())
            } else {
                Response::new(404, "not found")
            }
        })
        .await;

        let text = client_for(&server.base_url, "mistral")
            .generate("Recommend AAPL")
            .await
            .unwrap();
        assert_eq!(text, "BUY with high confidence");

        let sent: serde_json::Value = serde_json::from_str(&server.recorded()[0].body).unwrap();
        assert_eq!(
            sent,
            json!({"model": "mistral", "prompt": "Recommend AAPL", "stream": false})
        );
    }

    #[tokio::test]
    async fn non_200_is_a_status_error() {
        let server = test_server::serve(|_: &Request| {
            Response::new(500, r#"{"error":"model 'llama3' not found"}"#)
        })
        .await;

        let client = client_for(&server.base_url, "llama3");
        let err = client.generate("Write a post").await.unwrap_err();
        assert!(matches!(
            err,
            BackendError::Status { backend: Backend::Ollama, status: 500, .. }
        ));
        assert_eq!(
            client.generate_text("Write a post").await,
            r#"Ollama API Error: HTTP 500: {"error":"model 'llama3' not found"}"#
        );
    }
}
