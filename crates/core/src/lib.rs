pub mod agents;
pub mod domain;
pub mod llm;
pub mod market;
pub mod orchestrator;

#[cfg(test)]
mod test_server;

pub mod config {
    use std::time::Duration;

    const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 30;

    /// Process-wide configuration, read once at startup.
    #[derive(Debug, Clone, Default)]
    pub struct Settings {
        pub openai_api_key: Option<String>,
        pub groq_api_key: Option<String>,
        pub sentry_dsn: Option<String>,
        pub openai_base_url: Option<String>,
        pub openai_model: Option<String>,
        pub groq_base_url: Option<String>,
        pub groq_model: Option<String>,
        pub ollama_base_url: Option<String>,
        pub ollama_recommendation_model: Option<String>,
        pub ollama_blog_model: Option<String>,
        pub market_data_base_url: Option<String>,
        pub market_data_cookie_url: Option<String>,
        pub backend_timeout_secs: Option<u64>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                openai_api_key: non_empty_var("OPENAI_API_KEY"),
                groq_api_key: non_empty_var("GROQ_API_KEY"),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
                openai_base_url: non_empty_var("OPENAI_BASE_URL"),
                openai_model: non_empty_var("OPENAI_MODEL"),
                groq_base_url: non_empty_var("GROQ_BASE_URL"),
                groq_model: non_empty_var("GROQ_MODEL"),
                ollama_base_url: non_empty_var("OLLAMA_BASE_URL"),
                ollama_recommendation_model: non_empty_var("OLLAMA_RECOMMENDATION_MODEL"),
                ollama_blog_model: non_empty_var("OLLAMA_BLOG_MODEL"),
                market_data_base_url: non_empty_var("MARKET_DATA_BASE_URL"),
                market_data_cookie_url: non_empty_var("MARKET_DATA_COOKIE_URL"),
                backend_timeout_secs: match non_empty_var("BACKEND_TIMEOUT_SECS") {
                    Some(raw) => Some(raw.parse::<u64>().map_err(|e| {
                        anyhow::anyhow!("BACKEND_TIMEOUT_SECS must be an integer ({raw}): {e}")
                    })?),
                    None => None,
                },
            })
        }

        /// Upper bound applied to every outbound model and market-data call.
        pub fn backend_timeout(&self) -> Duration {
            Duration::from_secs(
                self.backend_timeout_secs
                    .unwrap_or(DEFAULT_BACKEND_TIMEOUT_SECS),
            )
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn default_timeout_is_thirty_seconds() {
            let settings = Settings::default();
            assert_eq!(settings.backend_timeout(), Duration::from_secs(30));
        }

        #[test]
        fn explicit_timeout_overrides_default() {
            let settings = Settings {
                backend_timeout_secs: Some(5),
                ..Default::default()
            };
            assert_eq!(settings.backend_timeout(), Duration::from_secs(5));
        }
    }
}
