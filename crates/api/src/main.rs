use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use actai_core::domain::report::CompositeReport;
use actai_core::orchestrator::{normalize_ticker, Orchestrator};

const SERVICE_NAME: &str = "ACT-AI Engine";
const AGENTS: [&str; 4] = ["research", "accounting", "recommender", "blogger"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = actai_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let orchestrator = Orchestrator::from_settings(&settings).inspect_err(|e| {
        sentry_anyhow::capture_anyhow(e);
    })?;
    let state = AppState {
        orchestrator: Arc::new(orchestrator),
    };

    let app = router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(5000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/analyze", post(analyze))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[derive(Clone)]
struct AppState {
    orchestrator: Arc<Orchestrator>,
}

#[derive(Debug, Serialize)]
struct ServiceInfo {
    message: String,
    status: &'static str,
    version: &'static str,
    agents: [&'static str; 4],
}

async fn home() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: format!("{SERVICE_NAME} is running!"),
        status: "success",
        version: env!("CARGO_PKG_VERSION"),
        agents: AGENTS,
    })
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "healthy", "service": SERVICE_NAME}))
}

#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    ticker: Option<String>,
}

#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Internal(err) => {
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %err, "analysis failed");
                (StatusCode::INTERNAL_SERVER_ERROR, format!("{err:#}"))
            }
        };
        (status, Json(json!({"error": message}))).into_response()
    }
}

async fn analyze(
    State(state): State<AppState>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<CompositeReport>, ApiError> {
    let missing = || ApiError::BadRequest("Missing 'ticker' in request body".to_string());

    let Json(req) = body.map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected analyze body");
        missing()
    })?;
    let requested = req.ticker.ok_or_else(missing)?;
    let ticker = normalize_ticker(Some(&requested));

    let orchestrator = state.orchestrator.clone();
    let report = tokio::spawn(async move { orchestrator.analyze(&ticker).await })
        .await
        .map_err(|e| ApiError::Internal(anyhow::Error::new(e).context("analysis task failed")))?;

    Ok(Json(report))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &actai_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actai_core::agents::{AccountingAgent, BlogAgent, RecommendationAgent, ResearchAgent};
    use actai_core::domain::snapshot::StockSnapshot;
    use actai_core::llm::error::BackendError;
    use actai_core::llm::{Backend, TextBackend};
    use actai_core::market::MarketDataProvider;

    struct Placeholders;

    #[async_trait::async_trait]
    impl MarketDataProvider for Placeholders {
        fn provider_name(&self) -> &'static str {
            "placeholders"
        }

        async fn fetch_snapshot(&self, ticker: &str) -> anyhow::Result<StockSnapshot> {
            Ok(StockSnapshot::unavailable(ticker))
        }
    }

    struct Echo;

    #[async_trait::async_trait]
    impl TextBackend for Echo {
        fn backend(&self) -> Backend {
            Backend::Ollama
        }

        fn model(&self) -> &str {
            "echo"
        }

        async fn generate(&self, _prompt: &str) -> Result<String, BackendError> {
            Ok("Buy with high confidence.".to_string())
        }
    }

    fn state() -> AppState {
        let market: Arc<dyn MarketDataProvider> = Arc::new(Placeholders);
        let backend: Arc<dyn TextBackend> = Arc::new(Echo);
        AppState {
            orchestrator: Arc::new(Orchestrator::from_agents(
                ResearchAgent::new(market.clone(), backend.clone()),
                AccountingAgent::new(market.clone(), backend.clone()),
                RecommendationAgent::new(market.clone(), backend.clone()),
                BlogAgent::new(market, backend),
            )),
        }
    }

    #[tokio::test]
    async fn missing_ticker_is_bad_request() {
        let res = analyze(State(state()), Ok(Json(AnalyzeRequest { ticker: None })))
            .await
            .into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn ticker_is_uppercased() {
        let Json(report) = analyze(
            State(state()),
            Ok(Json(AnalyzeRequest {
                ticker: Some("msft".to_string()),
            })),
        )
        .await
        .unwrap();

        assert_eq!(report.ticker, "MSFT");
        assert_eq!(report.status, "success");
        assert!(report.research.success && report.blog.success);
    }

    #[tokio::test]
    async fn blank_ticker_defaults() {
        let Json(report) = analyze(
            State(state()),
            Ok(Json(AnalyzeRequest {
                ticker: Some("  ".to_string()),
            })),
        )
        .await
        .unwrap();
        assert_eq!(report.ticker, "AAPL");
    }

    #[tokio::test]
    async fn identity_and_health_payloads() {
        let Json(info) = home().await;
        assert_eq!(info.status, "success");
        assert_eq!(info.agents.len(), 4);
        assert_eq!(info.message, "ACT-AI Engine is running!");

        let Json(health) = health().await;
        assert_eq!(health["status"], "healthy");
    }

    #[test]
    fn internal_errors_are_500() {
        let res = ApiError::Internal(anyhow::anyhow!("boom")).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
