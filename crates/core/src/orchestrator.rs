use crate::agents::{AccountingAgent, BlogAgent, RecommendationAgent, ResearchAgent, Role};
use crate::config::Settings;
use crate::domain::report::{AgentResult, CompositeReport};
use crate::llm::BackendClients;
use crate::market::{MarketDataProvider, YahooMarketData};
use std::sync::Arc;
use tokio::task::JoinError;

pub const DEFAULT_TICKER: &str = "AAPL";

/// Trim and uppercase a requested ticker, defaulting when it is absent or blank.
pub fn normalize_ticker(raw: Option<&str>) -> String {
    match raw.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) => t.to_uppercase(),
        None => DEFAULT_TICKER.to_string(),
    }
}

/// Runs the four agents for one ticker and merges their results.
///
/// Research, accounting and recommendation run as independent tasks; the blog agent
/// waits for the recommendation and builds on its reasoning.
#[derive(Clone)]
pub struct Orchestrator {
    research: ResearchAgent,
    accounting: AccountingAgent,
    recommendation: RecommendationAgent,
    blog: BlogAgent,
}

impl Orchestrator {
    pub fn new(market: Arc<dyn MarketDataProvider>, backends: BackendClients) -> Self {
        Self {
            research: ResearchAgent::new(market.clone(), backends.research),
            accounting: AccountingAgent::new(market.clone(), backends.accounting),
            recommendation: RecommendationAgent::new(market.clone(), backends.recommendation),
            blog: BlogAgent::new(market, backends.blog),
        }
    }

    pub fn from_agents(
        research: ResearchAgent,
        accounting: AccountingAgent,
        recommendation: RecommendationAgent,
        blog: BlogAgent,
    ) -> Self {
        Self {
            research,
            accounting,
            recommendation,
            blog,
        }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let market = YahooMarketData::from_settings(settings)?;
        tracing::info!(provider = market.provider_name(), "market data provider ready");
        let backends = BackendClients::from_settings(settings)?;
        tracing::info!(?backends, "model backends ready");
        Ok(Self::new(Arc::new(market), backends))
    }

    pub async fn analyze(&self, ticker: &str) -> CompositeReport {
        let ticker = normalize_ticker(Some(ticker));
        tracing::info!(%ticker, "analysis started");

        let research_task = tokio::spawn({
            let agent = self.research.clone();
            let ticker = ticker.clone();
            async move { agent.run(&ticker).await }
        });
        let accounting_task = tokio::spawn({
            let agent = self.accounting.clone();
            let ticker = ticker.clone();
            async move { agent.run(&ticker).await }
        });
        let recommendation_task = tokio::spawn({
            let agent = self.recommendation.clone();
            let ticker = ticker.clone();
            async move { agent.run(&ticker).await }
        });

        let recommendation = joined(Role::Recommendation, &ticker, recommendation_task.await);
        let blog_task = tokio::spawn({
            let agent = self.blog.clone();
            let ticker = ticker.clone();
            let prior = recommendation.clone();
            async move { agent.run(&ticker, Some(&prior)).await }
        });

        let blog = joined(Role::Blog, &ticker, blog_task.await);
        let research = joined(Role::Research, &ticker, research_task.await);
        let accounting = joined(Role::Accounting, &ticker, accounting_task.await);

        tracing::info!(
            %ticker,
            research = research.success,
            accounting = accounting.success,
            recommendation = recommendation.success,
            blog = blog.success,
            "analysis finished"
        );

        CompositeReport::new(ticker, research, accounting, recommendation, blog)
    }
}

fn joined(role: Role, ticker: &str, res: Result<AgentResult, JoinError>) -> AgentResult {
    res.unwrap_or_else(|err| {
        tracing::error!(%ticker, %role, error = %err, "agent task aborted");
        AgentResult::failed(ticker, format!("{role} agent task failed: {err}"))
    })
}
