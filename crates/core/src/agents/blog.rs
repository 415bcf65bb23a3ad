use crate::agents::{generate_or_fallback, into_result, Role};
use crate::domain::report::{AgentPayload, AgentResult};
use crate::domain::snapshot::StockSnapshot;
use crate::llm::TextBackend;
use crate::market::MarketDataProvider;
use std::sync::Arc;

pub const NO_ADDITIONAL_ANALYSIS: &str = "No additional analysis";

/// Investor blog post. Optionally builds on the recommendation agent's reasoning.
#[derive(Clone)]
pub struct BlogAgent {
    market: Arc<dyn MarketDataProvider>,
    backend: Arc<dyn TextBackend>,
}

impl BlogAgent {
    pub fn new(market: Arc<dyn MarketDataProvider>, backend: Arc<dyn TextBackend>) -> Self {
        Self { market, backend }
    }

    pub async fn run(&self, ticker: &str, prior: Option<&AgentResult>) -> AgentResult {
        into_result(Role::Blog, ticker, self.try_run(ticker, prior).await)
    }

    async fn try_run(&self, ticker: &str, prior: Option<&AgentResult>) -> anyhow::Result<AgentResult> {
        let snapshot = self.market.fetch_snapshot(ticker).await?;
        let additional = prior
            .and_then(AgentResult::reason)
            .unwrap_or(NO_ADDITIONAL_ANALYSIS);
        let prompt = render_prompt(ticker, &snapshot, additional);
        let generated =
            generate_or_fallback(self.backend.as_ref(), Role::Blog, ticker, &prompt).await;

        Ok(AgentResult::completed(
            ticker,
            AgentPayload::Blog {
                blog_post: generated.text,
                formatted_date: chrono::Local::now().format("%Y-%m-%d").to_string(),
            },
            snapshot,
            self.backend.label(),
        ))
    }
}

pub fn render_prompt(ticker: &str, s: &StockSnapshot, additional_analysis: &str) -> String {
    [
        format!(
            "Create a professional investment blog post about {ticker} ({}).",
            s.company_name
        ),
        String::new(),
        "Stock Data:".to_string(),
        format!("- Price: ${}", s.current_price),
        format!("- P/E: {}", s.pe_ratio),
        format!("- Market Cap: ${}", s.market_cap_display()),
        format!("- Sector: {}", s.sector),
        format!("- Industry: {}", s.industry),
        String::new(),
        format!("Additional Analysis: {additional_analysis}"),
        String::new(),
        "Create a comprehensive blog post including:".to_string(),
        "1. Engaging title and introduction".to_string(),
        "2. Company overview and business model".to_string(),
        "3. Financial analysis and valuation".to_string(),
        "4. Investment thesis and recommendation".to_string(),
        "5. Risk factors and considerations".to_string(),
        "6. Conclusion and future outlook".to_string(),
        String::new(),
        "Write in professional, engaging tone for investors. Use markdown formatting with headers, bullet points, and clear sections.".to_string(),
    ]
    .join("\n")
}
