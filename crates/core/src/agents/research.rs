use crate::agents::{generate_or_fallback, into_result, Role};
use crate::domain::report::{AgentPayload, AgentResult};
use crate::domain::snapshot::StockSnapshot;
use crate::llm::TextBackend;
use crate::market::MarketDataProvider;
use std::sync::Arc;

/// Company research report, generated by the hosted general-purpose model.
#[derive(Clone)]
pub struct ResearchAgent {
    market: Arc<dyn MarketDataProvider>,
    backend: Arc<dyn TextBackend>,
}

impl ResearchAgent {
    pub fn new(market: Arc<dyn MarketDataProvider>, backend: Arc<dyn TextBackend>) -> Self {
        Self { market, backend }
    }

    pub async fn run(&self, ticker: &str) -> AgentResult {
        into_result(Role::Research, ticker, self.try_run(ticker).await)
    }

    async fn try_run(&self, ticker: &str) -> anyhow::Result<AgentResult> {
        let snapshot = self.market.fetch_snapshot(ticker).await?;
        let prompt = render_prompt(ticker, &snapshot);
        let generated =
            generate_or_fallback(self.backend.as_ref(), Role::Research, ticker, &prompt).await;

        Ok(AgentResult::completed(
            ticker,
            AgentPayload::Research {
                research_report: generated.text,
            },
            snapshot,
            self.backend.label(),
        ))
    }
}

pub fn render_prompt(ticker: &str, s: &StockSnapshot) -> String {
    [
        format!(
            "Conduct comprehensive research on {ticker} ({}).",
            s.company_name
        ),
        String::new(),
        "Company Data:".to_string(),
        format!("- Current Price: ${}", s.current_price),
        format!("- P/E Ratio: {}", s.pe_ratio),
        format!("- Market Cap: ${}", s.market_cap_display()),
        format!("- Sector: {}", s.sector),
        format!("- Industry: {}", s.industry),
        String::new(),
        "Provide detailed analysis covering:".to_string(),
        "1. Company overview and business model".to_string(),
        "2. Recent financial performance and trends".to_string(),
        "3. Competitive position in the industry".to_string(),
        "4. Growth prospects and potential risks".to_string(),
        "5. Analyst sentiment and market outlook".to_string(),
        String::new(),
        "Return a well-structured research report in markdown format.".to_string(),
    ]
    .join("\n")
}
