use crate::agents::{generate_or_fallback, into_result, Role};
use crate::domain::report::{AgentPayload, AgentResult};
use crate::domain::snapshot::StockSnapshot;
use crate::llm::TextBackend;
use crate::market::MarketDataProvider;
use std::sync::Arc;

#[derive(Clone)]
pub struct AccountingAgent {
    market: Arc<dyn MarketDataProvider>,
    backend: Arc<dyn TextBackend>,
}

impl AccountingAgent {
    pub fn new(market: Arc<dyn MarketDataProvider>, backend: Arc<dyn TextBackend>) -> Self {
        Self { market, backend }
    }

    pub async fn run(&self, ticker: &str) -> AgentResult {
        into_result(Role::Accounting, ticker, self.try_run(ticker).await)
    }

    async fn try_run(&self, ticker: &str) -> anyhow::Result<AgentResult> {
        let snapshot = self.market.fetch_snapshot(ticker).await?;
        let prompt = render_prompt(ticker, &snapshot);
        let generated =
            generate_or_fallback(self.backend.as_ref(), Role::Accounting, ticker, &prompt).await;

        Ok(AgentResult::completed(
            ticker,
            AgentPayload::Accounting {
                financial_analysis: generated.text,
            },
            snapshot,
            self.backend.label(),
        ))
    }
}

pub fn render_prompt(ticker: &str, s: &StockSnapshot) -> String {
    [
        format!(
            "Analyze financial ratios and valuation for {ticker} ({}).",
            s.company_name
        ),
        String::new(),
        "Financial Data:".to_string(),
        format!("- Current Price: ${}", s.current_price),
        format!("- P/E Ratio: {}", s.pe_ratio),
        format!("- Market Cap: ${}", s.market_cap_display()),
        format!("- Sector: {}", s.sector),
        format!("- Industry: {}", s.industry),
        String::new(),
        "Provide comprehensive financial analysis covering:".to_string(),
        "1. Valuation assessment (P/E, P/S, P/B ratios)".to_string(),
        "2. Profitability metrics and trends".to_string(),
        "3. Liquidity and solvency ratios".to_string(),
        "4. Comparison with industry peers".to_string(),
        "5. Financial health score (1-10)".to_string(),
        String::new(),
        "Return structured financial analysis in markdown format.".to_string(),
    ]
    .join("\n")
}
