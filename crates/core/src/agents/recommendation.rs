use crate::agents::{generate_or_fallback, into_result, Role};
use crate::domain::report::{AgentPayload, AgentResult, Confidence, Decision, RecommendationResult};
use crate::domain::snapshot::StockSnapshot;
use crate::llm::TextBackend;
use crate::market::MarketDataProvider;
use std::sync::Arc;

/// `reason` reported when the model was unreachable and the canned text was used.
pub const FALLBACK_REASON: &str = "LLM analysis required";

#[derive(Clone)]
pub struct RecommendationAgent {
    market: Arc<dyn MarketDataProvider>,
    backend: Arc<dyn TextBackend>,
}

impl RecommendationAgent {
    pub fn new(market: Arc<dyn MarketDataProvider>, backend: Arc<dyn TextBackend>) -> Self {
        Self { market, backend }
    }

    pub async fn run(&self, ticker: &str) -> AgentResult {
        into_result(Role::Recommendation, ticker, self.try_run(ticker).await)
    }

    async fn try_run(&self, ticker: &str) -> anyhow::Result<AgentResult> {
        let snapshot = self.market.fetch_snapshot(ticker).await?;
        let prompt = render_prompt(ticker, &snapshot);
        let generated =
            generate_or_fallback(self.backend.as_ref(), Role::Recommendation, ticker, &prompt)
                .await;

        let reason = if generated.fell_back {
            FALLBACK_REASON.to_string()
        } else {
            generated.text.clone()
        };
        let result = RecommendationResult {
            recommendation: parse_decision(&generated.text),
            confidence: parse_confidence(&generated.text),
            reason,
            analysis: generated.text,
        };

        tracing::info!(
            %ticker,
            recommendation = %result.recommendation,
            confidence = %result.confidence,
            fell_back = generated.fell_back,
            "recommendation parsed"
        );

        Ok(AgentResult::completed(
            ticker,
            AgentPayload::Recommendation(result),
            snapshot,
            self.backend.label(),
        ))
    }
}

/// Keyword heuristic over free text: "buy" wins over "sell", default HOLD.
/// Negations such as "do not buy" are not understood.
pub fn parse_decision(text: &str) -> Decision {
    let lower = text.to_lowercase();
    if lower.contains("buy") {
        Decision::Buy
    } else if lower.contains("sell") {
        Decision::Sell
    } else {
        Decision::Hold
    }
}

pub fn parse_confidence(text: &str) -> Confidence {
    let lower = text.to_lowercase();
    if lower.contains("high confidence") {
        Confidence::High
    } else if lower.contains("medium confidence") {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

pub fn render_prompt(ticker: &str, s: &StockSnapshot) -> String {
    [
        format!(
            "Provide investment recommendation for {ticker} ({}).",
            s.company_name
        ),
        String::new(),
        "Key Data:".to_string(),
        format!("- Price: ${}", s.current_price),
        format!("- P/E: {}", s.pe_ratio),
        format!("- Market Cap: ${}", s.market_cap_display()),
        format!("- Sector: {}", s.sector),
        format!("- Industry: {}", s.industry),
        String::new(),
        "Analyze and provide:".to_string(),
        "1. BUY/SELL/HOLD recommendation".to_string(),
        "2. Confidence level (High/Medium/Low)".to_string(),
        "3. Detailed reasoning".to_string(),
        "4. Risk assessment".to_string(),
        "5. Time horizon (Short/Medium/Long-term)".to_string(),
        "6. Price target if possible".to_string(),
        String::new(),
        "Return in structured format.".to_string(),
    ]
    .join("\n")
}
