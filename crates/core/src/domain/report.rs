use crate::domain::snapshot::StockSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const REPORT_STATUS_SUCCESS: &str = "success";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Decision::Buy => "BUY",
            Decision::Sell => "SELL",
            Decision::Hold => "HOLD",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Confidence::High => "High",
            Confidence::Medium => "Medium",
            Confidence::Low => "Low",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub recommendation: Decision,
    pub confidence: Confidence,
    pub reason: String,
    pub analysis: String,
}

/// Role-specific fields, flattened next to `raw_data` in the JSON output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AgentPayload {
    Research {
        research_report: String,
    },
    Accounting {
        financial_analysis: String,
    },
    Recommendation(RecommendationResult),
    Blog {
        blog_post: String,
        formatted_date: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentOutput {
    #[serde(flatten)]
    pub payload: AgentPayload,
    pub raw_data: StockSnapshot,
    #[serde(alias = "llm_used")]
    pub backend_used: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AgentOutcome {
    Completed(AgentOutput),
    Failed { error: String },
}

/// Outcome of a single agent run. `success` mirrors whether `outcome` is `Completed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    pub success: bool,
    pub ticker: String,
    #[serde(flatten)]
    pub outcome: AgentOutcome,
}

impl AgentResult {
    pub fn completed(
        ticker: impl Into<String>,
        payload: AgentPayload,
        raw_data: StockSnapshot,
        backend_used: impl Into<String>,
    ) -> Self {
        Self {
            success: true,
            ticker: ticker.into(),
            outcome: AgentOutcome::Completed(AgentOutput {
                payload,
                raw_data,
                backend_used: backend_used.into(),
            }),
        }
    }

    pub fn failed(ticker: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            success: false,
            ticker: ticker.into(),
            outcome: AgentOutcome::Failed {
                error: error.to_string(),
            },
        }
    }

    pub fn output(&self) -> Option<&AgentOutput> {
        match &self.outcome {
            AgentOutcome::Completed(output) => Some(output),
            AgentOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            AgentOutcome::Completed(_) => None,
            AgentOutcome::Failed { error } => Some(error),
        }
    }

    pub fn recommendation(&self) -> Option<&RecommendationResult> {
        match self.output().map(|o| &o.payload) {
            Some(AgentPayload::Recommendation(rec)) => Some(rec),
            _ => None,
        }
    }

    /// The `reason` field, present only on a completed recommendation.
    pub fn reason(&self) -> Option<&str> {
        self.recommendation().map(|rec| rec.reason.as_str())
    }

    /// Main generated text of the payload, whatever the role.
    pub fn text(&self) -> Option<&str> {
        match &self.output()?.payload {
            AgentPayload::Research { research_report } => Some(research_report),
            AgentPayload::Accounting { financial_analysis } => Some(financial_analysis),
            AgentPayload::Recommendation(rec) => Some(&rec.analysis),
            AgentPayload::Blog { blog_post, .. } => Some(blog_post),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeReport {
    pub ticker: String,
    pub research: AgentResult,
    pub accounting: AgentResult,
    pub recommendation: AgentResult,
    pub blog: AgentResult,
    pub status: String,
}

impl CompositeReport {
    pub fn new(
        ticker: impl Into<String>,
        research: AgentResult,
        accounting: AgentResult,
        recommendation: AgentResult,
        blog: AgentResult,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            research,
            accounting,
            recommendation,
            blog,
            status: REPORT_STATUS_SUCCESS.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::snapshot::Datum;
    use serde_json::json;

    fn snapshot() -> StockSnapshot {
        StockSnapshot {
            current_price: Datum::Known(189.5),
            pe_ratio: Datum::Known(29.1),
            market_cap: Datum::Unavailable,
            company_name: "Apple Inc.".to_string(),
            sector: Datum::Known("Technology".to_string()),
            industry: Datum::Unavailable,
        }
    }

    fn sample_report() -> CompositeReport {
        CompositeReport::new(
            "AAPL",
            AgentResult::completed(
                "AAPL",
                AgentPayload::Research {
                    research_report: "# Apple\n\nSolid.".to_string(),
                },
                snapshot(),
                "OpenAI gpt-4",
            ),
            AgentResult::failed("AAPL", "market data unavailable"),
            AgentResult::completed(
                "AAPL",
                AgentPayload::Recommendation(RecommendationResult {
                    recommendation: Decision::Sell,
                    confidence: Confidence::High,
                    reason: "overvalued".to_string(),
                    analysis: "overvalued".to_string(),
                }),
                StockSnapshot::unavailable("AAPL"),
                "Ollama mistral",
            ),
            AgentResult::completed(
                "AAPL",
                AgentPayload::Blog {
                    blog_post: "# AAPL".to_string(),
                    formatted_date: "2026-10-19".to_string(),
                },
                snapshot(),
                "Ollama llama3",
            ),
        )
    }

    #[test]
    fn composite_report_round_trips_through_json() {
        let report = sample_report();
        let text = serde_json::to_string(&report).unwrap();
        let back: CompositeReport = serde_json::from_str(&text).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn completed_result_flattens_payload_fields() {
        let report = sample_report();
        let v = serde_json::to_value(&report.recommendation).unwrap();
        assert_eq!(v["success"], json!(true));
        assert_eq!(v["recommendation"], json!("SELL"));
        assert_eq!(v["confidence"], json!("High"));
        assert_eq!(v["backend_used"], json!("Ollama mistral"));
        assert_eq!(v["raw_data"]["company_name"], json!("AAPL"));
    }

    #[test]
    fn failed_result_has_only_error_fields() {
        let v = serde_json::to_value(AgentResult::failed("TSLA", "boom")).unwrap();
        assert_eq!(v, json!({"success": false, "ticker": "TSLA", "error": "boom"}));
    }

    #[test]
    fn accepts_legacy_llm_used_key() {
        let v = json!({
            "success": true,
            "ticker": "MSFT",
            "financial_analysis": "ratios",
            "raw_data": StockSnapshot::unavailable("MSFT"),
            "llm_used": "Groq Mixtral",
        });
        let parsed: AgentResult = serde_json::from_value(v).unwrap();
        assert_eq!(parsed.output().unwrap().backend_used, "Groq Mixtral");
        assert_eq!(parsed.text(), Some("ratios"));
    }

    #[test]
    fn reason_only_exists_on_recommendations() {
        let report = sample_report();
        assert_eq!(report.recommendation.reason(), Some("overvalued"));
        assert_eq!(report.research.reason(), None);
        assert_eq!(report.accounting.reason(), None);
        assert_eq!(report.accounting.error(), Some("market data unavailable"));
    }
}
