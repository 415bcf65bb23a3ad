/// Canned text substituted when a role's backend call fails. No I/O.
pub fn fallback_text(ticker: &str, analysis_type: &str) -> String {
    match analysis_type {
        "research" => format!("Basic research analysis for {ticker}. LLM integration required."),
        "accounting" => format!("Financial ratios for {ticker}. Enable AI for detailed analysis."),
        "recommendation" => "HOLD - Enable AI for personalized recommendations".to_string(),
        "blog" => format!("# {ticker} Analysis\n\nAI-powered analysis coming soon."),
        _ => "Analysis unavailable".to_string(),
    }
}
