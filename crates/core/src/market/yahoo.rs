use crate::config::Settings;
use crate::domain::snapshot::{Datum, StockSnapshot};
use crate::market::MarketDataProvider;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, COOKIE, SET_COOKIE, USER_AGENT};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::sync::Arc;

const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";
const DEFAULT_COOKIE_URL: &str = "https://fc.yahoo.com";
const SUMMARY_MODULES: &str = "price,summaryDetail,financialData,assetProfile";
const CLIENT_USER_AGENT: &str = "Mozilla/5.0 (compatible; actai/0.1)";

/// Yahoo Finance quoteSummary client. Never fails: any error yields a placeholder snapshot.
///
/// quoteSummary requires a session cookie plus the matching crumb. Both are obtained once and
/// reused until Yahoo answers 401.
#[derive(Debug, Clone)]
pub struct YahooMarketData {
    http: reqwest::Client,
    base_url: Url,
    cookie_url: String,
    session: Arc<tokio::sync::Mutex<Option<Session>>>,
}

#[derive(Debug, Clone)]
struct Session {
    cookie: String,
    crumb: String,
}

impl YahooMarketData {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let raw_base = settings
            .market_data_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(&raw_base)
            .with_context(|| format!("invalid MARKET_DATA_BASE_URL: {raw_base}"))?;
        let cookie_url = settings
            .market_data_cookie_url
            .clone()
            .unwrap_or_else(|| DEFAULT_COOKIE_URL.to_string());

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));

        let http = reqwest::Client::builder()
            .timeout(settings.backend_timeout())
            .default_headers(headers)
            .build()
            .context("failed to build market data http client")?;

        Ok(Self {
            http,
            base_url,
            cookie_url,
            session: Arc::new(tokio::sync::Mutex::new(None)),
        })
    }

    /// Appends percent-encoded path segments to the base URL.
    fn endpoint(&self, parts: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                anyhow::anyhow!("market data base url cannot hold a path: {}", self.base_url)
            })?;
            segments.pop_if_empty().extend(parts);
        }
        Ok(url)
    }

    fn quote_summary_url(&self, ticker: &str) -> Result<Url> {
        self.endpoint(&["v10", "finance", "quoteSummary", ticker])
    }

    async fn session(&self) -> Result<Session> {
        let mut guard = self.session.lock().await;
        if let Some(session) = guard.as_ref() {
            return Ok(session.clone());
        }

        let session = self.handshake().await?;
        *guard = Some(session.clone());
        Ok(session)
    }

    async fn handshake(&self) -> Result<Session> {
        // The cookie endpoint answers with an error status but still sets the cookie.
        let res = self
            .http
            .get(&self.cookie_url)
            .send()
            .await
            .context("market data cookie request failed")?;
        let cookie = res
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .collect::<Vec<_>>()
            .join("; ");
        anyhow::ensure!(!cookie.is_empty(), "market data cookie endpoint set no cookie");

        let res = self
            .http
            .get(self.endpoint(&["v1", "test", "getcrumb"])?)
            .header(COOKIE, &cookie)
            .send()
            .await
            .context("market data crumb request failed")?;
        let status = res.status();
        let crumb = res
            .text()
            .await
            .context("failed to read market data crumb")?
            .trim()
            .to_string();
        anyhow::ensure!(
            status.is_success() && !crumb.is_empty(),
            "market data crumb HTTP {status}: {crumb}"
        );

        tracing::debug!("market data session established");
        Ok(Session { cookie, crumb })
    }

    async fn fetch_once(&self, ticker: &str) -> Result<StockSnapshot> {
        let session = self.session().await?;
        let res = self
            .http
            .get(self.quote_summary_url(ticker)?)
            .header(COOKIE, &session.cookie)
            .query(&[("modules", SUMMARY_MODULES), ("crumb", session.crumb.as_str())])
            .send()
            .await
            .context("market data request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read market data response")?;
        if status == StatusCode::UNAUTHORIZED {
            // Stale crumb; the next fetch performs a fresh handshake.
            *self.session.lock().await = None;
        }
        if !status.is_success() {
            anyhow::bail!("market data HTTP {status}: {text}");
        }

        let parsed = serde_json::from_str::<QuoteSummaryEnvelope>(&text)
            .with_context(|| format!("market data response is not a quoteSummary: {text}"))?;
        snapshot_from_summary(ticker, parsed)
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for YahooMarketData {
    fn provider_name(&self) -> &'static str {
        "yahoo_finance"
    }

    async fn fetch_snapshot(&self, ticker: &str) -> Result<StockSnapshot> {
        match self.fetch_once(ticker).await {
            Ok(snapshot) => Ok(snapshot),
            Err(err) => {
                tracing::warn!(%ticker, error = %err, "market data fetch failed; using placeholders");
                Ok(StockSnapshot::unavailable(ticker))
            }
        }
    }
}

fn snapshot_from_summary(ticker: &str, envelope: QuoteSummaryEnvelope) -> Result<StockSnapshot> {
    let summary = envelope
        .quote_summary
        .result
        .and_then(|results| results.into_iter().next())
        .with_context(|| {
            let detail = envelope
                .quote_summary
                .error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "empty result".to_string());
            format!("no quoteSummary result for {ticker}: {detail}")
        })?;

    let price = summary.price.unwrap_or_default();
    let detail = summary.summary_detail.unwrap_or_default();
    let financial = summary.financial_data.unwrap_or_default();
    let profile = summary.asset_profile.unwrap_or_default();

    let current_price = financial
        .current_price
        .and_then(|v| v.raw)
        .or_else(|| price.regular_market_price.and_then(|v| v.raw));

    Ok(StockSnapshot {
        current_price: current_price.into(),
        pe_ratio: detail.trailing_pe.and_then(|v| v.raw).into(),
        market_cap: price.market_cap.and_then(|v| v.raw).into(),
        company_name: price
            .long_name
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| ticker.to_string()),
        sector: non_blank(profile.sector),
        industry: non_blank(profile.industry),
    })
}

fn non_blank(value: Option<String>) -> Datum<String> {
    value.filter(|s| !s.trim().is_empty()).into()
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
struct QuoteSummary {
    #[serde(default)]
    result: Option<Vec<SummaryModules>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryModules {
    #[serde(default)]
    price: Option<PriceModule>,
    #[serde(default)]
    summary_detail: Option<SummaryDetailModule>,
    #[serde(default)]
    financial_data: Option<FinancialDataModule>,
    #[serde(default)]
    asset_profile: Option<AssetProfileModule>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    #[serde(default)]
    regular_market_price: Option<RawNumber>,
    #[serde(default)]
    market_cap: Option<RawNumber>,
    #[serde(default)]
    long_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SummaryDetailModule {
    #[serde(default, rename = "trailingPE")]
    trailing_pe: Option<RawNumber>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinancialDataModule {
    #[serde(default)]
    current_price: Option<RawNumber>,
}

#[derive(Debug, Default, Deserialize)]
struct AssetProfileModule {
    #[serde(default)]
    sector: Option<String>,
    #[serde(default)]
    industry: Option<String>,
}

/// Yahoo wraps numbers as `{"raw": 1.0, "fmt": "1.00"}` and uses `{}` when a value is missing.
#[derive(Debug, Default, Deserialize)]
struct RawNumber {
    #[serde(default)]
    raw: Option<f64>,
}
