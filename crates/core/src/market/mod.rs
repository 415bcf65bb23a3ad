pub mod yahoo;

use crate::domain::snapshot::StockSnapshot;

pub use yahoo::YahooMarketData;

#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Fetch the snapshot for `ticker`. Implementations backed by a live source should degrade
    /// to [`StockSnapshot::unavailable`] instead of returning `Err`.
    async fn fetch_snapshot(&self, ticker: &str) -> anyhow::Result<StockSnapshot>;
}
