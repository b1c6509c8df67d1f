use crate::error::ProviderError;
use crate::prices::PriceSeries;
use async_trait::async_trait;
use chrono::NaiveDate;

/// The capability the simulator consumes to obtain prices: "given symbols and
/// a date range, return a price table".
///
/// Implementations must fail loudly on network or authentication problems.
/// Callers do not retry.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Fetches one resolved price per symbol per date in `[start, end]`.
    /// An open `end` means "through the latest available data".
    async fn fetch(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: Option<NaiveDate>,
    ) -> Result<PriceSeries, ProviderError>;
}
