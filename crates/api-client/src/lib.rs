use crate::error::ApiError;
use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};
use configuration::DataConfig;
use core_types::{DailyBar, PriceProvider, PriceSeries, ProviderError};
use futures::future::join_all;
use std::collections::HashMap;

pub mod error;
pub mod responses;

// --- Public API ---
pub use responses::{ChartErrorResponse, ChartResponse};

const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";
// The chart endpoint rejects requests without a browser-like user agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) rebal/0.1";

/// A `PriceProvider` backed by the Yahoo Finance chart API.
///
/// Downloads daily OHLCV bars for every requested symbol concurrently and
/// reduces them to the configured price field and shift.
#[derive(Clone)]
pub struct YahooClient {
    client: reqwest::Client,
    base_url: String,
    data: DataConfig,
}

impl YahooClient {
    pub fn new(data: DataConfig) -> Result<Self, ApiError> {
        Self::with_base_url(data, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(data: DataConfig, base_url: impl Into<String>) -> Result<Self, ApiError> {
        Ok(Self {
            client: reqwest::Client::builder().user_agent(USER_AGENT).build()?,
            base_url: base_url.into(),
            data,
        })
    }

    /// Fetches daily bars for one symbol over `[start, end]`.
    pub async fn fetch_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, ApiError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        let period1 = midnight_timestamp(start)?;
        // period2 is exclusive.
        let period2 = midnight_timestamp(end.checked_add_days(Days::new(1)).unwrap_or(end))?;

        tracing::debug!(symbol, %start, %end, "Requesting daily bars");
        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "div|split".to_string()),
                ("includeAdjustedClose", "true".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        let parsed: Result<ChartResponse, _> = serde_json::from_str(&text);
        match parsed {
            // Error bodies carry a structured description even on 4xx.
            Ok(chart) if status.is_success() || chart.chart.error.is_some() => chart.into_bars(symbol),
            Ok(_) => Err(ApiError::Status(status.as_u16(), text)),
            Err(e) if status.is_success() => Err(ApiError::Deserialization(e.to_string())),
            Err(_) => Err(ApiError::Status(status.as_u16(), text)),
        }
    }
}

fn midnight_timestamp(date: NaiveDate) -> Result<i64, ApiError> {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .ok_or_else(|| ApiError::InvalidData(format!("invalid date {}", date)))
}

#[async_trait]
impl PriceProvider for YahooClient {
    async fn fetch(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: Option<NaiveDate>,
    ) -> Result<PriceSeries, ProviderError> {
        let end = end.unwrap_or_else(|| Utc::now().date_naive());
        tracing::info!(count = symbols.len(), %start, %end, "Downloading price data");

        let results = join_all(symbols.iter().map(|symbol| self.fetch_bars(symbol, start, end))).await;

        let mut bars = HashMap::with_capacity(symbols.len());
        for (symbol, result) in symbols.iter().zip(results) {
            let symbol_bars = result?;
            if symbol_bars.is_empty() {
                return Err(ProviderError::NoData(symbol.clone()));
            }
            bars.insert(symbol.clone(), symbol_bars);
        }

        let series = PriceSeries::from_bars(symbols, &bars, self.data.price_field, self.data.price_shift)?;
        tracing::info!(rows = series.len(), "Price data ready");
        Ok(series)
    }
}
