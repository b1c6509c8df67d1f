use crate::error::ApiError;
use chrono::DateTime;
use core_types::DailyBar;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;

// Yahoo's chart endpoint returns parallel arrays: one timestamp array and one
// array per OHLCV field. Individual entries are null on halted sessions.

/// The envelope of a `GET /v8/finance/chart/{symbol}` response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartResponse {
    pub chart: Chart,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chart {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ChartErrorResponse>,
}

/// Represents an error body from the chart API.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartErrorResponse {
    pub code: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartResult {
    pub meta: ChartMeta,
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: Indicators,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub symbol: String,
    pub currency: Option<String>,
    /// Offset of the exchange's local time from UTC, in seconds.
    #[serde(default)]
    pub gmtoffset: i64,
    pub exchange_timezone_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Indicators {
    pub quote: Vec<Quote>,
    #[serde(default)]
    pub adjclose: Vec<AdjClose>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Quote {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdjClose {
    #[serde(default)]
    pub adjclose: Vec<Option<f64>>,
}

fn decimal_at(values: &[Option<f64>], i: usize) -> Option<Decimal> {
    values.get(i).copied().flatten().and_then(Decimal::from_f64)
}

impl ChartResponse {
    /// Converts the parallel arrays into daily bars keyed by exchange-local date.
    ///
    /// Entries with any missing OHLC value are dropped. When the same date
    /// appears twice (a live bar for the current session), the later entry wins.
    pub fn into_bars(self, symbol: &str) -> Result<Vec<DailyBar>, ApiError> {
        if let Some(error) = self.chart.error {
            return Err(ApiError::Chart {
                symbol: symbol.to_string(),
                code: error.code,
                description: error.description,
            });
        }
        let result = self
            .chart
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| ApiError::InvalidData(format!("empty chart result for {}", symbol)))?;

        let Some(quote) = result.indicators.quote.first() else {
            return Ok(Vec::new());
        };
        let adjclose = result
            .indicators
            .adjclose
            .first()
            .map(|a| a.adjclose.as_slice())
            .unwrap_or(&[]);

        let mut bars = BTreeMap::new();
        for (i, &ts) in result.timestamp.iter().enumerate() {
            let date = DateTime::from_timestamp(ts + result.meta.gmtoffset, 0)
                .ok_or_else(|| ApiError::InvalidData(format!("invalid timestamp {}", ts)))?
                .date_naive();

            let (Some(open), Some(high), Some(low), Some(close)) = (
                decimal_at(&quote.open, i),
                decimal_at(&quote.high, i),
                decimal_at(&quote.low, i),
                decimal_at(&quote.close, i),
            ) else {
                tracing::debug!(symbol, %date, "Skipping bar with missing OHLC values");
                continue;
            };

            bars.insert(
                date,
                DailyBar {
                    date,
                    open,
                    high,
                    low,
                    close,
                    adj_close: decimal_at(adjclose, i),
                    volume: decimal_at(&quote.volume, i).unwrap_or(Decimal::ZERO),
                },
            );
        }

        Ok(bars.into_values().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SAMPLE: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"symbol": "SPY", "currency": "USD", "gmtoffset": -18000, "exchangeTimezoneName": "America/New_York"},
                "timestamp": [1704205800, 1704292200, 1704378600],
                "indicators": {
                    "quote": [{
                        "open":   [472.16, 470.43, null],
                        "high":   [473.67, 471.19, 470.96],
                        "low":    [470.49, 468.17, 467.05],
                        "close":  [472.65, 468.79, 467.28],
                        "volume": [123623700, 103585900, 91970900]
                    }],
                    "adjclose": [{"adjclose": [466.10, 462.30, 460.81]}]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn parses_bars_in_exchange_local_dates() {
        let response: ChartResponse = serde_json::from_str(SAMPLE).unwrap();
        let bars = response.into_bars("SPY").unwrap();

        // The third entry has a null open and is dropped.
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(bars[1].date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(bars[0].open, Decimal::from_f64(472.16).unwrap());
        assert_eq!(bars[1].adj_close, Decimal::from_f64(462.30));
    }

    #[test]
    fn api_error_body_is_surfaced() {
        let body = r#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}}"#;
        let response: ChartResponse = serde_json::from_str(body).unwrap();
        let err = response.into_bars("NOPE").unwrap_err();
        assert!(matches!(err, ApiError::Chart { ref code, .. } if code == "Not Found"));
    }
}
