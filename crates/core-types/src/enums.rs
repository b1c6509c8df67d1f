use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Which price of the session a rebalance is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAt {
    Open,
    Close,
}

impl FromStr for TradeAt {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(TradeAt::Open),
            "close" => Ok(TradeAt::Close),
            other => Err(CoreError::InvalidInput(
                "trade_at".to_string(),
                format!("expected one of ['open', 'close'], got '{}'", other),
            )),
        }
    }
}

impl fmt::Display for TradeAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAt::Open => write!(f, "open"),
            TradeAt::Close => write!(f, "close"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommissionType {
    Percentage,
    Dollar,
}

impl FromStr for CommissionType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "percentage" => Ok(CommissionType::Percentage),
            "dollar" => Ok(CommissionType::Dollar),
            other => Err(CoreError::InvalidInput(
                "commission_type".to_string(),
                format!("expected one of ['percentage', 'dollar'], got '{}'", other),
            )),
        }
    }
}

/// The bar field a provider reduces its OHLCV data to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
    AdjClose,
}

impl FromStr for PriceField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "open" => Ok(PriceField::Open),
            "high" => Ok(PriceField::High),
            "low" => Ok(PriceField::Low),
            "close" => Ok(PriceField::Close),
            "adj_close" | "adjclose" => Ok(PriceField::AdjClose),
            other => Err(CoreError::InvalidInput(
                "price_field".to_string(),
                format!("unknown price field '{}'", other),
            )),
        }
    }
}

/// Sampling frequency used when the allocation matrix is reindexed onto the
/// exchange calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    /// Every open session.
    Daily,
    /// The last open session of each ISO week.
    Weekly,
    /// The last open session of each calendar month.
    Monthly,
}

impl FromStr for Frequency {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "D" | "1D" | "B" | "1B" | "DAILY" => Ok(Frequency::Daily),
            "W" | "1W" | "WEEKLY" => Ok(Frequency::Weekly),
            "M" | "1M" | "ME" | "MONTHLY" => Ok(Frequency::Monthly),
            other => Err(CoreError::InvalidInput(
                "reindex_date_freq".to_string(),
                format!("unsupported frequency token '{}'", other),
            )),
        }
    }
}

/// The exchange calendar governing which dates are trading sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Exchange {
    Nyse,
    /// Every Monday to Friday, no holidays.
    Weekday,
}

impl FromStr for Exchange {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NYSE" | "XNYS" | "NASDAQ" => Ok(Exchange::Nyse),
            "WEEKDAY" | "WEEKDAYS" | "24/5" => Ok(Exchange::Weekday),
            other => Err(CoreError::InvalidInput(
                "calendar".to_string(),
                format!("unknown exchange calendar '{}'", other),
            )),
        }
    }
}
