use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
///
/// Every section may be omitted from `config.toml`; omitted keys take the
/// defaults below. Nothing here is validated yet, see `SimulationConfig`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backtest: BacktestSettings,
    pub data: DataSettings,
    pub logging: LoggingSettings,
}

/// Raw parameters for a single backtest run, as written in the `[backtest]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BacktestSettings {
    /// When trades are placed: "open" or "close".
    pub trade_at: String,
    /// Whether holdings may be fractional. When false, target share counts are floored.
    pub fractional_shares: bool,
    /// First valuation date. Defaults to 52 weeks before today.
    pub start_date: Option<NaiveDate>,
    /// Last valuation date. Unset means "through the latest available price".
    pub end_date: Option<NaiveDate>,
    /// Re-expand the allocation matrix onto every trading session of `calendar`.
    pub reindex_allocation_matrix: bool,
    /// Sampling frequency for the reindexed timeline (e.g. "1D", "W", "M").
    pub reindex_date_freq: String,
    /// Exchange calendar used for reindexing (e.g. "NYSE").
    pub calendar: String,
    /// "percentage" or "dollar". Carried, not yet applied to the simulation.
    pub commission_type: String,
    pub commission_amount: Decimal,
    /// The initial cash balance. Must be at least 1.
    pub starting_portfolio_value: Decimal,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            trade_at: "open".to_string(),
            fractional_shares: false,
            start_date: None,
            end_date: None,
            reindex_allocation_matrix: false,
            reindex_date_freq: "1D".to_string(),
            calendar: "NYSE".to_string(),
            commission_type: "percentage".to_string(),
            commission_amount: Decimal::ZERO,
            starting_portfolio_value: Decimal::from(10_000),
        }
    }
}

impl BacktestSettings {
    /// The configured start date, or 52 weeks before today.
    pub fn start_date_or_default(&self) -> NaiveDate {
        self.start_date
            .unwrap_or_else(|| Utc::now().date_naive() - Duration::weeks(52))
    }
}

/// Parameters for the remote price provider, from the `[data]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// Which bar field prices are reduced to (open, high, low, close, adj_close).
    pub price_field: String,
    /// Lag applied to each symbol's price series, in observations.
    pub price_shift: usize,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self { price_field: "open".to_string(), price_shift: 0 }
    }
}

/// Logging destination and verbosity, from the `[logging]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// A `tracing` filter directive. `RUST_LOG` takes precedence when set.
    pub level: String,
    /// When set, logs are also written to a daily-rolling file in this directory.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "rebal.log".to_string(),
        }
    }
}
