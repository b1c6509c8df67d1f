use crate::settings::BacktestSettings;
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Command-line overrides for the `[backtest]` section.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct BacktestOverrides {
    /// First valuation date (format: YYYY-MM-DD).
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Last valuation date (format: YYYY-MM-DD).
    #[arg(long)]
    pub end_date: Option<NaiveDate>,

    /// Allow fractional share holdings. `--fractional-shares=false` turns it off.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub fractional_shares: Option<bool>,

    /// Re-expand the allocation matrix onto every trading session.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub reindex: Option<bool>,

    /// Sampling frequency for the reindexed timeline (e.g. "1D", "W", "M").
    #[arg(long)]
    pub freq: Option<String>,

    /// Initial cash balance.
    #[arg(long)]
    pub starting_value: Option<Decimal>,
}

impl BacktestOverrides {
    /// Applies every override that was given on the command line.
    pub fn apply(&self, settings: &mut BacktestSettings) {
        if self.start_date.is_some() {
            settings.start_date = self.start_date;
        }
        if self.end_date.is_some() {
            settings.end_date = self.end_date;
        }
        if let Some(fractional) = self.fractional_shares {
            settings.fractional_shares = fractional;
        }
        if let Some(reindex) = self.reindex {
            settings.reindex_allocation_matrix = reindex;
        }
        if let Some(freq) = &self.freq {
            settings.reindex_date_freq = freq.clone();
        }
        if let Some(value) = self.starting_value {
            settings.starting_portfolio_value = value;
        }
    }
}
