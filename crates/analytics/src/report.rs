use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Summary statistics of one backtest run.
///
/// Derived from the value and transaction histories only; building it never
/// touches the histories themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    // I. Span
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub valuation_days: usize,

    // II. Profitability
    pub starting_value: Decimal,
    pub final_value: Decimal,
    pub total_net_profit: Decimal,
    pub total_return_pct: Decimal,

    // III. Risk and Drawdown
    pub max_drawdown: Decimal,
    pub max_drawdown_pct: Decimal,
    pub sharpe_ratio: Option<Decimal>, // Option<> for cases with no stdev
    pub annualized_sharpe_ratio: Option<Decimal>,
    pub calmar_ratio: Option<Decimal>, // Option<> for cases with no drawdown

    // IV. Trading Activity
    pub rebalance_count: usize,
    pub transaction_count: usize,
    pub traded_value: Decimal,
}

impl PerformanceReport {
    /// Creates a new, zeroed-out PerformanceReport.
    pub fn new() -> Self {
        Self {
            start_date: None,
            end_date: None,
            valuation_days: 0,
            starting_value: Decimal::ZERO,
            final_value: Decimal::ZERO,
            total_net_profit: Decimal::ZERO,
            total_return_pct: Decimal::ZERO,
            max_drawdown: Decimal::ZERO,
            max_drawdown_pct: Decimal::ZERO,
            sharpe_ratio: None,
            annualized_sharpe_ratio: None,
            calmar_ratio: None,
            rebalance_count: 0,
            transaction_count: 0,
            traded_value: Decimal::ZERO,
        }
    }
}

impl Default for PerformanceReport {
    fn default() -> Self {
        Self::new()
    }
}
