use crate::error::AnalyticsError;
use crate::report::PerformanceReport;
use crate::returns::percentage_returns;
use core_types::{TransactionRow, ValueRow};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use std::collections::BTreeSet;

/// Sessions per year used to annualize daily statistics.
const TRADING_DAYS_PER_YEAR: i64 = 252;

/// A stateless calculator for deriving performance metrics from a run's histories.
#[derive(Debug, Default)]
pub struct AnalyticsEngine {}

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The main entry point for calculating performance metrics.
    ///
    /// # Arguments
    ///
    /// * `values` - The value history, one row per valuation date, ascending.
    /// * `transactions` - Every share-count change, ascending by date.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `PerformanceReport` or an `AnalyticsError`.
    pub fn calculate(
        &self,
        values: &[ValueRow],
        transactions: &[TransactionRow],
    ) -> Result<PerformanceReport, AnalyticsError> {
        let mut report = PerformanceReport::new();

        let (Some(first), Some(last)) = (values.first(), values.last()) else {
            // No valuation dates: nothing to measure.
            return Ok(report);
        };
        report.start_date = Some(first.date);
        report.end_date = Some(last.date);
        report.valuation_days = values.len();

        self.calculate_profitability(first, last, &mut report)?;
        self.calculate_drawdown(values, &mut report)?;
        self.calculate_activity(transactions, &mut report)?;
        self.calculate_ratios(values, &mut report)?;

        Ok(report)
    }

    /// Net profit and total return, measured from the first recorded value.
    fn calculate_profitability(
        &self,
        first: &ValueRow,
        last: &ValueRow,
        report: &mut PerformanceReport,
    ) -> Result<(), AnalyticsError> {
        report.starting_value = first.portfolio_value;
        report.final_value = last.portfolio_value;
        report.total_net_profit = last
            .portfolio_value
            .checked_sub(first.portfolio_value)
            .ok_or_else(|| overflow("total_net_profit"))?;

        if first.portfolio_value > Decimal::ZERO {
            report.total_return_pct = report
                .total_net_profit
                .checked_div(first.portfolio_value)
                .ok_or_else(|| AnalyticsError::DivisionByZero("total_return_pct".to_string()))?
                .checked_mul(Decimal::ONE_HUNDRED)
                .ok_or_else(|| overflow("total_return_pct"))?;
        }
        Ok(())
    }

    /// Largest peak-to-trough decline, in dollars and as a share of the peak.
    fn calculate_drawdown(&self, values: &[ValueRow], report: &mut PerformanceReport) -> Result<(), AnalyticsError> {
        let mut peak = match values.first() {
            Some(row) => row.portfolio_value,
            None => return Ok(()),
        };

        for row in values {
            let equity = row.portfolio_value;
            if equity > peak {
                peak = equity;
            }
            let drawdown = peak.checked_sub(equity).ok_or_else(|| overflow("max_drawdown"))?;
            if drawdown > report.max_drawdown {
                report.max_drawdown = drawdown;
            }
            if peak > Decimal::ZERO {
                let pct = drawdown
                    .checked_div(peak)
                    .and_then(|share| share.checked_mul(Decimal::ONE_HUNDRED))
                    .ok_or_else(|| overflow("max_drawdown_pct"))?;
                if pct > report.max_drawdown_pct {
                    report.max_drawdown_pct = pct;
                }
            }
        }
        Ok(())
    }

    /// Rebalance dates, trade count and gross traded value.
    fn calculate_activity(
        &self,
        transactions: &[TransactionRow],
        report: &mut PerformanceReport,
    ) -> Result<(), AnalyticsError> {
        report.transaction_count = transactions.len();
        report.rebalance_count = transactions.iter().map(|t| t.date).collect::<BTreeSet<_>>().len();
        report.traded_value = transactions
            .iter()
            .try_fold(Decimal::ZERO, |total, t| {
                t.amount.abs().checked_mul(t.price).and_then(|v| total.checked_add(v))
            })
            .ok_or_else(|| overflow("traded_value"))?;
        Ok(())
    }

    /// Sharpe (risk-free rate of zero) and Calmar ratios.
    fn calculate_ratios(&self, values: &[ValueRow], report: &mut PerformanceReport) -> Result<(), AnalyticsError> {
        // --- Calmar Ratio ---
        if report.max_drawdown_pct > Decimal::ZERO {
            report.calmar_ratio = report.total_return_pct.checked_div(report.max_drawdown_pct);
        }

        // --- Sharpe Ratio ---
        let returns: Vec<Decimal> = percentage_returns(values).into_iter().filter_map(|(_, r)| r).collect();
        if returns.len() < 2 {
            return Ok(());
        }

        let count = Decimal::from(returns.len());
        let mean_return = returns
            .iter()
            .try_fold(Decimal::ZERO, |total, r| total.checked_add(*r))
            .and_then(|total| total.checked_div(count))
            .ok_or_else(|| overflow("mean_return"))?;
        let variance = returns
            .iter()
            .try_fold(Decimal::ZERO, |total, r| {
                let deviation = r.checked_sub(mean_return)?;
                deviation.checked_mul(deviation).and_then(|sq| total.checked_add(sq))
            })
            .and_then(|total| total.checked_div(count))
            .ok_or_else(|| overflow("variance"))?;
        if variance <= Decimal::ZERO {
            return Ok(());
        }

        let std_dev = variance
            .sqrt()
            .ok_or_else(|| AnalyticsError::Calculation("Failed to calculate square root for variance".to_string()))?;
        if std_dev > Decimal::ZERO {
            let sharpe = mean_return
                .checked_div(std_dev)
                .ok_or_else(|| AnalyticsError::DivisionByZero("sharpe_ratio".to_string()))?;
            report.sharpe_ratio = Some(sharpe);
            report.annualized_sharpe_ratio = Decimal::from(TRADING_DAYS_PER_YEAR)
                .sqrt()
                .and_then(|factor| sharpe.checked_mul(factor));
        }

        Ok(())
    }
}

fn overflow(metric: &str) -> AnalyticsError {
    AnalyticsError::Calculation(format!("{metric} overflowed"))
}
