use crate::aligner::CalendarAligner;
use crate::calendar::{calendar_for, TradingCalendar};
use crate::data_handler::PriceResolver;
use crate::error::PortfolioError;
use crate::history::{BacktestHistory, HistoryRecorder};
use chrono::NaiveDate;
use configuration::SimulationConfig;
use core_types::{is_hold_row, AllocationMatrix, PriceProvider, PriceSeries, TradeAt};
use indicatif::ProgressStyle;
use rust_decimal::Decimal;
use tracing_indicatif::span_ext::IndicatifSpanExt;

/// Cash plus one share count per allocation column. Owned by a single run.
#[derive(Debug, Clone, PartialEq)]
struct PortfolioState {
    cash: Decimal,
    shares: Vec<Decimal>,
}

impl PortfolioState {
    fn new(cash: Decimal, width: usize) -> Self {
        Self { cash, shares: vec![Decimal::ZERO; width] }
    }

    /// Cash plus the marked value of every holding.
    fn value(&self, date: NaiveDate, prices: &[Decimal]) -> Result<Decimal, PortfolioError> {
        self.shares
            .iter()
            .zip(prices)
            .try_fold(self.cash, |total, (shares, price)| {
                shares.checked_mul(*price).and_then(|v| total.checked_add(v))
            })
            .ok_or_else(|| PortfolioError::Numeric {
                date,
                message: "portfolio value overflow".to_string(),
            })
    }

    /// Moves every holding to its target weight of `portfolio_value` and
    /// settles the difference in cash. Nonzero trades are recorded.
    fn rebalance(
        &mut self,
        date: NaiveDate,
        portfolio_value: Decimal,
        weights: &[Option<Decimal>],
        prices: &[Decimal],
        fractional_shares: bool,
        recorder: &mut HistoryRecorder,
    ) -> Result<(), PortfolioError> {
        let overflow = |what: &str| PortfolioError::Numeric { date, message: format!("{} overflow", what) };

        let mut targets = Vec::with_capacity(self.shares.len());
        for (i, (weight, price)) in weights.iter().zip(prices).enumerate() {
            let weight = weight.unwrap_or(Decimal::ZERO);
            let target = if weight.is_zero() {
                Decimal::ZERO
            } else if *price <= Decimal::ZERO {
                tracing::error!(
                    %date,
                    symbol = %recorder.symbol(i),
                    %price,
                    "Non-positive price for a weighted symbol, holding its position"
                );
                self.shares[i]
            } else {
                let raw = portfolio_value
                    .checked_mul(weight)
                    .and_then(|dollars| dollars.checked_div(*price))
                    .ok_or_else(|| overflow("target share"))?;
                if fractional_shares { raw } else { raw.floor() }
            };
            targets.push(target);
        }

        let mut cost_basis = Decimal::ZERO;
        for (i, (target, price)) in targets.iter().zip(prices).enumerate() {
            let traded = *target - self.shares[i];
            if !traded.is_zero() {
                recorder.record_transaction(date, i, traded, *price);
            }
            cost_basis = target
                .checked_mul(*price)
                .and_then(|v| cost_basis.checked_add(v))
                .ok_or_else(|| overflow("cost basis"))?;
        }

        self.cash = portfolio_value
            .checked_sub(cost_basis)
            .ok_or_else(|| overflow("cash"))?;
        self.shares = targets;
        Ok(())
    }
}

/// Replays an allocation matrix against daily prices.
///
/// Each valuation date marks the portfolio to that date's prices and, unless
/// the allocation row is a hold row, rebalances to the row's weights at the
/// same prices. Dates without prices are skipped and leave the state untouched.
pub struct PortfolioSimulator {
    config: SimulationConfig,
    allocation: AllocationMatrix,
    calendar: Box<dyn TradingCalendar>,
}

impl PortfolioSimulator {
    pub fn new(config: SimulationConfig, allocation: AllocationMatrix) -> Self {
        if config.trade_at() == TradeAt::Close {
            tracing::warn!("trade_at = close is evaluated with same-date pricing, identical to open");
        }
        let calendar = calendar_for(config.calendar());
        Self { config, allocation, calendar }
    }

    /// Overrides the calendar chosen by the config.
    pub fn with_calendar(mut self, calendar: Box<dyn TradingCalendar>) -> Self {
        self.calendar = calendar;
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn allocation(&self) -> &AllocationMatrix {
        &self.allocation
    }

    /// Fetches prices once, then simulates. A fetch failure is fatal.
    pub async fn run(&self, provider: &dyn PriceProvider) -> Result<BacktestHistory, PortfolioError> {
        tracing::info!(
            symbols = ?self.allocation.symbols(),
            start = %self.config.start_date(),
            end = ?self.config.end_date(),
            "Fetching price data"
        );
        let prices = provider
            .fetch(self.allocation.symbols(), self.config.start_date(), self.config.end_date())
            .await?;
        self.simulate(&prices)
    }

    /// Runs the simulation loop over an already fetched price table.
    pub fn simulate(&self, prices: &PriceSeries) -> Result<BacktestHistory, PortfolioError> {
        let prices = self.conform_prices(prices)?;
        let timeline =
            CalendarAligner::from_config(&self.config, self.calendar.as_ref()).align(&self.allocation, prices.last_date())?;

        let commission = self.config.commission();
        if !commission.amount.is_zero() {
            tracing::info!(kind = ?commission.kind, amount = %commission.amount, "Commission is recorded but not charged");
        }

        let span = tracing::info_span!("simulation");
        span.pb_set_style(
            &ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )?
            .progress_chars("=>-"),
        );
        span.pb_set_length(timeline.len() as u64);
        let _entered = span.enter();

        let fractional_shares = self.config.fractional_shares();
        let resolver = PriceResolver::new(&prices);
        let mut state = PortfolioState::new(self.config.starting_portfolio_value(), timeline.width());
        let mut recorder = HistoryRecorder::new(timeline.symbols().to_vec(), timeline.len());
        let mut skipped = 0usize;

        // --- Main valuation loop ---
        for (date, weights) in timeline.iter() {
            span.pb_inc(1);

            let Ok(price) = resolver.resolve(date) else {
                skipped += 1;
                continue;
            };

            let portfolio_value = state.value(date, price)?;
            if !is_hold_row(weights) {
                state.rebalance(date, portfolio_value, weights, price, fractional_shares, &mut recorder)?;
            }
            recorder.record_valuation(date, portfolio_value, state.cash, &state.shares, price)?;
        }

        let history = recorder.finish()?;
        tracing::info!(
            valuations = history.values.len(),
            transactions = history.transactions.len(),
            skipped,
            final_value = ?history.final_value(),
            "Simulation complete"
        );
        Ok(history)
    }

    /// Checks the price table against the allocation columns and projects it
    /// into allocation order.
    fn conform_prices(&self, prices: &PriceSeries) -> Result<PriceSeries, PortfolioError> {
        if prices.width() != self.allocation.width() {
            return Err(PortfolioError::Configuration(format!(
                "price table has {} columns but the allocation matrix has {}",
                prices.width(),
                self.allocation.width()
            )));
        }
        prices
            .select(self.allocation.symbols())
            .map_err(|e| PortfolioError::Configuration(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn recorder() -> HistoryRecorder {
        HistoryRecorder::new(vec!["A".into(), "B".into()], 1)
    }

    #[test]
    fn value_marks_holdings_to_market() {
        let state = PortfolioState { cash: dec!(5), shares: vec![dec!(2), dec!(3)] };
        assert_eq!(state.value(d(2), &[dec!(10), dec!(1)]).unwrap(), dec!(28));
    }

    #[test]
    fn null_weights_liquidate() {
        let mut state = PortfolioState { cash: dec!(0), shares: vec![dec!(10), dec!(5)] };
        let mut rec = recorder();
        state
            .rebalance(d(2), dec!(200), &[Some(dec!(1)), None], &[dec!(10), dec!(20)], false, &mut rec)
            .unwrap();
        assert_eq!(state.shares, vec![dec!(20), dec!(0)]);
        assert_eq!(state.cash, dec!(0));

        let history = rec.finish().unwrap();
        let trades = history.transactions.on(d(2));
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[1].amount, dec!(-5));
    }

    #[test]
    fn unchanged_holdings_emit_no_transaction() {
        let mut state = PortfolioState { cash: dec!(0), shares: vec![dec!(10), dec!(0)] };
        let mut rec = recorder();
        state
            .rebalance(d(2), dec!(100), &[Some(dec!(1)), Some(dec!(0))], &[dec!(10), dec!(20)], false, &mut rec)
            .unwrap();
        assert!(rec.finish().unwrap().transactions.is_empty());
    }

    #[test]
    fn negative_targets_floor_toward_negative_infinity() {
        let mut state = PortfolioState::new(dec!(1000), 2);
        let mut rec = recorder();
        // -0.25 * 1000 / 30 = -8.33.. floors to -9
        state
            .rebalance(d(2), dec!(1000), &[Some(dec!(-0.25)), Some(dec!(1))], &[dec!(30), dec!(100)], false, &mut rec)
            .unwrap();
        assert_eq!(state.shares, vec![dec!(-9), dec!(10)]);
        // 1000 - (-270 + 1000)
        assert_eq!(state.cash, dec!(270));
    }

    #[test]
    fn zero_price_holds_that_symbol() {
        let mut state = PortfolioState { cash: dec!(100), shares: vec![dec!(4), dec!(0)] };
        let mut rec = recorder();
        state
            .rebalance(d(2), dec!(100), &[Some(dec!(0.5)), Some(dec!(0.5))], &[dec!(0), dec!(10)], false, &mut rec)
            .unwrap();
        assert_eq!(state.shares, vec![dec!(4), dec!(5)]);
        assert_eq!(state.cash, dec!(50));

        let history = rec.finish().unwrap();
        assert_eq!(history.transactions.len(), 1);
        assert_eq!(history.transactions.rows()[0].symbol, "B");
    }
}
