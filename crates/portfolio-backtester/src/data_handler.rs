use crate::calendar::is_weekday;
use async_trait::async_trait;
use chrono::NaiveDate;
use core_types::{PriceProvider, PriceSeries, ProviderError};
use rust_decimal::Decimal;
use thiserror::Error;

/// A valuation date with no price row.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gap {
    /// Missing on a non-business day. Routine.
    #[error("no price data on non-business day {0}")]
    Expected(NaiveDate),
    /// Missing on a business day.
    #[error("no price data on business day {0}")]
    Unexpected(NaiveDate),
}

impl Gap {
    pub fn classify(date: NaiveDate) -> Self {
        if is_weekday(date) {
            Gap::Unexpected(date)
        } else {
            Gap::Expected(date)
        }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            Gap::Expected(date) | Gap::Unexpected(date) => *date,
        }
    }
}

/// Exact-date price lookup over a price table. No forward fill.
pub struct PriceResolver<'a> {
    prices: &'a PriceSeries,
}

impl<'a> PriceResolver<'a> {
    pub fn new(prices: &'a PriceSeries) -> Self {
        Self { prices }
    }

    /// Returns the price vector for `date`, or the classified gap. Gaps are
    /// logged here: warn for expected, error for unexpected.
    pub fn resolve(&self, date: NaiveDate) -> Result<&'a [Decimal], Gap> {
        match self.prices.get(date) {
            Some(row) => Ok(row),
            None => {
                let gap = Gap::classify(date);
                match gap {
                    Gap::Expected(_) => tracing::warn!(%date, "No price data on a non-business day, skipping"),
                    Gap::Unexpected(_) => tracing::error!(%date, "No price data on a business day, skipping"),
                }
                Err(gap)
            }
        }
    }
}

/// A `PriceProvider` over a fixed, preloaded table, e.g. a prices CSV.
///
/// Rows are clipped to the requested window; symbols are left for the
/// simulator to check.
#[derive(Debug, Clone)]
pub struct StaticPriceProvider {
    prices: PriceSeries,
}

impl StaticPriceProvider {
    pub fn new(prices: PriceSeries) -> Self {
        Self { prices }
    }
}

#[async_trait]
impl PriceProvider for StaticPriceProvider {
    async fn fetch(
        &self,
        _symbols: &[String],
        start: NaiveDate,
        end: Option<NaiveDate>,
    ) -> Result<PriceSeries, ProviderError> {
        let mut clipped = PriceSeries::new(self.prices.symbols().to_vec())?;
        for (date, row) in self.prices.iter() {
            if date < start || end.is_some_and(|end| date > end) {
                continue;
            }
            clipped.insert_row(date, row.to_vec())?;
        }
        if clipped.is_empty() {
            return Err(ProviderError::NoData(format!(
                "static price table has no rows from {}",
                start
            )));
        }
        Ok(clipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn prices() -> PriceSeries {
        let mut prices = PriceSeries::new(vec!["A".into()]).unwrap();
        prices.insert_row(d(2024, 1, 5), vec![dec!(10)]).unwrap();
        prices.insert_row(d(2024, 1, 8), vec![dec!(11)]).unwrap();
        prices
    }

    #[test]
    fn resolves_exact_dates_and_classifies_gaps() {
        let prices = prices();
        let resolver = PriceResolver::new(&prices);

        assert_eq!(resolver.resolve(d(2024, 1, 5)).unwrap(), &[dec!(10)]);
        // Saturday
        assert_eq!(resolver.resolve(d(2024, 1, 6)), Err(Gap::Expected(d(2024, 1, 6))));
        // Thursday: no fill from neighbours.
        assert_eq!(resolver.resolve(d(2024, 1, 4)), Err(Gap::Unexpected(d(2024, 1, 4))));
    }

    #[test]
    fn classification_ignores_holidays() {
        // Christmas is not a session but is still a business day here.
        assert_eq!(Gap::classify(d(2023, 12, 25)), Gap::Unexpected(d(2023, 12, 25)));
        assert_eq!(Gap::classify(d(2023, 12, 24)).date(), d(2023, 12, 24));
    }

    #[tokio::test]
    async fn static_provider_clips_to_window() {
        let provider = StaticPriceProvider::new(prices());
        let symbols = vec!["A".to_string()];

        let all = provider.fetch(&symbols, d(2024, 1, 1), None).await.unwrap();
        assert_eq!(all.len(), 2);

        let tail = provider.fetch(&symbols, d(2024, 1, 6), None).await.unwrap();
        assert_eq!(tail.first_date(), Some(d(2024, 1, 8)));

        let none = provider.fetch(&symbols, d(2024, 2, 1), None).await;
        assert!(matches!(none, Err(ProviderError::NoData(_))));
    }
}
