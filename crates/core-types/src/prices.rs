use crate::enums::PriceField;
use crate::error::CoreError;
use crate::table::read_table;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// One daily OHLCV bar as delivered by a market-data provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    /// Split/dividend adjusted close, when the provider supplies one.
    pub adj_close: Option<Decimal>,
    pub volume: Decimal,
}

impl DailyBar {
    pub fn value(&self, field: PriceField) -> Decimal {
        match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => self.close,
            PriceField::AdjClose => self.adj_close.unwrap_or(self.close),
        }
    }
}

/// A date-indexed table holding exactly one price per symbol per date.
///
/// Immutable once handed to the simulator. Lookups are exact-date only.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbols: Vec<String>,
    rows: BTreeMap<NaiveDate, Vec<Decimal>>,
}

impl PriceSeries {
    pub fn new(symbols: Vec<String>) -> Result<Self, CoreError> {
        if symbols.is_empty() {
            return Err(CoreError::Shape("price table needs at least one symbol".to_string()));
        }
        Ok(Self { symbols, rows: BTreeMap::new() })
    }

    pub fn insert_row(&mut self, date: NaiveDate, prices: Vec<Decimal>) -> Result<(), CoreError> {
        if prices.len() != self.symbols.len() {
            return Err(CoreError::Shape(format!(
                "price row for {} has {} values, expected {}",
                date,
                prices.len(),
                self.symbols.len()
            )));
        }
        if let Some(pos) = prices.iter().position(|p| p.is_sign_negative() && !p.is_zero()) {
            return Err(CoreError::InvalidInput(
                format!("price of {} on {}", self.symbols[pos], date),
                format!("negative price {}", prices[pos]),
            ));
        }
        if self.rows.contains_key(&date) {
            return Err(CoreError::DuplicateDate { table: "price table".to_string(), date });
        }
        self.rows.insert(date, prices);
        Ok(())
    }

    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        tracing::info!("Loading price data from: {}", path.display());
        let file = File::open(path).map_err(|e| {
            CoreError::InvalidInput("price table".to_string(), format!("{}: {}", path.display(), e))
        })?;
        Self::from_reader(file)
    }

    /// Reads a `date,<symbol>...` CSV. Rows with any empty cell are dropped,
    /// which surfaces those dates as gaps during simulation.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CoreError> {
        let table = read_table(reader)?;
        let mut series = Self::new(table.symbols)?;
        let mut skipped = 0usize;
        for (date, cells) in table.rows {
            match cells.into_iter().collect::<Option<Vec<_>>>() {
                Some(prices) => series.insert_row(date, prices)?,
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            tracing::warn!("Dropped {} price rows with missing values", skipped);
        }
        Ok(series)
    }

    /// Reduces per-symbol bars to one scalar field and lags every symbol's
    /// series by `shift` observations. Only dates on which every symbol has a
    /// value are kept.
    pub fn from_bars(
        symbols: &[String],
        bars: &HashMap<String, Vec<DailyBar>>,
        field: PriceField,
        shift: usize,
    ) -> Result<Self, CoreError> {
        let mut columns: Vec<BTreeMap<NaiveDate, Decimal>> = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let mut series: Vec<&DailyBar> = bars
                .get(symbol)
                .ok_or_else(|| CoreError::Shape(format!("no bars supplied for {}", symbol)))?
                .iter()
                .collect();
            series.sort_by_key(|bar| bar.date);

            let shifted = series
                .iter()
                .skip(shift)
                .zip(series.iter())
                .map(|(current, lagged)| (current.date, lagged.value(field)))
                .collect();
            columns.push(shifted);
        }

        let mut result = Self::new(symbols.to_vec())?;
        let Some((first, rest)) = columns.split_first() else {
            return Ok(result);
        };
        for (date, price) in first {
            let mut row = Vec::with_capacity(symbols.len());
            row.push(*price);
            for column in rest {
                match column.get(date) {
                    Some(p) => row.push(*p),
                    None => break,
                }
            }
            if row.len() == symbols.len() {
                result.insert_row(*date, row)?;
            }
        }
        Ok(result)
    }

    /// Projects the table onto `symbols`, in that order.
    pub fn select(&self, symbols: &[String]) -> Result<Self, CoreError> {
        let positions = symbols
            .iter()
            .map(|symbol| {
                self.symbols.iter().position(|s| s == symbol).ok_or_else(|| {
                    CoreError::Shape(format!("price table has no column for {}", symbol))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let rows = self
            .rows
            .iter()
            .map(|(date, row)| (*date, positions.iter().map(|&i| row[i]).collect()))
            .collect();
        Ok(Self { symbols: symbols.to_vec(), rows })
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn width(&self) -> usize {
        self.symbols.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Exact-date lookup.
    pub fn get(&self, date: NaiveDate) -> Option<&[Decimal]> {
        self.rows.get(&date).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &[Decimal])> + '_ {
        self.rows.iter().map(|(date, row)| (*date, row.as_slice()))
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.keys().next_back().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn bar(day: u32, open: Decimal, close: Decimal) -> DailyBar {
        DailyBar {
            date: d(day),
            open,
            high: close.max(open),
            low: close.min(open),
            close,
            adj_close: None,
            volume: dec!(1000),
        }
    }

    #[test]
    fn rows_with_missing_values_are_dropped() {
        let csv = "date,A,B\n2024-03-04,10,20\n2024-03-05,11,\n2024-03-06,12,22\n";
        let series = PriceSeries::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(series.len(), 2);
        assert!(series.get(d(5)).is_none());
        assert_eq!(series.get(d(6)).unwrap(), &[dec!(12), dec!(22)]);
    }

    #[test]
    fn negative_prices_are_rejected() {
        let mut series = PriceSeries::new(vec!["A".into()]).unwrap();
        assert!(series.insert_row(d(4), vec![dec!(-1)]).is_err());
        assert!(series.insert_row(d(4), vec![dec!(0)]).is_ok());
    }

    #[test]
    fn select_reorders_columns() {
        let mut series = PriceSeries::new(vec!["A".into(), "B".into()]).unwrap();
        series.insert_row(d(4), vec![dec!(1), dec!(2)]).unwrap();

        let selected = series.select(&["B".to_string(), "A".to_string()]).unwrap();
        assert_eq!(selected.get(d(4)).unwrap(), &[dec!(2), dec!(1)]);
        assert!(series.select(&["C".to_string()]).is_err());
    }

    #[test]
    fn from_bars_shifts_and_intersects() {
        let symbols = vec!["A".to_string(), "B".to_string()];
        let mut bars = HashMap::new();
        bars.insert(
            "A".to_string(),
            vec![bar(6, dec!(12), dec!(13)), bar(4, dec!(10), dec!(11)), bar(5, dec!(11), dec!(12))],
        );
        bars.insert("B".to_string(), vec![bar(5, dec!(20), dec!(21)), bar(6, dec!(21), dec!(22))]);

        let unshifted = PriceSeries::from_bars(&symbols, &bars, PriceField::Open, 0).unwrap();
        assert_eq!(unshifted.len(), 2);
        assert_eq!(unshifted.get(d(5)).unwrap(), &[dec!(11), dec!(20)]);

        // Each value moves forward by one observation of its own symbol.
        let shifted = PriceSeries::from_bars(&symbols, &bars, PriceField::Close, 1).unwrap();
        assert_eq!(shifted.len(), 1);
        assert_eq!(shifted.get(d(6)).unwrap(), &[dec!(12), dec!(21)]);
    }

    #[test]
    fn adj_close_falls_back_to_close() {
        let mut b = bar(4, dec!(10), dec!(11));
        assert_eq!(b.value(PriceField::AdjClose), dec!(11));
        b.adj_close = Some(dec!(10.5));
        assert_eq!(b.value(PriceField::AdjClose), dec!(10.5));
    }
}
