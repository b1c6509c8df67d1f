use crate::error::CoreError;
use crate::table::read_table;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// A date-indexed table of target weights, one column per symbol.
///
/// A `None` cell means "no explicit target on this date". A row that is
/// entirely `None` means "do not rebalance on this date". Rows are kept in
/// chronological order regardless of insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationMatrix {
    symbols: Vec<String>,
    rows: BTreeMap<NaiveDate, Vec<Option<Decimal>>>,
}

impl AllocationMatrix {
    /// Creates an empty matrix over the given symbols.
    pub fn new(symbols: Vec<String>) -> Result<Self, CoreError> {
        if symbols.is_empty() {
            return Err(CoreError::Shape("allocation matrix needs at least one symbol".to_string()));
        }
        Ok(Self { symbols, rows: BTreeMap::new() })
    }

    /// Adds the weights for one date. Each date may appear only once.
    pub fn insert_row(
        &mut self,
        date: NaiveDate,
        weights: Vec<Option<Decimal>>,
    ) -> Result<(), CoreError> {
        if weights.len() != self.symbols.len() {
            return Err(CoreError::Shape(format!(
                "allocation row for {} has {} weights, expected {}",
                date,
                weights.len(),
                self.symbols.len()
            )));
        }
        if self.rows.contains_key(&date) {
            return Err(CoreError::DuplicateDate { table: "allocation matrix".to_string(), date });
        }
        self.rows.insert(date, weights);
        Ok(())
    }

    /// Convenience for a row where every symbol has an explicit weight.
    pub fn insert_weights(&mut self, date: NaiveDate, weights: &[Decimal]) -> Result<(), CoreError> {
        self.insert_row(date, weights.iter().copied().map(Some).collect())
    }

    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        tracing::info!("Loading allocation matrix from: {}", path.display());
        let file = File::open(path).map_err(|e| {
            CoreError::InvalidInput("allocation matrix".to_string(), format!("{}: {}", path.display(), e))
        })?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CoreError> {
        let table = read_table(reader)?;
        let mut matrix = Self::new(table.symbols)?;
        for (date, weights) in table.rows {
            matrix.insert_row(date, weights)?;
        }
        Ok(matrix)
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

    pub fn row(&self, date: NaiveDate) -> Option<&[Option<Decimal>]> {
        self.rows.get(&date).map(Vec::as_slice)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.rows.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &[Option<Decimal>])> + '_ {
        self.rows.iter().map(|(date, row)| (*date, row.as_slice()))
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.keys().next_back().copied()
    }

    /// Returns the rows dated within `[start, end]`. An open `end` keeps
    /// everything from `start` onwards.
    pub fn clip(&self, start: NaiveDate, end: Option<NaiveDate>) -> Self {
        let rows = self
            .rows
            .range(start..)
            .take_while(|(date, _)| end.is_none_or(|end| **date <= end))
            .map(|(date, row)| (*date, row.clone()))
            .collect();
        Self { symbols: self.symbols.clone(), rows }
    }

    /// Conforms the matrix to a new date index. Dates absent from the matrix
    /// receive an all-null row; rows whose dates are not in the index are dropped.
    pub fn reindex<I>(&self, index: I) -> Self
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let empty = vec![None; self.symbols.len()];
        let rows = index
            .into_iter()
            .map(|date| {
                let row = self.rows.get(&date).cloned().unwrap_or_else(|| empty.clone());
                (date, row)
            })
            .collect();
        Self { symbols: self.symbols.clone(), rows }
    }
}

/// Returns true when no weight in the row is set, i.e. "hold".
pub fn is_hold_row(row: &[Option<Decimal>]) -> bool {
    row.iter().all(Option::is_none)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn csv_rows_are_sorted_and_nulls_preserved() {
        let csv = "date,A,B\n2024-01-05,,\n2024-01-02,0.6,0.4\n2024-01-03,0.5,\n";
        let matrix = AllocationMatrix::from_reader(csv.as_bytes()).unwrap();

        assert_eq!(matrix.symbols(), ["A".to_string(), "B".to_string()]);
        let dates: Vec<_> = matrix.dates().collect();
        assert_eq!(dates, vec![d(2024, 1, 2), d(2024, 1, 3), d(2024, 1, 5)]);
        assert_eq!(matrix.row(d(2024, 1, 3)).unwrap(), &[Some(dec!(0.5)), None]);
        assert!(is_hold_row(matrix.row(d(2024, 1, 5)).unwrap()));
        assert!(!is_hold_row(matrix.row(d(2024, 1, 3)).unwrap()));
    }

    #[test]
    fn duplicate_dates_are_rejected() {
        let csv = "date,A\n2024-01-02,1\n2024-01-02,0.5\n";
        let err = AllocationMatrix::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateDate { .. }));
    }

    #[test]
    fn wrong_width_is_rejected() {
        let mut matrix = AllocationMatrix::new(vec!["A".into(), "B".into()]).unwrap();
        assert!(matrix.insert_weights(d(2024, 1, 2), &[dec!(1)]).is_err());
    }

    #[test]
    fn clip_is_inclusive_and_open_ended() {
        let mut matrix = AllocationMatrix::new(vec!["A".into()]).unwrap();
        for day in 1..=5 {
            matrix.insert_weights(d(2024, 2, day), &[dec!(1)]).unwrap();
        }
        assert_eq!(matrix.clip(d(2024, 2, 2), Some(d(2024, 2, 4))).len(), 3);
        assert_eq!(matrix.clip(d(2024, 2, 3), None).len(), 3);
        assert!(matrix.clip(d(2024, 3, 1), None).is_empty());
    }

    #[test]
    fn reindex_fills_missing_dates_with_hold_rows() {
        let mut matrix = AllocationMatrix::new(vec!["A".into()]).unwrap();
        matrix.insert_weights(d(2024, 2, 1), &[dec!(1)]).unwrap();
        matrix.insert_weights(d(2024, 2, 10), &[dec!(0.5)]).unwrap();

        let reindexed = matrix.reindex([d(2024, 2, 1), d(2024, 2, 2), d(2024, 2, 5)]);
        assert_eq!(reindexed.len(), 3);
        assert_eq!(reindexed.row(d(2024, 2, 1)).unwrap(), &[Some(dec!(1))]);
        assert!(is_hold_row(reindexed.row(d(2024, 2, 2)).unwrap()));
        assert!(reindexed.row(d(2024, 2, 10)).is_none());
    }

    #[test]
    fn loads_from_a_file_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.csv");
        std::fs::write(&path, "date,SPY,TLT\n2024-01-02 00:00:00,0.6,0.4\n2024-02-01 00:00:00,nan,nan\n").unwrap();

        let matrix = AllocationMatrix::from_csv(&path).unwrap();
        assert_eq!(matrix.width(), 2);
        assert_eq!(matrix.first_date(), Some(d(2024, 1, 2)));
        assert!(is_hold_row(matrix.row(d(2024, 2, 1)).unwrap()));

        assert!(AllocationMatrix::from_csv(dir.path().join("missing.csv")).is_err());
    }
}
