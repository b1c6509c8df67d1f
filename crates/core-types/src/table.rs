//! Shared helpers for the date-indexed CSV tables.

use crate::error::CoreError;
use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use rust_decimal::Decimal;
use std::io::Read;
use std::str::FromStr;

/// Parses a date cell. Accepts plain `YYYY-MM-DD` as well as the datetime
/// stamps pandas writes for a normalized index (`2024-01-02 00:00:00`).
pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, CoreError> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(dt.date());
        }
    }
    // Timezone-aware stamps: keep the local calendar date.
    if let Some(prefix) = raw.get(..10) {
        if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
            return Ok(date);
        }
    }
    Err(CoreError::InvalidInput("date".to_string(), format!("could not parse '{}'", raw)))
}

/// Parses a numeric cell. Empty and NaN cells are `None`.
pub(crate) fn parse_cell(raw: &str) -> Result<Option<Decimal>, CoreError> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") || raw.eq_ignore_ascii_case("null") {
        return Ok(None);
    }
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map(Some)
        .map_err(|e| CoreError::InvalidInput("value".to_string(), format!("'{}': {}", raw, e)))
}

/// A raw, untyped table: the symbol header plus `(date, cells)` rows in file order.
pub(crate) struct RawTable {
    pub symbols: Vec<String>,
    pub rows: Vec<(NaiveDate, Vec<Option<Decimal>>)>,
}

/// Reads a CSV whose first column is the date and every other column is a symbol.
pub(crate) fn read_table<R: Read>(reader: R) -> Result<RawTable, CoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    if headers.len() < 2 {
        return Err(CoreError::Shape(
            "expected a date column followed by at least one symbol column".to_string(),
        ));
    }
    let symbols: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

    let mut rows = Vec::new();
    let mut record = StringRecord::new();
    while reader.read_record(&mut record)? {
        if record.len() != headers.len() {
            return Err(CoreError::Shape(format!(
                "row {} has {} fields, header has {}",
                rows.len() + 1,
                record.len(),
                headers.len()
            )));
        }
        let date = parse_date(&record[0])?;
        let cells = record
            .iter()
            .skip(1)
            .map(parse_cell)
            .collect::<Result<Vec<_>, _>>()?;
        rows.push((date, cells));
    }

    Ok(RawTable { symbols, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_pandas_style_dates() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(parse_date("2024-01-02").unwrap(), expected);
        assert_eq!(parse_date("2024-01-02 00:00:00").unwrap(), expected);
        assert_eq!(parse_date("2024-01-02 00:00:00-05:00").unwrap(), expected);
        assert!(parse_date("02/01/2024").is_err());
    }

    #[test]
    fn empty_and_nan_cells_are_null() {
        assert_eq!(parse_cell("").unwrap(), None);
        assert_eq!(parse_cell("NaN").unwrap(), None);
        assert_eq!(parse_cell("0.25").unwrap(), Some(dec!(0.25)));
        assert_eq!(parse_cell("1e-2").unwrap(), Some(dec!(0.01)));
        assert!(parse_cell("abc").is_err());
    }
}
