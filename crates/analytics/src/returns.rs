use chrono::NaiveDate;
use core_types::ValueRow;
use rust_decimal::Decimal;

/// Period-over-period fractional change of the portfolio value.
///
/// The first row has no predecessor and yields `None`, as does any row whose
/// predecessor is worth zero or whose change overflows.
pub fn percentage_returns(values: &[ValueRow]) -> Vec<(NaiveDate, Option<Decimal>)> {
    let first = values.first().map(|row| (row.date, None));
    first
        .into_iter()
        .chain(values.windows(2).map(|pair| {
            let (prev, curr) = (pair[0].portfolio_value, pair[1].portfolio_value);
            let change = curr.checked_sub(prev).and_then(|diff| diff.checked_div(prev));
            (pair[1].date, change)
        }))
        .collect()
}
