use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Portfolio value, cash and share counts at the end of one valuation date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRow {
    pub date: NaiveDate,
    pub portfolio_value: Decimal,
    pub cash: Decimal,
    /// Share counts, in allocation-matrix column order.
    pub shares: Vec<Decimal>,
}

/// Cash and the dollar value of each holding at the end of one valuation date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRow {
    pub date: NaiveDate,
    pub cash: Decimal,
    pub dollar_values: Vec<Decimal>,
}

/// One symbol's share-count change on a rebalance date.
/// A positive `amount` is a buy, a negative one a sell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRow {
    pub date: NaiveDate,
    pub symbol: String,
    pub amount: Decimal,
    pub price: Decimal,
}

/// Anything stored in a date-indexed history table.
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

impl Dated for ValueRow {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for PositionRow {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for TransactionRow {
    fn date(&self) -> NaiveDate {
        self.date
    }
}
