use crate::error::PortfolioError;
use chrono::NaiveDate;
use core_types::{Dated, PositionRow, TransactionRow, ValueRow};
use rust_decimal::Decimal;

/// A frozen table with a strictly increasing date index.
#[derive(Debug, Clone, PartialEq)]
pub struct DateTable<T> {
    rows: Vec<T>,
}

impl<T: Dated> DateTable<T> {
    /// Fails on a duplicate or out-of-order date.
    pub fn from_rows(name: &str, rows: Vec<T>) -> Result<Self, PortfolioError> {
        if let Some(pair) = rows.windows(2).find(|pair| pair[0].date() >= pair[1].date()) {
            return Err(PortfolioError::History(format!(
                "{} has {} followed by {}",
                name,
                pair[0].date(),
                pair[1].date()
            )));
        }
        Ok(Self { rows })
    }

    pub fn get(&self, date: NaiveDate) -> Option<&T> {
        self.rows
            .binary_search_by_key(&date, Dated::date)
            .ok()
            .map(|i| &self.rows[i])
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.rows.iter().map(Dated::date)
    }
}

impl<T> DateTable<T> {
    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first(&self) -> Option<&T> {
        self.rows.first()
    }

    pub fn last(&self) -> Option<&T> {
        self.rows.last()
    }
}

/// Transactions ordered by date. Several rows may share a date.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionTable {
    rows: Vec<TransactionRow>,
}

impl TransactionTable {
    pub fn from_rows(rows: Vec<TransactionRow>) -> Result<Self, PortfolioError> {
        if let Some(pair) = rows.windows(2).find(|pair| pair[0].date > pair[1].date) {
            return Err(PortfolioError::History(format!(
                "transaction history has {} followed by {}",
                pair[0].date, pair[1].date
            )));
        }
        Ok(Self { rows })
    }

    /// All transactions executed on `date`.
    pub fn on(&self, date: NaiveDate) -> &[TransactionRow] {
        let start = self.rows.partition_point(|row| row.date < date);
        let end = self.rows.partition_point(|row| row.date <= date);
        &self.rows[start..end]
    }

    pub fn rows(&self) -> &[TransactionRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The three tables produced by one run. Immutable.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestHistory {
    pub symbols: Vec<String>,
    pub values: DateTable<ValueRow>,
    pub positions: DateTable<PositionRow>,
    pub transactions: TransactionTable,
}

impl BacktestHistory {
    pub fn final_value(&self) -> Option<Decimal> {
        self.values.last().map(|row| row.portfolio_value)
    }
}

/// Append-only row buffers filled during the loop.
#[derive(Debug)]
pub struct HistoryRecorder {
    symbols: Vec<String>,
    values: Vec<ValueRow>,
    positions: Vec<PositionRow>,
    transactions: Vec<TransactionRow>,
}

impl HistoryRecorder {
    pub fn new(symbols: Vec<String>, capacity: usize) -> Self {
        Self {
            symbols,
            values: Vec::with_capacity(capacity),
            positions: Vec::with_capacity(capacity),
            transactions: Vec::new(),
        }
    }

    pub fn symbol(&self, index: usize) -> &str {
        &self.symbols[index]
    }

    pub fn record_transaction(&mut self, date: NaiveDate, index: usize, amount: Decimal, price: Decimal) {
        self.transactions.push(TransactionRow {
            date,
            symbol: self.symbols[index].clone(),
            amount,
            price,
        });
    }

    /// Appends the value row and the position row for `date`.
    pub fn record_valuation(
        &mut self,
        date: NaiveDate,
        portfolio_value: Decimal,
        cash: Decimal,
        shares: &[Decimal],
        prices: &[Decimal],
    ) -> Result<(), PortfolioError> {
        let dollar_values = shares
            .iter()
            .zip(prices)
            .map(|(s, p)| {
                s.checked_mul(*p).ok_or_else(|| PortfolioError::Numeric {
                    date,
                    message: format!("position value overflow: {} x {}", s, p),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.values.push(ValueRow { date, portfolio_value, cash, shares: shares.to_vec() });
        self.positions.push(PositionRow { date, cash, dollar_values });
        Ok(())
    }

    pub fn finish(self) -> Result<BacktestHistory, PortfolioError> {
        Ok(BacktestHistory {
            values: DateTable::from_rows("value history", self.values)?,
            positions: DateTable::from_rows("position history", self.positions)?,
            transactions: TransactionTable::from_rows(self.transactions)?,
            symbols: self.symbols,
        })
    }
}
