//! # Portfolio Backtester
//!
//! Replays a date-indexed allocation matrix against daily prices. One run
//! owns a single cash/shares state that is marked to market on every
//! valuation date and rebalanced to the matrix's target weights, producing
//! value, position and transaction histories.

pub mod aligner;
pub mod calendar;
pub mod data_handler;
pub mod error;
pub mod history;
pub mod simulator;

pub use aligner::CalendarAligner;
pub use calendar::{calendar_for, NyseCalendar, TradingCalendar, WeekdayCalendar};
pub use data_handler::{Gap, PriceResolver, StaticPriceProvider};
pub use error::PortfolioError;
pub use history::{BacktestHistory, DateTable, HistoryRecorder, TransactionTable};
pub use simulator::PortfolioSimulator;
