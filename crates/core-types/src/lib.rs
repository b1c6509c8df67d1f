pub mod allocation;
pub mod enums;
pub mod error;
pub mod prices;
pub mod provider;
pub mod structs;
mod table;

// Re-export the core types to provide a clean public API.
pub use allocation::{is_hold_row, AllocationMatrix};
pub use enums::{CommissionType, Exchange, Frequency, PriceField, TradeAt};
pub use error::{CoreError, ProviderError};
pub use prices::{DailyBar, PriceSeries};
pub use provider::PriceProvider;
pub use structs::{Dated, PositionRow, TransactionRow, ValueRow};
