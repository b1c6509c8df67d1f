use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),

    #[error("Shape mismatch: {0}")]
    Shape(String),

    #[error("Duplicate date in {table}: {date}")]
    DuplicateDate { table: String, date: chrono::NaiveDate },

    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Failures raised by a `PriceProvider`. None of these are retried by the simulator.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Network error while fetching prices: {0}")]
    Network(String),

    #[error("The data provider rejected the request: {0}")]
    Rejected(String),

    #[error("No price data returned for {0}")]
    NoData(String),

    #[error("Invalid price data: {0}")]
    Data(#[from] CoreError),
}
