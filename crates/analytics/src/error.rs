use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Calculation error: Division by zero encountered in metric '{0}'")]
    DivisionByZero(String),

    #[error("Error in calculation: {0}")]
    Calculation(String),
}
