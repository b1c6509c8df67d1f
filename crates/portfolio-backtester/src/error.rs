use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PortfolioError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Configuration error: {0}")]
    Config(#[from] configuration::ConfigError),

    #[error("Price provider error: {0}")]
    Provider(#[from] core_types::ProviderError),

    #[error("Data handler error: {0}")]
    Data(#[from] core_types::CoreError),

    #[error("Numeric error on {date}: {message}")]
    Numeric { date: NaiveDate, message: String },

    #[error("History table error: {0}")]
    History(String),

    #[error("Progress bar template error: {0}")]
    ProgressBarTemplate(String),
}

impl From<indicatif::style::TemplateError> for PortfolioError {
    fn from(error: indicatif::style::TemplateError) -> Self {
        PortfolioError::ProgressBarTemplate(error.to_string())
    }
}
