use core_types::ProviderError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Failed to build the HTTP request: {0}")]
    RequestBuild(#[from] reqwest::Error),

    #[error("The API request returned HTTP {0}: {1}")]
    Status(u16, String),

    #[error("The API returned an error for {symbol}: {code}: {description}")]
    Chart { symbol: String, code: String, description: String },

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),

    #[error("Invalid data format from API: {0}")]
    InvalidData(String),
}

impl From<ApiError> for ProviderError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::RequestBuild(e) => ProviderError::Network(e.to_string()),
            e @ (ApiError::Status(..) | ApiError::Chart { .. }) => ProviderError::Rejected(e.to_string()),
            e @ (ApiError::Deserialization(_) | ApiError::InvalidData(_)) => {
                ProviderError::Network(e.to_string())
            }
        }
    }
}
