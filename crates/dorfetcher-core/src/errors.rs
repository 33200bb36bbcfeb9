use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("invalid druid: {0}")]
    InvalidIdentifier(String),
    #[error("invalid time parameters: {0}")]
    InvalidTimeRange(String),
    #[error("empty response from solr")]
    EmptySearchResponse,
    #[error("internal consistency violation: {0}")]
    InternalConsistency(String),
    #[error("search backend error: {0}")]
    Backend(String),
}

impl FetchError {
    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::InvalidIdentifier(_) => "invalid_identifier",
            FetchError::InvalidTimeRange(_) => "invalid_time_range",
            FetchError::EmptySearchResponse => "empty_search_response",
            FetchError::InternalConsistency(_) => "internal_consistency",
            FetchError::Backend(_) => "backend",
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;
