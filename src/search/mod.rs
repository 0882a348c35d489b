pub mod providers;
pub mod query;
pub mod result;

pub use query::{Search, SearchStatus, DEFAULT_MAX_RESULTS};
pub use result::{ResultError, SearchResult};

/// Query engine abstraction - one implementation per search provider
///
/// [`Search::execute`] stamps the search and then calls
/// [`QueryEngine::query_engine`], so implementations only deal with retrieval.
#[async_trait::async_trait]
pub trait QueryEngine: Send + Sync {
    /// Short provider name, stored with every executed search
    fn name(&self) -> &str;

    /// Retrieve results for `query`, in provider rank order.
    ///
    /// Implementations must return at most `max_results` entries.
    async fn query_engine(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, SearchError>;
}

/// Failures while executing a search
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid result: {0}")]
    InvalidResult(#[from] ResultError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(SearchError::InvalidApiKey.to_string(), "Invalid API key");
        assert_eq!(
            SearchError::ApiError("HTTP 500: boom".into()).to_string(),
            "API error: HTTP 500: boom"
        );
        assert_eq!(
            SearchError::from(ResultError::MissingField("Url")).to_string(),
            "Invalid result: Provider record is missing field 'Url'"
        );
    }

    #[test]
    fn test_error_variants_by_origin() {
        // Exhaustive: a new variant must be placed here deliberately
        fn is_provider_side(e: &SearchError) -> bool {
            match e {
                SearchError::ApiError(_)
                | SearchError::NetworkError(_)
                | SearchError::RateLimitExceeded
                | SearchError::InvalidApiKey
                | SearchError::MalformedResponse(_)
                | SearchError::InvalidResult(_) => true,
                SearchError::InvalidEndpoint(_) => false,
            }
        }

        assert!(is_provider_side(&SearchError::RateLimitExceeded));
        assert!(!is_provider_side(&SearchError::InvalidEndpoint("x".into())));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SearchError>();
    }
}
