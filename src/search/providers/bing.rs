use crate::search::{QueryEngine, SearchError, SearchResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Request template of the Bing Search API on Azure Data Market.
pub const DEFAULT_ENDPOINT: &str =
    "https://api.datamarket.azure.com/Bing/Search/Web?Query=%27{query}%27&$format=json&$top={count}";

/// Key written into freshly created config files; treated as no key at all
pub const ACCOUNT_KEY_PLACEHOLDER: &str = "YOUR_ACCOUNT_KEY_HERE";

const QUERY_PLACEHOLDER: &str = "{query}";
const COUNT_PLACEHOLDER: &str = "{count}";

/// Connection settings for the Bing provider
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BingConfig {
    /// Account key, sent as both user and password of a Basic credential
    #[serde(default)]
    pub account_key: String,

    /// URL template with `{query}` and `{count}` placeholders
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl BingConfig {
    pub fn new(account_key: impl Into<String>) -> Self {
        Self {
            account_key: account_key.into(),
            ..Self::default()
        }
    }

    /// Whether a real account key is configured
    pub fn has_account_key(&self) -> bool {
        let key = self.account_key.trim();
        !key.is_empty() && key != ACCOUNT_KEY_PLACEHOLDER
    }

    /// Point the provider at a different endpoint template
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl Default for BingConfig {
    fn default() -> Self {
        Self {
            account_key: String::new(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

// Keeps the account key out of logs.
impl fmt::Debug for BingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = if self.has_account_key() { "***" } else { "<unset>" };
        f.debug_struct("BingConfig")
            .field("account_key", &key)
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

/// Bing web search provider
///
/// Results are read from `d.results` of the JSON response. Each record must
/// carry `Url`, `Title` and `Description`; a malformed record fails the whole
/// search rather than being skipped.
pub struct BingSearchProvider {
    client: reqwest::Client,
    config: BingConfig,
}

impl BingSearchProvider {
    /// Create a provider from explicit settings
    pub fn new(config: BingConfig) -> Result<Self, SearchError> {
        if !config.has_account_key() {
            tracing::warn!("bing account key not set, searches will fail");
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;

        Ok(Self { client, config })
    }

    /// Fill the endpoint template for one request
    fn request_url(&self, query: &str, max_results: usize) -> Result<url::Url, SearchError> {
        let filled = self
            .config
            .endpoint
            .replace(QUERY_PLACEHOLDER, &urlencoding::encode(query))
            .replace(COUNT_PLACEHOLDER, &max_results.to_string());

        url::Url::parse(&filled).map_err(|e| SearchError::InvalidEndpoint(format!("{filled}: {e}")))
    }
}

#[async_trait::async_trait]
impl QueryEngine for BingSearchProvider {
    fn name(&self) -> &str {
        "bing"
    }

    async fn query_engine(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        if !self.config.has_account_key() {
            return Err(SearchError::InvalidApiKey);
        }

        let url = self.request_url(query, max_results)?;

        tracing::debug!(
            query = %query,
            max_results,
            host = url.host_str().unwrap_or(""),
            "performing bing search"
        );

        let response = self
            .client
            .get(url)
            .basic_auth(&self.config.account_key, Some(&self.config.account_key))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            tracing::warn!(
                status = %status,
                error = %error_text,
                "bing search api error"
            );

            return match status.as_u16() {
                401 | 403 => Err(SearchError::InvalidApiKey),
                429 => Err(SearchError::RateLimitExceeded),
                _ => Err(SearchError::ApiError(format!(
                    "HTTP {}: {}",
                    status, error_text
                ))),
            };
        }

        let body = response.text().await?;
        let json: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| SearchError::MalformedResponse(format!("response is not JSON: {e}")))?;

        let results = parse_bing_response(query, &json, max_results)?;

        tracing::debug!(
            query = %query,
            result_count = results.len(),
            "bing search completed"
        );

        Ok(results)
    }
}

/// Convert a Bing JSON response into results, keeping the response order.
fn parse_bing_response(
    query: &str,
    json: &serde_json::Value,
    max_results: usize,
) -> Result<Vec<SearchResult>, SearchError> {
    let records = json
        .get("d")
        .and_then(|d| d.get("results"))
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| SearchError::MalformedResponse("missing d.results array".into()))?;

    records
        .iter()
        .take(max_results)
        .map(|record| SearchResult::from_record(query, record).map_err(SearchError::from))
        .collect()
}
