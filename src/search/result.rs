use serde::{Deserialize, Serialize};
use url::Url;

/// Field names of a provider record.
const FIELD_URL: &str = "Url";
const FIELD_TITLE: &str = "Title";
const FIELD_DESCRIPTION: &str = "Description";

/// Errors raised while building a [`SearchResult`] from provider data
#[derive(Debug, thiserror::Error)]
pub enum ResultError {
    #[error("Invalid result URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Provider record is missing field '{0}'")]
    MissingField(&'static str),
}

/// One hit returned by a provider for a query.
///
/// Everything except the click counter is fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    query: String,
    url: Url,
    headline: String,
    summary: String,
    #[serde(default)]
    click_count: u64,
}

impl SearchResult {
    /// Create a result, validating that `url` is an absolute URL
    pub fn new(
        query: impl Into<String>,
        url: &str,
        headline: impl Into<String>,
        summary: impl Into<String>,
    ) -> Result<Self, ResultError> {
        let url = Url::parse(url).map_err(|source| ResultError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        Ok(Self {
            query: query.into(),
            url,
            headline: headline.into(),
            summary: summary.into(),
            click_count: 0,
        })
    }

    /// Create a result from a provider record carrying `Url`, `Title` and
    /// `Description` string fields.
    pub fn from_record(
        query: impl Into<String>,
        record: &serde_json::Value,
    ) -> Result<Self, ResultError> {
        let url = required_str(record, FIELD_URL)?;
        let headline = required_str(record, FIELD_TITLE)?;
        let summary = required_str(record, FIELD_DESCRIPTION)?;

        Self::new(query, url, headline, summary)
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headline(&self) -> &str {
        &self.headline
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn click_count(&self) -> u64 {
        self.click_count
    }

    /// Record that the user opened this result
    pub fn increment_click_counter(&mut self) {
        self.click_count = self.click_count.saturating_add(1);
    }
}

fn required_str<'a>(record: &'a serde_json::Value, field: &'static str) -> Result<&'a str, ResultError> {
    record
        .get(field)
        .and_then(serde_json::Value::as_str)
        .ok_or(ResultError::MissingField(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_accepts_absolute_urls() {
        for url in [
            "https://x.test",
            "http://example.com/path?q=1#frag",
            "ftp://files.example.org/pub",
        ] {
            let result = SearchResult::new("q", url, "h", "s").unwrap();
            assert_eq!(result.url(), &Url::parse(url).unwrap());
            assert_eq!(result.click_count(), 0);
        }
    }

    #[test]
    fn test_new_rejects_malformed_urls() {
        for url in ["", "not a url", "/relative/path", "example.com", "http://"] {
            let err = SearchResult::new("q", url, "h", "s").unwrap_err();
            assert!(
                matches!(err, ResultError::InvalidUrl { .. }),
                "expected InvalidUrl for {url:?}, got {err:?}"
            );
        }
    }

    #[test]
    fn test_from_record() {
        let record = json!({"Url": "https://x.test", "Title": "X", "Description": "Y"});
        let result = SearchResult::from_record("xq", &record).unwrap();

        assert_eq!(result.query(), "xq");
        assert_eq!(result.url().as_str(), "https://x.test/");
        assert_eq!(result.headline(), "X");
        assert_eq!(result.summary(), "Y");
        assert_eq!(result.click_count(), 0);
    }

    #[test]
    fn test_from_record_missing_field() {
        let record = json!({"Url": "https://x.test", "Description": "Y"});
        let err = SearchResult::from_record("q", &record).unwrap_err();
        assert!(matches!(err, ResultError::MissingField("Title")));

        // Non-string values count as missing
        let record = json!({"Url": "https://x.test", "Title": "X", "Description": 7});
        let err = SearchResult::from_record("q", &record).unwrap_err();
        assert!(matches!(err, ResultError::MissingField("Description")));
    }

    #[test]
    fn test_from_record_invalid_url() {
        let record = json!({"Url": "nope", "Title": "X", "Description": "Y"});
        let err = SearchResult::from_record("q", &record).unwrap_err();
        assert!(err.to_string().contains("Invalid result URL 'nope'"));
    }

    #[test]
    fn test_click_counter_only_increments() {
        let mut result = SearchResult::new("q", "https://x.test", "h", "s").unwrap();
        for expected in 1..=5 {
            result.increment_click_counter();
            assert_eq!(result.click_count(), expected);
        }
    }

    #[test]
    fn test_serialized_form_keeps_click_count() {
        let mut result = SearchResult::new("q", "https://x.test/a", "h", "s").unwrap();
        result.increment_click_counter();

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            json!({
                "query": "q",
                "url": "https://x.test/a",
                "headline": "h",
                "summary": "s",
                "click_count": 1
            })
        );
    }
}
