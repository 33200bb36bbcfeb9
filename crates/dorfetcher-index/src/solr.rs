use crate::traits::SearchIndex;
use dorfetcher_core::{FetchError, Result, SolrQuery, SolrResponse};
use reqwest::Client;
use std::time::Duration;

/// Solr over HTTP. Every call is bounded by the client timeout and failures
/// are returned as [`FetchError::Backend`].
#[derive(Clone)]
pub struct SolrIndex {
    client: Client,
    base_url: String,
}

impl SolrIndex {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Backend(format!("building http client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn select_url(&self) -> String {
        format!("{}/select", self.base_url)
    }
}

#[async_trait::async_trait]
impl SearchIndex for SolrIndex {
    async fn execute(&self, query: &SolrQuery) -> Result<SolrResponse> {
        let res = self
            .client
            .get(self.select_url())
            .query(&query.params())
            .send()
            .await
            .map_err(|e| FetchError::Backend(e.to_string()))?;
        let res = res
            .error_for_status()
            .map_err(|e| FetchError::Backend(e.to_string()))?;
        res.json::<SolrResponse>()
            .await
            .map_err(|e| FetchError::Backend(format!("decoding solr response: {}", e)))
    }

    fn describe(&self) -> String {
        format!("solr at {}", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_url_ignores_trailing_slash() {
        let idx = SolrIndex::new("http://localhost:8983/solr/argo/", Duration::from_secs(1))
            .unwrap();
        assert_eq!(idx.select_url(), "http://localhost:8983/solr/argo/select");
        assert_eq!(idx.describe(), "solr at http://localhost:8983/solr/argo");
    }
}
