use dorfetcher_core::{Result, SolrQuery, SolrResponse};

/// Executes select queries against a search index.
#[async_trait::async_trait]
pub trait SearchIndex: Send + Sync + 'static {
    async fn execute(&self, query: &SolrQuery) -> Result<SolrResponse>;

    // Human readable backend description for startup logs
    fn describe(&self) -> String {
        "search index".to_string()
    }
}
