use crate::traits::SearchIndex;
use dorfetcher_core::format::normalize;
use dorfetcher_core::query::build;
use dorfetcher_core::{
    ControllerType, FedoraType, FetchError, FetchResponse, Relation, RequestParams, Result,
    SolrQuery, SolrResponse, TimeRange,
};
use once_cell::sync::Lazy;
use prometheus::{register_histogram_vec, HistogramVec};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

pub static SOLR_QUERY_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "solr_query_seconds",
        "Solr select latency",
        &["relation"]
    )
    .unwrap()
});

/// Answers fetch requests: builds the query, runs it and shapes the result.
#[derive(Clone)]
pub struct Fetcher {
    index: Arc<dyn SearchIndex>,
}

impl Fetcher {
    pub fn new(index: Arc<dyn SearchIndex>) -> Self {
        Self { index }
    }

    /// Every object of `ftype`, optionally limited by date or rows.
    pub async fn find_all_fedora_type(
        &self,
        params: &RequestParams,
        ftype: FedoraType,
    ) -> Result<FetchResponse> {
        self.fetch(params, Relation::AllOfType(ftype)).await
    }

    /// Every object controlled by the APO or collection in `params.id`,
    /// plus the controller itself.
    pub async fn find_all_under(
        &self,
        params: &RequestParams,
        controlled_by: ControllerType,
    ) -> Result<FetchResponse> {
        let raw_id = params
            .id
            .as_deref()
            .ok_or_else(|| FetchError::InvalidIdentifier("missing id".to_string()))?;
        let relation = Relation::controlled_by(raw_id, controlled_by)?;
        self.fetch(params, relation).await
    }

    /// Every object tagged with `params.id`.
    pub async fn find_tagged(&self, params: &RequestParams) -> Result<FetchResponse> {
        let tag = params
            .id
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| FetchError::InvalidIdentifier("missing tag".to_string()))?;
        self.fetch(params, Relation::tagged_with(tag)).await
    }

    pub async fn fetch(&self, params: &RequestParams, relation: Relation) -> Result<FetchResponse> {
        let query = build(params, relation)?;
        let raw = self.run_solr_query(&query).await?;
        let range = query.date_range.unwrap_or_else(TimeRange::unbounded);
        normalize(params, &range, raw)
    }

    async fn run_solr_query(&self, query: &SolrQuery) -> Result<SolrResponse> {
        let label = query.relation.label();
        let timer = SOLR_QUERY_SECONDS.with_label_values(&[label]).start_timer();
        let start = Instant::now();
        let res = self.index.execute(query).await;
        timer.observe_duration();
        let elapsed = start.elapsed().as_secs_f64();
        info!(
            relation = label,
            q = %query.q(),
            rows = %query.rows,
            "solr query run time: {:.3} seconds ({:.2} minutes)",
            elapsed,
            elapsed / 60.0
        );
        res
    }
}
