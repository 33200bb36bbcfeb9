use crate::traits::SearchIndex;
use dorfetcher_core::format::field_values;
use dorfetcher_core::{
    ControllerType, Document, FetchError, Relation, Result, SolrQuery, SolrResponse, TimeRange,
    ID_FIELD, LAST_CHANGED_FIELD, TYPE_FIELD,
};
use parking_lot::RwLock;
use serde_json::Value as JsonValue;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

/// Index held in memory, evaluating queries the way Solr would for the
/// fields this service filters on.
#[derive(Clone, Default)]
pub struct InMemoryIndex {
    inner: Arc<RwLock<Inner>>,
}

/// Most recent queries kept for inspection; older ones are dropped.
pub const MAX_RECORDED_QUERIES: usize = 256;

#[derive(Default)]
struct Inner {
    docs: Vec<Document>,
    // last MAX_RECORDED_QUERIES queries executed, oldest first
    seen: VecDeque<SolrQuery>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_docs(docs: Vec<Document>) -> Self {
        let idx = Self::new();
        idx.inner.write().docs = docs;
        idx
    }

    /// Loads documents from a JSON file holding either an array of
    /// documents or a select response (`{"response": {"docs": [...]}}`).
    pub fn from_json_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let value: JsonValue = serde_json::from_str(&raw)?;
        let docs = docs_from_value(value).ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "expected an array of documents or a select response",
            )
        })?;
        Ok(Self::with_docs(docs))
    }

    pub fn len(&self) -> usize {
        self.inner.read().docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Recently executed queries, oldest first.
    pub fn queries(&self) -> Vec<SolrQuery> {
        self.inner.read().seen.iter().cloned().collect()
    }
}

fn docs_from_value(value: JsonValue) -> Option<Vec<Document>> {
    let list = match value {
        JsonValue::Array(items) => items,
        JsonValue::Object(mut m) => match m.remove("response")? {
            JsonValue::Object(mut r) => match r.remove("docs")? {
                JsonValue::Array(items) => items,
                _ => return None,
            },
            _ => return None,
        },
        _ => return None,
    };
    list.into_iter()
        .map(|v| match v {
            JsonValue::Object(m) => Some(m),
            _ => None,
        })
        .collect()
}

fn has_value(doc: &Document, field: &str, wanted: &str) -> bool {
    field_values(doc, field).iter().any(|v| v == wanted)
}

fn matches_relation(doc: &Document, relation: &Relation) -> bool {
    match relation {
        Relation::AllOfType(t) => has_value(doc, TYPE_FIELD, t.solr_value()),
        Relation::ControlledBy { druid, controller } => {
            has_value(doc, controller.field(), &druid.for_controller())
                || has_value(doc, ID_FIELD, &druid.for_index())
        }
        Relation::TaggedWith(tag) => has_value(doc, ControllerType::Tag.field(), tag),
    }
}

fn matches_range(doc: &Document, range: &TimeRange) -> bool {
    field_values(doc, LAST_CHANGED_FIELD)
        .iter()
        .any(|c| range.contains(c))
}

#[async_trait::async_trait]
impl SearchIndex for InMemoryIndex {
    async fn execute(&self, query: &SolrQuery) -> Result<SolrResponse> {
        let rows: usize = query
            .rows
            .trim()
            .parse()
            .map_err(|_| FetchError::Backend(format!("invalid rows value {:?}", query.rows)))?;
        let mut inner = self.inner.write();
        if inner.seen.len() == MAX_RECORDED_QUERIES {
            inner.seen.pop_front();
        }
        inner.seen.push_back(query.clone());
        let hits: Vec<Document> = inner
            .docs
            .iter()
            .filter(|d| matches_relation(d, &query.relation))
            .filter(|d| query.date_range.map_or(true, |r| matches_range(d, &r)))
            .cloned()
            .collect();
        let num_found = hits.len() as u64;
        Ok(SolrResponse::new(
            num_found,
            hits.into_iter().take(rows).collect(),
        ))
    }

    fn describe(&self) -> String {
        format!("in-memory index ({} documents)", self.len())
    }
}
