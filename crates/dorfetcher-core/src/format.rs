use crate::errors::{FetchError, Result};
use crate::model::{
    Document, Entry, FedoraType, FetchResponse, OrderedMap, RequestParams, ResponsePayload,
    SolrResponse, CATKEY_FIELD, COUNTS_KEY, ID_FIELD, LAST_CHANGED_FIELD, TITLE_FIELD,
    TITLE_FIELD_ALT, TOTAL_COUNT_KEY, TYPE_FIELD, UNKNOWN_TYPE,
};
use crate::time::TimeRange;
use serde_json::Value as JsonValue;

/// Bucket key for an object type: lowercased, then pluralized.
///
/// Used both to seed the known buckets and to file documents, so the two
/// always agree (`adminPolicy` -> `adminpolicies`).
pub fn bucket_name(object_type: &str) -> String {
    pluralize(&object_type.to_ascii_lowercase())
}

fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }
    if let Some(stem) = word.strip_suffix('y') {
        let before = stem.chars().last();
        if !matches!(before, None | Some('a' | 'e' | 'i' | 'o' | 'u')) {
            return format!("{}ies", stem);
        }
    }
    if ["s", "x", "z", "ch", "sh"].iter().any(|s| word.ends_with(s)) {
        return format!("{}es", word);
    }
    format!("{}s", word)
}

/// Values of a document field as strings. Absent fields are empty, scalars
/// become a single element list.
pub fn field_values(doc: &Document, field: &str) -> Vec<String> {
    match doc.get(field) {
        None | Some(JsonValue::Null) => Vec::new(),
        Some(JsonValue::Array(items)) => items.iter().filter_map(scalar_string).collect(),
        Some(other) => scalar_string(other).into_iter().collect(),
    }
}

fn scalar_string(v: &JsonValue) -> Option<String> {
    match v {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn first_value(doc: &Document, field: &str) -> Option<String> {
    field_values(doc, field).into_iter().next()
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

/// Most recent change stamp inside `range`, or `None` when there are none.
///
/// The index only returns documents with a stamp inside the same range, so
/// finding nothing means query and selection disagree about the range.
pub fn latest_change(range: &TimeRange, changes: &[String]) -> Result<Option<String>> {
    if changes.is_empty() {
        return Ok(None);
    }
    let first = range.first_iso();
    let last = range.last_iso();
    let mut sorted: Vec<&String> = changes.iter().collect();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted
        .into_iter()
        .find(|c| c.as_str() >= first.as_str() && c.as_str() <= last.as_str())
        .map(|c| Some(c.clone()))
        .ok_or_else(|| {
            FetchError::InternalConsistency(format!(
                "no change date within [{} TO {}] among {:?}",
                first, last, changes
            ))
        })
}

fn entry(range: &TimeRange, doc: &Document) -> Result<Entry> {
    // Alt title wins whenever it is set.
    let mut title = String::new();
    if let Some(primary) = non_blank(first_value(doc, TITLE_FIELD)) {
        title = primary;
    }
    if let Some(alt) = non_blank(first_value(doc, TITLE_FIELD_ALT)) {
        title = alt;
    }
    Ok(Entry {
        druid: first_value(doc, ID_FIELD).unwrap_or_default(),
        latest_change: latest_change(range, &field_values(doc, LAST_CHANGED_FIELD))?,
        title,
        catkey: first_value(doc, CATKEY_FIELD),
    })
}

/// Bucket a document of `object_type` is filed under. A type whose bucket
/// would shadow the `counts` object goes to the unknown bucket.
fn bucket_for(object_type: &str) -> String {
    let name = bucket_name(object_type);
    if name == COUNTS_KEY {
        bucket_name(UNKNOWN_TYPE)
    } else {
        name
    }
}

/// Groups documents by type into buckets and counts them.
///
/// Known types keep their declaration order, other types follow in order of
/// first appearance, and `total_count` is always the last count.
pub fn format_json(range: &TimeRange, docs: &[Document]) -> Result<ResponsePayload> {
    let mut buckets: OrderedMap<Vec<Entry>> = OrderedMap::default();
    for t in FedoraType::ALL {
        buckets.insert(bucket_name(t.solr_value()), Vec::new());
    }

    for doc in docs {
        let object_type = first_value(doc, TYPE_FIELD).unwrap_or_else(|| UNKNOWN_TYPE.to_string());
        let e = entry(range, doc)?;
        buckets.get_or_default(&bucket_for(&object_type)).push(e);
    }

    buckets.retain(|_, entries| !entries.is_empty());
    let mut counts: OrderedMap<u64> = OrderedMap::default();
    let mut total = 0;
    for (name, entries) in buckets.iter() {
        counts.insert(name, entries.len() as u64);
        total += entries.len() as u64;
    }
    counts.insert(TOTAL_COUNT_KEY, total);

    Ok(ResponsePayload { buckets, counts })
}

/// Shapes a raw index response for the client.
///
/// `range` is the interval the query was filtered with; callers pass
/// [`TimeRange::unbounded`] when no date filter applied.
pub fn normalize(
    params: &RequestParams,
    range: &TimeRange,
    raw: SolrResponse,
) -> Result<FetchResponse> {
    let result = raw.response.ok_or(FetchError::EmptySearchResponse)?;
    if params.count_only() {
        return Ok(FetchResponse::Count(result.num_found));
    }
    let docs = result.docs.unwrap_or_default();
    format_json(range, &docs).map(FetchResponse::Payload)
}
