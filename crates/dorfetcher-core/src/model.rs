use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::ops::Index;

pub const ID_FIELD: &str = "id";
pub const LAST_CHANGED_FIELD: &str = "published_dttsim";
pub const TYPE_FIELD: &str = "objectType_ssim";
pub const TITLE_FIELD: &str = "title_tesim";
pub const TITLE_FIELD_ALT: &str = "dc_title_ssi";
pub const CATKEY_FIELD: &str = "catkey_id_ssim";

/// Fields requested from the index for every fetch, in `fl` order.
pub const RETURN_FIELDS: [&str; 6] = [
    ID_FIELD,
    LAST_CHANGED_FIELD,
    TYPE_FIELD,
    TITLE_FIELD,
    TITLE_FIELD_ALT,
    CATKEY_FIELD,
];

pub const FEDORA_PREFIX: &str = "info:fedora/";
pub const DRUID_PREFIX: &str = "druid:";

pub const UNKNOWN_TYPE: &str = "unknown_type";
pub const COUNTS_KEY: &str = "counts";
pub const TOTAL_COUNT_KEY: &str = "total_count";

/// Row cap used when the caller does not ask for a specific number of rows.
pub const DEFAULT_ROWS: &str = "100000000";
/// `rows` value asking for the match count only.
pub const COUNT_ONLY_ROWS: &str = "0";

pub type Document = Map<String, JsonValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FedoraType {
    Item,
    Collection,
    AdminPolicy,
}

impl FedoraType {
    pub const ALL: [FedoraType; 3] = [
        FedoraType::Item,
        FedoraType::Collection,
        FedoraType::AdminPolicy,
    ];

    /// Literal value stored in the index type field.
    pub fn solr_value(self) -> &'static str {
        match self {
            FedoraType::Item => "item",
            FedoraType::Collection => "collection",
            FedoraType::AdminPolicy => "adminPolicy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerType {
    Apo,
    Collection,
    Tag,
}

impl ControllerType {
    /// Index field holding the controlling relationship.
    pub fn field(self) -> &'static str {
        match self {
            ControllerType::Apo => "is_governed_by_ssim",
            ControllerType::Collection => "is_member_of_collection_ssim",
            ControllerType::Tag => "tag_ssim",
        }
    }
}

/// Query string parameters accepted by every fetch.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct RequestParams {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub first_modified: Option<String>,
    #[serde(default)]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub rows: Option<String>,
}

impl RequestParams {
    /// True when the caller only wants registered objects, which ignores dates.
    pub fn registered_only(&self) -> bool {
        self.status
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case("registered"))
            .unwrap_or(false)
    }

    pub fn count_only(&self) -> bool {
        self.rows.as_deref() == Some(COUNT_ONLY_ROWS)
    }

    pub fn rows_or_default(&self) -> &str {
        self.rows.as_deref().unwrap_or(DEFAULT_ROWS)
    }
}

/// Raw select response as returned by the index.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SolrResponse {
    #[serde(default)]
    pub response: Option<SolrResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SolrResult {
    #[serde(rename = "numFound", default)]
    pub num_found: u64,
    #[serde(default)]
    pub docs: Option<Vec<Document>>,
}

impl SolrResponse {
    pub fn new(num_found: u64, docs: Vec<Document>) -> Self {
        Self {
            response: Some(SolrResult {
                num_found,
                docs: Some(docs),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Entry {
    pub druid: String,
    pub latest_change: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catkey: Option<String>,
}

/// String-keyed map that keeps keys in insertion order, serialized as a
/// JSON object in that order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> OrderedMap<V> {
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Replaces the value of an existing key in place, otherwise appends.
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Mutable value for `key`, appending a default one first if absent.
    pub fn get_or_default(&mut self, key: &str) -> &mut V
    where
        V: Default,
    {
        let pos = match self.entries.iter().position(|(k, _)| k == key) {
            Some(pos) => pos,
            None => {
                self.entries.push((key.to_string(), V::default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[pos].1
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str, &V) -> bool) {
        self.entries.retain(|(k, v)| keep(k.as_str(), v));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Index<&str> for OrderedMap<V> {
    type Output = V;

    fn index(&self, key: &str) -> &V {
        match self.get(key) {
            Some(v) => v,
            None => panic!("no entry for key {:?}", key),
        }
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Buckets in seeding order, then `counts` last.
#[derive(Debug, Clone, Serialize, Default, PartialEq, Eq)]
pub struct ResponsePayload {
    #[serde(flatten)]
    pub buckets: OrderedMap<Vec<Entry>>,
    pub counts: OrderedMap<u64>,
}

impl ResponsePayload {
    pub fn total_count(&self) -> u64 {
        self.counts.get(TOTAL_COUNT_KEY).copied().unwrap_or(0)
    }
}

/// Either the grouped listing or, for count-only requests, the bare match count.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum FetchResponse {
    Count(u64),
    Payload(ResponsePayload),
}
