use crate::druid::Druid;
use crate::errors::Result;
use crate::model::{
    ControllerType, FedoraType, RequestParams, ID_FIELD, LAST_CHANGED_FIELD, RETURN_FIELDS,
    TYPE_FIELD,
};
use crate::time::TimeRange;
use serde::Serialize;

/// Which objects a fetch is asking about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relation {
    AllOfType(FedoraType),
    ControlledBy {
        druid: Druid,
        controller: ControllerType,
    },
    TaggedWith(String),
}

impl Relation {
    /// Parses the identifier before any query is built.
    pub fn controlled_by(raw_id: &str, controller: ControllerType) -> Result<Self> {
        Ok(Relation::ControlledBy {
            druid: Druid::parse(raw_id)?,
            controller,
        })
    }

    pub fn tagged_with(tag: impl Into<String>) -> Self {
        Relation::TaggedWith(tag.into())
    }

    /// Short label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Relation::AllOfType(_) => "all_of_type",
            Relation::ControlledBy { .. } => "controlled_by",
            Relation::TaggedWith(_) => "tagged_with",
        }
    }

    fn clause(&self) -> String {
        match self {
            Relation::AllOfType(t) => format!("{}:\"{}\"", TYPE_FIELD, t.solr_value()),
            Relation::ControlledBy { druid, controller } => format!(
                "({}:\"{}\" OR {}:\"{}\")",
                controller.field(),
                druid.for_controller(),
                ID_FIELD,
                druid.for_index()
            ),
            Relation::TaggedWith(tag) => {
                format!("({}:\"{}\")", ControllerType::Tag.field(), escape_phrase(tag))
            }
        }
    }
}

/// A select request against the index, kept in structured form so that
/// executors other than Solr can evaluate it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolrQuery {
    pub relation: Relation,
    /// `None` for registered-only requests.
    pub date_range: Option<TimeRange>,
    pub rows: String,
}

/// Wire form of a [`SolrQuery`].
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SolrParams {
    pub q: String,
    pub wt: &'static str,
    pub fl: String,
    pub rows: String,
}

impl SolrQuery {
    pub fn q(&self) -> String {
        let mut q = self.relation.clause();
        if let Some(range) = &self.date_range {
            q.push_str(&format!(
                " AND {}:[\"{}\" TO \"{}\"]",
                LAST_CHANGED_FIELD,
                range.first_iso(),
                range.last_iso()
            ));
        }
        q
    }

    pub fn fl() -> String {
        RETURN_FIELDS.join(",")
    }

    pub fn params(&self) -> SolrParams {
        SolrParams {
            q: self.q(),
            wt: "json",
            fl: Self::fl(),
            rows: self.rows.clone(),
        }
    }
}

/// Date range implied by the request; `None` when registered-only.
pub fn date_range(params: &RequestParams) -> Result<Option<TimeRange>> {
    if params.registered_only() {
        return Ok(None);
    }
    TimeRange::resolve(
        params.first_modified.as_deref(),
        params.last_modified.as_deref(),
    )
    .map(Some)
}

pub fn build(params: &RequestParams, relation: Relation) -> Result<SolrQuery> {
    Ok(SolrQuery {
        relation,
        date_range: date_range(params)?,
        rows: params.rows_or_default().to_string(),
    })
}

fn escape_phrase(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FetchError;

    fn params() -> RequestParams {
        RequestParams::default()
    }

    #[test]
    fn all_of_type_with_default_dates() {
        let q = build(&params(), Relation::AllOfType(FedoraType::Collection)).unwrap();
        assert_eq!(
            q.q(),
            "objectType_ssim:\"collection\" AND published_dttsim:[\"1970-01-01T00:00:00Z\" TO \"9999-12-31T23:59:59Z\"]"
        );
        assert_eq!(q.rows, "100000000");
    }

    #[test]
    fn controlled_by_matches_controller_or_itself() {
        let rel = Relation::controlled_by("druid:oo000oo0001", ControllerType::Apo).unwrap();
        let p = RequestParams {
            first_modified: Some("2014-01-01".into()),
            last_modified: Some("2015-01-01".into()),
            ..params()
        };
        let q = build(&p, rel).unwrap();
        assert_eq!(
            q.q(),
            "(is_governed_by_ssim:\"info:fedora/druid:oo000oo0001\" OR id:\"druid:oo000oo0001\") AND published_dttsim:[\"2014-01-01T00:00:00Z\" TO \"2015-01-01T00:00:00Z\"]"
        );
    }

    #[test]
    fn controlled_by_rejects_bad_druid() {
        assert!(matches!(
            Relation::controlled_by("junk", ControllerType::Collection),
            Err(FetchError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn tag_value_is_escaped() {
        let q = build(&params(), Relation::tagged_with("Project : \"Foo\"")).unwrap();
        assert!(q
            .q()
            .starts_with("(tag_ssim:\"Project : \\\"Foo\\\"\") AND published_dttsim:"));
    }

    #[test]
    fn registered_only_never_has_date_clause() {
        for (first, last) in [
            (None, None),
            (Some("2014-01-01"), Some("2015-01-01")),
            (Some("2015-01-01"), Some("2014-01-01")),
            (Some("junk"), None),
        ] {
            let p = RequestParams {
                status: Some("ReGiStErEd".into()),
                first_modified: first.map(String::from),
                last_modified: last.map(String::from),
                ..params()
            };
            let q = build(&p, Relation::AllOfType(FedoraType::Collection)).unwrap();
            assert_eq!(q.date_range, None);
            assert_eq!(q.q(), "objectType_ssim:\"collection\"");
        }
    }

    #[test]
    fn rows_pass_through() {
        let p = RequestParams {
            rows: Some("0".into()),
            ..params()
        };
        let q = build(&p, Relation::AllOfType(FedoraType::Item)).unwrap();
        let wire = q.params();
        assert_eq!(wire.rows, "0");
        assert_eq!(wire.wt, "json");
        assert_eq!(
            wire.fl,
            "id,published_dttsim,objectType_ssim,title_tesim,dc_title_ssi,catkey_id_ssim"
        );
    }

    #[test]
    fn invalid_dates_fail_the_build() {
        let p = RequestParams {
            first_modified: Some("2015-01-01".into()),
            last_modified: Some("2014-01-01".into()),
            ..params()
        };
        assert!(matches!(
            build(&p, Relation::AllOfType(FedoraType::Item)),
            Err(FetchError::InvalidTimeRange(_))
        ));
    }
}
