pub mod druid;
pub mod errors;
pub mod format;
pub mod model;
pub mod query;
pub mod time;

pub use druid::Druid;
pub use errors::*;
pub use model::*;
pub use query::{Relation, SolrParams, SolrQuery};
pub use time::TimeRange;
