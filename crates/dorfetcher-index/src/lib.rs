pub mod fetcher;
pub mod mem;
pub mod solr;
pub mod traits;

pub use fetcher::Fetcher;
pub use mem::InMemoryIndex;
pub use solr::SolrIndex;
pub use traits::*;
