use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use dorfetcher_core::{ControllerType, Druid, FedoraType, Relation, RequestParams};
use dorfetcher_index::{Fetcher, InMemoryIndex, SearchIndex, SolrIndex};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dorfetcher")]
#[command(about="DorFetcher admin CLI", long_about=None)]
struct Cli {
    /// Solr core url, e.g. http://localhost:8983/solr/argo
    #[arg(long, global = true, conflicts_with = "fixtures")]
    solr_url: Option<String>,
    /// JSON file of documents to query instead of Solr
    #[arg(long, global = true)]
    fixtures: Option<PathBuf>,
    #[arg(long, global = true, default_value_t = 30_000)]
    timeout_ms: u64,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Args, Default)]
struct Filters {
    #[arg(long)]
    status: Option<String>,
    #[arg(long)]
    first_modified: Option<String>,
    #[arg(long)]
    last_modified: Option<String>,
    #[arg(long)]
    rows: Option<String>,
}

impl Filters {
    fn into_params(self, id: Option<String>) -> RequestParams {
        RequestParams {
            id,
            status: self.status,
            first_modified: self.first_modified,
            last_modified: self.last_modified,
            rows: self.rows,
        }
    }
}

#[derive(Subcommand)]
enum Cmd {
    /// All collections, or the objects in one collection
    Collections {
        id: Option<String>,
        #[command(flatten)]
        filters: Filters,
    },
    /// All APOs, or the objects governed by one APO
    Apos {
        id: Option<String>,
        #[command(flatten)]
        filters: Filters,
    },
    /// Objects carrying a tag
    Tag {
        tag: String,
        #[command(flatten)]
        filters: Filters,
    },
    /// Print the canonical forms of a druid
    Druid { raw: String },
}

fn open_index(
    solr_url: Option<String>,
    fixtures: Option<PathBuf>,
    timeout_ms: u64,
) -> Result<Arc<dyn SearchIndex>> {
    match (solr_url, fixtures) {
        (Some(url), _) => Ok(Arc::new(SolrIndex::new(
            url,
            Duration::from_millis(timeout_ms),
        )?)),
        (None, Some(path)) => Ok(Arc::new(InMemoryIndex::from_json_file(path)?)),
        (None, None) => anyhow::bail!("either --solr-url or --fixtures is required"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let (params, relation) = match cli.cmd {
        Cmd::Druid { raw } => {
            let druid = Druid::parse(&raw)?;
            let out = serde_json::json!({
                "druid": druid.as_str(),
                "index": druid.for_index(),
                "controller": druid.for_controller(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
            return Ok(());
        }
        Cmd::Collections { id: None, filters } => (
            filters.into_params(None),
            Relation::AllOfType(FedoraType::Collection),
        ),
        Cmd::Collections {
            id: Some(id),
            filters,
        } => (
            filters.into_params(Some(id.clone())),
            Relation::controlled_by(&id, ControllerType::Collection)?,
        ),
        Cmd::Apos { id: None, filters } => (
            filters.into_params(None),
            Relation::AllOfType(FedoraType::AdminPolicy),
        ),
        Cmd::Apos {
            id: Some(id),
            filters,
        } => (
            filters.into_params(Some(id.clone())),
            Relation::controlled_by(&id, ControllerType::Apo)?,
        ),
        Cmd::Tag { tag, filters } => (
            filters.into_params(Some(tag.clone())),
            Relation::tagged_with(tag),
        ),
    };

    let fetcher = Fetcher::new(open_index(cli.solr_url, cli.fixtures, cli.timeout_ms)?);
    let res = fetcher.fetch(&params, relation).await?;
    println!("{}", serde_json::to_string_pretty(&res)?);
    Ok(())
}
