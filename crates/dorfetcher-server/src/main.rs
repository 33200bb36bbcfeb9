use dorfetcher_server::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dorfetcher_server::init_tracing();
    let config = ServerConfig::load()?;
    dorfetcher_server::run(config).await
}
