//! swapi-graphql server binary
//!
//! ```bash
//! PORT=3000 swapi-graphql --api-base-url https://swapi.dev/api
//! ```

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use swapi_graphql::telemetry::{init_logging, LoggingConfig};
use swapi_graphql::{build_schema, router, AppState, Config, HttpFetcher, RelationRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_logging(LoggingConfig::from(&config));

    let registry = Arc::new(RelationRegistry::swapi(config.api_base_url()));
    let schema = build_schema(registry);

    let client = reqwest::Client::builder()
        .user_agent(concat!("swapi-graphql/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let fetcher = Arc::new(HttpFetcher::with_client(client));

    let mut state = AppState::new(schema, fetcher);
    if let Some(timeout) = config.query_timeout() {
        state = state.with_query_timeout(timeout);
    }

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(version = env!("CARGO_PKG_VERSION"), %addr, api = config.api_base_url(), "App running");
    info!("Visit http://localhost:{}/graphql", config.port);

    axum::serve(listener, router(state)).await?;
    Ok(())
}
