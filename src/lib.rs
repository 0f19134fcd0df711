//! # swapi-graphql
//!
//! GraphQL gateway over the Star Wars REST API.
//!
//! ## Features
//!
//! - **DataLoader** - Per-query batching cache that coalesces lookups into one dispatch per tick
//! - **Remote Fetcher** - HTTP lookups with paginated-envelope unwrapping
//! - **Entity Resolvers** - find-by-id, find-page, find-by-url and find-by-url-list per entity type
//! - **Relation Graph** - Static registry mapping `(type, field)` to a target resolver
//! - **Schema** - async-graphql object types and the axum handler serving them
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use swapi_graphql::{DataLoader, EntityKind, EntityResolver, HttpFetcher};
//!
//! # async fn example() -> swapi_graphql::Result<()> {
//! let loader = DataLoader::new(Arc::new(HttpFetcher::new()));
//! let people = EntityResolver::new(EntityKind::Person, "https://swapi.dev/api");
//! let luke = people.find_by_id(&loader, 1).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dataloaders;
pub mod fetcher;
pub mod handler;
pub mod pagination;
pub mod relations;
pub mod resolvers;
pub mod schema;
pub mod telemetry;
pub mod types;

pub use config::Config;
pub use dataloaders::{DataLoader, KeyState, LoadResult, LoaderStats};
pub use fetcher::{FetchError, Fetcher, HttpFetcher};
pub use handler::{graphql_handler, router, AppState};
pub use relations::{RelationArgs, RelationEdge, RelationRegistry, Related, ResolverRef};
pub use resolvers::{EntityKind, EntityResolver};
pub use schema::{build_schema, QueryRoot, SwapiSchema};
pub use types::DateTime;

use thiserror::Error;

/// A JSON value returned for one key: an entity, an error body, or an unwrapped page.
pub type Record = serde_json::Value;

/// GraphQL errors
#[derive(Error, Debug, Clone)]
pub enum GraphQLError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid relation: {0}")]
    InvalidRelation(String),

    #[error("Unexpected response: {0}")]
    UnexpectedShape(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Result type for GraphQL operations
pub type Result<T> = std::result::Result<T, GraphQLError>;
