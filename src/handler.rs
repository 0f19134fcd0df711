//! HTTP surface for the GraphQL endpoint
//!
//! Provides helpers for:
//! - Executing queries with a fresh per-query [`DataLoader`] injected as request data
//! - Enforcing an optional overall query deadline
//! - Serving GraphiQL on the same paths

use std::sync::Arc;
use std::time::Duration;

use async_graphql::http::GraphiQLSource;
use async_graphql::{Request, Response, ServerError};
use axum::{
    extract::Extension,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use tracing::{debug, warn};

use crate::dataloaders::DataLoader;
use crate::fetcher::Fetcher;
use crate::schema::SwapiSchema;

/// Process-wide state shared by every query
#[derive(Clone)]
pub struct AppState {
    pub schema: SwapiSchema,
    pub fetcher: Arc<dyn Fetcher>,
    pub query_timeout: Option<Duration>,
}

impl AppState {
    pub fn new(schema: SwapiSchema, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            schema,
            fetcher,
            query_timeout: None,
        }
    }

    /// Abandon queries that run longer than `timeout`
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }
}

/// Standard GraphQL handler
///
/// Builds a new [`DataLoader`] for the request so no cached record crosses
/// query boundaries.
///
/// # Example
///
/// ```rust,no_run
/// use axum::{Extension, Router, routing::post};
/// use swapi_graphql::handler::{graphql_handler, AppState};
///
/// # fn example(state: AppState) {
/// let app: Router = Router::new()
///     .route("/graphql", post(graphql_handler))
///     .layer(Extension(state));
/// # }
/// ```
pub async fn graphql_handler(
    Extension(state): Extension<AppState>,
    req: Json<Request>,
) -> Json<Response> {
    let loader = DataLoader::new(state.fetcher.clone());
    let request = req.0.data(loader.clone());

    let response = match state.query_timeout {
        Some(limit) => match tokio::time::timeout(limit, state.schema.execute(request)).await {
            Ok(response) => response,
            Err(_) => {
                warn!(timeout = ?limit, "query abandoned after deadline");
                Response::from_errors(vec![ServerError::new(
                    format!("Query exceeded the {:?} deadline", limit),
                    None,
                )])
            }
        },
        None => state.schema.execute(request).await,
    };

    let stats = loader.stats();
    debug!(
        dispatches = stats.dispatches,
        fetches = stats.fetches,
        errors = response.errors.len(),
        "query complete"
    );

    Json(response)
}

/// GraphiQL IDE pointed at the GraphQL endpoint
pub async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}

/// Routes: `GET` serves GraphiQL, `POST` executes queries, on `/` and `/graphql`
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(graphiql).post(graphql_handler))
        .route("/graphql", get(graphiql).post(graphql_handler))
        .layer(Extension(state))
}
