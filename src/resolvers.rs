//! Per-entity lookups translated into loader keys

use std::fmt;

use tracing::debug;

use crate::dataloaders::{DataLoader, LoadResult};
use crate::pagination::{entity_key, page_key, positive};
use crate::{GraphQLError, Record, Result};

/// Entity types exposed by the REST API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Person,
    Planet,
    Film,
    Species,
    Vehicle,
    Starship,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Person,
        EntityKind::Planet,
        EntityKind::Film,
        EntityKind::Species,
        EntityKind::Vehicle,
        EntityKind::Starship,
    ];

    /// REST collection path segment
    pub fn collection(self) -> &'static str {
        match self {
            EntityKind::Person => "people",
            EntityKind::Planet => "planets",
            EntityKind::Film => "films",
            EntityKind::Species => "species",
            EntityKind::Vehicle => "vehicles",
            EntityKind::Starship => "starships",
        }
    }

    /// GraphQL type name
    pub fn type_name(self) -> &'static str {
        match self {
            EntityKind::Person => "Person",
            EntityKind::Planet => "Planet",
            EntityKind::Film => "Film",
            EntityKind::Species => "Species",
            EntityKind::Vehicle => "Vehicle",
            EntityKind::Starship => "Starship",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// The standard lookups for one entity type
#[derive(Debug, Clone)]
pub struct EntityResolver {
    kind: EntityKind,
    base_url: String,
}

impl EntityResolver {
    pub fn new(kind: EntityKind, base_url: impl Into<String>) -> Self {
        Self {
            kind,
            base_url: base_url.into(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Load `{base}/{collection}/{id}/`
    pub async fn find_by_id(&self, loader: &DataLoader, id: i32) -> Result<Record> {
        let id = positive("id", id)?;
        let key = entity_key(&self.base_url, self.kind.collection(), id);
        debug!(kind = %self.kind, %key, "find by id");
        Ok(loader.load(key).await?)
    }

    /// Load `{base}/{collection}/?page={page}`, one-based, defaulting to the first page
    pub async fn find_page(&self, loader: &DataLoader, page: Option<i32>) -> Result<Vec<Record>> {
        let page = positive("page", page.unwrap_or(crate::pagination::DEFAULT_PAGE))?;
        let key = page_key(&self.base_url, self.kind.collection(), page);
        debug!(kind = %self.kind, %key, "find page");
        match loader.load(key.clone()).await? {
            Record::Array(items) => Ok(items),
            other => Err(GraphQLError::UnexpectedShape(format!(
                "expected a page of {} records at {}, got {}",
                self.kind,
                key,
                json_kind(&other)
            ))),
        }
    }

    /// Load one record by its absolute URL
    pub async fn find_by_url(&self, loader: &DataLoader, url: &str) -> Result<Record> {
        Ok(loader.load(url).await?)
    }

    /// Load records by absolute URL, one outcome per input slot, in input order
    pub async fn find_by_url_list(&self, loader: &DataLoader, urls: &[String]) -> Vec<LoadResult> {
        loader.load_many(urls.iter().cloned()).await
    }
}

pub(crate) fn json_kind(value: &Record) -> &'static str {
    match value {
        Record::Null => "null",
        Record::Bool(_) => "a boolean",
        Record::Number(_) => "a number",
        Record::String(_) => "a string",
        Record::Array(_) => "an array",
        Record::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::testing::StubFetcher;
    use crate::fetcher::FetchError;
    use serde_json::json;
    use std::sync::Arc;

    const BASE: &str = "https://swapi.test/api";

    fn fetcher() -> Arc<StubFetcher> {
        Arc::new(
            StubFetcher::new()
                .with("https://swapi.test/api/people/1/", json!({"name": "Luke Skywalker"}))
                .with("https://swapi.test/api/people/4/", json!({"name": "Darth Vader"}))
                .with(
                    "https://swapi.test/api/people/?page=1",
                    json!({"count": 3, "next": null, "previous": null, "results": [
                        {"name": "x"}, {"name": "y"}, {"name": "z"}
                    ]}),
                )
                .with("https://swapi.test/api/planets/?page=2", json!({"detail": "odd"})),
        )
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let fetcher = fetcher();
        let loader = DataLoader::new(fetcher.clone());
        let people = EntityResolver::new(EntityKind::Person, BASE);

        let luke = people.find_by_id(&loader, 1).await.unwrap();

        assert_eq!(luke["name"], "Luke Skywalker");
        assert_eq!(fetcher.calls(), vec!["https://swapi.test/api/people/1/"]);
    }

    #[tokio::test]
    async fn test_find_by_id_rejects_non_positive_without_fetching() {
        let fetcher = fetcher();
        let loader = DataLoader::new(fetcher.clone());
        let people = EntityResolver::new(EntityKind::Person, BASE);

        let err = people.find_by_id(&loader, 0).await.unwrap_err();

        assert!(matches!(err, GraphQLError::InvalidArgument(_)));
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_find_by_id_surfaces_fetch_error() {
        let loader = DataLoader::new(fetcher());
        let people = EntityResolver::new(EntityKind::Person, BASE);

        let err = people.find_by_id(&loader, 99).await.unwrap_err();
        assert!(matches!(err, GraphQLError::Fetch(FetchError::Http { status: 404, .. })));
    }

    #[tokio::test]
    async fn test_find_page_defaults_to_first_and_unwraps() {
        let loader = DataLoader::new(fetcher());
        let people = EntityResolver::new(EntityKind::Person, BASE);

        let page = people.find_page(&loader, None).await.unwrap();

        assert_eq!(page, vec![json!({"name": "x"}), json!({"name": "y"}), json!({"name": "z"})]);
    }

    #[tokio::test]
    async fn test_find_page_rejects_non_list() {
        let loader = DataLoader::new(fetcher());
        let planets = EntityResolver::new(EntityKind::Planet, BASE);

        let err = planets.find_page(&loader, Some(2)).await.unwrap_err();
        assert!(matches!(err, GraphQLError::UnexpectedShape(_)));
        assert!(matches!(
            planets.find_page(&loader, Some(0)).await,
            Err(GraphQLError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_find_by_url_list_order_and_isolation() {
        let loader = DataLoader::new(fetcher());
        let people = EntityResolver::new(EntityKind::Person, BASE);
        let urls = vec![
            "https://swapi.test/api/people/4/".to_string(),
            "https://swapi.test/api/people/404/".to_string(),
            "https://swapi.test/api/people/1/".to_string(),
        ];

        let results = people.find_by_url_list(&loader, &urls).await;

        assert_eq!(results[0].as_ref().unwrap()["name"], "Darth Vader");
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap()["name"], "Luke Skywalker");
    }

    #[tokio::test]
    async fn test_find_by_url_shares_cache_with_find_by_id() {
        let fetcher = fetcher();
        let loader = DataLoader::new(fetcher.clone());
        let people = EntityResolver::new(EntityKind::Person, BASE);

        people.find_by_id(&loader, 1).await.unwrap();
        let luke = people
            .find_by_url(&loader, "https://swapi.test/api/people/1/")
            .await
            .unwrap();

        assert_eq!(luke["name"], "Luke Skywalker");
        assert_eq!(fetcher.calls().len(), 1);
    }

    #[test]
    fn test_collections() {
        let collections: Vec<_> = EntityKind::ALL.iter().map(|k| k.collection()).collect();
        assert_eq!(
            collections,
            vec!["people", "planets", "films", "species", "vehicles", "starships"]
        );
    }
}
