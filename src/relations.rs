//! Relation graph between entity types
//!
//! Records link to each other through embedded absolute URLs. Each edge
//! maps `(source type, field)` to a target resolver and a pure function
//! pulling that resolver's arguments out of the parent record. The
//! registry is built once at startup and only read afterwards.
//!
//! Type-level cycles (Person -> Planet -> Person) need no handling here:
//! the depth of a traversal is bounded by the query's selection set.

use std::collections::HashMap;
use std::fmt;

use crate::dataloaders::{DataLoader, LoadResult};
use crate::resolvers::{json_kind, EntityKind, EntityResolver};
use crate::{GraphQLError, Record, Result};

/// Arguments for a target resolver, extracted from a parent record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationArgs {
    /// `url` for find-by-url; `None` when the parent holds no link
    Url(Option<String>),
    /// `urls` for find-by-url-list
    Urls(Vec<String>),
}

/// Which lookup of the target entity an edge invokes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverRef {
    FindByUrl,
    FindByUrlList,
}

pub type ArgsExtractor = Box<dyn Fn(&Record) -> Result<RelationArgs> + Send + Sync>;

/// One declared link from a parent field to a target resolver
pub struct RelationEdge {
    pub target: EntityKind,
    pub resolver: ResolverRef,
    extract: ArgsExtractor,
}

impl RelationEdge {
    pub fn new(target: EntityKind, resolver: ResolverRef, extract: ArgsExtractor) -> Self {
        Self {
            target,
            resolver,
            extract,
        }
    }

    /// Edge following a single URL stored in `field`
    pub fn one(target: EntityKind, field: &'static str) -> Self {
        Self::new(target, ResolverRef::FindByUrl, url_field(field))
    }

    /// Edge following the list of URLs stored in `field`
    pub fn many(target: EntityKind, field: &'static str) -> Self {
        Self::new(target, ResolverRef::FindByUrlList, urls_field(field))
    }

    pub fn args(&self, parent: &Record) -> Result<RelationArgs> {
        (self.extract)(parent)
    }
}

impl fmt::Debug for RelationEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationEdge")
            .field("target", &self.target)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

/// Take `field` as a single URL; absent or null means no link
pub fn url_field(field: &'static str) -> ArgsExtractor {
    Box::new(move |parent| match parent.get(field) {
        None | Some(Record::Null) => Ok(RelationArgs::Url(None)),
        Some(Record::String(url)) => Ok(RelationArgs::Url(Some(url.clone()))),
        Some(other) => Err(GraphQLError::InvalidRelation(format!(
            "'{}' should be a URL, got {}",
            field,
            json_kind(other)
        ))),
    })
}

/// Take `field` as an ordered list of URLs; absent or null means empty
pub fn urls_field(field: &'static str) -> ArgsExtractor {
    Box::new(move |parent| match parent.get(field) {
        None | Some(Record::Null) => Ok(RelationArgs::Urls(Vec::new())),
        Some(Record::Array(items)) => items
            .iter()
            .map(|item| match item {
                Record::String(url) => Ok(url.clone()),
                other => Err(GraphQLError::InvalidRelation(format!(
                    "'{}' should hold URLs, found {}",
                    field,
                    json_kind(other)
                ))),
            })
            .collect::<Result<Vec<_>>>()
            .map(RelationArgs::Urls),
        Some(other) => Err(GraphQLError::InvalidRelation(format!(
            "'{}' should be a list of URLs, got {}",
            field,
            json_kind(other)
        ))),
    })
}

/// Outcome of following an edge
#[derive(Debug)]
pub enum Related {
    One(Option<Record>),
    Many(Vec<LoadResult>),
}

/// Immutable `(type, field)` -> edge mapping plus the resolvers edges point at
#[derive(Debug)]
pub struct RelationRegistry {
    edges: HashMap<EntityKind, HashMap<&'static str, RelationEdge>>,
    resolvers: Vec<EntityResolver>,
}

impl RelationRegistry {
    /// Registry without edges, resolving against `base_url`
    pub fn new(base_url: &str) -> Self {
        Self {
            edges: HashMap::new(),
            resolvers: EntityKind::ALL
                .iter()
                .map(|kind| EntityResolver::new(*kind, base_url))
                .collect(),
        }
    }

    pub fn with_edge(mut self, source: EntityKind, field: &'static str, edge: RelationEdge) -> Self {
        self.edges.entry(source).or_default().insert(field, edge);
        self
    }

    /// Every link of the Star Wars API
    pub fn swapi(base_url: &str) -> Self {
        use EntityKind::*;

        Self::new(base_url)
            .with_edge(Person, "films", RelationEdge::many(Film, "films"))
            .with_edge(Person, "homeworld", RelationEdge::one(Planet, "homeworld"))
            .with_edge(Person, "species", RelationEdge::many(Species, "species"))
            .with_edge(Person, "vehicles", RelationEdge::many(Vehicle, "vehicles"))
            .with_edge(Person, "starships", RelationEdge::many(Starship, "starships"))
            .with_edge(Planet, "residents", RelationEdge::many(Person, "residents"))
            .with_edge(Planet, "films", RelationEdge::many(Film, "films"))
            .with_edge(Film, "characters", RelationEdge::many(Person, "characters"))
            .with_edge(Film, "planets", RelationEdge::many(Planet, "planets"))
            .with_edge(Film, "starships", RelationEdge::many(Starship, "starships"))
            .with_edge(Film, "vehicles", RelationEdge::many(Vehicle, "vehicles"))
            .with_edge(Film, "species", RelationEdge::many(Species, "species"))
            .with_edge(Species, "homeworld", RelationEdge::one(Planet, "homeworld"))
            .with_edge(Species, "people", RelationEdge::many(Person, "people"))
            .with_edge(Species, "films", RelationEdge::many(Film, "films"))
            .with_edge(Vehicle, "pilots", RelationEdge::many(Person, "pilots"))
            .with_edge(Vehicle, "films", RelationEdge::many(Film, "films"))
            .with_edge(Starship, "pilots", RelationEdge::many(Person, "pilots"))
            .with_edge(Starship, "films", RelationEdge::many(Film, "films"))
    }

    pub fn edge(&self, source: EntityKind, field: &str) -> Option<&RelationEdge> {
        self.edges.get(&source)?.get(field)
    }

    /// Standard resolver for an entity type
    pub fn resolver(&self, kind: EntityKind) -> &EntityResolver {
        // `resolvers` is built from `EntityKind::ALL`, in declaration order.
        &self.resolvers[kind as usize]
    }

    /// Follow `source.field` from an already fetched parent record
    pub async fn resolve(
        &self,
        loader: &DataLoader,
        source: EntityKind,
        field: &str,
        parent: &Record,
    ) -> Result<Related> {
        let edge = self.edge(source, field).ok_or_else(|| {
            GraphQLError::InvalidRelation(format!("no relation {}.{}", source, field))
        })?;
        let target = self.resolver(edge.target);

        match (edge.resolver, edge.args(parent)?) {
            (ResolverRef::FindByUrl, RelationArgs::Url(None)) => Ok(Related::One(None)),
            (ResolverRef::FindByUrl, RelationArgs::Url(Some(url))) => {
                Ok(Related::One(Some(target.find_by_url(loader, &url).await?)))
            }
            (ResolverRef::FindByUrlList, RelationArgs::Urls(urls)) => {
                Ok(Related::Many(target.find_by_url_list(loader, &urls).await))
            }
            (resolver, args) => Err(GraphQLError::InvalidRelation(format!(
                "{}.{} passes {:?} to {:?}",
                source, field, args, resolver
            ))),
        }
    }

    /// Follow a single-link edge
    pub async fn resolve_one(
        &self,
        loader: &DataLoader,
        source: EntityKind,
        field: &str,
        parent: &Record,
    ) -> Result<Option<Record>> {
        match self.resolve(loader, source, field, parent).await? {
            Related::One(record) => Ok(record),
            Related::Many(_) => Err(GraphQLError::InvalidRelation(format!(
                "{}.{} is a list relation",
                source, field
            ))),
        }
    }

    /// Follow a list edge
    pub async fn resolve_many(
        &self,
        loader: &DataLoader,
        source: EntityKind,
        field: &str,
        parent: &Record,
    ) -> Result<Vec<LoadResult>> {
        match self.resolve(loader, source, field, parent).await? {
            Related::Many(records) => Ok(records),
            Related::One(_) => Err(GraphQLError::InvalidRelation(format!(
                "{}.{} is a single relation",
                source, field
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::testing::StubFetcher;
    use serde_json::json;
    use std::sync::Arc;

    const BASE: &str = "https://swapi.test/api";

    fn fetcher() -> Arc<StubFetcher> {
        Arc::new(
            StubFetcher::new()
                .with("https://swapi.test/api/films/1/", json!({"title": "A New Hope"}))
                .with("https://swapi.test/api/films/2/", json!({"title": "The Empire Strikes Back"}))
                .with("https://swapi.test/api/films/3/", json!({"title": "Return of the Jedi"}))
                .with("https://swapi.test/api/planets/1/", json!({"name": "Tatooine"})),
        )
    }

    fn luke() -> Record {
        json!({
            "name": "Luke Skywalker",
            "homeworld": "https://swapi.test/api/planets/1/",
            "films": ["https://swapi.test/api/films/2/", "https://swapi.test/api/films/1/"],
        })
    }

    #[tokio::test]
    async fn test_list_relation_in_source_order() {
        let fetcher = fetcher();
        let loader = DataLoader::new(fetcher.clone());
        let registry = RelationRegistry::swapi(BASE);

        let films = registry
            .resolve_many(&loader, EntityKind::Person, "films", &luke())
            .await
            .unwrap();

        let titles: Vec<_> = films.iter().map(|f| f.as_ref().unwrap()["title"].clone()).collect();
        assert_eq!(titles, vec![json!("The Empire Strikes Back"), json!("A New Hope")]);
        assert_eq!(loader.stats().dispatches, 1);
        assert_eq!(fetcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_single_relation() {
        let loader = DataLoader::new(fetcher());
        let registry = RelationRegistry::swapi(BASE);

        let planet = registry
            .resolve_one(&loader, EntityKind::Person, "homeworld", &luke())
            .await
            .unwrap();

        assert_eq!(planet.unwrap()["name"], "Tatooine");
    }

    #[tokio::test]
    async fn test_null_link_skips_fetch() {
        let fetcher = fetcher();
        let loader = DataLoader::new(fetcher.clone());
        let registry = RelationRegistry::swapi(BASE);
        let droid_species = json!({"name": "Droid", "homeworld": null});

        let homeworld = registry
            .resolve_one(&loader, EntityKind::Species, "homeworld", &droid_species)
            .await
            .unwrap();
        let people = registry
            .resolve_many(&loader, EntityKind::Species, "people", &droid_species)
            .await
            .unwrap();

        assert!(homeworld.is_none());
        assert!(people.is_empty());
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_sibling_relations_share_one_dispatch() {
        let fetcher = fetcher();
        let loader = DataLoader::new(fetcher.clone());
        let registry = RelationRegistry::swapi(BASE);
        let leia = json!({
            "homeworld": "https://swapi.test/api/planets/2/",
            "films": ["https://swapi.test/api/films/1/", "https://swapi.test/api/films/3/"],
        });
        let luke = luke();

        let (a, b) = futures::join!(
            registry.resolve_many(&loader, EntityKind::Person, "films", &luke),
            registry.resolve_many(&loader, EntityKind::Person, "films", &leia),
        );

        assert_eq!(a.unwrap().len(), 2);
        assert_eq!(b.unwrap().len(), 2);
        assert_eq!(loader.stats().dispatches, 1);
        assert_eq!(fetcher.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_relation() {
        let loader = DataLoader::new(fetcher());
        let registry = RelationRegistry::swapi(BASE);

        let err = registry
            .resolve(&loader, EntityKind::Planet, "pilots", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, GraphQLError::InvalidRelation(_)));
    }

    #[tokio::test]
    async fn test_malformed_link_field() {
        let loader = DataLoader::new(fetcher());
        let registry = RelationRegistry::swapi(BASE);

        let err = registry
            .resolve_many(&loader, EntityKind::Person, "films", &json!({"films": [1, 2]}))
            .await
            .unwrap_err();
        assert!(matches!(err, GraphQLError::InvalidRelation(_)));

        let err = registry
            .resolve_one(&loader, EntityKind::Person, "homeworld", &json!({"homeworld": 7}))
            .await
            .unwrap_err();
        assert!(matches!(err, GraphQLError::InvalidRelation(_)));
    }

    #[test]
    fn test_swapi_registry() {
        use EntityKind::*;
        let registry = RelationRegistry::swapi(BASE);

        let fields: [(EntityKind, &[&str]); 6] = [
            (Person, &["homeworld", "films", "species", "vehicles", "starships"]),
            (Planet, &["residents", "films"]),
            (Film, &["characters", "planets", "starships", "vehicles", "species"]),
            (Species, &["homeworld", "people", "films"]),
            (Vehicle, &["pilots", "films"]),
            (Starship, &["pilots", "films"]),
        ];
        for (kind, names) in fields {
            for name in names {
                assert!(registry.edge(kind, name).is_some(), "{}.{}", kind, name);
            }
        }
        assert!(registry.edge(Person, "name").is_none());

        let homeworld = registry.edge(EntityKind::Person, "homeworld").unwrap();
        assert_eq!(homeworld.target, EntityKind::Planet);
        assert_eq!(homeworld.resolver, ResolverRef::FindByUrl);

        let residents = registry.edge(EntityKind::Planet, "residents").unwrap();
        assert_eq!(residents.target, EntityKind::Person);
        assert_eq!(residents.resolver, ResolverRef::FindByUrlList);

        for kind in EntityKind::ALL {
            assert_eq!(registry.resolver(kind).kind(), kind);
        }
    }

    #[test]
    fn test_extractors() {
        let record = json!({"films": ["u1", "u2"], "homeworld": "p"});
        assert_eq!(
            urls_field("films")(&record).unwrap(),
            RelationArgs::Urls(vec!["u1".into(), "u2".into()])
        );
        assert_eq!(url_field("homeworld")(&record).unwrap(), RelationArgs::Url(Some("p".into())));
        assert_eq!(url_field("missing")(&record).unwrap(), RelationArgs::Url(None));
    }
}
