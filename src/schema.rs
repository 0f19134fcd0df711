//! GraphQL object types over the REST records
//!
//! Every object wraps the raw JSON record it was loaded from. Scalar fields
//! read straight out of the record; relation fields go through the
//! [`RelationRegistry`] and the query's [`DataLoader`].

use std::sync::Arc;

use async_graphql::{
    Context, EmptyMutation, EmptySubscription, Error, Object, PathSegment, Schema,
};

use crate::dataloaders::{DataLoader, LoadResult};
use crate::relations::RelationRegistry;
use crate::resolvers::EntityKind;
use crate::types::DateTime;
use crate::Record;

pub type SwapiSchema = Schema<QueryRoot, EmptyMutation, EmptySubscription>;

/// Build the schema around a relation registry
///
/// The registry is process-wide. A [`DataLoader`] must be attached to each
/// request as request data.
pub fn build_schema(registry: Arc<RelationRegistry>) -> SwapiSchema {
    Schema::build(QueryRoot, EmptyMutation, EmptySubscription)
        .data(registry)
        .finish()
}

fn text(record: &Record, field: &str) -> Option<String> {
    match record.get(field)? {
        Record::String(s) => Some(s.clone()),
        Record::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn timestamp(record: &Record, field: &str) -> Option<DateTime> {
    record.get(field)?.as_str().and_then(DateTime::parse_rfc3339)
}

fn loader_and_registry<'a>(
    ctx: &Context<'a>,
) -> async_graphql::Result<(&'a DataLoader, &'a RelationRegistry)> {
    let loader = ctx.data::<DataLoader>()?;
    let registry = ctx.data::<Arc<RelationRegistry>>()?;
    Ok((loader, registry.as_ref()))
}

/// Keep successful items, report failed ones at their list index
fn collect_items<T: From<Record>>(ctx: &Context<'_>, results: Vec<LoadResult>) -> Vec<Option<T>> {
    results
        .into_iter()
        .enumerate()
        .map(|(idx, result)| match result {
            Ok(record) => Some(T::from(record)),
            Err(e) => {
                let error = Error::new(e.to_string()).into_server_error(ctx.item.pos);
                let mut error = ctx.set_error_path(error);
                error.path.push(PathSegment::Index(idx));
                ctx.add_error(error);
                None
            }
        })
        .collect()
}

async fn related_one<T: From<Record>>(
    ctx: &Context<'_>,
    source: EntityKind,
    field: &str,
    parent: &Record,
) -> async_graphql::Result<Option<T>> {
    let (loader, registry) = loader_and_registry(ctx)?;
    let record = registry.resolve_one(loader, source, field, parent).await?;
    Ok(record.map(T::from))
}

async fn related_many<T: From<Record>>(
    ctx: &Context<'_>,
    source: EntityKind,
    field: &str,
    parent: &Record,
) -> async_graphql::Result<Vec<Option<T>>> {
    let (loader, registry) = loader_and_registry(ctx)?;
    let results = registry.resolve_many(loader, source, field, parent).await?;
    Ok(collect_items(ctx, results))
}

// Root fields are nullable: a failed lookup nulls only its own field.

async fn find_by_id<T: From<Record>>(
    ctx: &Context<'_>,
    kind: EntityKind,
    id: i32,
) -> async_graphql::Result<Option<T>> {
    let (loader, registry) = loader_and_registry(ctx)?;
    Ok(Some(T::from(registry.resolver(kind).find_by_id(loader, id).await?)))
}

async fn find_page<T: From<Record>>(
    ctx: &Context<'_>,
    kind: EntityKind,
    page: Option<i32>,
) -> async_graphql::Result<Option<Vec<T>>> {
    let (loader, registry) = loader_and_registry(ctx)?;
    let records = registry.resolver(kind).find_page(loader, page).await?;
    Ok(Some(records.into_iter().map(T::from).collect()))
}

async fn find_by_urls<T: From<Record>>(
    ctx: &Context<'_>,
    kind: EntityKind,
    urls: Vec<String>,
) -> async_graphql::Result<Option<Vec<Option<T>>>> {
    let (loader, registry) = loader_and_registry(ctx)?;
    let results = registry.resolver(kind).find_by_url_list(loader, &urls).await;
    Ok(Some(collect_items(ctx, results)))
}

/// An individual person or character within the Star Wars universe
#[derive(Debug, Clone)]
pub struct Person(pub Record);

impl From<Record> for Person {
    fn from(record: Record) -> Self {
        Self(record)
    }
}

#[Object(rename_fields = "snake_case")]
impl Person {
    async fn name(&self) -> Option<String> {
        text(&self.0, "name")
    }

    async fn height(&self) -> Option<String> {
        text(&self.0, "height")
    }

    async fn mass(&self) -> Option<String> {
        text(&self.0, "mass")
    }

    async fn hair_color(&self) -> Option<String> {
        text(&self.0, "hair_color")
    }

    async fn skin_color(&self) -> Option<String> {
        text(&self.0, "skin_color")
    }

    async fn eye_color(&self) -> Option<String> {
        text(&self.0, "eye_color")
    }

    async fn birth_year(&self) -> Option<String> {
        text(&self.0, "birth_year")
    }

    async fn gender(&self) -> Option<String> {
        text(&self.0, "gender")
    }

    async fn homeworld(&self, ctx: &Context<'_>) -> async_graphql::Result<Option<Planet>> {
        related_one(ctx, EntityKind::Person, "homeworld", &self.0).await
    }

    async fn films(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<Option<Film>>> {
        related_many(ctx, EntityKind::Person, "films", &self.0).await
    }

    async fn species(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<Option<Species>>> {
        related_many(ctx, EntityKind::Person, "species", &self.0).await
    }

    async fn vehicles(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<Option<Vehicle>>> {
        related_many(ctx, EntityKind::Person, "vehicles", &self.0).await
    }

    async fn starships(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<Option<Starship>>> {
        related_many(ctx, EntityKind::Person, "starships", &self.0).await
    }

    async fn created(&self) -> Option<DateTime> {
        timestamp(&self.0, "created")
    }

    async fn edited(&self) -> Option<DateTime> {
        timestamp(&self.0, "edited")
    }

    async fn url(&self) -> Option<String> {
        text(&self.0, "url")
    }
}

/// A large mass, planet or planetoid
#[derive(Debug, Clone)]
pub struct Planet(pub Record);

impl From<Record> for Planet {
    fn from(record: Record) -> Self {
        Self(record)
    }
}

#[Object(rename_fields = "snake_case")]
impl Planet {
    async fn name(&self) -> Option<String> {
        text(&self.0, "name")
    }

    async fn rotation_period(&self) -> Option<String> {
        text(&self.0, "rotation_period")
    }

    async fn orbital_period(&self) -> Option<String> {
        text(&self.0, "orbital_period")
    }

    async fn diameter(&self) -> Option<String> {
        text(&self.0, "diameter")
    }

    async fn climate(&self) -> Option<String> {
        text(&self.0, "climate")
    }

    async fn gravity(&self) -> Option<String> {
        text(&self.0, "gravity")
    }

    async fn terrain(&self) -> Option<String> {
        text(&self.0, "terrain")
    }

    async fn surface_water(&self) -> Option<String> {
        text(&self.0, "surface_water")
    }

    async fn population(&self) -> Option<String> {
        text(&self.0, "population")
    }

    async fn residents(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<Option<Person>>> {
        related_many(ctx, EntityKind::Planet, "residents", &self.0).await
    }

    async fn films(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<Option<Film>>> {
        related_many(ctx, EntityKind::Planet, "films", &self.0).await
    }

    async fn created(&self) -> Option<DateTime> {
        timestamp(&self.0, "created")
    }

    async fn edited(&self) -> Option<DateTime> {
        timestamp(&self.0, "edited")
    }

    async fn url(&self) -> Option<String> {
        text(&self.0, "url")
    }
}

/// A single film
#[derive(Debug, Clone)]
pub struct Film(pub Record);

impl From<Record> for Film {
    fn from(record: Record) -> Self {
        Self(record)
    }
}

#[Object(rename_fields = "snake_case")]
impl Film {
    async fn title(&self) -> Option<String> {
        text(&self.0, "title")
    }

    async fn episode_id(&self) -> Option<i32> {
        self.0
            .get("episode_id")
            .and_then(Record::as_i64)
            .and_then(|v| i32::try_from(v).ok())
    }

    async fn opening_crawl(&self) -> Option<String> {
        text(&self.0, "opening_crawl")
    }

    async fn director(&self) -> Option<String> {
        text(&self.0, "director")
    }

    async fn producer(&self) -> Option<String> {
        text(&self.0, "producer")
    }

    async fn release_date(&self) -> Option<String> {
        text(&self.0, "release_date")
    }

    async fn characters(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<Option<Person>>> {
        related_many(ctx, EntityKind::Film, "characters", &self.0).await
    }

    async fn planets(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<Option<Planet>>> {
        related_many(ctx, EntityKind::Film, "planets", &self.0).await
    }

    async fn starships(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<Option<Starship>>> {
        related_many(ctx, EntityKind::Film, "starships", &self.0).await
    }

    async fn vehicles(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<Option<Vehicle>>> {
        related_many(ctx, EntityKind::Film, "vehicles", &self.0).await
    }

    async fn species(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<Option<Species>>> {
        related_many(ctx, EntityKind::Film, "species", &self.0).await
    }

    async fn created(&self) -> Option<DateTime> {
        timestamp(&self.0, "created")
    }

    async fn edited(&self) -> Option<DateTime> {
        timestamp(&self.0, "edited")
    }

    async fn url(&self) -> Option<String> {
        text(&self.0, "url")
    }
}

/// A type of person or character
#[derive(Debug, Clone)]
pub struct Species(pub Record);

impl From<Record> for Species {
    fn from(record: Record) -> Self {
        Self(record)
    }
}

#[Object(rename_fields = "snake_case")]
impl Species {
    async fn name(&self) -> Option<String> {
        text(&self.0, "name")
    }

    async fn classification(&self) -> Option<String> {
        text(&self.0, "classification")
    }

    async fn designation(&self) -> Option<String> {
        text(&self.0, "designation")
    }

    async fn average_height(&self) -> Option<String> {
        text(&self.0, "average_height")
    }

    async fn average_lifespan(&self) -> Option<String> {
        text(&self.0, "average_lifespan")
    }

    async fn skin_colors(&self) -> Option<String> {
        text(&self.0, "skin_colors")
    }

    async fn hair_colors(&self) -> Option<String> {
        text(&self.0, "hair_colors")
    }

    async fn eye_colors(&self) -> Option<String> {
        text(&self.0, "eye_colors")
    }

    async fn language(&self) -> Option<String> {
        text(&self.0, "language")
    }

    async fn homeworld(&self, ctx: &Context<'_>) -> async_graphql::Result<Option<Planet>> {
        related_one(ctx, EntityKind::Species, "homeworld", &self.0).await
    }

    async fn people(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<Option<Person>>> {
        related_many(ctx, EntityKind::Species, "people", &self.0).await
    }

    async fn films(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<Option<Film>>> {
        related_many(ctx, EntityKind::Species, "films", &self.0).await
    }

    async fn created(&self) -> Option<DateTime> {
        timestamp(&self.0, "created")
    }

    async fn edited(&self) -> Option<DateTime> {
        timestamp(&self.0, "edited")
    }

    async fn url(&self) -> Option<String> {
        text(&self.0, "url")
    }
}

/// A single transport craft without hyperdrive capability
#[derive(Debug, Clone)]
pub struct Vehicle(pub Record);

impl From<Record> for Vehicle {
    fn from(record: Record) -> Self {
        Self(record)
    }
}

#[Object(rename_fields = "snake_case")]
impl Vehicle {
    async fn name(&self) -> Option<String> {
        text(&self.0, "name")
    }

    async fn model(&self) -> Option<String> {
        text(&self.0, "model")
    }

    async fn manufacturer(&self) -> Option<String> {
        text(&self.0, "manufacturer")
    }

    async fn cost_in_credits(&self) -> Option<String> {
        text(&self.0, "cost_in_credits")
    }

    async fn length(&self) -> Option<String> {
        text(&self.0, "length")
    }

    async fn max_atmosphering_speed(&self) -> Option<String> {
        text(&self.0, "max_atmosphering_speed")
    }

    async fn crew(&self) -> Option<String> {
        text(&self.0, "crew")
    }

    async fn passengers(&self) -> Option<String> {
        text(&self.0, "passengers")
    }

    async fn cargo_capacity(&self) -> Option<String> {
        text(&self.0, "cargo_capacity")
    }

    async fn consumables(&self) -> Option<String> {
        text(&self.0, "consumables")
    }

    async fn vehicle_class(&self) -> Option<String> {
        text(&self.0, "vehicle_class")
    }

    async fn pilots(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<Option<Person>>> {
        related_many(ctx, EntityKind::Vehicle, "pilots", &self.0).await
    }

    async fn films(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<Option<Film>>> {
        related_many(ctx, EntityKind::Vehicle, "films", &self.0).await
    }

    async fn created(&self) -> Option<DateTime> {
        timestamp(&self.0, "created")
    }

    async fn edited(&self) -> Option<DateTime> {
        timestamp(&self.0, "edited")
    }

    async fn url(&self) -> Option<String> {
        text(&self.0, "url")
    }
}

/// A single transport craft with hyperdrive capability
#[derive(Debug, Clone)]
pub struct Starship(pub Record);

impl From<Record> for Starship {
    fn from(record: Record) -> Self {
        Self(record)
    }
}

#[Object(rename_fields = "snake_case")]
impl Starship {
    async fn name(&self) -> Option<String> {
        text(&self.0, "name")
    }

    async fn model(&self) -> Option<String> {
        text(&self.0, "model")
    }

    async fn manufacturer(&self) -> Option<String> {
        text(&self.0, "manufacturer")
    }

    async fn cost_in_credits(&self) -> Option<String> {
        text(&self.0, "cost_in_credits")
    }

    async fn length(&self) -> Option<String> {
        text(&self.0, "length")
    }

    async fn max_atmosphering_speed(&self) -> Option<String> {
        text(&self.0, "max_atmosphering_speed")
    }

    async fn crew(&self) -> Option<String> {
        text(&self.0, "crew")
    }

    async fn passengers(&self) -> Option<String> {
        text(&self.0, "passengers")
    }

    async fn cargo_capacity(&self) -> Option<String> {
        text(&self.0, "cargo_capacity")
    }

    async fn consumables(&self) -> Option<String> {
        text(&self.0, "consumables")
    }

    async fn hyperdrive_rating(&self) -> Option<String> {
        text(&self.0, "hyperdrive_rating")
    }

    /// Maximum number of Megalights this starship can travel in a standard hour
    #[graphql(name = "MGLT")]
    async fn mglt(&self) -> Option<String> {
        text(&self.0, "MGLT")
    }

    async fn starship_class(&self) -> Option<String> {
        text(&self.0, "starship_class")
    }

    async fn pilots(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<Option<Person>>> {
        related_many(ctx, EntityKind::Starship, "pilots", &self.0).await
    }

    async fn films(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<Option<Film>>> {
        related_many(ctx, EntityKind::Starship, "films", &self.0).await
    }

    async fn created(&self) -> Option<DateTime> {
        timestamp(&self.0, "created")
    }

    async fn edited(&self) -> Option<DateTime> {
        timestamp(&self.0, "edited")
    }

    async fn url(&self) -> Option<String> {
        text(&self.0, "url")
    }
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn person(&self, ctx: &Context<'_>, id: i32) -> async_graphql::Result<Option<Person>> {
        find_by_id(ctx, EntityKind::Person, id).await
    }

    async fn people(
        &self,
        ctx: &Context<'_>,
        #[graphql(desc = "One-based page number, 1 when omitted")] page: Option<i32>,
    ) -> async_graphql::Result<Option<Vec<Person>>> {
        find_page(ctx, EntityKind::Person, page).await
    }

    async fn people_by_urls(
        &self,
        ctx: &Context<'_>,
        urls: Vec<String>,
    ) -> async_graphql::Result<Option<Vec<Option<Person>>>> {
        find_by_urls(ctx, EntityKind::Person, urls).await
    }

    async fn planet(&self, ctx: &Context<'_>, id: i32) -> async_graphql::Result<Option<Planet>> {
        find_by_id(ctx, EntityKind::Planet, id).await
    }

    async fn planets(
        &self,
        ctx: &Context<'_>,
        #[graphql(desc = "One-based page number, 1 when omitted")] page: Option<i32>,
    ) -> async_graphql::Result<Option<Vec<Planet>>> {
        find_page(ctx, EntityKind::Planet, page).await
    }

    async fn planets_by_urls(
        &self,
        ctx: &Context<'_>,
        urls: Vec<String>,
    ) -> async_graphql::Result<Option<Vec<Option<Planet>>>> {
        find_by_urls(ctx, EntityKind::Planet, urls).await
    }

    async fn film(&self, ctx: &Context<'_>, id: i32) -> async_graphql::Result<Option<Film>> {
        find_by_id(ctx, EntityKind::Film, id).await
    }

    async fn films(
        &self,
        ctx: &Context<'_>,
        #[graphql(desc = "One-based page number, 1 when omitted")] page: Option<i32>,
    ) -> async_graphql::Result<Option<Vec<Film>>> {
        find_page(ctx, EntityKind::Film, page).await
    }

    async fn films_by_urls(
        &self,
        ctx: &Context<'_>,
        urls: Vec<String>,
    ) -> async_graphql::Result<Option<Vec<Option<Film>>>> {
        find_by_urls(ctx, EntityKind::Film, urls).await
    }

    async fn species(&self, ctx: &Context<'_>, id: i32) -> async_graphql::Result<Option<Species>> {
        find_by_id(ctx, EntityKind::Species, id).await
    }

    async fn species_list(
        &self,
        ctx: &Context<'_>,
        #[graphql(desc = "One-based page number, 1 when omitted")] page: Option<i32>,
    ) -> async_graphql::Result<Option<Vec<Species>>> {
        find_page(ctx, EntityKind::Species, page).await
    }

    async fn species_by_urls(
        &self,
        ctx: &Context<'_>,
        urls: Vec<String>,
    ) -> async_graphql::Result<Option<Vec<Option<Species>>>> {
        find_by_urls(ctx, EntityKind::Species, urls).await
    }

    async fn vehicle(&self, ctx: &Context<'_>, id: i32) -> async_graphql::Result<Option<Vehicle>> {
        find_by_id(ctx, EntityKind::Vehicle, id).await
    }

    async fn vehicles(
        &self,
        ctx: &Context<'_>,
        #[graphql(desc = "One-based page number, 1 when omitted")] page: Option<i32>,
    ) -> async_graphql::Result<Option<Vec<Vehicle>>> {
        find_page(ctx, EntityKind::Vehicle, page).await
    }

    async fn vehicles_by_urls(
        &self,
        ctx: &Context<'_>,
        urls: Vec<String>,
    ) -> async_graphql::Result<Option<Vec<Option<Vehicle>>>> {
        find_by_urls(ctx, EntityKind::Vehicle, urls).await
    }

    async fn starship(&self, ctx: &Context<'_>, id: i32) -> async_graphql::Result<Option<Starship>> {
        find_by_id(ctx, EntityKind::Starship, id).await
    }

    async fn starships(
        &self,
        ctx: &Context<'_>,
        #[graphql(desc = "One-based page number, 1 when omitted")] page: Option<i32>,
    ) -> async_graphql::Result<Option<Vec<Starship>>> {
        find_page(ctx, EntityKind::Starship, page).await
    }

    async fn starships_by_urls(
        &self,
        ctx: &Context<'_>,
        urls: Vec<String>,
    ) -> async_graphql::Result<Option<Vec<Option<Starship>>>> {
        find_by_urls(ctx, EntityKind::Starship, urls).await
    }
}
