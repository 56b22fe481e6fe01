//! Batched eager loading
//!
//! Each requested relation is loaded for a whole result set with one query.
//! Dotted paths load level by level: `author.meta` loads every author first,
//! then the meta of all those authors in a single query.

pub mod belongs_to;
pub mod belongs_to_many;
pub mod has_one_or_many;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

pub use belongs_to::BelongsToLoader;
pub use belongs_to_many::BelongsToManyLoader;
pub use has_one_or_many::HasOneOrManyLoader;

use crate::collection::{key_of, Collection};
use crate::connection::ConnectionManager;
use crate::error::OrmResult;
use crate::model::{Record, Related, Schema};
use crate::query::QueryBuilder;
use crate::relationships::{QueryableRelation, Relation, RelationConstraint};

/// A requested eager load and its optional caller constraint
#[derive(Clone)]
pub struct EagerLoad {
    pub name: String,
    pub constraint: Option<Arc<dyn RelationConstraint>>,
}

impl EagerLoad {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            constraint: None,
        }
    }
}

/// Hydrates one relation across many parents
#[async_trait]
pub trait RelationLoader: Send + Sync {
    async fn load(
        &self,
        db: &ConnectionManager,
        models: &mut [Record],
        name: &str,
        constraint: Option<&dyn RelationConstraint>,
    ) -> OrmResult<()>;
}

/// Picks the loader for a relation variant
pub struct RelationLoaderFactory;

impl RelationLoaderFactory {
    pub fn make(relation: &Relation) -> Box<dyn RelationLoader> {
        match relation {
            Relation::HasOne(r) => Box::new(HasOneOrManyLoader::new(r.clone(), true)),
            Relation::HasMany(r) => Box::new(HasOneOrManyLoader::new(r.clone(), false)),
            Relation::BelongsTo(r) => Box::new(BelongsToLoader::new(r.clone())),
            Relation::BelongsToMany(r) => Box::new(BelongsToManyLoader::new(r.clone())),
        }
    }
}

/// Distinct non-null values of `column` across `models`
pub(crate) fn collect_keys(models: &[Record], column: &str) -> Vec<Value> {
    let mut seen: IndexMap<String, Value> = IndexMap::new();
    for model in models {
        if let Some(value) = model.get_attribute(column) {
            if let Some(key) = key_of(value) {
                seen.entry(key).or_insert_with(|| value.clone());
            }
        }
    }
    seen.into_values().collect()
}

/// Base query for a batched load: the caller's constraint goes first, the
/// key filter and the relation's own constraints follow
pub(crate) fn start_query(
    query: QueryBuilder<Record>,
    caller: Option<&dyn RelationConstraint>,
) -> QueryBuilder<Record> {
    match caller {
        Some(constraint) => constraint.apply(query),
        None => query,
    }
}

/// Split rows into buckets keyed by `column`
pub(crate) fn bucket_by(rows: Collection<Record>, column: &str) -> IndexMap<String, Vec<Record>> {
    let mut buckets: IndexMap<String, Vec<Record>> = IndexMap::new();
    for row in rows {
        if let Some(key) = row.get_attribute(column).and_then(key_of) {
            buckets.entry(key).or_default().push(row);
        }
    }
    buckets
}

/// One level of the requested relation tree
#[derive(Default)]
struct LoadNode {
    constraint: Option<Arc<dyn RelationConstraint>>,
    children: IndexMap<String, LoadNode>,
}

fn build_tree(requests: &[EagerLoad]) -> IndexMap<String, LoadNode> {
    let mut roots: IndexMap<String, LoadNode> = IndexMap::new();
    for request in requests {
        let segments: Vec<&str> = request
            .name
            .split('.')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        let Some((last, parents)) = segments.split_last() else {
            continue;
        };

        let mut level = &mut roots;
        for segment in parents {
            level = &mut level.entry(segment.to_string()).or_default().children;
        }
        let node = level.entry(last.to_string()).or_default();
        if request.constraint.is_some() {
            node.constraint = request.constraint.clone();
        }
    }
    roots
}

/// Load the requested relations onto `records`, whose model is `schema`
pub async fn eager_load(
    db: &ConnectionManager,
    schema: Schema,
    records: &mut Vec<Record>,
    requests: &[EagerLoad],
) -> OrmResult<()> {
    let tree = build_tree(requests);
    load_level(db, schema, records, &tree).await
}

fn load_level<'a>(
    db: &'a ConnectionManager,
    schema: Schema,
    records: &'a mut Vec<Record>,
    nodes: &'a IndexMap<String, LoadNode>,
) -> Pin<Box<dyn Future<Output = OrmResult<()>> + Send + 'a>> {
    Box::pin(async move {
        if records.is_empty() {
            return Ok(());
        }

        for (name, node) in nodes {
            let Some(relation) = records.first().and_then(|first| schema.relation(first, name)) else {
                warn!(table = %schema.table, relation = %name, "unknown relation skipped");
                continue;
            };

            debug!(table = %schema.table, relation = %name, parents = records.len(), "eager loading");
            let loader = RelationLoaderFactory::make(&relation);
            loader
                .load(db, records.as_mut_slice(), name, node.constraint.as_deref())
                .await?;

            if !node.children.is_empty() {
                load_nested(db, relation.related_schema(), records, name, &node.children).await?;
            }
        }
        Ok(())
    })
}

/// How many related records each parent contributed
enum Shape {
    One(bool),
    Many(usize),
}

async fn load_nested(
    db: &ConnectionManager,
    related: Schema,
    records: &mut [Record],
    name: &str,
    children: &IndexMap<String, LoadNode>,
) -> OrmResult<()> {
    let mut shapes = Vec::with_capacity(records.len());
    let mut flat: Vec<Record> = Vec::new();

    for record in records.iter_mut() {
        match record.take_relation(name) {
            Some(Related::One(Some(one))) => {
                flat.push(one);
                shapes.push(Shape::One(true));
            }
            Some(Related::Many(many)) => {
                shapes.push(Shape::Many(many.len()));
                flat.extend(many);
            }
            _ => shapes.push(Shape::One(false)),
        }
    }

    load_level(db, related, &mut flat, children).await?;

    let mut loaded = flat.into_iter();
    for (record, shape) in records.iter_mut().zip(shapes) {
        let related = match shape {
            Shape::One(true) => Related::One(loaded.next()),
            Shape::One(false) => Related::One(None),
            Shape::Many(count) => Related::Many(loaded.by_ref().take(count).collect()),
        };
        record.set_relation(name, related);
    }
    Ok(())
}
