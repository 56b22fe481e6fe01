//! Core Model Trait - Base definition for database entities
//!
//! A model is a typed wrapper around a [`Record`] that knows its table, its
//! primary key and its relations. [`Schema`] carries the same metadata at
//! runtime so relation queries and nested eager loads can work on untyped
//! records.

use serde_json::Value;

use super::record::{Record, Related};
use crate::collection::Collection;
use crate::connection::ConnectionManager;
use crate::error::{ModelError, OrmResult};
use crate::loading::{self, EagerLoad};
use crate::query::QueryBuilder;
use crate::relationships::{BelongsTo, BelongsToMany, HasOneOrMany, Relation};

/// Anything that can be hydrated from a [`Record`] and flattened back
pub trait Entity: From<Record> + Into<Record> + Send + Sync + 'static {}

impl<T> Entity for T where T: From<Record> + Into<Record> + Send + Sync + 'static {}

/// Resolves a relation by name for a record of some model type
pub type RelationResolver = fn(&Record, &str) -> Option<Relation>;

/// Runtime table metadata of a model type
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub table: &'static str,
    pub primary_key: &'static str,
    pub global: bool,
    pub connection: Option<&'static str>,
    resolver: RelationResolver,
}

impl Schema {
    pub fn of<M: Model>() -> Self {
        Self {
            table: M::table_name(),
            primary_key: M::primary_key_name(),
            global: M::is_global_table(),
            connection: M::connection_name(),
            resolver: resolve_relation::<M>,
        }
    }

    /// Metadata for a table without a model or relations
    pub fn untyped(table: &'static str, primary_key: &'static str) -> Self {
        Self {
            table,
            primary_key,
            global: false,
            connection: None,
            resolver: |_, _| None,
        }
    }

    /// The relation `name` as declared for `record`'s model type
    pub fn relation(&self, record: &Record, name: &str) -> Option<Relation> {
        (self.resolver)(record, name)
    }
}

fn resolve_relation<M: Model>(record: &Record, name: &str) -> Option<Relation> {
    M::from(Record::from_attributes(record.attributes().clone())).relation(name)
}

/// Core trait for database models
pub trait Model: Entity + AsRef<Record> + AsMut<Record> + Clone {
    /// Table name without prefix
    fn table_name() -> &'static str;

    /// Primary key column
    fn primary_key_name() -> &'static str {
        "ID"
    }

    /// Tables shared by every site ignore the site prefix
    fn is_global_table() -> bool {
        false
    }

    /// Named connection, `None` for the default
    fn connection_name() -> Option<&'static str> {
        None
    }

    /// The relation declared under `name`
    fn relation(&self, _name: &str) -> Option<Relation> {
        None
    }

    fn schema() -> Schema {
        Schema::of::<Self>()
    }

    // Query entry points

    fn query(db: &ConnectionManager) -> OrmResult<QueryBuilder<Self>> {
        QueryBuilder::for_schema(db, Self::schema())
    }

    /// Query after switching `db` to another site
    fn on_site(db: &ConnectionManager, site_id: i64) -> OrmResult<QueryBuilder<Self>> {
        Self::query(db)?.on_site(site_id)
    }

    /// Query on the tenant-independent table
    fn global(db: &ConnectionManager) -> OrmResult<QueryBuilder<Self>> {
        Ok(Self::query(db)?.global())
    }

    fn where_eq<T: Into<Value>>(db: &ConnectionManager, column: &str, value: T) -> OrmResult<QueryBuilder<Self>> {
        Ok(Self::query(db)?.where_eq(column, value))
    }

    fn with(db: &ConnectionManager, relation: &str) -> OrmResult<QueryBuilder<Self>> {
        Ok(Self::query(db)?.with(relation))
    }

    async fn all(db: &ConnectionManager) -> OrmResult<Collection<Self>> {
        Self::query(db)?.get().await
    }

    async fn find<K: Into<Value> + Send>(db: &ConnectionManager, id: K) -> OrmResult<Option<Self>> {
        Self::query(db)?.find(id).await
    }

    // Attribute access

    fn get_key(&self) -> Option<&Value> {
        self.as_ref().get_attribute(Self::primary_key_name())
    }

    fn get_attribute(&self, key: &str) -> Option<&Value> {
        self.as_ref().get_attribute(key)
    }

    fn set_attribute<V: Into<Value>>(&mut self, key: &str, value: V) {
        self.as_mut().set_attribute(key, value);
    }

    /// A relation resolved earlier by eager or lazy loading
    fn get_relation(&self, name: &str) -> Option<&Related> {
        self.as_ref().get_relation(name)
    }

    /// The cached single related model, typed
    fn related_one<R: Model>(&self, name: &str) -> Option<R> {
        self.get_relation(name)
            .and_then(Related::as_one)
            .map(|record| R::from(record.clone()))
    }

    /// The cached related collection, typed
    fn related_many<R: Model>(&self, name: &str) -> Option<Collection<R>> {
        self.get_relation(name)
            .and_then(Related::as_many)
            .map(|records| records.iter().cloned().map(R::from).collect())
    }

    /// The relation `name`: the cached value if resolved, otherwise its
    /// query runs once and the result is cached
    async fn resolve_relation(&mut self, db: &ConnectionManager, name: &str) -> OrmResult<&Related> {
        if !AsRef::<Record>::as_ref(&*self).relation_loaded(name) {
            let relation = self.relation(name).ok_or_else(|| {
                ModelError::Relationship(format!(
                    "Relation [{}] is not defined on [{}]",
                    name,
                    Self::table_name()
                ))
            })?;
            let related = relation.get_results(db).await?;
            self.as_mut().set_relation(name, related);
        }
        AsRef::<Record>::as_ref(&*self)
            .get_relation(name)
            .ok_or_else(|| ModelError::Relationship(format!("Relation [{}] was not cached", name)))
    }

    /// Eager load relations onto this already retrieved model
    async fn load(&mut self, db: &ConnectionManager, relations: &[&str]) -> OrmResult<()> {
        let requests: Vec<EagerLoad> = relations.iter().map(|name| EagerLoad::new(name)).collect();
        let mut records = vec![AsRef::<Record>::as_ref(&*self).clone()];
        loading::eager_load(db, Self::schema(), &mut records, &requests).await?;
        if let Some(record) = records.pop() {
            *self.as_mut() = record;
        }
        Ok(())
    }

    fn exists(&self) -> bool {
        self.as_ref().exists()
    }

    fn to_json(&self) -> Value {
        self.as_ref().to_json()
    }

    // Relation declarations

    /// Child rows whose `foreign_key` holds this model's `local_key`
    fn has_one<R: Model>(&self, foreign_key: &str, local_key: Option<&str>) -> Relation {
        Relation::HasOne(self.has_relation::<R>(foreign_key, local_key))
    }

    fn has_many<R: Model>(&self, foreign_key: &str, local_key: Option<&str>) -> Relation {
        Relation::HasMany(self.has_relation::<R>(foreign_key, local_key))
    }

    #[doc(hidden)]
    fn has_relation<R: Model>(&self, foreign_key: &str, local_key: Option<&str>) -> HasOneOrMany {
        let local_key = local_key.unwrap_or(Self::primary_key_name());
        HasOneOrMany::new(
            R::schema(),
            foreign_key,
            local_key,
            self.get_attribute(local_key).cloned(),
        )
    }

    /// The owner whose `owner_key` (default: its primary key) matches this
    /// model's `foreign_key`
    fn belongs_to<R: Model>(&self, foreign_key: &str, owner_key: Option<&str>) -> Relation {
        let owner_key = owner_key.unwrap_or(R::primary_key_name());
        Relation::BelongsTo(BelongsTo::new(
            R::schema(),
            foreign_key,
            owner_key,
            self.get_attribute(foreign_key).cloned(),
        ))
    }

    /// Related models linked through `pivot_table`
    fn belongs_to_many<R: Model>(
        &self,
        pivot_table: &str,
        foreign_pivot_key: &str,
        related_pivot_key: &str,
    ) -> Relation {
        Relation::BelongsToMany(BelongsToMany::new(
            R::schema(),
            pivot_table,
            foreign_pivot_key,
            related_pivot_key,
            Self::primary_key_name(),
            self.get_key().cloned(),
        ))
    }
}
