//! BelongsToMany - related rows reached through a pivot table

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::traits::{QueryableRelation, RelationConstraint};
use crate::connection::ConnectionManager;
use crate::error::OrmResult;
use crate::model::{Record, Schema};
use crate::query::QueryBuilder;

/// Alias under which batched loads select the pivot's parent key
pub const PIVOT_PARENT_KEY: &str = "pivot_parent_key";

/// Many-to-many relation. Pivot rows pair `foreign_pivot_key` (the parent's
/// `parent_key`) with `related_pivot_key` (the related row's `related_key`).
#[derive(Clone)]
pub struct BelongsToMany {
    pub(crate) related: Schema,
    pub(crate) pivot_table: String,
    pub(crate) foreign_pivot_key: String,
    pub(crate) related_pivot_key: String,
    pub(crate) parent_key: String,
    pub(crate) related_key: String,
    pub(crate) parent_value: Option<Value>,
    pub(crate) constraints: Vec<Arc<dyn RelationConstraint>>,
}

impl BelongsToMany {
    pub fn new(
        related: Schema,
        pivot_table: &str,
        foreign_pivot_key: &str,
        related_pivot_key: &str,
        parent_key: &str,
        parent_value: Option<Value>,
    ) -> Self {
        Self {
            related,
            pivot_table: pivot_table.to_string(),
            foreign_pivot_key: foreign_pivot_key.to_string(),
            related_pivot_key: related_pivot_key.to_string(),
            parent_key: parent_key.to_string(),
            related_key: related.primary_key.to_string(),
            parent_value,
            constraints: Vec::new(),
        }
    }

    /// Join on a related column other than the primary key
    pub fn related_key(mut self, related_key: &str) -> Self {
        self.related_key = related_key.to_string();
        self
    }

    pub fn pivot_table(&self) -> &str {
        &self.pivot_table
    }

    pub fn parent_key(&self) -> &str {
        &self.parent_key
    }

    /// Pivot column holding the parent key, qualified by the pivot table
    pub fn qualified_foreign_pivot_key(&self) -> String {
        format!("{}.{}", self.pivot_table, self.foreign_pivot_key)
    }

    /// Related rows joined to their pivot rows
    pub(crate) fn joined_query(&self, db: &ConnectionManager) -> OrmResult<QueryBuilder<Record>> {
        let related = self.related.table;
        Ok(QueryBuilder::for_schema(db, self.related)?
            .select(&format!("{}.*", related))
            .join(
                &self.pivot_table,
                &format!("{}.{}", related, self.related_key),
                &format!("{}.{}", self.pivot_table, self.related_pivot_key),
            ))
    }
}

impl QueryableRelation for BelongsToMany {
    fn related_schema(&self) -> Schema {
        self.related
    }

    fn constraints(&self) -> &[Arc<dyn RelationConstraint>] {
        &self.constraints
    }

    fn constraints_mut(&mut self) -> &mut Vec<Arc<dyn RelationConstraint>> {
        &mut self.constraints
    }

    fn base_query(&self, db: &ConnectionManager) -> OrmResult<QueryBuilder<Record>> {
        let query = self.joined_query(db)?;
        let pivot_key = self.qualified_foreign_pivot_key();
        Ok(match self.parent_value.as_ref().filter(|v| !v.is_null()) {
            Some(value) => query.where_eq(&pivot_key, value.clone()),
            None => query.where_in(&pivot_key, Vec::<Value>::new()),
        })
    }
}

impl fmt::Debug for BelongsToMany {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BelongsToMany")
            .field("related", &self.related.table)
            .field("pivot_table", &self.pivot_table)
            .field("foreign_pivot_key", &self.foreign_pivot_key)
            .field("related_pivot_key", &self.related_pivot_key)
            .field("parent_value", &self.parent_value)
            .field("constraints", &self.constraints.len())
            .finish()
    }
}
