//! HasOne / HasMany - child rows carry the parent's key

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::traits::{QueryableRelation, RelationConstraint};
use crate::connection::ConnectionManager;
use crate::error::OrmResult;
use crate::model::{Record, Schema};
use crate::query::QueryBuilder;

/// Relation where the related table's `foreign_key` holds the parent's
/// `local_key`
#[derive(Clone)]
pub struct HasOneOrMany {
    pub(crate) related: Schema,
    pub(crate) foreign_key: String,
    pub(crate) local_key: String,
    pub(crate) parent_value: Option<Value>,
    pub(crate) constraints: Vec<Arc<dyn RelationConstraint>>,
}

impl HasOneOrMany {
    pub fn new(related: Schema, foreign_key: &str, local_key: &str, parent_value: Option<Value>) -> Self {
        Self {
            related,
            foreign_key: foreign_key.to_string(),
            local_key: local_key.to_string(),
            parent_value,
            constraints: Vec::new(),
        }
    }

    pub fn foreign_key(&self) -> &str {
        &self.foreign_key
    }

    pub fn local_key(&self) -> &str {
        &self.local_key
    }
}

impl QueryableRelation for HasOneOrMany {
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
        let query = QueryBuilder::for_schema(db, self.related)?;
        Ok(match self.parent_value.as_ref().filter(|v| !v.is_null()) {
            Some(value) => query.where_eq(&self.foreign_key, value.clone()),
            None => query.where_in(&self.foreign_key, Vec::<Value>::new()),
        })
    }
}

impl fmt::Debug for HasOneOrMany {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HasOneOrMany")
            .field("related", &self.related.table)
            .field("foreign_key", &self.foreign_key)
            .field("local_key", &self.local_key)
            .field("parent_value", &self.parent_value)
            .field("constraints", &self.constraints.len())
            .finish()
    }
}
