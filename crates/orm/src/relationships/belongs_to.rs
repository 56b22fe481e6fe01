//! BelongsTo - the child row carries the owner's key

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::traits::{QueryableRelation, RelationConstraint};
use crate::connection::ConnectionManager;
use crate::error::OrmResult;
use crate::model::{Record, Schema};
use crate::query::QueryBuilder;

/// The child's `foreign_key` holds the owner's `owner_key`
#[derive(Clone)]
pub struct BelongsTo {
    pub(crate) related: Schema,
    pub(crate) foreign_key: String,
    pub(crate) owner_key: String,
    pub(crate) child_value: Option<Value>,
    pub(crate) constraints: Vec<Arc<dyn RelationConstraint>>,
}

impl BelongsTo {
    pub fn new(related: Schema, foreign_key: &str, owner_key: &str, child_value: Option<Value>) -> Self {
        Self {
            related,
            foreign_key: foreign_key.to_string(),
            owner_key: owner_key.to_string(),
            child_value,
            constraints: Vec::new(),
        }
    }

    pub fn foreign_key(&self) -> &str {
        &self.foreign_key
    }

    pub fn owner_key(&self) -> &str {
        &self.owner_key
    }
}

impl QueryableRelation for BelongsTo {
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
        Ok(match self.child_value.as_ref().filter(|v| !v.is_null()) {
            Some(value) => query.where_eq(&self.owner_key, value.clone()),
            None => query.where_in(&self.owner_key, Vec::<Value>::new()),
        })
    }
}

impl fmt::Debug for BelongsTo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BelongsTo")
            .field("related", &self.related.table)
            .field("foreign_key", &self.foreign_key)
            .field("owner_key", &self.owner_key)
            .field("child_value", &self.child_value)
            .field("constraints", &self.constraints.len())
            .finish()
    }
}
