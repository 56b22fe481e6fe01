//! Batched BelongsTo loading

use async_trait::async_trait;

use super::{collect_keys, start_query, RelationLoader};
use crate::collection::key_of;
use crate::connection::ConnectionManager;
use crate::error::OrmResult;
use crate::model::{Record, Related};
use crate::query::QueryBuilder;
use crate::relationships::traits::apply_constraints;
use crate::relationships::{BelongsTo, RelationConstraint};

/// Loads owners with one `owner_key IN (...)` query
pub struct BelongsToLoader {
    relation: BelongsTo,
}

impl BelongsToLoader {
    pub fn new(relation: BelongsTo) -> Self {
        Self { relation }
    }
}

#[async_trait]
impl RelationLoader for BelongsToLoader {
    async fn load(
        &self,
        db: &ConnectionManager,
        models: &mut [Record],
        name: &str,
        constraint: Option<&dyn RelationConstraint>,
    ) -> OrmResult<()> {
        let relation = &self.relation;
        let keys = collect_keys(models, &relation.foreign_key);

        let owners = if keys.is_empty() {
            Default::default()
        } else {
            let query = start_query(QueryBuilder::for_schema(db, relation.related)?, constraint)
                .where_in(&relation.owner_key, keys);
            apply_constraints(query, &relation.constraints)
                .get()
                .await?
        };
        let owners = owners.key_by(&relation.owner_key);

        for model in models.iter_mut() {
            let owner = model
                .get_attribute(&relation.foreign_key)
                .and_then(key_of)
                .and_then(|key| owners.get(&key))
                .map(|owner| (*owner).clone());
            model.set_relation(name, Related::One(owner));
        }
        Ok(())
    }
}
