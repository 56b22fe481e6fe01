//! Batched BelongsToMany loading

use async_trait::async_trait;

use super::{bucket_by, collect_keys, start_query, RelationLoader};
use crate::collection::key_of;
use crate::connection::ConnectionManager;
use crate::error::OrmResult;
use crate::model::{Record, Related};
use crate::relationships::traits::apply_constraints;
use crate::relationships::{BelongsToMany, RelationConstraint, PIVOT_PARENT_KEY};

/// Loads related rows for every parent with one query joined through the
/// pivot table. Each row carries the parent key it was matched for under
/// `pivot_parent_key`.
pub struct BelongsToManyLoader {
    relation: BelongsToMany,
}

impl BelongsToManyLoader {
    pub fn new(relation: BelongsToMany) -> Self {
        Self { relation }
    }
}

#[async_trait]
impl RelationLoader for BelongsToManyLoader {
    async fn load(
        &self,
        db: &ConnectionManager,
        models: &mut [Record],
        name: &str,
        constraint: Option<&dyn RelationConstraint>,
    ) -> OrmResult<()> {
        let relation = &self.relation;
        let keys = collect_keys(models, &relation.parent_key);

        let buckets = if keys.is_empty() {
            Default::default()
        } else {
            let pivot_key = relation.qualified_foreign_pivot_key();
            let query = start_query(relation.joined_query(db)?, constraint).where_in(&pivot_key, keys);
            // added last so a constraint that replaces the SELECT list keeps the tag
            let rows = apply_constraints(query, &relation.constraints)
                .add_select(&format!("{} as {}", pivot_key, PIVOT_PARENT_KEY))
                .get()
                .await?;
            bucket_by(rows, PIVOT_PARENT_KEY)
        };

        for model in models.iter_mut() {
            let related = model
                .get_attribute(&relation.parent_key)
                .and_then(key_of)
                .and_then(|key| buckets.get(&key))
                .map(|rows| rows.clone().into())
                .unwrap_or_default();
            model.set_relation(name, Related::Many(related));
        }
        Ok(())
    }
}
