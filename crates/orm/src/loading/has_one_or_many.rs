//! Batched HasOne / HasMany loading

use async_trait::async_trait;

use super::{bucket_by, collect_keys, start_query, RelationLoader};
use crate::collection::key_of;
use crate::connection::ConnectionManager;
use crate::error::OrmResult;
use crate::model::{Record, Related};
use crate::query::QueryBuilder;
use crate::relationships::traits::apply_constraints;
use crate::relationships::{HasOneOrMany, RelationConstraint};

/// Loads child rows for every parent with one `foreign_key IN (...)` query
pub struct HasOneOrManyLoader {
    relation: HasOneOrMany,
    single: bool,
}

impl HasOneOrManyLoader {
    pub fn new(relation: HasOneOrMany, single: bool) -> Self {
        Self { relation, single }
    }
}

#[async_trait]
impl RelationLoader for HasOneOrManyLoader {
    async fn load(
        &self,
        db: &ConnectionManager,
        models: &mut [Record],
        name: &str,
        constraint: Option<&dyn RelationConstraint>,
    ) -> OrmResult<()> {
        let relation = &self.relation;
        let keys = collect_keys(models, &relation.local_key);

        let buckets = if keys.is_empty() {
            Default::default()
        } else {
            let query = start_query(QueryBuilder::for_schema(db, relation.related)?, constraint)
                .where_in(&relation.foreign_key, keys);
            let rows = apply_constraints(query, &relation.constraints)
                .get()
                .await?;
            bucket_by(rows, &relation.foreign_key)
        };

        for model in models.iter_mut() {
            let key = model.get_attribute(&relation.local_key).and_then(key_of);
            let bucket = key.and_then(|key| buckets.get(&key));
            let related = if self.single {
                Related::One(bucket.and_then(|rows| rows.first().cloned()))
            } else {
                Related::Many(bucket.map(|rows| rows.clone().into()).unwrap_or_default())
            };
            model.set_relation(name, related);
        }
        Ok(())
    }
}
