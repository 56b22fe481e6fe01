//! Relationships Module - relation definitions and their single-parent queries
//!
//! A [`Relation`] is built by a model from its own attributes. Called on its
//! own it queries the related rows of that one parent; the loaders in
//! [`crate::loading`] reuse the same definition to hydrate many parents at
//! once.

pub mod belongs_to;
pub mod belongs_to_many;
pub mod has_one_many;
pub mod traits;

use std::sync::Arc;

pub use belongs_to::BelongsTo;
pub use belongs_to_many::{BelongsToMany, PIVOT_PARENT_KEY};
pub use has_one_many::HasOneOrMany;
pub use traits::{QueryableRelation, RelationConstraint};

use crate::connection::ConnectionManager;
use crate::error::OrmResult;
use crate::model::{Record, Related, Schema};
use crate::query::QueryBuilder;

/// A declared relation of one parent model
#[derive(Debug, Clone)]
pub enum Relation {
    HasOne(HasOneOrMany),
    HasMany(HasOneOrMany),
    BelongsTo(BelongsTo),
    BelongsToMany(BelongsToMany),
}

impl Relation {
    /// Whether results are a collection rather than a single model
    pub fn is_many(&self) -> bool {
        matches!(self, Relation::HasMany(_) | Relation::BelongsToMany(_))
    }

    /// Run the relation for its parent and wrap the result for caching
    pub async fn get_results(&self, db: &ConnectionManager) -> OrmResult<Related> {
        if self.is_many() {
            Ok(Related::Many(self.get::<Record>(db).await?))
        } else {
            Ok(Related::One(self.first::<Record>(db).await?))
        }
    }
}

impl QueryableRelation for Relation {
    fn related_schema(&self) -> Schema {
        match self {
            Relation::HasOne(r) | Relation::HasMany(r) => r.related_schema(),
            Relation::BelongsTo(r) => r.related_schema(),
            Relation::BelongsToMany(r) => r.related_schema(),
        }
    }

    fn constraints(&self) -> &[Arc<dyn RelationConstraint>] {
        match self {
            Relation::HasOne(r) | Relation::HasMany(r) => r.constraints(),
            Relation::BelongsTo(r) => r.constraints(),
            Relation::BelongsToMany(r) => r.constraints(),
        }
    }

    fn constraints_mut(&mut self) -> &mut Vec<Arc<dyn RelationConstraint>> {
        match self {
            Relation::HasOne(r) | Relation::HasMany(r) => r.constraints_mut(),
            Relation::BelongsTo(r) => r.constraints_mut(),
            Relation::BelongsToMany(r) => r.constraints_mut(),
        }
    }

    fn base_query(&self, db: &ConnectionManager) -> OrmResult<QueryBuilder<Record>> {
        match self {
            Relation::HasOne(r) | Relation::HasMany(r) => r.base_query(db),
            Relation::BelongsTo(r) => r.base_query(db),
            Relation::BelongsToMany(r) => r.base_query(db),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_manager, CallKind, RecordingFactory};
    use serde_json::{json, Value};

    fn comments(parent: Option<Value>) -> Relation {
        Relation::HasMany(HasOneOrMany::new(
            Schema::untyped("comments", "comment_ID"),
            "comment_post_ID",
            "ID",
            parent,
        ))
    }

    #[test]
    fn test_has_many_query() {
        let (db, _) = test_manager(RecordingFactory::new());
        let query = comments(Some(json!(7)))
            .where_eq("comment_approved", "1")
            .query::<Record>(&db)
            .unwrap();

        assert_eq!(
            query.to_sql(),
            "SELECT * FROM wp_comments WHERE comment_post_ID = %s AND comment_approved = %s"
        );
        assert_eq!(query.get_bindings(), vec![json!(7), json!("1")]);
    }

    #[test]
    fn test_null_parent_key_matches_nothing() {
        let (db, _) = test_manager(RecordingFactory::new());
        let query = comments(None).query::<Record>(&db).unwrap();
        assert_eq!(query.to_sql(), "SELECT * FROM wp_comments WHERE 0 = 1");
        assert!(query.get_bindings().is_empty());
    }

    #[test]
    fn test_belongs_to_query() {
        let (db, _) = test_manager(RecordingFactory::new());
        let relation = BelongsTo::new(Schema::untyped("users", "ID"), "post_author", "ID", Some(json!("5")));
        let query = relation.query::<Record>(&db).unwrap();
        assert_eq!(query.to_sql(), "SELECT * FROM wp_users WHERE ID = %s");
        assert_eq!(query.get_bindings(), vec![json!("5")]);
    }

    #[test]
    fn test_belongs_to_many_joins_pivot() {
        let (db, _) = test_manager(RecordingFactory::new());
        let relation = BelongsToMany::new(
            Schema::untyped("term_taxonomy", "term_taxonomy_id"),
            "term_relationships",
            "object_id",
            "term_taxonomy_id",
            "ID",
            Some(json!(12)),
        )
        .where_eq("term_taxonomy.taxonomy", "category");

        let query = relation.query::<Record>(&db).unwrap();
        assert_eq!(
            query.to_sql(),
            "SELECT wp_term_taxonomy.* FROM wp_term_taxonomy \
             INNER JOIN wp_term_relationships ON wp_term_taxonomy.term_taxonomy_id = wp_term_relationships.term_taxonomy_id \
             WHERE wp_term_relationships.object_id = %s AND wp_term_taxonomy.taxonomy = %s"
        );
        assert_eq!(query.get_bindings(), vec![json!(12), json!("category")]);
    }

    #[tokio::test]
    async fn test_get_results_shape() {
        let factory = RecordingFactory::with_responder(|_, _| {
            vec![crate::testing::row([("comment_ID", json!(1)), ("comment_post_ID", json!(7))])]
        });
        let (db, factory) = test_manager(factory);

        let many = comments(Some(json!(7))).get_results(&db).await.unwrap();
        assert_eq!(many.as_many().map(|c| c.len()), Some(1));

        let one = Relation::HasOne(HasOneOrMany::new(
            Schema::untyped("comments", "comment_ID"),
            "comment_post_ID",
            "ID",
            Some(json!(7)),
        ))
        .get_results(&db)
        .await
        .unwrap();
        assert!(one.as_one().is_some());

        let calls = factory.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|c| c.kind == CallKind::Select));
        assert!(calls[1].sql.ends_with("LIMIT 1"));
    }
}
