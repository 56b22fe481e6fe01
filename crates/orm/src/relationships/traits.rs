//! Relationship Traits - Constraints and the query surface shared by every
//! relation kind

use std::sync::Arc;

use serde_json::Value;

use crate::collection::Collection;
use crate::connection::ConnectionManager;
use crate::error::OrmResult;
use crate::model::{Entity, Record, Schema};
use crate::query::{OrderDirection, QueryBuilder, QueryOperator};

/// Extra filtering applied to a relation's query.
///
/// Constraints are stored on the relation itself, so the batched eager
/// loaders reapply the same filters a lazy load would.
pub trait RelationConstraint: Send + Sync {
    fn apply(&self, query: QueryBuilder<Record>) -> QueryBuilder<Record>;
}

impl<F> RelationConstraint for F
where
    F: Fn(QueryBuilder<Record>) -> QueryBuilder<Record> + Send + Sync,
{
    fn apply(&self, query: QueryBuilder<Record>) -> QueryBuilder<Record> {
        self(query)
    }
}

/// Apply constraints in declaration order
pub(crate) fn apply_constraints(
    query: QueryBuilder<Record>,
    constraints: &[Arc<dyn RelationConstraint>],
) -> QueryBuilder<Record> {
    constraints
        .iter()
        .fold(query, |query, constraint| constraint.apply(query))
}

/// Fluent filters and terminal calls for a single parent's relation
pub trait QueryableRelation: Sized {
    fn related_schema(&self) -> Schema;

    fn constraints(&self) -> &[Arc<dyn RelationConstraint>];

    fn constraints_mut(&mut self) -> &mut Vec<Arc<dyn RelationConstraint>>;

    /// Query for the parent's related rows before any constraint
    fn base_query(&self, db: &ConnectionManager) -> OrmResult<QueryBuilder<Record>>;

    fn constrain<C: RelationConstraint + 'static>(mut self, constraint: C) -> Self {
        self.constraints_mut().push(Arc::new(constraint));
        self
    }

    fn where_eq<V: Into<Value>>(self, column: &str, value: V) -> Self {
        self.where_op(column, QueryOperator::Equal, value)
    }

    fn where_op<V: Into<Value>>(self, column: &str, operator: QueryOperator, value: V) -> Self {
        let column = column.to_string();
        let value = value.into();
        self.constrain(move |query: QueryBuilder<Record>| {
            query.where_op(&column, operator, value.clone())
        })
    }

    fn where_in<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let column = column.to_string();
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.constrain(move |query: QueryBuilder<Record>| query.where_in(&column, values.clone()))
    }

    fn where_null(self, column: &str) -> Self {
        let column = column.to_string();
        self.constrain(move |query: QueryBuilder<Record>| query.where_null(&column))
    }

    fn order_by<D: Into<OrderDirection>>(self, column: &str, direction: D) -> Self {
        let column = column.to_string();
        let direction = direction.into();
        self.constrain(move |query: QueryBuilder<Record>| query.order_by(&column, direction))
    }

    fn limit(self, count: u64) -> Self {
        self.constrain(move |query: QueryBuilder<Record>| query.limit(count))
    }

    /// The constrained query, hydrating `T`
    fn query<T>(&self, db: &ConnectionManager) -> OrmResult<QueryBuilder<T>> {
        let query = apply_constraints(self.base_query(db)?, self.constraints());
        Ok(query.cast())
    }

    async fn get<T: Entity>(&self, db: &ConnectionManager) -> OrmResult<Collection<T>> {
        self.query::<T>(db)?.get().await
    }

    async fn first<T: Entity>(&self, db: &ConnectionManager) -> OrmResult<Option<T>> {
        self.query::<T>(db)?.first().await
    }
}
