//! Query Builder eager loading requests

use std::sync::Arc;

use super::builder::QueryBuilder;
use crate::loading::EagerLoad;
use crate::relationships::RelationConstraint;

impl<M> QueryBuilder<M> {
    /// Eager load a relation; `"author.meta"` loads `author`, then `meta` on
    /// every loaded author
    pub fn with(self, relation: &str) -> Self {
        self.push_eager(relation, None)
    }

    pub fn with_many<I, S>(self, relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        relations
            .into_iter()
            .fold(self, |query, relation| query.with(relation.as_ref()))
    }

    /// Eager load a relation with extra constraints on its query. For a
    /// nested path only the last segment is constrained.
    pub fn with_constraint<C>(self, relation: &str, constraint: C) -> Self
    where
        C: RelationConstraint + 'static,
    {
        self.push_eager(relation, Some(Arc::new(constraint)))
    }

    fn push_eager(mut self, relation: &str, constraint: Option<Arc<dyn RelationConstraint>>) -> Self {
        let relation = relation.trim();
        if relation.is_empty() {
            return self;
        }
        match self.eager.iter_mut().find(|load| load.name == relation) {
            Some(existing) => {
                if constraint.is_some() {
                    existing.constraint = constraint;
                }
            }
            None => self.eager.push(EagerLoad {
                name: relation.to_string(),
                constraint,
            }),
        }
        self
    }

    /// Relation paths requested for eager loading
    pub fn eager_loads(&self) -> Vec<&str> {
        self.eager.iter().map(|load| load.name.as_str()).collect()
    }
}
