//! Query Builder JOIN operations

use super::builder::QueryBuilder;
use super::join_clause::{JoinClause, JoinSpec, JoinType};
use super::types::QueryOperator;

impl<M> QueryBuilder<M> {
    fn push_simple_join(mut self, join_type: JoinType, table: &str, first: &str, second: &str) -> Self {
        self.state.joins.push(JoinSpec::Simple {
            join_type,
            table: table.to_string(),
            first: first.to_string(),
            operator: QueryOperator::Equal,
            second: second.to_string(),
        });
        self
    }

    /// INNER JOIN table ON first = second
    pub fn join(self, table: &str, first: &str, second: &str) -> Self {
        self.push_simple_join(JoinType::Inner, table, first, second)
    }

    /// LEFT JOIN table ON first = second
    pub fn left_join(self, table: &str, first: &str, second: &str) -> Self {
        self.push_simple_join(JoinType::Left, table, first, second)
    }

    /// RIGHT JOIN table ON first = second
    pub fn right_join(self, table: &str, first: &str, second: &str) -> Self {
        self.push_simple_join(JoinType::Right, table, first, second)
    }

    /// JOIN with several ON conditions built through a [`JoinClause`]
    pub fn join_with<F>(mut self, join_type: JoinType, table: &str, build: F) -> Self
    where
        F: FnOnce(JoinClause) -> JoinClause,
    {
        let clause = build(JoinClause::new(join_type, table));
        self.state.joins.push(JoinSpec::Clause(clause));
        self
    }

    pub fn left_join_with<F>(self, table: &str, build: F) -> Self
    where
        F: FnOnce(JoinClause) -> JoinClause,
    {
        self.join_with(JoinType::Left, table, build)
    }
}
