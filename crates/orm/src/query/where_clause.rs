//! Query Builder WHERE clause operations

use serde_json::Value;

use super::builder::QueryBuilder;
use super::types::*;

impl<M> QueryBuilder<M> {
    fn push_where(mut self, clause: WhereClause) -> Self {
        self.state.wheres.push(clause);
        self
    }

    fn push_basic(self, column: &str, operator: QueryOperator, value: Value, boolean: Boolean) -> Self {
        self.push_where(WhereClause::Basic {
            column: column.to_string(),
            operator,
            value,
            boolean,
        })
    }

    /// Add WHERE condition with equality
    pub fn where_eq<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.push_basic(column, QueryOperator::Equal, value.into(), Boolean::And)
    }

    /// Add WHERE condition with an explicit operator
    pub fn where_op<T: Into<Value>>(self, column: &str, operator: QueryOperator, value: T) -> Self {
        self.push_basic(column, operator, value.into(), Boolean::And)
    }

    pub fn where_ne<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.where_op(column, QueryOperator::NotEqual, value)
    }

    pub fn where_gt<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.where_op(column, QueryOperator::GreaterThan, value)
    }

    pub fn where_gte<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.where_op(column, QueryOperator::GreaterThanOrEqual, value)
    }

    pub fn where_lt<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.where_op(column, QueryOperator::LessThan, value)
    }

    pub fn where_lte<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.where_op(column, QueryOperator::LessThanOrEqual, value)
    }

    pub fn where_like(self, column: &str, pattern: &str) -> Self {
        self.where_op(column, QueryOperator::Like, pattern)
    }

    /// Add OR WHERE condition with equality
    pub fn or_where<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.push_basic(column, QueryOperator::Equal, value.into(), Boolean::Or)
    }

    pub fn or_where_op<T: Into<Value>>(self, column: &str, operator: QueryOperator, value: T) -> Self {
        self.push_basic(column, operator, value.into(), Boolean::Or)
    }

    /// One equality condition per pair
    pub fn where_all<I, K, V>(self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        pairs
            .into_iter()
            .fold(self, |query, (column, value)| query.where_eq(column.as_ref(), value))
    }

    /// WHERE column IN (...). An empty list matches nothing.
    pub fn where_in<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.push_where(WhereClause::In {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
            boolean: Boolean::And,
        })
    }

    pub fn or_where_in<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.push_where(WhereClause::In {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
            boolean: Boolean::Or,
        })
    }

    /// WHERE column NOT IN (...). An empty list matches everything.
    pub fn where_not_in<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.push_where(WhereClause::NotIn {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
            boolean: Boolean::And,
        })
    }

    /// WHERE column IN (subquery); a builder's bindings are spliced in
    pub fn where_in_sub<S: Into<SubQuery>>(self, column: &str, query: S) -> Self {
        self.push_where(WhereClause::InSub {
            column: column.to_string(),
            query: query.into(),
            boolean: Boolean::And,
        })
    }

    pub fn where_not_in_sub<S: Into<SubQuery>>(self, column: &str, query: S) -> Self {
        self.push_where(WhereClause::NotInSub {
            column: column.to_string(),
            query: query.into(),
            boolean: Boolean::And,
        })
    }

    pub fn where_exists<S: Into<SubQuery>>(self, query: S) -> Self {
        self.push_where(WhereClause::Exists {
            query: query.into(),
            boolean: Boolean::And,
        })
    }

    pub fn where_not_exists<S: Into<SubQuery>>(self, query: S) -> Self {
        self.push_where(WhereClause::NotExists {
            query: query.into(),
            boolean: Boolean::And,
        })
    }

    pub fn where_null(self, column: &str) -> Self {
        self.push_where(WhereClause::Null {
            column: column.to_string(),
            boolean: Boolean::And,
        })
    }

    pub fn where_not_null(self, column: &str) -> Self {
        self.push_where(WhereClause::NotNull {
            column: column.to_string(),
            boolean: Boolean::And,
        })
    }

    pub fn or_where_null(self, column: &str) -> Self {
        self.push_where(WhereClause::Null {
            column: column.to_string(),
            boolean: Boolean::Or,
        })
    }

    pub fn or_where_not_null(self, column: &str) -> Self {
        self.push_where(WhereClause::NotNull {
            column: column.to_string(),
            boolean: Boolean::Or,
        })
    }

    /// Parenthesized group of conditions built on a fresh builder
    pub fn where_group<F>(self, group: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        self.push_group(group, Boolean::And)
    }

    pub fn or_where_group<F>(self, group: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        self.push_group(group, Boolean::Or)
    }

    fn push_group<F>(self, group: F, boolean: Boolean) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        let nested = group(self.fresh());
        if nested.state.wheres.is_empty() {
            return self;
        }
        self.push_where(WhereClause::Nested {
            clauses: nested.state.wheres,
            boolean,
        })
    }
}
