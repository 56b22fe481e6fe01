//! Query Builder SELECT operations

use super::builder::QueryBuilder;
use super::types::{FromClause, SubQuery};

impl<M> QueryBuilder<M> {
    /// Replace the SELECT list with comma-separated fields
    pub fn select(mut self, fields: &str) -> Self {
        self.state.columns.clear();
        self.add_select(fields)
    }

    /// Append comma-separated fields to the SELECT list
    pub fn add_select(mut self, fields: &str) -> Self {
        self.state.columns.extend(
            fields
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty() && *f != "*")
                .map(str::to_string),
        );
        self
    }

    /// Append an expression verbatim
    pub fn select_raw(mut self, expression: &str) -> Self {
        self.state.columns.push(expression.to_string());
        self
    }

    /// Select from a subquery instead of the model table
    pub fn from_sub<S: Into<SubQuery>>(mut self, query: S, alias: &str) -> Self {
        self.state.from = FromClause::Sub {
            query: query.into(),
            alias: alias.to_string(),
        };
        self
    }
}
