//! Query Builder ORDER BY and GROUP BY operations

use super::builder::QueryBuilder;
use super::types::OrderDirection;

impl<M> QueryBuilder<M> {
    /// Add ORDER BY clause; `"desc"` in any case sorts descending
    pub fn order_by<D: Into<OrderDirection>>(mut self, column: &str, direction: D) -> Self {
        self.state.orders.push((column.to_string(), direction.into()));
        self
    }

    /// Add ORDER BY clause (descending)
    pub fn order_by_desc(self, column: &str) -> Self {
        self.order_by(column, OrderDirection::Desc)
    }

    pub fn latest(self, column: &str) -> Self {
        self.order_by_desc(column)
    }

    pub fn oldest(self, column: &str) -> Self {
        self.order_by(column, OrderDirection::Asc)
    }

    /// Add GROUP BY clause
    pub fn group_by(mut self, column: &str) -> Self {
        self.state.groups.push(column.to_string());
        self
    }
}
