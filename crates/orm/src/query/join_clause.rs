//! JOIN descriptors and the multi-condition join builder

use std::fmt;

use serde_json::Value;

use super::types::{Boolean, QueryOperator};

/// Join type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Cross,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinType::Inner => write!(f, "INNER"),
            JoinType::Left => write!(f, "LEFT"),
            JoinType::Right => write!(f, "RIGHT"),
            JoinType::Cross => write!(f, "CROSS"),
        }
    }
}

/// One ON condition
#[derive(Debug, Clone, PartialEq)]
pub enum JoinCondition {
    /// Column compared to column
    Column {
        first: String,
        operator: QueryOperator,
        second: String,
        boolean: Boolean,
    },
    /// Column compared to a literal, inlined escaped into the SQL
    Value {
        column: String,
        operator: QueryOperator,
        value: Value,
        boolean: Boolean,
    },
}

impl JoinCondition {
    pub fn boolean(&self) -> Boolean {
        match self {
            JoinCondition::Column { boolean, .. } | JoinCondition::Value { boolean, .. } => *boolean,
        }
    }
}

/// Builder for a single JOIN with any number of ON conditions
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub join_type: JoinType,
    pub table: String,
    pub conditions: Vec<JoinCondition>,
}

impl JoinClause {
    pub fn new(join_type: JoinType, table: impl Into<String>) -> Self {
        Self {
            join_type,
            table: table.into(),
            conditions: Vec::new(),
        }
    }

    /// `first = second`
    pub fn on(self, first: &str, second: &str) -> Self {
        self.on_op(first, QueryOperator::Equal, second)
    }

    pub fn on_op(self, first: &str, operator: QueryOperator, second: &str) -> Self {
        self.push_column(first, operator, second, Boolean::And)
    }

    pub fn or_on(self, first: &str, second: &str) -> Self {
        self.push_column(first, QueryOperator::Equal, second, Boolean::Or)
    }

    /// `column = <literal>`; the literal is escaped into the SQL, not bound
    pub fn where_eq<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.push_value(column, QueryOperator::Equal, value.into(), Boolean::And)
    }

    pub fn where_op<T: Into<Value>>(self, column: &str, operator: QueryOperator, value: T) -> Self {
        self.push_value(column, operator, value.into(), Boolean::And)
    }

    pub fn or_where<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.push_value(column, QueryOperator::Equal, value.into(), Boolean::Or)
    }

    fn push_column(mut self, first: &str, operator: QueryOperator, second: &str, boolean: Boolean) -> Self {
        self.conditions.push(JoinCondition::Column {
            first: first.to_string(),
            operator,
            second: second.to_string(),
            boolean,
        });
        self
    }

    fn push_value(mut self, column: &str, operator: QueryOperator, value: Value, boolean: Boolean) -> Self {
        self.conditions.push(JoinCondition::Value {
            column: column.to_string(),
            operator,
            value,
            boolean,
        });
        self
    }
}

/// A stored join: the structured clause, or the flat single-equality form
#[derive(Debug, Clone, PartialEq)]
pub enum JoinSpec {
    Clause(JoinClause),
    Simple {
        join_type: JoinType,
        table: String,
        first: String,
        operator: QueryOperator,
        second: String,
    },
}

impl JoinSpec {
    pub fn table(&self) -> &str {
        match self {
            JoinSpec::Clause(clause) => &clause.table,
            JoinSpec::Simple { table, .. } => table,
        }
    }

    pub(crate) fn table_mut(&mut self) -> &mut String {
        match self {
            JoinSpec::Clause(clause) => &mut clause.table,
            JoinSpec::Simple { table, .. } => table,
        }
    }

    /// Rewrite every column name through `f`
    pub(crate) fn map_columns(&mut self, f: &dyn Fn(&str) -> String) {
        match self {
            JoinSpec::Clause(clause) => {
                for condition in &mut clause.conditions {
                    match condition {
                        JoinCondition::Column { first, second, .. } => {
                            *first = f(first);
                            *second = f(second);
                        }
                        JoinCondition::Value { column, .. } => *column = f(column),
                    }
                }
            }
            JoinSpec::Simple { first, second, .. } => {
                *first = f(first);
                *second = f(second);
            }
        }
    }
}
