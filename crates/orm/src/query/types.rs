//! Query Builder types and enums

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use super::join_clause::JoinSpec;
use crate::error::ModelError;

/// Query operator enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOperator {
    Equal,
    NotEqual,
    NotEqualAlt,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Like,
    NotLike,
    Regexp,
}

impl fmt::Display for QueryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            QueryOperator::Equal => "=",
            QueryOperator::NotEqual => "!=",
            QueryOperator::NotEqualAlt => "<>",
            QueryOperator::LessThan => "<",
            QueryOperator::LessThanOrEqual => "<=",
            QueryOperator::GreaterThan => ">",
            QueryOperator::GreaterThanOrEqual => ">=",
            QueryOperator::Like => "LIKE",
            QueryOperator::NotLike => "NOT LIKE",
            QueryOperator::Regexp => "REGEXP",
        };
        write!(f, "{}", op)
    }
}

impl FromStr for QueryOperator {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "=" => Ok(QueryOperator::Equal),
            "!=" => Ok(QueryOperator::NotEqual),
            "<>" => Ok(QueryOperator::NotEqualAlt),
            "<" => Ok(QueryOperator::LessThan),
            "<=" => Ok(QueryOperator::LessThanOrEqual),
            ">" => Ok(QueryOperator::GreaterThan),
            ">=" => Ok(QueryOperator::GreaterThanOrEqual),
            "LIKE" => Ok(QueryOperator::Like),
            "NOT LIKE" => Ok(QueryOperator::NotLike),
            "REGEXP" => Ok(QueryOperator::Regexp),
            other => Err(ModelError::Query(format!("Unsupported operator '{}'", other))),
        }
    }
}

/// Connector placed before a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Boolean {
    #[default]
    And,
    Or,
}

impl fmt::Display for Boolean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Boolean::And => write!(f, "AND"),
            Boolean::Or => write!(f, "OR"),
        }
    }
}

/// Order direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderDirection::Asc => write!(f, "ASC"),
            OrderDirection::Desc => write!(f, "DESC"),
        }
    }
}

impl From<&str> for OrderDirection {
    /// `desc` in any case is descending, anything else ascending
    fn from(direction: &str) -> Self {
        if direction.trim().eq_ignore_ascii_case("desc") {
            OrderDirection::Desc
        } else {
            OrderDirection::Asc
        }
    }
}

/// Compiled SQL embedded in another query together with its bindings
#[derive(Debug, Clone, PartialEq)]
pub struct SubQuery {
    pub sql: String,
    pub bindings: Vec<Value>,
}

impl SubQuery {
    pub fn raw(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            bindings: Vec::new(),
        }
    }
}

impl From<&str> for SubQuery {
    fn from(sql: &str) -> Self {
        SubQuery::raw(sql)
    }
}

impl From<String> for SubQuery {
    fn from(sql: String) -> Self {
        SubQuery::raw(sql)
    }
}

/// One WHERE condition
#[derive(Debug, Clone, PartialEq)]
pub enum WhereClause {
    Basic {
        column: String,
        operator: QueryOperator,
        value: Value,
        boolean: Boolean,
    },
    In {
        column: String,
        values: Vec<Value>,
        boolean: Boolean,
    },
    NotIn {
        column: String,
        values: Vec<Value>,
        boolean: Boolean,
    },
    InSub {
        column: String,
        query: SubQuery,
        boolean: Boolean,
    },
    NotInSub {
        column: String,
        query: SubQuery,
        boolean: Boolean,
    },
    Exists {
        query: SubQuery,
        boolean: Boolean,
    },
    NotExists {
        query: SubQuery,
        boolean: Boolean,
    },
    Null {
        column: String,
        boolean: Boolean,
    },
    NotNull {
        column: String,
        boolean: Boolean,
    },
    Nested {
        clauses: Vec<WhereClause>,
        boolean: Boolean,
    },
}

impl WhereClause {
    pub fn boolean(&self) -> Boolean {
        match self {
            WhereClause::Basic { boolean, .. }
            | WhereClause::In { boolean, .. }
            | WhereClause::NotIn { boolean, .. }
            | WhereClause::InSub { boolean, .. }
            | WhereClause::NotInSub { boolean, .. }
            | WhereClause::Exists { boolean, .. }
            | WhereClause::NotExists { boolean, .. }
            | WhereClause::Null { boolean, .. }
            | WhereClause::NotNull { boolean, .. }
            | WhereClause::Nested { boolean, .. } => *boolean,
        }
    }

    /// Append this clause's bindings in placeholder order
    pub fn collect_bindings(&self, out: &mut Vec<Value>) {
        match self {
            WhereClause::Basic { value, .. } => out.push(value.clone()),
            WhereClause::In { values, .. } | WhereClause::NotIn { values, .. } => {
                out.extend(values.iter().cloned())
            }
            WhereClause::InSub { query, .. }
            | WhereClause::NotInSub { query, .. }
            | WhereClause::Exists { query, .. }
            | WhereClause::NotExists { query, .. } => out.extend(query.bindings.iter().cloned()),
            WhereClause::Null { .. } | WhereClause::NotNull { .. } => {}
            WhereClause::Nested { clauses, .. } => {
                for clause in clauses {
                    clause.collect_bindings(out);
                }
            }
        }
    }

    /// Rewrite every column name through `f`
    pub fn map_columns(&mut self, f: &dyn Fn(&str) -> String) {
        match self {
            WhereClause::Basic { column, .. }
            | WhereClause::In { column, .. }
            | WhereClause::NotIn { column, .. }
            | WhereClause::InSub { column, .. }
            | WhereClause::NotInSub { column, .. }
            | WhereClause::Null { column, .. }
            | WhereClause::NotNull { column, .. } => *column = f(column),
            WhereClause::Exists { .. } | WhereClause::NotExists { .. } => {}
            WhereClause::Nested { clauses, .. } => {
                for clause in clauses {
                    clause.map_columns(f);
                }
            }
        }
    }
}

/// Source of the rows
#[derive(Debug, Clone, PartialEq)]
pub enum FromClause {
    Table(String),
    Sub { query: SubQuery, alias: String },
}

/// Accumulated clause state of a SELECT, in the form the grammar compiles
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    pub columns: Vec<String>,
    pub from: FromClause,
    pub joins: Vec<JoinSpec>,
    pub wheres: Vec<WhereClause>,
    pub groups: Vec<String>,
    pub orders: Vec<(String, OrderDirection)>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl QueryState {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            columns: Vec::new(),
            from: FromClause::Table(table.into()),
            joins: Vec::new(),
            wheres: Vec::new(),
            groups: Vec::new(),
            orders: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Bindings in the order their placeholders appear: FROM subquery first,
    /// then WHERE. Join value conditions are inlined and never bound.
    pub fn bindings(&self) -> Vec<Value> {
        let mut bindings = Vec::new();
        if let FromClause::Sub { query, .. } = &self.from {
            bindings.extend(query.bindings.iter().cloned());
        }
        for clause in &self.wheres {
            clause.collect_bindings(&mut bindings);
        }
        bindings
    }
}
