//! Query Builder Module - fluent SELECT builder with site-aware table names

pub mod builder;
pub mod execution;
pub mod join_clause;
pub mod joins;
pub mod normalizer;
pub mod ordering;
pub mod pagination;
pub mod select;
pub mod types;
pub mod where_clause;
pub mod with;

#[cfg(test)]
mod tests;

pub use builder::QueryBuilder;
pub use join_clause::{JoinClause, JoinCondition, JoinSpec, JoinType};
pub use normalizer::TableNormalizer;
pub use pagination::Paginator;
pub use types::{Boolean, FromClause, OrderDirection, QueryOperator, QueryState, SubQuery, WhereClause};
