//! SQL Grammar
//!
//! A [`Grammar`] turns accumulated clause state into dialect-specific SQL.
//! Compilers are pure: they never perform I/O or touch the builder.

pub mod join;
pub mod select;
pub mod where_clause;

use std::fmt;

use crate::query::QueryState;

/// Placeholder emitted for every bound value
pub const PLACEHOLDER: &str = "%s";

/// Strategy turning clause state into SQL text
pub trait Grammar: Send + Sync + fmt::Debug {
    fn placeholder(&self) -> &str {
        PLACEHOLDER
    }

    /// SELECT list, FROM, JOIN, WHERE, GROUP BY, ORDER BY, LIMIT/OFFSET,
    /// in that order, joined by single spaces
    fn compile_select(&self, query: &QueryState) -> String;

    /// Outer count over a grouped query
    fn compile_count_wrapper(&self, inner_sql: &str) -> String {
        format!("SELECT COUNT(*) as count FROM ({}) as count_wrapper", inner_sql)
    }

    fn compile_insert(&self, table: &str, columns: &[String]) -> String {
        let placeholders = vec![self.placeholder(); columns.len()].join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            columns.join(", "),
            placeholders
        )
    }

    fn compile_update(&self, table: &str, columns: &[String], key: &str) -> String {
        let sets = columns
            .iter()
            .map(|column| format!("{} = {}", column, self.placeholder()))
            .collect::<Vec<_>>()
            .join(", ");
        format!("UPDATE {} SET {} WHERE {} = {}", table, sets, key, self.placeholder())
    }

    fn compile_delete(&self, table: &str, key: &str) -> String {
        format!("DELETE FROM {} WHERE {} = {}", table, key, self.placeholder())
    }
}

/// MySQL-flavoured grammar
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlGrammar;

impl MySqlGrammar {
    pub fn new() -> Self {
        Self
    }
}

impl Grammar for MySqlGrammar {
    fn compile_select(&self, query: &QueryState) -> String {
        let placeholder = self.placeholder();
        let parts = [
            select::compile_columns(&query.columns),
            select::compile_from(&query.from),
            join::compile_joins(&query.joins),
            where_clause::compile_wheres(&query.wheres, placeholder),
            select::compile_groups(&query.groups),
            select::compile_orders(&query.orders),
            select::compile_limit(query.limit, query.offset),
        ];

        parts
            .iter()
            .filter(|part| !part.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}
