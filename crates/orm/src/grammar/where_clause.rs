//! WHERE compiler

use crate::query::WhereClause;

/// Compile a WHERE list, or nothing when it is empty
pub fn compile_wheres(wheres: &[WhereClause], placeholder: &str) -> String {
    if wheres.is_empty() {
        return String::new();
    }
    format!("WHERE {}", compile_conditions(wheres, placeholder))
}

/// The conditions without the leading keyword. The first clause never gets a
/// connector, whatever it stores.
pub fn compile_conditions(wheres: &[WhereClause], placeholder: &str) -> String {
    let mut sql = String::new();
    for (index, clause) in wheres.iter().enumerate() {
        if index > 0 {
            sql.push(' ');
            sql.push_str(&clause.boolean().to_string());
            sql.push(' ');
        }
        sql.push_str(&compile_clause(clause, placeholder));
    }
    sql
}

fn compile_clause(clause: &WhereClause, placeholder: &str) -> String {
    match clause {
        WhereClause::Basic { column, operator, .. } => {
            format!("{} {} {}", column, operator, placeholder)
        }
        // An empty list can never match
        WhereClause::In { values, .. } if values.is_empty() => "0 = 1".to_string(),
        WhereClause::NotIn { values, .. } if values.is_empty() => "1 = 1".to_string(),
        WhereClause::In { column, values, .. } => {
            format!("{} IN ({})", column, placeholders(values.len(), placeholder))
        }
        WhereClause::NotIn { column, values, .. } => {
            format!("{} NOT IN ({})", column, placeholders(values.len(), placeholder))
        }
        WhereClause::InSub { column, query, .. } => format!("{} IN ({})", column, query.sql),
        WhereClause::NotInSub { column, query, .. } => format!("{} NOT IN ({})", column, query.sql),
        WhereClause::Exists { query, .. } => format!("EXISTS ({})", query.sql),
        WhereClause::NotExists { query, .. } => format!("NOT EXISTS ({})", query.sql),
        WhereClause::Null { column, .. } => format!("{} IS NULL", column),
        WhereClause::NotNull { column, .. } => format!("{} IS NOT NULL", column),
        WhereClause::Nested { clauses, .. } => {
            let inner = compile_wheres(clauses, placeholder);
            let inner = inner.strip_prefix("WHERE ").unwrap_or(&inner);
            format!("({})", inner)
        }
    }
}

fn placeholders(count: usize, placeholder: &str) -> String {
    vec![placeholder; count].join(", ")
}
