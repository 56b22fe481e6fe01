//! SELECT list, FROM, GROUP BY, ORDER BY and LIMIT compilers

use crate::query::{FromClause, OrderDirection};

pub fn compile_columns(columns: &[String]) -> String {
    if columns.is_empty() {
        "SELECT *".to_string()
    } else {
        format!("SELECT {}", columns.join(", "))
    }
}

pub fn compile_from(from: &FromClause) -> String {
    match from {
        FromClause::Table(table) => format!("FROM {}", table),
        FromClause::Sub { query, alias } => format!("FROM ({}) as {}", query.sql, alias),
    }
}

pub fn compile_groups(groups: &[String]) -> String {
    if groups.is_empty() {
        return String::new();
    }
    format!("GROUP BY {}", groups.join(", "))
}

pub fn compile_orders(orders: &[(String, OrderDirection)]) -> String {
    if orders.is_empty() {
        return String::new();
    }
    let orders = orders
        .iter()
        .map(|(column, direction)| format!("{} {}", column, direction))
        .collect::<Vec<_>>()
        .join(", ");
    format!("ORDER BY {}", orders)
}

/// `LIMIT n` and `OFFSET n`, each only when set
pub fn compile_limit(limit: Option<u64>, offset: Option<u64>) -> String {
    let mut parts = Vec::with_capacity(2);
    if let Some(limit) = limit {
        parts.push(format!("LIMIT {}", limit));
    }
    if let Some(offset) = offset {
        parts.push(format!("OFFSET {}", offset));
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::SubQuery;

    #[test]
    fn test_limit_parts_are_independent() {
        assert_eq!(compile_limit(None, None), "");
        assert_eq!(compile_limit(Some(5), None), "LIMIT 5");
        assert_eq!(compile_limit(None, Some(10)), "OFFSET 10");
        assert_eq!(compile_limit(Some(5), Some(10)), "LIMIT 5 OFFSET 10");
    }

    #[test]
    fn test_from_subquery() {
        let from = FromClause::Sub {
            query: SubQuery::raw("SELECT post_author FROM wp_posts"),
            alias: "authors".to_string(),
        };
        assert_eq!(compile_from(&from), "FROM (SELECT post_author FROM wp_posts) as authors");
    }
}
