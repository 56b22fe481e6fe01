//! Table and column name normalization
//!
//! Bare names get the connection's prefix. A leading `@` opts out of
//! prefixing, as do names that already carry the base prefix and
//! database-qualified `db.table` names. Columns qualified by a declared alias
//! are left alone.

use std::collections::HashSet;

use crate::connection::Connection;

#[derive(Debug)]
pub struct TableNormalizer<'a> {
    connection: &'a Connection,
    use_global_table: bool,
    aliases: HashSet<String>,
}

impl<'a> TableNormalizer<'a> {
    pub fn new(connection: &'a Connection, use_global_table: bool) -> Self {
        Self {
            connection,
            use_global_table,
            aliases: HashSet::new(),
        }
    }

    /// Declare an alias whose qualified columns must not be prefixed
    pub fn add_alias(&mut self, alias: &str) {
        self.aliases.insert(alias.to_string());
    }

    /// Collect the alias of a `table AS alias` expression, if any
    pub fn register(&mut self, table_expression: &str) {
        if let Some((_, alias)) = split_alias(table_expression) {
            self.add_alias(alias);
        }
    }

    pub fn normalize_table(&self, table: &str) -> String {
        let table = table.trim();
        if let Some((name, alias)) = split_alias(table) {
            return format!("{} AS {}", self.normalize_table_name(name), alias);
        }
        self.normalize_table_name(table)
    }

    fn normalize_table_name(&self, table: &str) -> String {
        if let Some(raw) = table.strip_prefix('@') {
            return raw.to_string();
        }
        if table.contains('.') || table.starts_with(self.connection.base_prefix()) {
            return table.to_string();
        }
        self.connection.table_name(table, self.use_global_table)
    }

    /// Prefix the table part of `table.column`. Unqualified columns and
    /// expressions are returned unchanged.
    pub fn normalize_column(&self, column: &str) -> String {
        let Some((table, rest)) = column.split_once('.') else {
            return column.to_string();
        };
        if !is_identifier(table) {
            return column.to_string();
        }
        if let Some(raw) = table.strip_prefix('@') {
            return format!("{}.{}", raw, rest);
        }
        if self.aliases.contains(table) {
            return column.to_string();
        }
        format!("{}.{}", self.normalize_table_name(table), rest)
    }
}

/// Split `name AS alias` (case-insensitive) into its parts
pub fn split_alias(expression: &str) -> Option<(&str, &str)> {
    let lower = expression.to_ascii_lowercase();
    let index = lower.find(" as ")?;
    let name = expression[..index].trim();
    let alias = expression[index + 4..].trim();
    if name.is_empty() || alias.is_empty() {
        return None;
    }
    Some((name, alias))
}

fn is_identifier(part: &str) -> bool {
    let part = part.strip_prefix('@').unwrap_or(part);
    !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionConfig;
    use crate::testing::RecordingFactory;
    use std::sync::Arc;

    fn connection(site: Option<i64>) -> Connection {
        Connection::new("mysql", ConnectionConfig::default(), site, Arc::new(RecordingFactory::new())).unwrap()
    }

    #[test]
    fn test_tables() {
        let conn = connection(Some(2));
        let normalizer = TableNormalizer::new(&conn, false);
        assert_eq!(normalizer.normalize_table("posts"), "wp_2_posts");
        assert_eq!(normalizer.normalize_table("@custom_log"), "custom_log");
        assert_eq!(normalizer.normalize_table("wp_2_posts"), "wp_2_posts");
        assert_eq!(normalizer.normalize_table("other_db.posts"), "other_db.posts");
        assert_eq!(normalizer.normalize_table("postmeta AS pm"), "wp_2_postmeta AS pm");
        assert_eq!(normalizer.normalize_table("postmeta as pm"), "wp_2_postmeta AS pm");
    }

    #[test]
    fn test_global_tables_ignore_site() {
        let conn = connection(Some(2));
        let normalizer = TableNormalizer::new(&conn, true);
        assert_eq!(normalizer.normalize_table("users"), "wp_users");
    }

    #[test]
    fn test_columns() {
        let conn = connection(None);
        let mut normalizer = TableNormalizer::new(&conn, false);
        normalizer.register("postmeta AS pm");

        assert_eq!(normalizer.normalize_column("post_status"), "post_status");
        assert_eq!(normalizer.normalize_column("posts.ID"), "wp_posts.ID");
        assert_eq!(normalizer.normalize_column("posts.*"), "wp_posts.*");
        assert_eq!(normalizer.normalize_column("pm.meta_key"), "pm.meta_key");
        assert_eq!(normalizer.normalize_column("@t.col"), "t.col");
        assert_eq!(normalizer.normalize_column("COUNT(posts.ID)"), "COUNT(posts.ID)");
        assert_eq!(
            normalizer.normalize_column("term_relationships.object_id as pivot_parent_key"),
            "wp_term_relationships.object_id as pivot_parent_key"
        );
    }
}
