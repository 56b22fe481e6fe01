//! Core Database Backend Abstractions
//!
//! The traits every driver implements. A [`DatabaseDriver`] is one handle to a
//! running server; a [`DriverFactory`] opens handles for resolved endpoints.
//! Compiled SQL uses `%s` placeholders and drivers translate them to their
//! native form.

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;

use crate::connection::Endpoint;
use crate::error::OrmResult;

/// One result row, column name to value, in select-list order
pub type Row = IndexMap<String, Value>;

/// Outcome of a write statement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
    pub last_insert_id: u64,
}

/// A handle able to run parameterized SQL
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Execute a query and return every row
    async fn fetch_all(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>>;

    /// Execute a statement that returns no rows
    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<ExecResult>;

    async fn begin(&self) -> OrmResult<()> {
        self.execute("START TRANSACTION", &[]).await.map(|_| ())
    }

    async fn commit(&self) -> OrmResult<()> {
        self.execute("COMMIT", &[]).await.map(|_| ())
    }

    async fn rollback(&self) -> OrmResult<()> {
        self.execute("ROLLBACK", &[]).await.map(|_| ())
    }

    /// Render a value as a safely escaped SQL literal
    fn quote(&self, value: &Value) -> String {
        quote_value(value)
    }

    /// Driver name used in logs
    fn driver_name(&self) -> &str;
}

/// Opens driver handles for resolved endpoints
pub trait DriverFactory: Send + Sync {
    fn connect(&self, endpoint: &Endpoint) -> OrmResult<Arc<dyn DatabaseDriver>>;
}

/// Escape a string for inclusion inside a single-quoted MySQL literal
pub fn escape_string(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len() + 2);
    for ch in input.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '"' => escaped.push_str("\\\""),
            '\0' => escaped.push_str("\\0"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\u{1a}' => escaped.push_str("\\Z"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Render a JSON value as an SQL literal.
///
/// NULL becomes `NULL`, booleans `1`/`0`, numbers are emitted verbatim and
/// everything else is quoted and escaped.
pub fn quote_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => "0".to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => format!("'{}'", escape_string(text)),
        other => format!("'{}'", escape_string(&other.to_string())),
    }
}

/// Replace every placeholder token outside quoted literals.
///
/// `replacement` receives the zero-based position of each placeholder.
pub fn replace_placeholders<F>(sql: &str, token: &str, mut replacement: F) -> String
where
    F: FnMut(usize) -> String,
{
    let mut output = String::with_capacity(sql.len());
    let mut quote: Option<char> = None;
    let mut position = 0;
    let mut rest = sql;

    while let Some(ch) = rest.chars().next() {
        match quote {
            Some(open) => {
                output.push(ch);
                rest = &rest[ch.len_utf8()..];
                if ch == '\\' {
                    if let Some(next) = rest.chars().next() {
                        output.push(next);
                        rest = &rest[next.len_utf8()..];
                    }
                } else if ch == open {
                    quote = None;
                }
            }
            None => {
                if !token.is_empty() && rest.starts_with(token) {
                    output.push_str(&replacement(position));
                    position += 1;
                    rest = &rest[token.len()..];
                    continue;
                }
                if ch == '\'' || ch == '"' || ch == '`' {
                    quote = Some(ch);
                }
                output.push(ch);
                rest = &rest[ch.len_utf8()..];
            }
        }
    }

    output
}

/// Count placeholder tokens outside quoted literals
pub fn count_placeholders(sql: &str, token: &str) -> usize {
    let mut count = 0;
    replace_placeholders(sql, token, |_| {
        count += 1;
        String::new()
    });
    count
}
