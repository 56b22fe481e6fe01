//! MySQL Backend Implementation
//!
//! Driver handles backed by a lazily connected `sqlx` MySQL pool. Compiled
//! `%s` placeholders are rewritten to `?` before binding. A transaction pins
//! one pooled connection until it is committed or rolled back.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::mysql::{MySql, MySqlArguments, MySqlPoolOptions, MySqlRow};
use sqlx::pool::PoolConnection;
use sqlx::query::Query;
use sqlx::{Column, MySqlPool, Row as SqlxRow, TypeInfo};
use tokio::sync::Mutex;

use super::core::*;
use crate::connection::Endpoint;
use crate::error::{OrmError, OrmResult};

/// Opens [`MySqlDriver`] handles
#[derive(Debug, Clone)]
pub struct MySqlDriverFactory {
    max_connections: u32,
}

impl MySqlDriverFactory {
    pub fn new() -> Self {
        Self { max_connections: 10 }
    }

    /// Upper bound of pooled connections per endpoint
    pub fn max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }
}

impl Default for MySqlDriverFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl DriverFactory for MySqlDriverFactory {
    fn connect(&self, endpoint: &Endpoint) -> OrmResult<Arc<dyn DatabaseDriver>> {
        let url = endpoint.url()?;
        let pool = MySqlPoolOptions::new()
            .max_connections(self.max_connections)
            .connect_lazy(url.as_str())
            .map_err(|e| OrmError::Connection(format!("Failed to create MySQL pool: {}", e)))?;

        tracing::info!(host = %endpoint.host, database = %endpoint.database, "opened MySQL pool");
        Ok(Arc::new(MySqlDriver::new(pool)))
    }
}

/// MySQL driver handle
pub struct MySqlDriver {
    pool: MySqlPool,
    transaction: Mutex<Option<PoolConnection<MySql>>>,
}

impl MySqlDriver {
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            pool,
            transaction: Mutex::new(None),
        }
    }

    fn prepare<'q>(sql: &'q str, params: &[Value]) -> Query<'q, MySql, MySqlArguments> {
        params
            .iter()
            .fold(sqlx::query(sql), |query, param| bind_json_value(query, param))
    }
}

#[async_trait]
impl DatabaseDriver for MySqlDriver {
    async fn fetch_all(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        let native = to_native_placeholders(sql);
        let query = Self::prepare(&native, params);

        let mut pinned = self.transaction.lock().await;
        let rows = match pinned.as_mut() {
            Some(conn) => query.fetch_all(&mut **conn).await?,
            None => {
                drop(pinned);
                query.fetch_all(&self.pool).await?
            }
        };

        rows.iter().map(decode_row).collect()
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<ExecResult> {
        let native = to_native_placeholders(sql);
        let query = Self::prepare(&native, params);

        let mut pinned = self.transaction.lock().await;
        let result = match pinned.as_mut() {
            Some(conn) => query.execute(&mut **conn).await?,
            None => {
                drop(pinned);
                query.execute(&self.pool).await?
            }
        };

        Ok(ExecResult {
            rows_affected: result.rows_affected(),
            last_insert_id: result.last_insert_id(),
        })
    }

    async fn begin(&self) -> OrmResult<()> {
        let mut pinned = self.transaction.lock().await;
        if pinned.is_some() {
            return Err(OrmError::Transaction(
                "a transaction is already active on this handle".to_string(),
            ));
        }

        let mut conn = self.pool.acquire().await?;
        sqlx::query("START TRANSACTION").execute(&mut *conn).await?;
        *pinned = Some(conn);
        Ok(())
    }

    async fn commit(&self) -> OrmResult<()> {
        let mut pinned = self.transaction.lock().await;
        let mut conn = pinned
            .take()
            .ok_or_else(|| OrmError::Transaction("no active transaction to commit".to_string()))?;
        sqlx::query("COMMIT").execute(&mut *conn).await?;
        Ok(())
    }

    async fn rollback(&self) -> OrmResult<()> {
        let mut pinned = self.transaction.lock().await;
        let mut conn = pinned
            .take()
            .ok_or_else(|| OrmError::Transaction("no active transaction to roll back".to_string()))?;
        sqlx::query("ROLLBACK").execute(&mut *conn).await?;
        Ok(())
    }

    fn driver_name(&self) -> &str {
        "mysql"
    }
}

/// Rewrite `%s` placeholders into MySQL's `?`
pub fn to_native_placeholders(sql: &str) -> String {
    replace_placeholders(sql, "%s", |_| "?".to_string())
}

fn bind_json_value<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: &Value,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if let Some(u) = n.as_u64() {
                query.bind(u)
            } else {
                query.bind(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => query.bind(s.clone()),
        other => query.bind(other.to_string()),
    }
}

fn decode_row(row: &MySqlRow) -> OrmResult<Row> {
    let mut record = Row::with_capacity(row.columns().len());
    for column in row.columns() {
        let value = decode_column(row, column.ordinal(), column.type_info().name())?;
        record.insert(column.name().to_string(), value);
    }
    Ok(record)
}

fn decode_column(row: &MySqlRow, index: usize, type_name: &str) -> OrmResult<Value> {
    let value = match type_name {
        "BOOLEAN" => row.try_get::<Option<bool>, _>(index)?.map(Value::from),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            row.try_get::<Option<i64>, _>(index)?.map(Value::from)
        }
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => row.try_get::<Option<u64>, _>(index)?.map(Value::from),
        "FLOAT" => row.try_get::<Option<f32>, _>(index)?.map(|f| Value::from(f as f64)),
        "DOUBLE" => row.try_get::<Option<f64>, _>(index)?.map(Value::from),
        "DATETIME" | "TIMESTAMP" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(index)?
            .map(|dt| Value::from(dt.format("%Y-%m-%d %H:%M:%S").to_string())),
        "DATE" => row
            .try_get::<Option<chrono::NaiveDate>, _>(index)?
            .map(|d| Value::from(d.format("%Y-%m-%d").to_string())),
        "TIME" => row
            .try_get::<Option<chrono::NaiveTime>, _>(index)?
            .map(|t| Value::from(t.format("%H:%M:%S").to_string())),
        "JSON" => row.try_get::<Option<Value>, _>(index)?,
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" => row
            .try_get::<Option<Vec<u8>>, _>(index)?
            .map(|bytes| Value::from(String::from_utf8_lossy(&bytes).into_owned())),
        "NULL" => None,
        _ => row.try_get_unchecked::<Option<String>, _>(index)?.map(Value::from),
    };

    Ok(value.unwrap_or(Value::Null))
}
