//! A named connection with read/write routing and site-scoped prefixes

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde_json::Value;
use tracing::{debug, error};

use super::config::{ConnectionConfig, EndpointOverride};
use crate::backends::{DatabaseDriver, DriverFactory, ExecResult, Row};
use crate::error::{ModelError, OrmResult};
use crate::grammar::{Grammar, MySqlGrammar};

/// Which side of a read/write split a statement runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessKind::Read => write!(f, "read"),
            AccessKind::Write => write!(f, "write"),
        }
    }
}

/// Database connection bound to one site.
///
/// Driver handles are created on first use. Without a read/write split both
/// sides share one ambient handle. Reads go to the read handle even inside a
/// transaction, so a read right after a write may observe a lagging replica;
/// use [`Connection::select_from_write`] when that matters.
pub struct Connection {
    name: String,
    config: ConnectionConfig,
    site_id: Option<i64>,
    factory: Arc<dyn DriverFactory>,
    grammar: Arc<dyn Grammar>,
    ambient: OnceCell<Arc<dyn DatabaseDriver>>,
    read: OnceCell<Arc<dyn DatabaseDriver>>,
    write: OnceCell<Arc<dyn DatabaseDriver>>,
    in_transaction: AtomicBool,
}

impl Connection {
    pub fn new(
        name: impl Into<String>,
        config: ConnectionConfig,
        site_id: Option<i64>,
        factory: Arc<dyn DriverFactory>,
    ) -> OrmResult<Self> {
        let grammar: Arc<dyn Grammar> = match config.driver.to_lowercase().as_str() {
            "mysql" | "mariadb" => Arc::new(MySqlGrammar::new()),
            other => {
                return Err(ModelError::Configuration(format!(
                    "Unsupported database driver [{}]",
                    other
                )))
            }
        };

        Ok(Self {
            name: name.into(),
            config,
            site_id,
            factory,
            grammar,
            ambient: OnceCell::new(),
            read: OnceCell::new(),
            write: OnceCell::new(),
            in_transaction: AtomicBool::new(false),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn site_id(&self) -> Option<i64> {
        self.site_id
    }

    pub fn grammar(&self) -> Arc<dyn Grammar> {
        self.grammar.clone()
    }

    /// Prefix shared by every site
    pub fn base_prefix(&self) -> &str {
        &self.config.prefix
    }

    /// Prefix for site-scoped tables: `wp_` on the main site, `wp_3_` on site 3
    pub fn table_prefix(&self) -> String {
        match self.site_id {
            Some(site) if site > 1 => format!("{}{}_", self.config.prefix, site),
            _ => self.config.prefix.clone(),
        }
    }

    /// Resolve a bare table name to its prefixed form
    pub fn table_name(&self, table: &str, use_global_table: bool) -> String {
        if use_global_table {
            format!("{}{}", self.config.prefix, table)
        } else {
            format!("{}{}", self.table_prefix(), table)
        }
    }

    /// The driver handle for one side of the split
    pub fn handle(&self, kind: AccessKind) -> OrmResult<Arc<dyn DatabaseDriver>> {
        let (cell, over) = match kind {
            AccessKind::Read => (&self.read, self.config.read.as_ref()),
            AccessKind::Write => (&self.write, self.config.write.as_ref()),
        };

        match over {
            Some(over) => cell.get_or_try_init(|| self.open(kind, Some(over))).cloned(),
            None => self.ambient_handle(),
        }
    }

    fn ambient_handle(&self) -> OrmResult<Arc<dyn DatabaseDriver>> {
        self.ambient
            .get_or_try_init(|| self.open(AccessKind::Read, None))
            .cloned()
    }

    fn open(
        &self,
        kind: AccessKind,
        over: Option<&EndpointOverride>,
    ) -> OrmResult<Arc<dyn DatabaseDriver>> {
        let endpoint = self.config.endpoint_with(over);
        debug!(
            connection = %self.name,
            side = %kind,
            host = %endpoint.host,
            "opening database handle"
        );
        self.factory.connect(&endpoint)
    }

    /// Run a query on the read handle
    pub async fn select(&self, sql: &str, bindings: &[Value]) -> OrmResult<Vec<Row>> {
        self.fetch(AccessKind::Read, sql, bindings).await
    }

    /// Run a query on the write handle, for reads that must see the latest writes
    pub async fn select_from_write(&self, sql: &str, bindings: &[Value]) -> OrmResult<Vec<Row>> {
        self.fetch(AccessKind::Write, sql, bindings).await
    }

    async fn fetch(&self, kind: AccessKind, sql: &str, bindings: &[Value]) -> OrmResult<Vec<Row>> {
        debug!(connection = %self.name, side = %kind, bindings = bindings.len(), "{}", sql);
        let handle = self.handle(kind)?;
        handle.fetch_all(sql, bindings).await.map_err(|e| {
            error!(connection = %self.name, error = %e, "query failed: {}", sql);
            into_database_error(e)
        })
    }

    async fn run(&self, sql: &str, bindings: &[Value]) -> OrmResult<ExecResult> {
        debug!(connection = %self.name, side = "write", bindings = bindings.len(), "{}", sql);
        let handle = self.handle(AccessKind::Write)?;
        handle.execute(sql, bindings).await.map_err(|e| {
            error!(connection = %self.name, error = %e, "statement failed: {}", sql);
            into_database_error(e)
        })
    }

    /// Run a statement on the write handle
    pub async fn statement(&self, sql: &str, bindings: &[Value]) -> OrmResult<bool> {
        self.run(sql, bindings).await.map(|_| true)
    }

    /// Run an INSERT and return the generated key
    pub async fn insert(&self, sql: &str, bindings: &[Value]) -> OrmResult<u64> {
        self.run(sql, bindings).await.map(|r| r.last_insert_id)
    }

    /// Run an UPDATE and return the affected row count
    pub async fn update(&self, sql: &str, bindings: &[Value]) -> OrmResult<u64> {
        self.run(sql, bindings).await.map(|r| r.rows_affected)
    }

    /// Run a DELETE and return the affected row count
    pub async fn delete(&self, sql: &str, bindings: &[Value]) -> OrmResult<u64> {
        self.run(sql, bindings).await.map(|r| r.rows_affected)
    }

    /// Escape a value with the read handle's quoting primitive
    pub fn quote(&self, value: &Value) -> OrmResult<String> {
        Ok(self.handle(AccessKind::Read)?.quote(value))
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction.load(Ordering::SeqCst)
    }

    /// Start a transaction on the write handle. Nesting is rejected.
    pub async fn begin_transaction(&self) -> OrmResult<()> {
        if self
            .in_transaction
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            error!(connection = %self.name, "nested transaction rejected");
            return Err(ModelError::Transaction(
                "nested transactions are not supported".to_string(),
            ));
        }

        debug!(connection = %self.name, "START TRANSACTION");
        let started = match self.handle(AccessKind::Write) {
            Ok(handle) => handle.begin().await,
            Err(e) => Err(e),
        };
        if started.is_err() {
            self.in_transaction.store(false, Ordering::SeqCst);
        }
        started
    }

    pub async fn commit(&self) -> OrmResult<()> {
        self.finish(true).await
    }

    pub async fn rollback(&self) -> OrmResult<()> {
        self.finish(false).await
    }

    async fn finish(&self, commit: bool) -> OrmResult<()> {
        if !self.in_transaction.swap(false, Ordering::SeqCst) {
            return Err(ModelError::Transaction("no active transaction".to_string()));
        }

        let handle = self.handle(AccessKind::Write)?;
        if commit {
            debug!(connection = %self.name, "COMMIT");
            handle.commit().await
        } else {
            debug!(connection = %self.name, "ROLLBACK");
            handle.rollback().await
        }
    }
}

fn into_database_error(err: ModelError) -> ModelError {
    match err {
        ModelError::Database(_) | ModelError::Connection(_) | ModelError::Transaction(_) => err,
        other => ModelError::Database(other.to_string()),
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("name", &self.name)
            .field("site_id", &self.site_id)
            .field("prefix", &self.table_prefix())
            .field("split", &self.config.has_split())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::HostSpec;
    use crate::testing::{CallKind, RecordingFactory};
    use serde_json::json;

    fn split_config() -> ConnectionConfig {
        ConnectionConfig {
            host: Some(HostSpec::Single("primary".to_string())),
            read: Some(EndpointOverride {
                host: Some(HostSpec::Pool(vec!["replica".to_string()])),
                ..Default::default()
            }),
            write: Some(EndpointOverride {
                host: Some(HostSpec::Single("primary".to_string())),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_table_prefix_per_site() {
        let factory = Arc::new(RecordingFactory::new());
        let main = Connection::new("mysql", ConnectionConfig::default(), None, factory.clone()).unwrap();
        let first = Connection::new("mysql", ConnectionConfig::default(), Some(1), factory.clone()).unwrap();
        let third = Connection::new("mysql", ConnectionConfig::default(), Some(3), factory).unwrap();

        assert_eq!(main.table_name("posts", false), "wp_posts");
        assert_eq!(first.table_name("posts", false), "wp_posts");
        assert_eq!(third.table_name("posts", false), "wp_3_posts");
        assert_eq!(third.table_name("users", true), "wp_users");
    }

    #[test]
    fn test_unsupported_driver() {
        let config = ConnectionConfig {
            driver: "oracle".to_string(),
            ..Default::default()
        };
        let err = Connection::new("legacy", config, None, Arc::new(RecordingFactory::new())).unwrap_err();
        assert!(matches!(err, ModelError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_reads_and_writes_use_split_handles() {
        let factory = Arc::new(RecordingFactory::new());
        let connection = Connection::new("mysql", split_config(), None, factory.clone()).unwrap();

        connection.select("SELECT 1", &[]).await.unwrap();
        connection
            .update("UPDATE wp_posts SET post_title = %s", &[json!("x")])
            .await
            .unwrap();
        connection.begin_transaction().await.unwrap();
        connection.commit().await.unwrap();

        let calls = factory.calls();
        assert_eq!(calls[0].host, "replica");
        assert_eq!(calls[0].kind, CallKind::Select);
        assert!(calls[1..].iter().all(|c| c.host == "primary"));
        assert_eq!(calls[2].sql, "START TRANSACTION");
        assert_eq!(calls[3].sql, "COMMIT");
    }

    #[tokio::test]
    async fn test_without_split_both_sides_share_one_handle() {
        let factory = Arc::new(RecordingFactory::new());
        let connection = Connection::new("mysql", ConnectionConfig::default(), None, factory.clone()).unwrap();

        connection.select("SELECT 1", &[]).await.unwrap();
        connection.statement("DELETE FROM wp_options", &[]).await.unwrap();

        assert_eq!(factory.connect_count(), 1);
        let read = connection.handle(AccessKind::Read).unwrap();
        let write = connection.handle(AccessKind::Write).unwrap();
        assert!(Arc::ptr_eq(&read, &write));
    }

    #[tokio::test]
    async fn test_insert_returns_generated_key() {
        let factory = Arc::new(RecordingFactory::new());
        let connection = Connection::new("mysql", ConnectionConfig::default(), None, factory).unwrap();
        let id = connection
            .insert("INSERT INTO wp_posts (post_title) VALUES (%s)", &[json!("Hello")])
            .await
            .unwrap();
        assert_eq!(id, 1);
    }

    #[tokio::test]
    async fn test_select_surfaces_driver_error() {
        let factory = Arc::new(RecordingFactory::failing("Table 'wp.wp_nope' doesn't exist"));
        let connection = Connection::new("mysql", ConnectionConfig::default(), None, factory).unwrap();
        let err = connection.select("SELECT * FROM wp_nope", &[]).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Database query error: Table 'wp.wp_nope' doesn't exist"
        );
    }

    #[tokio::test]
    async fn test_nested_transaction_rejected() {
        let factory = Arc::new(RecordingFactory::new());
        let connection = Connection::new("mysql", ConnectionConfig::default(), None, factory).unwrap();

        connection.begin_transaction().await.unwrap();
        let err = connection.begin_transaction().await.unwrap_err();
        assert!(matches!(err, ModelError::Transaction(_)));
        connection.rollback().await.unwrap();
        assert!(!connection.in_transaction());
        assert!(connection.commit().await.is_err());
    }
}
