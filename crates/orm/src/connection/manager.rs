//! Connection registry and site context
//!
//! [`ConnectionManager`] is the context handle threaded through every query
//! builder. It owns the configuration, the cache of connections keyed by
//! name and site, and the current site id. Clones share state; [`fork`]
//! creates an independent context for another request or tenant.
//!
//! [`fork`]: ConnectionManager::fork

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::info;

use super::config::DatabaseConfig;
use super::core::Connection;
use crate::backends::{DriverFactory, MySqlDriverFactory};
use crate::error::{ModelError, OrmResult};
use crate::model::{Record, Schema};
use crate::query::QueryBuilder;

/// Cache key for an instantiated connection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionKey {
    pub name: String,
    pub site_id: Option<i64>,
}

impl fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.site_id {
            Some(site) => write!(f, "{}_{}", self.name, site),
            None => write!(f, "{}_default", self.name),
        }
    }
}

struct ManagerState {
    config: RwLock<DatabaseConfig>,
    connections: DashMap<ConnectionKey, Arc<Connection>>,
    site_id: RwLock<Option<i64>>,
    factory: Arc<dyn DriverFactory>,
}

/// Registry of named connections scoped to the current site
#[derive(Clone)]
pub struct ConnectionManager {
    state: Arc<ManagerState>,
}

impl ConnectionManager {
    pub fn new(config: DatabaseConfig, factory: Arc<dyn DriverFactory>) -> Self {
        info!(default = %config.default, connections = config.connections.len(), "database configured");
        Self {
            state: Arc::new(ManagerState {
                config: RwLock::new(config),
                connections: DashMap::new(),
                site_id: RwLock::new(None),
                factory,
            }),
        }
    }

    /// A manager that opens sqlx MySQL pools
    pub fn mysql(config: DatabaseConfig) -> Self {
        Self::new(config, Arc::new(MySqlDriverFactory::new()))
    }

    /// Replace the configuration and drop every cached connection
    pub fn configure(&self, config: DatabaseConfig) {
        info!(default = %config.default, connections = config.connections.len(), "database reconfigured");
        *self.state.config.write() = config;
        self.state.connections.clear();
    }

    pub fn config(&self) -> DatabaseConfig {
        self.state.config.read().clone()
    }

    pub fn default_connection_name(&self) -> String {
        self.state.config.read().default.clone()
    }

    /// Resolve a connection for the current site, `None` meaning the default
    pub fn connection(&self, name: Option<&str>) -> OrmResult<Arc<Connection>> {
        let name = match name {
            Some(name) => name.to_string(),
            None => self.default_connection_name(),
        };
        let key = ConnectionKey {
            name: name.clone(),
            site_id: self.site_id(),
        };

        if let Some(connection) = self.state.connections.get(&key) {
            return Ok(connection.value().clone());
        }

        let config = self
            .state
            .config
            .read()
            .connections
            .get(&name)
            .cloned()
            .ok_or_else(|| ModelError::connection_not_configured(&name))?;

        let connection = Arc::new(Connection::new(
            name,
            config,
            key.site_id,
            self.state.factory.clone(),
        )?);
        info!(key = %key, prefix = %connection.table_prefix(), "connection created");

        Ok(self
            .state
            .connections
            .entry(key)
            .or_insert(connection)
            .value()
            .clone())
    }

    pub fn site_id(&self) -> Option<i64> {
        *self.state.site_id.read()
    }

    /// Switch the current site. Cached connections are dropped so no handle
    /// with the previous prefix survives.
    pub fn set_site_id(&self, site_id: Option<i64>) {
        let mut current = self.state.site_id.write();
        if *current != site_id {
            info!(from = ?*current, to = ?site_id, "switching site");
        }
        *current = site_id;
        self.state.connections.clear();
    }

    /// Drop every cached connection and forget the current site
    pub fn reset(&self) {
        *self.state.site_id.write() = None;
        self.state.connections.clear();
    }

    /// Number of connections currently cached
    pub fn cached_connections(&self) -> usize {
        self.state.connections.len()
    }

    /// An independent context sharing configuration and driver factory
    pub fn fork(&self) -> Self {
        Self {
            state: Arc::new(ManagerState {
                config: RwLock::new(self.config()),
                connections: DashMap::new(),
                site_id: RwLock::new(self.site_id()),
                factory: self.state.factory.clone(),
            }),
        }
    }

    /// An independent context pinned to a site
    pub fn for_site(&self, site_id: i64) -> Self {
        let forked = self.fork();
        forked.set_site_id(Some(site_id));
        forked
    }

    /// Untyped query against a site-scoped table
    pub fn table(&self, table: &'static str) -> OrmResult<QueryBuilder<Record>> {
        QueryBuilder::for_schema(self, Schema::untyped(table, "ID"))
    }
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("default", &self.default_connection_name())
            .field("site_id", &self.site_id())
            .field("cached", &self.cached_connections())
            .finish()
    }
}
