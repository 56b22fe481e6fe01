//! Connection configuration
//!
//! The shape consumed by [`ConnectionManager::configure`](super::ConnectionManager::configure):
//!
//! ```json
//! {
//!   "default": "mysql",
//!   "connections": {
//!     "mysql": {
//!       "driver": "mysql",
//!       "read": { "host": ["10.0.0.2", "10.0.0.3"] },
//!       "write": { "host": "10.0.0.1" },
//!       "database": "wordpress",
//!       "username": "wp",
//!       "password": "secret",
//!       "charset": "utf8mb4",
//!       "collation": "utf8mb4_unicode_ci",
//!       "prefix": "wp_"
//!     }
//!   }
//! }
//! ```

use std::collections::HashMap;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::error::{ModelError, OrmResult};

fn default_connection() -> String {
    "mysql".to_string()
}

fn default_driver() -> String {
    "mysql".to_string()
}

fn default_port() -> u16 {
    3306
}

fn default_charset() -> String {
    "utf8mb4".to_string()
}

fn default_prefix() -> String {
    "wp_".to_string()
}

/// Top-level database configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_connection")]
    pub default: String,
    #[serde(default)]
    pub connections: HashMap<String, ConnectionConfig>,
}

impl DatabaseConfig {
    /// A configuration with a single connection registered as the default
    pub fn single(name: &str, connection: ConnectionConfig) -> Self {
        let mut connections = HashMap::new();
        connections.insert(name.to_string(), connection);
        Self {
            default: name.to_string(),
            connections,
        }
    }

    pub fn from_value(value: Value) -> OrmResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| ModelError::Configuration(format!("Invalid database configuration: {}", e)))
    }

    pub fn from_json(json: &str) -> OrmResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ModelError::Configuration(format!("Invalid database configuration: {}", e)))
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            default: default_connection(),
            connections: HashMap::new(),
        }
    }
}

/// One host or a list to pick from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HostSpec {
    Single(String),
    Pool(Vec<String>),
}

impl HostSpec {
    /// Resolve to one host, choosing uniformly at random from a list
    pub fn pick(&self) -> Option<String> {
        match self {
            HostSpec::Single(host) => Some(host.clone()),
            HostSpec::Pool(hosts) => hosts.choose(&mut rand::thread_rng()).cloned(),
        }
    }
}

/// Fields a `read` or `write` section may override
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointOverride {
    #[serde(default)]
    pub host: Option<HostSpec>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Settings for a named connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default = "default_driver")]
    pub driver: String,
    #[serde(default)]
    pub host: Option<HostSpec>,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_charset")]
    pub charset: String,
    #[serde(default)]
    pub collation: Option<String>,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default)]
    pub read: Option<EndpointOverride>,
    #[serde(default)]
    pub write: Option<EndpointOverride>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            host: None,
            port: default_port(),
            database: String::new(),
            username: String::new(),
            password: String::new(),
            charset: default_charset(),
            collation: None,
            prefix: default_prefix(),
            read: None,
            write: None,
        }
    }
}

impl ConnectionConfig {
    /// Whether a read/write split is configured
    pub fn has_split(&self) -> bool {
        self.read.is_some() || self.write.is_some()
    }

    /// The endpoint described by the base fields
    pub fn endpoint(&self) -> Endpoint {
        self.endpoint_with(None)
    }

    /// The endpoint produced by merging an override over the base fields
    pub fn endpoint_with(&self, over: Option<&EndpointOverride>) -> Endpoint {
        let host_spec = over.and_then(|o| o.host.as_ref()).or(self.host.as_ref());
        let raw_host = host_spec
            .and_then(HostSpec::pick)
            .unwrap_or_else(|| "localhost".to_string());
        let port = over.and_then(|o| o.port).unwrap_or(self.port);
        let (host, port) = split_host_port(&raw_host, port);

        Endpoint {
            host,
            port,
            database: over
                .and_then(|o| o.database.clone())
                .unwrap_or_else(|| self.database.clone()),
            username: over
                .and_then(|o| o.username.clone())
                .unwrap_or_else(|| self.username.clone()),
            password: over
                .and_then(|o| o.password.clone())
                .unwrap_or_else(|| self.password.clone()),
            charset: self.charset.clone(),
            collation: self.collation.clone(),
        }
    }
}

/// `host:port` strings carry their own port
fn split_host_port(host: &str, default_port: u16) -> (String, u16) {
    if let Some((name, port)) = host.rsplit_once(':') {
        if !name.contains(':') {
            if let Ok(port) = port.parse() {
                return (name.to_string(), port);
            }
        }
    }
    (host.to_string(), default_port)
}

/// A fully resolved server address plus credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub charset: String,
    pub collation: Option<String>,
}

impl Endpoint {
    /// Build the `mysql://` DSN for this endpoint
    pub fn url(&self) -> OrmResult<Url> {
        let mut url = Url::parse("mysql://localhost")?;
        url.set_host(Some(&self.host))?;
        url.set_port(Some(self.port))
            .map_err(|_| ModelError::Configuration(format!("Invalid port for host {}", self.host)))?;
        if !self.username.is_empty() {
            url.set_username(&self.username)
                .map_err(|_| ModelError::Configuration("Invalid username".to_string()))?;
        }
        if !self.password.is_empty() {
            url.set_password(Some(&self.password))
                .map_err(|_| ModelError::Configuration("Invalid password".to_string()))?;
        }
        url.set_path(&self.database);

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("charset", &self.charset);
            if let Some(collation) = &self.collation {
                query.append_pair("collation", collation);
            }
        }

        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_split_config() {
        let config = DatabaseConfig::from_value(json!({
            "connections": {
                "mysql": {
                    "driver": "mysql",
                    "read": { "host": ["10.0.0.2", "10.0.0.3"] },
                    "write": { "host": "10.0.0.1" },
                    "database": "wordpress",
                    "username": "wp",
                    "password": "secret",
                    "prefix": "wp_"
                }
            }
        }))
        .unwrap();

        assert_eq!(config.default, "mysql");
        let connection = &config.connections["mysql"];
        assert!(connection.has_split());
        assert_eq!(connection.charset, "utf8mb4");

        let read = connection.endpoint_with(connection.read.as_ref());
        assert!(read.host == "10.0.0.2" || read.host == "10.0.0.3");
        let write = connection.endpoint_with(connection.write.as_ref());
        assert_eq!(write.host, "10.0.0.1");
        assert_eq!(write.database, "wordpress");
    }

    #[test]
    fn test_host_with_port() {
        let config = ConnectionConfig {
            host: Some(HostSpec::Single("db.internal:3307".to_string())),
            ..Default::default()
        };
        let endpoint = config.endpoint();
        assert_eq!(endpoint.host, "db.internal");
        assert_eq!(endpoint.port, 3307);
    }

    #[test]
    fn test_endpoint_url_encodes_credentials() {
        let config = ConnectionConfig {
            host: Some(HostSpec::Single("localhost".to_string())),
            database: "wordpress".to_string(),
            username: "wp".to_string(),
            password: "p@ss word".to_string(),
            collation: Some("utf8mb4_unicode_ci".to_string()),
            ..Default::default()
        };
        let url = config.endpoint().url().unwrap();
        assert_eq!(url.scheme(), "mysql");
        assert_eq!(url.path(), "/wordpress");
        assert_eq!(url.port(), Some(3306));
        assert!(url.as_str().contains("charset=utf8mb4"));
        assert!(url.as_str().contains("collation=utf8mb4_unicode_ci"));
        assert_ne!(url.password(), Some("p@ss word"));
    }

    #[test]
    fn test_invalid_config_is_configuration_error() {
        let err = DatabaseConfig::from_json("{\"connections\": 4}").unwrap_err();
        assert!(matches!(err, ModelError::Configuration(_)));
    }
}
