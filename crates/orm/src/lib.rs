//! # wp-orm: Active-record ORM for WordPress databases
//!
//! A fluent query builder, models with lazy and batched eager-loaded
//! relations, and a connection layer that understands WordPress table
//! prefixes, multisite and read/write splitting.
//!
//! Table names are written bare (`posts`, `postmeta`) and prefixed when SQL
//! is compiled: `wp_posts` on the main site, `wp_3_posts` on site 3. Network
//! tables such as `users` are marked global and never get the site segment.
//!
//! ```no_run
//! use wp_orm::prelude::*;
//! use wp_orm::models::Post;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DatabaseConfig::from_json(&std::fs::read_to_string("database.json")?)?;
//! let db = ConnectionManager::mysql(config);
//! let posts = Post::query(&db)?
//!     .published()
//!     .with("author")
//!     .with("comments")
//!     .latest("post_date")
//!     .limit(10)
//!     .get()
//!     .await?;
//!
//! for post in &posts {
//!     println!("{:?} by user {:?}", post.title(), post.author_id());
//! }
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod collection;
pub mod connection;
pub mod error;
pub mod grammar;
pub mod loading;
pub mod model;
pub mod models;
pub mod query;
pub mod relationships;

#[cfg(test)]
mod testing;

pub use backends::{DatabaseDriver, DriverFactory, ExecResult, MySqlDriverFactory, Row};
pub use collection::Collection;
pub use connection::{Connection, ConnectionConfig, ConnectionManager, DatabaseConfig};
pub use error::{ModelError, ModelResult, OrmError, OrmResult};
pub use grammar::{Grammar, MySqlGrammar};
pub use loading::{EagerLoad, RelationLoader, RelationLoaderFactory};
pub use model::{CrudOperations, Entity, Model, Record, Related, Schema};
pub use query::{JoinClause, JoinType, OrderDirection, Paginator, QueryBuilder, QueryOperator, TableNormalizer};
pub use relationships::{QueryableRelation, Relation, RelationConstraint};

/// The types most applications need
pub mod prelude {
    pub use crate::collection::Collection;
    pub use crate::connection::{ConnectionConfig, ConnectionManager, DatabaseConfig};
    pub use crate::error::{ModelError, OrmResult};
    pub use crate::model::{CrudOperations, Model, Record};
    pub use crate::query::{JoinType, OrderDirection, QueryBuilder, QueryOperator};
    pub use crate::relationships::QueryableRelation;
}
