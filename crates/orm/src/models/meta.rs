//! Metadata tables and the `get_meta` / `set_meta` helpers
//!
//! Reads go through the ORM. Writes are delegated to a [`MetaStore`] so an
//! application can route them through its own cache-aware metadata API.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::connection::ConnectionManager;
use crate::error::{ModelError, OrmResult};
use crate::model::crud_operations::save_record;
use crate::model::{Model, Record};

wp_model! {
    /// A row of `postmeta`
    PostMeta
}

wp_model! {
    /// A row of `usermeta`, shared by the network
    UserMeta
}

wp_model! {
    /// A row of `commentmeta`
    CommentMeta
}

wp_model! {
    /// A row of `termmeta`
    TermMeta
}

macro_rules! meta_model {
    ($name:ident, $table:literal, $key:literal, $global:literal) => {
        impl $name {
            pub fn key(&self) -> Option<&str> {
                self.str_attribute("meta_key")
            }

            pub fn value(&self) -> Option<&Value> {
                self.record.get_attribute("meta_value")
            }

            pub fn id(&self) -> Option<i64> {
                self.int_attribute($key)
            }
        }

        impl Model for $name {
            fn table_name() -> &'static str {
                $table
            }

            fn primary_key_name() -> &'static str {
                $key
            }

            fn is_global_table() -> bool {
                $global
            }
        }
    };
}

meta_model!(PostMeta, "postmeta", "meta_id", false);
meta_model!(UserMeta, "usermeta", "umeta_id", true);
meta_model!(CommentMeta, "commentmeta", "meta_id", false);
meta_model!(TermMeta, "termmeta", "meta_id", false);

/// The object type a meta row belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaKind {
    Post,
    User,
    Comment,
    Term,
}

impl MetaKind {
    /// Column of the meta table pointing at the owning object
    pub fn foreign_key(&self) -> &'static str {
        match self {
            MetaKind::Post => "post_id",
            MetaKind::User => "user_id",
            MetaKind::Comment => "comment_id",
            MetaKind::Term => "term_id",
        }
    }
}

impl fmt::Display for MetaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaKind::Post => write!(f, "post"),
            MetaKind::User => write!(f, "user"),
            MetaKind::Comment => write!(f, "comment"),
            MetaKind::Term => write!(f, "term"),
        }
    }
}

/// Writes one metadata value for an object
#[async_trait]
pub trait MetaStore: Send + Sync {
    async fn update_meta(&self, kind: MetaKind, object_id: &Value, key: &str, value: &Value) -> OrmResult<bool>;
}

/// Models with a companion meta table
pub trait HasMeta: Model {
    type Meta: Model;
    const META_KIND: MetaKind;

    /// `meta_value` of the first row stored under `key`
    async fn get_meta(&self, db: &ConnectionManager, key: &str) -> OrmResult<Option<Value>> {
        let Some(id) = self.get_key().cloned() else {
            return Ok(None);
        };
        let meta = Self::Meta::query(db)?
            .where_eq(Self::META_KIND.foreign_key(), id)
            .where_eq("meta_key", key)
            .first()
            .await?;
        Ok(meta.and_then(|m| m.get_attribute("meta_value").cloned()))
    }

    /// Write through `store`; a blank key is rejected before the store is
    /// called
    async fn set_meta<V: Into<Value>>(&self, store: &dyn MetaStore, key: &str, value: V) -> OrmResult<bool> {
        if key.trim().is_empty() {
            return Err(ModelError::Validation("meta key must not be empty".to_string()));
        }
        let id = self.get_key().cloned().ok_or(ModelError::MissingPrimaryKey)?;
        store.update_meta(Self::META_KIND, &id, key, &value.into()).await
    }
}

/// [`MetaStore`] writing through the ORM: updates the first row for the key
/// or inserts one
#[derive(Debug, Clone)]
pub struct OrmMetaStore {
    db: ConnectionManager,
}

impl OrmMetaStore {
    pub fn new(db: ConnectionManager) -> Self {
        Self { db }
    }

    async fn upsert<M: Model>(&self, kind: MetaKind, object_id: &Value, key: &str, value: &Value) -> OrmResult<bool> {
        let existing = M::query(&self.db)?
            .use_write_connection()
            .where_eq(kind.foreign_key(), object_id.clone())
            .where_eq("meta_key", key)
            .first()
            .await?;

        let mut record: Record = match existing {
            Some(meta) => meta.into(),
            None => Record::from_attributes([
                (kind.foreign_key(), object_id.clone()),
                ("meta_key", Value::from(key)),
            ]),
        };
        record.set_attribute("meta_value", value.clone());
        debug!(kind = %kind, key, "writing meta");
        save_record(&self.db, M::schema(), &mut record).await
    }
}

#[async_trait]
impl MetaStore for OrmMetaStore {
    async fn update_meta(&self, kind: MetaKind, object_id: &Value, key: &str, value: &Value) -> OrmResult<bool> {
        match kind {
            MetaKind::Post => self.upsert::<PostMeta>(kind, object_id, key, value).await,
            MetaKind::User => self.upsert::<UserMeta>(kind, object_id, key, value).await,
            MetaKind::Comment => self.upsert::<CommentMeta>(kind, object_id, key, value).await,
            MetaKind::Term => self.upsert::<TermMeta>(kind, object_id, key, value).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Post, User};
    use crate::testing::{row, test_manager, RecordingFactory};
    use parking_lot::Mutex;
    use serde_json::json;

    #[derive(Default)]
    struct CapturingStore {
        writes: Mutex<Vec<(MetaKind, Value, String, Value)>>,
    }

    #[async_trait]
    impl MetaStore for CapturingStore {
        async fn update_meta(&self, kind: MetaKind, object_id: &Value, key: &str, value: &Value) -> OrmResult<bool> {
            self.writes
                .lock()
                .push((kind, object_id.clone(), key.to_string(), value.clone()));
            Ok(true)
        }
    }

    #[tokio::test]
    async fn test_get_meta() {
        let (db, factory) = test_manager(RecordingFactory::with_responder(|_, _| {
            vec![row([("meta_id", json!(1)), ("meta_key", json!("_edit_lock")), ("meta_value", json!("1700000000:1"))])]
        }));

        let post = Post::from_attributes([("ID", 5)]);
        let value = post.get_meta(&db, "_edit_lock").await.unwrap();
        assert_eq!(value, Some(json!("1700000000:1")));
        assert_eq!(
            factory.selects()[0].sql,
            "SELECT * FROM wp_postmeta WHERE post_id = %s AND meta_key = %s LIMIT 1"
        );

        assert_eq!(Post::new().get_meta(&db, "_edit_lock").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_meta_goes_to_the_store() {
        let store = CapturingStore::default();
        let user = User::from_attributes([("ID", 2)]);
        assert!(user.set_meta(&store, "nickname", "ada").await.unwrap());

        assert_eq!(
            store.writes.lock()[0],
            (MetaKind::User, json!(2), "nickname".to_string(), json!("ada"))
        );

        let err = User::new().set_meta(&store, "nickname", "x").await.unwrap_err();
        assert!(matches!(err, ModelError::MissingPrimaryKey));

        let err = user.set_meta(&store, "  ", "x").await.unwrap_err();
        assert!(matches!(err, ModelError::Validation(_)));
        assert_eq!(store.writes.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_orm_store_inserts_then_updates() {
        let (db, factory) = test_manager(RecordingFactory::with_responder(|sql, _| {
            if sql.contains("meta_key = %s") && sql.contains("wp_usermeta") {
                vec![row([("umeta_id", json!(40)), ("user_id", json!(2)), ("meta_key", json!("nickname")), ("meta_value", json!("old"))])]
            } else {
                Vec::new()
            }
        }));
        let store = OrmMetaStore::new(db);

        store
            .update_meta(MetaKind::Post, &json!(5), "_price", &json!("9.99"))
            .await
            .unwrap();
        store
            .update_meta(MetaKind::User, &json!(2), "nickname", &json!("ada"))
            .await
            .unwrap();

        let executes = factory.executes();
        assert_eq!(
            executes[0].sql,
            "INSERT INTO wp_postmeta (post_id, meta_key, meta_value) VALUES (%s, %s, %s)"
        );
        assert_eq!(
            executes[1].sql,
            "UPDATE wp_usermeta SET meta_value = %s WHERE umeta_id = %s"
        );
        assert_eq!(executes[1].bindings, vec![json!("ada"), json!(40)]);
    }

    #[test]
    fn test_meta_accessors() {
        let meta = TermMeta::from_attributes([("meta_id", json!(3)), ("meta_key", json!("color")), ("meta_value", json!("red"))]);
        assert_eq!(meta.id(), Some(3));
        assert_eq!(meta.key(), Some("color"));
        assert_eq!(meta.value(), Some(&json!("red")));
        assert_eq!(MetaKind::Comment.foreign_key(), "comment_id");
        assert_eq!(MetaKind::Term.to_string(), "term");
    }
}
