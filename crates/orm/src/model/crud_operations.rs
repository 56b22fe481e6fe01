//! CRUD Operations - Persisting models
//!
//! `save` inserts models that were never persisted and updates only the dirty
//! columns of the rest. All writes go through the connection's write handle.

use serde_json::Value;
use tracing::debug;

use super::core_trait::{Model, Schema};
use super::record::Record;
use crate::connection::ConnectionManager;
use crate::error::{ModelError, ModelResult};

/// Trait providing CRUD operations for models
pub trait CrudOperations: Model {
    /// Insert or update, then take the attributes as the new snapshot.
    ///
    /// Saving an existing model with nothing dirty executes no statement.
    async fn save(&mut self, db: &ConnectionManager) -> ModelResult<bool> {
        save_record(db, Self::schema(), self.as_mut()).await
    }

    /// Delete the row. Returns `false` for a model that was never persisted.
    ///
    /// The model is marked as not existing afterwards, so a later `save`
    /// inserts it again.
    async fn delete(&mut self, db: &ConnectionManager) -> ModelResult<bool> {
        delete_record(db, Self::schema(), self.as_mut()).await
    }

    /// Build a model from attributes and insert it
    async fn create<I, K, V>(db: &ConnectionManager, attributes: I) -> ModelResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut record = Record::from_attributes(attributes);
        save_record(db, Self::schema(), &mut record).await?;
        Ok(Self::from(record))
    }

    /// Reload attributes from the write handle, discarding unsaved changes
    /// and cached relations
    async fn refresh(&mut self, db: &ConnectionManager) -> ModelResult<()> {
        let id = persisted_key(self.as_ref(), Self::primary_key_name()).ok_or(ModelError::MissingPrimaryKey)?;
        let fresh = Self::query(db)?
            .use_write_connection()
            .find(id)
            .await?
            .ok_or_else(|| ModelError::NotFound(Self::table_name().to_string()))?;
        *self = fresh;
        Ok(())
    }
}

impl<T: Model> CrudOperations for T {}

/// Persist `record` into `schema`'s table
pub async fn save_record(db: &ConnectionManager, schema: Schema, record: &mut Record) -> ModelResult<bool> {
    if record.exists() {
        update_record(db, schema, record).await
    } else {
        insert_record(db, schema, record).await
    }
}

async fn insert_record(db: &ConnectionManager, schema: Schema, record: &mut Record) -> ModelResult<bool> {
    let connection = db.connection(schema.connection)?;
    let table = connection.table_name(schema.table, schema.global);

    let (columns, bindings): (Vec<String>, Vec<Value>) = record
        .attributes()
        .iter()
        .map(|(column, value)| (column.clone(), value.clone()))
        .unzip();

    let sql = connection.grammar().compile_insert(&table, &columns);
    let id = connection.insert(&sql, &bindings).await?;

    let has_key = matches!(record.get_attribute(schema.primary_key), Some(value) if !value.is_null());
    if id > 0 && !has_key {
        record.set_attribute(schema.primary_key, id);
    }

    record.set_exists(true);
    record.sync_original();
    debug!(table = %table, id, "model inserted");
    Ok(true)
}

async fn update_record(db: &ConnectionManager, schema: Schema, record: &mut Record) -> ModelResult<bool> {
    let dirty = record.get_dirty();
    if dirty.is_empty() {
        return Ok(true);
    }

    let id = persisted_key(record, schema.primary_key).ok_or(ModelError::MissingPrimaryKey)?;
    let connection = db.connection(schema.connection)?;
    let table = connection.table_name(schema.table, schema.global);
    let (columns, mut bindings): (Vec<String>, Vec<Value>) = dirty.into_iter().unzip();
    bindings.push(id);

    let sql = connection.grammar().compile_update(&table, &columns, schema.primary_key);
    connection.update(&sql, &bindings).await?;

    record.sync_original();
    Ok(true)
}

/// Delete `record`'s row and mark it as not existing
pub async fn delete_record(db: &ConnectionManager, schema: Schema, record: &mut Record) -> ModelResult<bool> {
    if !record.exists() {
        return Ok(false);
    }

    let id = persisted_key(record, schema.primary_key).ok_or(ModelError::MissingPrimaryKey)?;
    let connection = db.connection(schema.connection)?;
    let table = connection.table_name(schema.table, schema.global);

    let sql = connection.grammar().compile_delete(&table, schema.primary_key);
    connection.delete(&sql, &[id]).await?;

    record.set_exists(false);
    Ok(true)
}

/// The key the row was loaded or saved under; a changed key must not
/// redirect the UPDATE
fn persisted_key(record: &Record, key: &str) -> Option<Value> {
    record
        .original()
        .get(key)
        .or_else(|| record.get_attribute(key))
        .filter(|value| !value.is_null())
        .cloned()
}
