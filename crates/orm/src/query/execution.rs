//! Query Builder execution

use serde_json::Value;
use tracing::warn;

use super::builder::QueryBuilder;
use crate::backends::Row;
use crate::collection::Collection;
use crate::error::{ModelError, OrmResult};
use crate::loading;
use crate::model::{Entity, Record};

impl<M> QueryBuilder<M> {
    async fn fetch(&self, sql: &str, bindings: &[Value]) -> OrmResult<Vec<Row>> {
        if self.use_write {
            self.connection.select_from_write(sql, bindings).await
        } else {
            self.connection.select(sql, bindings).await
        }
    }

    /// Execute query and return the raw rows
    pub async fn get_rows(&self) -> OrmResult<Vec<Row>> {
        self.fetch(&self.to_sql(), &self.get_bindings()).await
    }

    /// Number of matching rows; grouped queries are wrapped in a subquery
    pub async fn count(&self) -> OrmResult<u64> {
        self.count_with_wrap(true).await
    }

    /// Count without touching this builder's SELECT list.
    ///
    /// With `auto_wrap` off a grouped query yields the size of the first
    /// group only; callers opt into that deliberately.
    pub async fn count_with_wrap(&self, auto_wrap: bool) -> OrmResult<u64> {
        let grouped = !self.state.groups.is_empty();
        let sql = if grouped && auto_wrap {
            self.grammar.compile_count_wrapper(&self.to_sql())
        } else {
            if grouped {
                warn!(table = %self.schema.table, "count without wrapping ignores GROUP BY");
            }
            let mut state = self.resolved_state();
            state.columns = vec!["COUNT(*) as count".to_string()];
            self.grammar.compile_select(&state)
        };

        let rows = self.fetch(&sql, &self.get_bindings()).await?;
        Ok(rows
            .first()
            .and_then(|row| row.get("count"))
            .and_then(value_as_u64)
            .unwrap_or(0))
    }

    pub async fn exists(&self) -> OrmResult<bool> {
        Ok(self.count().await? > 0)
    }

    /// Values of a single column
    pub async fn pluck(&self, column: &str) -> OrmResult<Vec<Value>> {
        let rows = self.clone().select(column).get_rows().await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.into_iter().next().map(|(_, value)| value))
            .collect())
    }
}

impl<M: Entity> QueryBuilder<M> {
    /// Execute query and return models, eager loading requested relations
    pub async fn get(&self) -> OrmResult<Collection<M>> {
        let rows = self.get_rows().await?;
        let mut records: Vec<Record> = rows.into_iter().map(Record::new_instance).collect();

        if !self.eager.is_empty() && !records.is_empty() {
            loading::eager_load(&self.manager, self.schema, &mut records, &self.eager).await?;
        }

        Ok(records.into_iter().map(M::from).collect())
    }

    /// First match, or `None`
    pub async fn first(&self) -> OrmResult<Option<M>> {
        Ok(self.clone().limit(1).get().await?.into_first())
    }

    /// First match, or a `NotFound` error
    pub async fn first_or_fail(&self) -> OrmResult<M> {
        self.first()
            .await?
            .ok_or_else(|| ModelError::NotFound(self.table_name()))
    }

    /// Match on the model's primary key
    pub async fn find<K: Into<Value>>(&self, id: K) -> OrmResult<Option<M>> {
        self.clone()
            .where_eq(self.schema.primary_key, id)
            .first()
            .await
    }

    pub async fn find_or_fail<K: Into<Value>>(&self, id: K) -> OrmResult<M> {
        self.find(id)
            .await?
            .ok_or_else(|| ModelError::NotFound(self.table_name()))
    }
}

/// Counts come back as numbers or numeric strings depending on the driver
pub(crate) fn value_as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
