//! Query Builder - Core builder implementation
//!
//! The builder keeps bare table and column names. They are prefixed for the
//! current site when SQL is compiled, so `global()` and `on_site()` apply to
//! every clause no matter when it was added.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;

use super::normalizer::TableNormalizer;
use super::types::*;
use crate::backends::replace_placeholders;
use crate::connection::{Connection, ConnectionManager};
use crate::error::OrmResult;
use crate::grammar::Grammar;
use crate::loading::EagerLoad;
use crate::model::{Record, Schema};

/// Query builder for constructing database queries
pub struct QueryBuilder<M = Record> {
    pub(crate) manager: ConnectionManager,
    pub(crate) connection: Arc<Connection>,
    pub(crate) grammar: Arc<dyn Grammar>,
    pub(crate) schema: Schema,
    pub(crate) state: QueryState,
    pub(crate) eager: Vec<EagerLoad>,
    pub(crate) use_global_table: bool,
    pub(crate) use_write: bool,
    _model: PhantomData<fn() -> M>,
}

impl<M> Clone for QueryBuilder<M> {
    fn clone(&self) -> Self {
        Self {
            manager: self.manager.clone(),
            connection: self.connection.clone(),
            grammar: self.grammar.clone(),
            schema: self.schema,
            state: self.state.clone(),
            eager: self.eager.clone(),
            use_global_table: self.use_global_table,
            use_write: self.use_write,
            _model: PhantomData,
        }
    }
}

impl<M> fmt::Debug for QueryBuilder<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("table", &self.schema.table)
            .field("connection", &self.connection.name())
            .field("state", &self.state)
            .field("eager", &self.eager.iter().map(|e| e.name.as_str()).collect::<Vec<_>>())
            .field("global", &self.use_global_table)
            .finish()
    }
}

impl<M> QueryBuilder<M> {
    /// Builder over `schema`'s table on the connection the manager resolves
    pub fn for_schema(manager: &ConnectionManager, schema: Schema) -> OrmResult<Self> {
        let connection = manager.connection(schema.connection)?;
        Ok(Self {
            manager: manager.clone(),
            grammar: connection.grammar(),
            connection,
            schema,
            state: QueryState::new(schema.table),
            eager: Vec::new(),
            use_global_table: schema.global,
            use_write: false,
            _model: PhantomData,
        })
    }

    /// Same query, hydrating a different type
    pub fn cast<T>(self) -> QueryBuilder<T> {
        QueryBuilder {
            manager: self.manager,
            connection: self.connection,
            grammar: self.grammar,
            schema: self.schema,
            state: self.state,
            eager: self.eager,
            use_global_table: self.use_global_table,
            use_write: self.use_write,
            _model: PhantomData,
        }
    }

    /// An empty builder over the same table, used for nested groups
    pub(crate) fn fresh(&self) -> Self {
        Self {
            state: QueryState::new(self.schema.table),
            eager: Vec::new(),
            ..self.clone()
        }
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    /// Use the tenant-independent table names
    pub fn global(mut self) -> Self {
        self.use_global_table = true;
        self
    }

    /// Switch to another site.
    ///
    /// This changes the manager's current site, so every connection resolved
    /// afterwards through the same manager sees the switch too, not only this
    /// query.
    pub fn on_site(mut self, site_id: i64) -> OrmResult<Self> {
        self.manager.set_site_id(Some(site_id));
        self.connection = self.manager.connection(Some(self.connection.name()))?;
        Ok(self)
    }

    /// Run the SELECT on the write handle to read back fresh writes
    pub fn use_write_connection(mut self) -> Self {
        self.use_write = true;
        self
    }

    pub fn set_grammar(mut self, grammar: Arc<dyn Grammar>) -> Self {
        self.grammar = grammar;
        self
    }

    /// Fully prefixed name of the model table
    pub fn table_name(&self) -> String {
        self.normalizer().normalize_table(self.schema.table)
    }

    fn normalizer(&self) -> TableNormalizer<'_> {
        let mut normalizer = TableNormalizer::new(&self.connection, self.use_global_table);
        for join in &self.state.joins {
            normalizer.register(join.table());
        }
        match &self.state.from {
            FromClause::Sub { alias, .. } => normalizer.add_alias(alias),
            FromClause::Table(table) => normalizer.register(table),
        }
        normalizer
    }

    /// The clause state with every table and column name prefixed
    pub fn resolved_state(&self) -> QueryState {
        let normalizer = self.normalizer();
        let column = |name: &str| normalizer.normalize_column(name);
        let mut state = self.state.clone();

        if let FromClause::Table(table) = &mut state.from {
            *table = normalizer.normalize_table(table);
        }
        state.columns = state.columns.iter().map(|c| column(c)).collect();
        for join in &mut state.joins {
            let table = normalizer.normalize_table(join.table());
            *join.table_mut() = table;
            join.map_columns(&column);
        }
        for clause in &mut state.wheres {
            clause.map_columns(&column);
        }
        state.groups = state.groups.iter().map(|c| column(c)).collect();
        for (name, _) in &mut state.orders {
            *name = column(name);
        }

        state
    }

    /// Compile to SQL with placeholders
    pub fn to_sql(&self) -> String {
        self.grammar.compile_select(&self.resolved_state())
    }

    /// Values for the placeholders of [`to_sql`](Self::to_sql), in order
    pub fn get_bindings(&self) -> Vec<Value> {
        self.state.bindings()
    }

    /// SQL with every binding substituted as an escaped literal. For
    /// diagnostics only; never executed.
    pub fn to_raw_sql(&self) -> OrmResult<String> {
        let sql = self.to_sql();
        let bindings = self.get_bindings();
        let quoted = bindings
            .iter()
            .map(|value| self.connection.quote(value))
            .collect::<OrmResult<Vec<_>>>()?;

        Ok(replace_placeholders(&sql, self.grammar.placeholder(), |index| {
            quoted
                .get(index)
                .cloned()
                .unwrap_or_else(|| self.grammar.placeholder().to_string())
        }))
    }

    /// This query as an embeddable subquery
    pub fn to_sub_query(&self) -> SubQuery {
        SubQuery {
            sql: self.to_sql(),
            bindings: self.get_bindings(),
        }
    }
}

impl<M> From<&QueryBuilder<M>> for SubQuery {
    fn from(query: &QueryBuilder<M>) -> Self {
        query.to_sub_query()
    }
}

impl<M> From<QueryBuilder<M>> for SubQuery {
    fn from(query: QueryBuilder<M>) -> Self {
        query.to_sub_query()
    }
}
