//! In-memory driver used by unit tests. Every statement is recorded with
//! the host it was sent to; SELECT results come from an optional responder.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::backends::{DatabaseDriver, DriverFactory, ExecResult, Row};
use crate::connection::{ConnectionConfig, ConnectionManager, DatabaseConfig, Endpoint};
use crate::error::{ModelError, OrmResult};

type Responder = dyn Fn(&str, &[Value]) -> Vec<Row> + Send + Sync;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Select,
    Execute,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub host: String,
    pub kind: CallKind,
    pub sql: String,
    pub bindings: Vec<Value>,
}

struct Shared {
    calls: Mutex<Vec<Call>>,
    connects: AtomicUsize,
    next_id: AtomicU64,
    responder: Option<Box<Responder>>,
    failure: Option<String>,
}

pub struct RecordingFactory {
    shared: Arc<Shared>,
}

impl RecordingFactory {
    fn build(responder: Option<Box<Responder>>, failure: Option<String>) -> Self {
        Self {
            shared: Arc::new(Shared {
                calls: Mutex::new(Vec::new()),
                connects: AtomicUsize::new(0),
                next_id: AtomicU64::new(1),
                responder,
                failure,
            }),
        }
    }

    /// Selects return no rows
    pub fn new() -> Self {
        Self::build(None, None)
    }

    /// Every statement fails with `message`
    pub fn failing(message: &str) -> Self {
        Self::build(None, Some(message.to_string()))
    }

    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&str, &[Value]) -> Vec<Row> + Send + Sync + 'static,
    {
        Self::build(Some(Box::new(responder)), None)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.shared.calls.lock().clone()
    }

    pub fn selects(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| call.kind == CallKind::Select)
            .collect()
    }

    pub fn executes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| call.kind == CallKind::Execute)
            .collect()
    }

    pub fn connect_count(&self) -> usize {
        self.shared.connects.load(Ordering::SeqCst)
    }
}

impl DriverFactory for RecordingFactory {
    fn connect(&self, endpoint: &Endpoint) -> OrmResult<Arc<dyn DatabaseDriver>> {
        self.shared.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(RecordingDriver {
            host: endpoint.host.clone(),
            shared: self.shared.clone(),
        }))
    }
}

struct RecordingDriver {
    host: String,
    shared: Arc<Shared>,
}

impl RecordingDriver {
    fn record(&self, kind: CallKind, sql: &str, params: &[Value]) -> OrmResult<()> {
        self.shared.calls.lock().push(Call {
            host: self.host.clone(),
            kind,
            sql: sql.to_string(),
            bindings: params.to_vec(),
        });
        match &self.shared.failure {
            Some(message) => Err(ModelError::Database(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DatabaseDriver for RecordingDriver {
    async fn fetch_all(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        self.record(CallKind::Select, sql, params)?;
        Ok(self
            .shared
            .responder
            .as_ref()
            .map(|responder| responder(sql, params))
            .unwrap_or_default())
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<ExecResult> {
        self.record(CallKind::Execute, sql, params)?;
        let last_insert_id = if sql.starts_with("INSERT") {
            self.shared.next_id.fetch_add(1, Ordering::SeqCst)
        } else {
            0
        };
        Ok(ExecResult {
            rows_affected: 1,
            last_insert_id,
        })
    }

    fn driver_name(&self) -> &str {
        "recording"
    }
}

/// A manager with one default `mysql` connection backed by `factory`
pub fn test_manager(factory: RecordingFactory) -> (ConnectionManager, Arc<RecordingFactory>) {
    let factory = Arc::new(factory);
    let manager = ConnectionManager::new(
        DatabaseConfig::single("mysql", ConnectionConfig::default()),
        factory.clone(),
    );
    (manager, factory)
}

/// Build a row from column/value pairs
pub fn row<I, K>(pairs: I) -> Row
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}
