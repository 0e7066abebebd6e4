#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use sea_orm::{
    DatabaseBackend, FromQueryResult, MockDatabase, MockExecResult, Statement, Value,
};
use traced_sea_orm::{RecordingTracer, TracedConnection, TracingConfig};

pub const SERVICE: &str = "orders-service";

#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct User {
    pub id: i32,
    pub name: String,
}

pub fn user_row(id: i32, name: &str) -> BTreeMap<&'static str, Value> {
    BTreeMap::from([("id", Value::from(id)), ("name", Value::from(name))])
}

pub fn no_rows() -> Vec<BTreeMap<&'static str, Value>> {
    Vec::new()
}

pub fn exec_result(last_insert_id: u64, rows_affected: u64) -> MockExecResult {
    MockExecResult {
        last_insert_id,
        rows_affected,
    }
}

pub fn pg(sql: &str) -> Statement {
    Statement::from_string(DatabaseBackend::Postgres, sql)
}

pub fn pg_with(sql: &str, values: impl IntoIterator<Item = Value>) -> Statement {
    Statement::from_sql_and_values(DatabaseBackend::Postgres, sql, values)
}

/// Wrap a mock database with a fresh recording tracer.
pub fn traced(mock: MockDatabase) -> (TracedConnection, Arc<RecordingTracer>) {
    traced_with(mock, TracingConfig::new(SERVICE))
}

pub fn traced_with(
    mock: MockDatabase,
    config: TracingConfig,
) -> (TracedConnection, Arc<RecordingTracer>) {
    let tracer = Arc::new(RecordingTracer::new());
    let conn = TracedConnection::with_config(mock.into_connection(), tracer.clone(), config);
    (conn, tracer)
}

pub fn postgres() -> MockDatabase {
    MockDatabase::new(DatabaseBackend::Postgres)
}
