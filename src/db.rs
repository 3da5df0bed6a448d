//! Execution engine
//!
//! The database boundary: an accepted query goes in, JSON-ready rows come
//! out. Errors surface as message strings so the workflow's classifier can
//! route them to targeted feedback.

use crate::error::{Result, WardenError};
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Row};

/// One result row, keyed by column name.
pub type ResultRow = Map<String, Value>;

#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    async fn run_query(&self, sql: &str) -> Result<Vec<ResultRow>>;
}

pub struct PgExecutionEngine {
    pool: PgPool,
}

impl PgExecutionEngine {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| WardenError::Database(format!("failed to connect: {}", e)))?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl ExecutionEngine for PgExecutionEngine {
    async fn run_query(&self, sql: &str) -> Result<Vec<ResultRow>> {
        let rows = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| WardenError::Database(e.to_string()))?;
        Ok(rows.iter().map(row_to_json).collect())
    }
}

fn row_to_json(row: &PgRow) -> ResultRow {
    let mut out = Map::new();
    for (idx, column) in row.columns().iter().enumerate() {
        out.insert(column.name().to_string(), column_value(row, idx));
    }
    out
}

/// Best-effort decode across the column types the schema pipeline produces.
fn column_value(row: &PgRow, idx: usize) -> Value {
    if let Ok(v) = row.try_get::<Option<bool>, _>(idx) {
        return v.map(Value::Bool).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<i16>, _>(idx) {
        return v.map(|n| Value::from(n as i64)).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<i32>, _>(idx) {
        return v.map(|n| Value::from(n as i64)).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f32>, _>(idx) {
        return v.map(|n| Value::from(n as f64)).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
        return v.map(Value::String).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<chrono::NaiveDate>, _>(idx) {
        return v.map(|d| Value::String(d.to_string())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<chrono::NaiveDateTime>, _>(idx) {
        return v.map(|d| Value::String(d.to_string())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(idx) {
        return v.map(|d| Value::String(d.to_rfc3339())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<uuid::Uuid>, _>(idx) {
        return v.map(|u| Value::String(u.to_string())).unwrap_or(Value::Null);
    }
    Value::Null
}
