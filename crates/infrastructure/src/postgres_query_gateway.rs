use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

use rolegate_application::QueryGateway;
use rolegate_core::{AppError, AppResult};
use rolegate_domain::Table;

use sqlx::postgres::PgRow;
use sqlx::{Column, Connection, Row, TypeInfo};

use crate::connection::{PostgresEndpoint, acquire_connection};

/// PostgreSQL gateway executing already-permitted queries.
///
/// Each call opens its own connection. Writes run inside an explicit
/// transaction; a failed statement leaves the transaction uncommitted and
/// it rolls back when dropped.
#[derive(Clone)]
pub struct PostgresQueryGateway {
    endpoint: PostgresEndpoint,
}

impl PostgresQueryGateway {
    /// Creates a gateway over the given endpoint configuration.
    #[must_use]
    pub fn new(endpoint: PostgresEndpoint) -> Self {
        Self { endpoint }
    }
}

fn render_value(row: &PgRow, index: usize) -> Result<String, sqlx::Error> {
    let type_name = row.columns()[index].type_info().name();
    let rendered = match type_name {
        "BOOL" => row
            .try_get::<Option<bool>, _>(index)?
            .map(|value| value.to_string()),
        "INT2" => row
            .try_get::<Option<i16>, _>(index)?
            .map(|value| value.to_string()),
        "INT4" => row
            .try_get::<Option<i32>, _>(index)?
            .map(|value| value.to_string()),
        "INT8" => row
            .try_get::<Option<i64>, _>(index)?
            .map(|value| value.to_string()),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(index)?
            .map(|value| value.to_string()),
        "FLOAT8" => row
            .try_get::<Option<f64>, _>(index)?
            .map(|value| value.to_string()),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => row.try_get::<Option<String>, _>(index)?,
        "UUID" => row
            .try_get::<Option<Uuid>, _>(index)?
            .map(|value| value.to_string()),
        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(index)?
            .map(|value| value.to_rfc3339()),
        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(index)?
            .map(|value| value.to_string()),
        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(index)?
            .map(|value| value.to_string()),
        "JSON" | "JSONB" => row
            .try_get::<Option<serde_json::Value>, _>(index)?
            .map(|value| value.to_string()),
        other => Some(format!("<{other}>")),
    };
    Ok(rendered.unwrap_or_default())
}

#[async_trait]
impl QueryGateway for PostgresQueryGateway {
    async fn run_read(&self, query: &str) -> AppResult<Table> {
        let mut connection = acquire_connection(&self.endpoint).await?;

        let rows = sqlx::query(query)
            .fetch_all(&mut connection)
            .await
            .map_err(|error| AppError::Execution(format!("read query failed: {error}")))?;

        let columns = rows.first().map_or_else(Vec::new, |row| {
            row.columns()
                .iter()
                .map(|column| column.name().to_owned())
                .collect()
        });

        let mut rendered_rows = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut rendered = Vec::with_capacity(row.columns().len());
            for index in 0..row.columns().len() {
                let value = render_value(row, index).map_err(|error| {
                    AppError::Execution(format!(
                        "failed to decode column {index} of read result: {error}"
                    ))
                })?;
                rendered.push(value);
            }
            rendered_rows.push(rendered);
        }

        Ok(Table {
            columns,
            rows: rendered_rows,
        })
    }

    async fn run_write(&self, query: &str) -> AppResult<u64> {
        let mut connection = acquire_connection(&self.endpoint).await?;

        let mut transaction = connection
            .begin()
            .await
            .map_err(|error| AppError::Execution(format!("failed to open transaction: {error}")))?;

        let result = sqlx::query(query)
            .execute(&mut *transaction)
            .await
            .map_err(|error| AppError::Execution(format!("write query failed: {error}")))?;

        transaction
            .commit()
            .await
            .map_err(|error| AppError::Execution(format!("failed to commit write: {error}")))?;

        Ok(result.rows_affected())
    }
}
