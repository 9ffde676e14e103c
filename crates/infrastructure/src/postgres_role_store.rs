use std::str::FromStr;

use async_trait::async_trait;

use rolegate_application::RoleStore;
use rolegate_core::{AppError, AppResult, UserIdentity};
use rolegate_domain::{Role, RoleRecord};

use sqlx::FromRow;
use sqlx::postgres::PgConnection;

use crate::connection::{PostgresEndpoint, acquire_connection};

const CREATE_ROLES_TABLE: &str =
    "CREATE TABLE IF NOT EXISTS roles (user_id TEXT PRIMARY KEY, role TEXT NOT NULL)";

/// PostgreSQL-backed store for the identity → role mapping.
///
/// Every call opens its own short-lived connection through the endpoint
/// resolver. The `roles` table is created lazily before administrative
/// writes; lookups against a missing table surface as store failures rather
/// than defaulting anyone's role.
#[derive(Clone)]
pub struct PostgresRoleStore {
    endpoint: PostgresEndpoint,
}

impl PostgresRoleStore {
    /// Creates a role store over the given endpoint configuration.
    #[must_use]
    pub fn new(endpoint: PostgresEndpoint) -> Self {
        Self { endpoint }
    }

    async fn connect(&self) -> AppResult<PgConnection> {
        acquire_connection(&self.endpoint)
            .await
            .map_err(|error| match error {
                AppError::ConnectionUnavailable(detail) => AppError::StoreUnavailable(detail),
                other => other,
            })
    }
}

#[derive(Debug, FromRow)]
struct RoleValueRow {
    role: String,
}

#[derive(Debug, FromRow)]
struct RoleRecordRow {
    user_id: String,
    role: String,
}

#[async_trait]
impl RoleStore for PostgresRoleStore {
    async fn lookup_role(&self, user_id: &UserIdentity) -> AppResult<Role> {
        let mut connection = self.connect().await?;

        let row = sqlx::query_as::<_, RoleValueRow>("SELECT role FROM roles WHERE user_id = $1")
            .bind(user_id.as_str())
            .fetch_optional(&mut connection)
            .await
            .map_err(|error| AppError::StoreUnavailable(format!("role lookup failed: {error}")))?;

        match row {
            Some(row) => Role::from_str(row.role.as_str()),
            None => Ok(Role::Unauthorized),
        }
    }

    async fn upsert_role(&self, user_id: &UserIdentity, role: Role) -> AppResult<()> {
        let mut connection = self.connect().await?;

        sqlx::query(CREATE_ROLES_TABLE)
            .execute(&mut connection)
            .await
            .map_err(|error| {
                AppError::StoreUnavailable(format!("failed to ensure roles table: {error}"))
            })?;

        sqlx::query(
            r#"
            INSERT INTO roles (user_id, role)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET role = EXCLUDED.role
            "#,
        )
        .bind(user_id.as_str())
        .bind(role.as_str())
        .execute(&mut connection)
        .await
        .map_err(|error| AppError::StoreUnavailable(format!("role upsert failed: {error}")))?;

        Ok(())
    }

    async fn list_records(&self) -> AppResult<Vec<RoleRecord>> {
        let mut connection = self.connect().await?;

        let rows = sqlx::query_as::<_, RoleRecordRow>(
            "SELECT user_id, role FROM roles ORDER BY user_id",
        )
        .fetch_all(&mut connection)
        .await
        .map_err(|error| AppError::StoreUnavailable(format!("role listing failed: {error}")))?;

        rows.into_iter()
            .map(|row| {
                let role = Role::from_str(row.role.as_str())?;
                Ok(RoleRecord {
                    user_id: UserIdentity::new(row.user_id),
                    role,
                })
            })
            .collect()
    }
}
