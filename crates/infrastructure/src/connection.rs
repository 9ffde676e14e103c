use sqlx::ConnectOptions;
use sqlx::postgres::{PgConnectOptions, PgConnection};

use rolegate_core::{AppError, AppResult};

/// Connection settings for the gated database.
///
/// The pooler endpoint addresses the same logical database as the primary
/// host and shares its password, port, and database name; only the host and
/// the user name differ.
#[derive(Debug, Clone)]
pub struct PostgresEndpoint {
    /// Primary database host.
    pub host: String,
    /// Fallback pooler host.
    pub pooler_host: String,
    /// Port shared by both endpoints.
    pub port: u16,
    /// Database name shared by both endpoints.
    pub database: String,
    /// User name for the primary endpoint.
    pub user: String,
    /// User name for the pooler endpoint.
    pub pooler_user: String,
    /// Password shared by both endpoints.
    pub password: String,
    /// Optional schema applied as the connection's search path.
    pub schema: Option<String>,
}

impl PostgresEndpoint {
    fn connect_options(&self, host: &str, user: &str) -> PgConnectOptions {
        let mut options = PgConnectOptions::new()
            .host(host)
            .port(self.port)
            .username(user)
            .password(self.password.as_str())
            .database(self.database.as_str());
        if let Some(schema) = self.schema.as_deref() {
            options = options.options([("search_path", schema)]);
        }
        options
    }
}

/// Opens a single connection, trying the primary host first and the pooler
/// exactly once after it.
///
/// Both attempts failing yields [`AppError::ConnectionUnavailable`]. There is
/// no backoff and no third attempt; callers decide what a dead database means
/// for them.
pub(crate) async fn acquire_connection(endpoint: &PostgresEndpoint) -> AppResult<PgConnection> {
    let primary = endpoint
        .connect_options(endpoint.host.as_str(), endpoint.user.as_str())
        .connect()
        .await;

    let primary_error = match primary {
        Ok(connection) => return Ok(connection),
        Err(error) => error,
    };

    tracing::warn!(
        host = endpoint.host.as_str(),
        error = %primary_error,
        "primary endpoint refused connection, falling back to pooler"
    );

    endpoint
        .connect_options(endpoint.pooler_host.as_str(), endpoint.pooler_user.as_str())
        .connect()
        .await
        .map_err(|pooler_error| {
            AppError::ConnectionUnavailable(format!(
                "primary: {primary_error}; pooler: {pooler_error}"
            ))
        })
}
