//! Shared primitives for all Rust crates in rolegate.

#![forbid(unsafe_code)]

/// Identity primitives shared across services.
pub mod auth;

use thiserror::Error;

pub use auth::UserIdentity;

/// Result type used across rolegate crates.
pub type AppResult<T> = Result<T, AppError>;

/// Common application error categories.
///
/// Permission denials are not represented here. A denial is an expected,
/// first-class outcome that callers must distinguish from system failure,
/// so services return it as a value instead of an error.
#[derive(Debug, Error)]
pub enum AppError {
    /// The external identity provider rejected the credentials or was
    /// unusable. Provider-internal detail is never carried past this point.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Neither the primary nor the pooler endpoint accepted a connection.
    #[error("database connection unavailable: {0}")]
    ConnectionUnavailable(String),

    /// The role store could not be read or written. Must never be collapsed
    /// into an `unauthorized` role: "we don't know" is not a valid deny.
    #[error("role store unavailable: {0}")]
    StoreUnavailable(String),

    /// Role value outside the enumerated set.
    #[error("invalid role: {0}")]
    InvalidRole(String),

    /// Database-level failure after permission was already granted.
    #[error("query execution failed: {0}")]
    Execution(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}
