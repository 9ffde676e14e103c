use std::fmt::{Display, Formatter};
use std::str::FromStr;

use rolegate_core::{AppError, UserIdentity};
use serde::{Deserialize, Serialize};

/// Privilege level attached to a user identity.
///
/// Query permissions follow `Unauthorized < ReadAccess < ReadWriteAccess`,
/// with `Admin` matching `ReadWriteAccess` for queries while additionally
/// gating role administration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// No privilege. The default for any identity without a stored record.
    Unauthorized,
    /// May run read queries only.
    ReadAccess,
    /// May run read and write queries.
    ReadWriteAccess,
    /// Full query access plus role administration.
    Admin,
}

impl Role {
    /// Returns a stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::ReadAccess => "read_access",
            Self::ReadWriteAccess => "read_write_access",
            Self::Admin => "admin",
        }
    }

    /// Returns all known roles.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Role] = &[
            Role::Unauthorized,
            Role::ReadAccess,
            Role::ReadWriteAccess,
            Role::Admin,
        ];

        ALL
    }

    /// Whether this role may run read queries.
    #[must_use]
    pub fn can_read(&self) -> bool {
        !matches!(self, Self::Unauthorized)
    }

    /// Whether this role may run write queries.
    #[must_use]
    pub fn can_write(&self) -> bool {
        matches!(self, Self::ReadWriteAccess | Self::Admin)
    }

    /// Whether this role may grant or update roles.
    #[must_use]
    pub fn can_manage_roles(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "unauthorized" => Ok(Self::Unauthorized),
            "read_access" => Ok(Self::ReadAccess),
            "read_write_access" => Ok(Self::ReadWriteAccess),
            "admin" => Ok(Self::Admin),
            _ => Err(AppError::InvalidRole(format!(
                "unknown role value '{value}'"
            ))),
        }
    }
}

impl Display for Role {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.as_str())
    }
}

/// A persisted (user identity, role) pair.
///
/// The user identity is unique across records; an identity without a record
/// is treated as [`Role::Unauthorized`]. Revocation is modeled as updating
/// the role to `unauthorized`, not as deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    /// Identity the role is attached to.
    pub user_id: UserIdentity,
    /// Stored privilege level.
    pub role: Role,
}

/// Permission refusal returned to callers as a value, never as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// The acting role holds no privilege at all.
    UnauthorizedRole,
    /// A read-only role attempted a write query.
    ReadOnlyWrite,
    /// A non-admin attempted a role administration operation.
    AdminRequired,
}

impl Denial {
    /// Returns the user-facing refusal message.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnauthorizedRole => "unauthorized role",
            Self::ReadOnlyWrite => "read-only role cannot modify data",
            Self::AdminRequired => "only admin can update roles",
        }
    }
}

impl Display for Denial {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.as_str())
    }
}
