use async_trait::async_trait;

use rolegate_core::{AppResult, UserIdentity};
use rolegate_domain::{Role, RoleRecord};

/// Repository port for the persisted identity → role mapping.
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Returns the stored role for `user_id`, or [`Role::Unauthorized`]
    /// when no record exists.
    ///
    /// Store unavailability must surface as
    /// [`AppError::StoreUnavailable`](rolegate_core::AppError::StoreUnavailable),
    /// never as a default role: "we don't know" is neither a grant nor a
    /// silent deny.
    async fn lookup_role(&self, user_id: &UserIdentity) -> AppResult<Role>;

    /// Inserts a record for `user_id` or updates the existing one.
    ///
    /// Idempotent when called twice with the same role.
    async fn upsert_role(&self, user_id: &UserIdentity, role: Role) -> AppResult<()>;

    /// Lists every persisted role record.
    async fn list_records(&self) -> AppResult<Vec<RoleRecord>>;
}
