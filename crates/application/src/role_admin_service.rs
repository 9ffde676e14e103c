use std::sync::Arc;

use rolegate_core::{AppResult, UserIdentity};
use rolegate_domain::{Denial, Role, RoleRecord};

use crate::RoleStore;

/// Outcome of a grant-or-update request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantOutcome {
    /// The role record was written.
    Applied,
    /// The requester lacked administrative privilege; the store is unchanged.
    Denied(Denial),
}

/// Outcome of an administrative role listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleListing {
    /// All persisted role records.
    Records(Vec<RoleRecord>),
    /// The requester lacked administrative privilege.
    Denied(Denial),
}

/// Application service for role administration.
///
/// Authority is re-derived from the role store on every call. A role value
/// threaded through session state could be stale or forged upstream, so it
/// is never accepted here.
#[derive(Clone)]
pub struct RoleAdminService {
    role_store: Arc<dyn RoleStore>,
}

impl RoleAdminService {
    /// Creates a new role administration service.
    #[must_use]
    pub fn new(role_store: Arc<dyn RoleStore>) -> Self {
        Self { role_store }
    }

    /// Grants a role to `target`, or updates the existing record.
    ///
    /// The requester's role is freshly resolved from the store; anything
    /// short of admin is refused without touching the store. Store
    /// unavailability during the resolution propagates as an error, it
    /// never falls back to a permissive default.
    pub async fn grant_or_update(
        &self,
        requester: &UserIdentity,
        target: &UserIdentity,
        new_role: Role,
    ) -> AppResult<GrantOutcome> {
        let requester_role = self.role_store.lookup_role(requester).await?;
        if !requester_role.can_manage_roles() {
            return Ok(GrantOutcome::Denied(Denial::AdminRequired));
        }

        self.role_store.upsert_role(target, new_role).await?;
        Ok(GrantOutcome::Applied)
    }

    /// Lists every role record for an administrative requester.
    pub async fn list_roles(&self, requester: &UserIdentity) -> AppResult<RoleListing> {
        let requester_role = self.role_store.lookup_role(requester).await?;
        if !requester_role.can_manage_roles() {
            return Ok(RoleListing::Denied(Denial::AdminRequired));
        }

        Ok(RoleListing::Records(self.role_store.list_records().await?))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use rolegate_core::{AppError, AppResult, UserIdentity};
    use rolegate_domain::{Denial, Role, RoleRecord};
    use tokio::sync::Mutex;

    use super::{GrantOutcome, RoleAdminService, RoleListing};
    use crate::RoleStore;

    #[derive(Default)]
    struct FakeRoleStore {
        records: Mutex<HashMap<String, Role>>,
    }

    impl FakeRoleStore {
        async fn with_records(entries: &[(&str, Role)]) -> Self {
            let store = Self::default();
            {
                let mut records = store.records.lock().await;
                for (user_id, role) in entries {
                    records.insert((*user_id).to_owned(), *role);
                }
            }
            store
        }
    }

    #[async_trait]
    impl RoleStore for FakeRoleStore {
        async fn lookup_role(&self, user_id: &UserIdentity) -> AppResult<Role> {
            Ok(self
                .records
                .lock()
                .await
                .get(user_id.as_str())
                .copied()
                .unwrap_or(Role::Unauthorized))
        }

        async fn upsert_role(&self, user_id: &UserIdentity, role: Role) -> AppResult<()> {
            self.records
                .lock()
                .await
                .insert(user_id.as_str().to_owned(), role);
            Ok(())
        }

        async fn list_records(&self) -> AppResult<Vec<RoleRecord>> {
            let records = self.records.lock().await;
            let mut listing: Vec<RoleRecord> = records
                .iter()
                .map(|(user_id, role)| RoleRecord {
                    user_id: UserIdentity::new(user_id.clone()),
                    role: *role,
                })
                .collect();
            listing.sort_by(|left, right| left.user_id.as_str().cmp(right.user_id.as_str()));
            Ok(listing)
        }
    }

    struct UnavailableRoleStore;

    #[async_trait]
    impl RoleStore for UnavailableRoleStore {
        async fn lookup_role(&self, _user_id: &UserIdentity) -> AppResult<Role> {
            Err(AppError::StoreUnavailable("both endpoints refused".to_owned()))
        }

        async fn upsert_role(&self, _user_id: &UserIdentity, _role: Role) -> AppResult<()> {
            Err(AppError::StoreUnavailable("both endpoints refused".to_owned()))
        }

        async fn list_records(&self) -> AppResult<Vec<RoleRecord>> {
            Err(AppError::StoreUnavailable("both endpoints refused".to_owned()))
        }
    }

    #[tokio::test]
    async fn non_admin_grant_is_denied_and_store_unchanged() {
        for requester_role in [Role::Unauthorized, Role::ReadAccess, Role::ReadWriteAccess] {
            let store =
                Arc::new(FakeRoleStore::with_records(&[("requester", requester_role)]).await);
            let service = RoleAdminService::new(store.clone());

            let outcome = service
                .grant_or_update(
                    &UserIdentity::new("requester"),
                    &UserIdentity::new("target"),
                    Role::ReadAccess,
                )
                .await;
            assert!(matches!(
                outcome,
                Ok(GrantOutcome::Denied(Denial::AdminRequired))
            ));
            assert!(!store.records.lock().await.contains_key("target"));
        }
    }

    #[tokio::test]
    async fn admin_grant_creates_record_for_unknown_identity() {
        let store = Arc::new(FakeRoleStore::with_records(&[("root", Role::Admin)]).await);
        let service = RoleAdminService::new(store.clone());

        let outcome = service
            .grant_or_update(
                &UserIdentity::new("root"),
                &UserIdentity::new("newcomer"),
                Role::ReadWriteAccess,
            )
            .await;
        assert!(matches!(outcome, Ok(GrantOutcome::Applied)));

        let stored = store.lookup_role(&UserIdentity::new("newcomer")).await;
        assert!(matches!(stored, Ok(Role::ReadWriteAccess)));
    }

    #[tokio::test]
    async fn repeated_grant_with_the_same_role_is_idempotent() {
        let store = Arc::new(FakeRoleStore::with_records(&[("root", Role::Admin)]).await);
        let service = RoleAdminService::new(store.clone());

        for _ in 0..2 {
            let outcome = service
                .grant_or_update(
                    &UserIdentity::new("root"),
                    &UserIdentity::new("reader"),
                    Role::ReadAccess,
                )
                .await;
            assert!(matches!(outcome, Ok(GrantOutcome::Applied)));
        }

        let stored = store.lookup_role(&UserIdentity::new("reader")).await;
        assert!(matches!(stored, Ok(Role::ReadAccess)));
    }

    #[tokio::test]
    async fn requester_role_is_resolved_from_store_not_caller() {
        // The requester claims nothing; the store says unauthorized. The
        // service must consult the store and refuse.
        let store = Arc::new(FakeRoleStore::default());
        let service = RoleAdminService::new(store);

        let outcome = service
            .grant_or_update(
                &UserIdentity::new("unknown"),
                &UserIdentity::new("target"),
                Role::Admin,
            )
            .await;
        assert!(matches!(
            outcome,
            Ok(GrantOutcome::Denied(Denial::AdminRequired))
        ));
    }

    #[tokio::test]
    async fn store_unavailability_propagates_instead_of_failing_open() {
        let service = RoleAdminService::new(Arc::new(UnavailableRoleStore));

        let outcome = service
            .grant_or_update(
                &UserIdentity::new("root"),
                &UserIdentity::new("target"),
                Role::Admin,
            )
            .await;
        assert!(matches!(outcome, Err(AppError::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn listing_is_admin_gated() {
        let store = Arc::new(
            FakeRoleStore::with_records(&[("root", Role::Admin), ("reader", Role::ReadAccess)])
                .await,
        );
        let service = RoleAdminService::new(store);

        let denied = service.list_roles(&UserIdentity::new("reader")).await;
        assert!(matches!(
            denied,
            Ok(RoleListing::Denied(Denial::AdminRequired))
        ));

        let listing = service.list_roles(&UserIdentity::new("root")).await;
        match listing {
            Ok(RoleListing::Records(records)) => assert_eq!(records.len(), 2),
            other => panic!("expected records, got {other:?}"),
        }
    }
}
