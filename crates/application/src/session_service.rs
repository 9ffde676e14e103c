use std::sync::Arc;

use async_trait::async_trait;

use rolegate_core::{AppResult, UserIdentity};
use rolegate_domain::Role;

use crate::RoleStore;

/// Port verifying credentials against the external identity provider.
///
/// `Ok(None)` means the provider rejected the credentials; `Err` means the
/// provider could not be consulted at all. Callers must not collapse the
/// two.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verifies an email/password pair and returns the provider identity.
    async fn authenticate(&self, email: &str, password: &str)
    -> AppResult<Option<UserIdentity>>;

    /// Registers a new account and returns the provider identity.
    async fn register(&self, email: &str, password: &str) -> AppResult<Option<UserIdentity>>;
}

/// An authenticated session: the verified identity and its stored role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Identity issued by the provider.
    pub user_id: UserIdentity,
    /// Role resolved from the role store at login time.
    pub role: Role,
}

/// Application service establishing sessions from credentials.
#[derive(Clone)]
pub struct SessionService {
    verifier: Arc<dyn IdentityVerifier>,
    role_store: Arc<dyn RoleStore>,
}

impl SessionService {
    /// Creates a new session service.
    #[must_use]
    pub fn new(verifier: Arc<dyn IdentityVerifier>, role_store: Arc<dyn RoleStore>) -> Self {
        Self { verifier, role_store }
    }

    /// Authenticates the credentials and resolves the stored role.
    ///
    /// Returns `Ok(None)` when the provider rejects the credentials. When
    /// the provider accepts but the role store is unavailable, the error
    /// propagates; a session is never fabricated with a guessed role.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<Option<Session>> {
        let Some(user_id) = self.verifier.authenticate(email, password).await? else {
            return Ok(None);
        };

        let role = self.role_store.lookup_role(&user_id).await?;
        Ok(Some(Session { user_id, role }))
    }

    /// Registers a new account and records it with no access.
    ///
    /// A role record with [`Role::Unauthorized`] is written immediately so
    /// the new identity shows up in administrative listings; an admin must
    /// grant anything beyond that.
    pub async fn register(&self, email: &str, password: &str) -> AppResult<Option<Session>> {
        let Some(user_id) = self.verifier.register(email, password).await? else {
            return Ok(None);
        };

        self.role_store
            .upsert_role(&user_id, Role::Unauthorized)
            .await?;
        Ok(Some(Session {
            user_id,
            role: Role::Unauthorized,
        }))
    }
}
