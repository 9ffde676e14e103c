use async_trait::async_trait;
use serde::Deserialize;

use rolegate_application::IdentityVerifier;
use rolegate_core::{AppError, AppResult, UserIdentity};

/// Identity verifier backed by the Supabase auth REST API.
///
/// The provider's responses are inspected only for the opaque user id;
/// tokens and profile fields are discarded. A non-success status means the
/// credentials were rejected, a transport failure means the provider could
/// not be consulted, and the two are never conflated.
pub struct SupabaseIdentityVerifier {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
}

/// Supabase nests the user under `user` on token responses but returns it
/// at the top level on signup responses; both shapes are accepted.
#[derive(Debug, Deserialize)]
struct AuthResponse {
    user: Option<AuthUser>,
    id: Option<String>,
}

impl AuthResponse {
    fn into_user_id(self) -> Option<String> {
        self.user.map(|user| user.id).or(self.id)
    }
}

impl SupabaseIdentityVerifier {
    /// Creates a verifier for the project at `base_url` using `api_key`.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    async fn request_identity(
        &self,
        url: &str,
        email: &str,
        password: &str,
    ) -> AppResult<Option<UserIdentity>> {
        let response = self
            .http_client
            .post(url)
            .header("apikey", self.api_key.as_str())
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|error| {
                tracing::warn!(error = %error, "identity provider unreachable");
                AppError::AuthenticationFailed
            })?;

        if !response.status().is_success() {
            return Ok(None);
        }

        let body: AuthResponse = response.json().await.map_err(|error| {
            tracing::warn!(error = %error, "identity provider returned an unreadable body");
            AppError::AuthenticationFailed
        })?;

        Ok(body.into_user_id().map(UserIdentity::new))
    }
}

#[async_trait]
impl IdentityVerifier for SupabaseIdentityVerifier {
    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> AppResult<Option<UserIdentity>> {
        let url = self.endpoint("/auth/v1/token?grant_type=password");
        self.request_identity(url.as_str(), email, password).await
    }

    async fn register(&self, email: &str, password: &str) -> AppResult<Option<UserIdentity>> {
        let url = self.endpoint("/auth/v1/signup");
        self.request_identity(url.as_str(), email, password).await
    }
}
