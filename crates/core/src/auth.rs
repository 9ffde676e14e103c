use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Opaque user identifier issued by the external identity provider.
///
/// Immutable once issued and never generated locally; the provider's
/// subject value is carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserIdentity(String);

impl UserIdentity {
    /// Wraps a provider-issued identifier.
    #[must_use]
    pub fn new(subject: impl Into<String>) -> Self {
        Self(subject.into())
    }

    /// Returns the identifier as issued by the provider.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for UserIdentity {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl From<UserIdentity> for String {
    fn from(value: UserIdentity) -> Self {
        value.0
    }
}
