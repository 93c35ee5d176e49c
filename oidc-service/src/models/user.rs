//! End-user identity, normalized across identity providers.

use serde::{Deserialize, Serialize};

/// A user as established by a credential provider. Providers map their
/// native account shape into this one before it enters the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable subject identifier within the tenant's provider.
    pub id: String,
    pub email: String,
    pub name: String,
    /// Scope strings the user is entitled to request.
    pub permissions: Vec<String>,
}

impl User {
    pub fn new(
        id: impl Into<String>,
        email: impl Into<String>,
        name: impl Into<String>,
        permissions: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            name: name.into(),
            permissions,
        }
    }
}
