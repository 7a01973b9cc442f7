//! The authenticated user as seen by the storefront.

use serde::{Deserialize, Serialize};

use super::{Email, Role, UserId};

/// An authenticated user: who they are and in what role.
///
/// Sourced from the external identity provider; the storefront never
/// constructs one from user input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Provider-assigned user ID.
    pub id: UserId,
    /// Email the account was registered with, if the provider reports one.
    pub email: Option<Email>,
    /// Account role.
    pub role: Role,
}

impl Identity {
    /// Create a new identity.
    #[must_use]
    pub const fn new(id: UserId, email: Option<Email>, role: Role) -> Self {
        Self { id, email, role }
    }

    /// Whether this identity holds the given role.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }

    /// Name to show in the navbar: the email if known, otherwise the ID.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.email
            .as_ref()
            .map_or_else(|| self.id.to_string(), ToString::to_string)
    }
}
