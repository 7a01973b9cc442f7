//! Account roles.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a role tag is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown role: {0:?}")]
pub struct RoleParseError(pub String);

/// The kind of account a user holds.
///
/// Determines which dashboard a user lands on and which role-gated views
/// admit them. Serialized as the lowercase tag stored in the identity
/// provider's user metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Sells products through the marketplace.
    Producer,
    /// Buys products; owns a cart.
    Consumer,
}

impl Role {
    /// All roles, in display order.
    pub const ALL: [Self; 2] = [Self::Consumer, Self::Producer];

    /// The lowercase tag (`"producer"` / `"consumer"`).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Producer => "producer",
            Self::Consumer => "consumer",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Producer => "Producer",
            Self::Consumer => "Consumer",
        }
    }

    /// Path of this role's own dashboard.
    #[must_use]
    pub const fn dashboard_path(&self) -> &'static str {
        match self {
            Self::Producer => "/producer/dashboard",
            Self::Consumer => "/consumer/dashboard",
        }
    }

    /// Path of this role's login page.
    #[must_use]
    pub const fn login_path(&self) -> &'static str {
        match self {
            Self::Producer => "/producer/login",
            Self::Consumer => "/consumer/login",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "producer" => Ok(Self::Producer),
            "consumer" => Ok(Self::Consumer),
            other => Err(RoleParseError(other.to_owned())),
        }
    }
}
