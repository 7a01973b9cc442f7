//! Access decision for role-restricted views.
//!
//! [`authorize`] is a pure function of the current identity and the role a
//! view requires. A signed-in user with the wrong role is sent to their own
//! dashboard rather than shown an error.

use crate::types::{Identity, Role};

/// Where a rejected navigation is sent instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// The public landing page.
    Landing,
    /// The dashboard belonging to the given role.
    Dashboard(Role),
}

impl Destination {
    /// Path to redirect to.
    #[must_use]
    pub const fn path(&self) -> &'static str {
        match self {
            Self::Landing => "/",
            Self::Dashboard(role) => role.dashboard_path(),
        }
    }
}

/// Outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Render the requested view.
    Granted,
    /// Navigate elsewhere.
    Redirect(Destination),
}

/// Decide whether `identity` may view a page restricted to `required`.
#[must_use]
pub fn authorize(identity: Option<&Identity>, required: Role) -> Access {
    match identity {
        None => Access::Redirect(Destination::Landing),
        Some(identity) if identity.role != required => {
            Access::Redirect(Destination::Dashboard(identity.role))
        }
        Some(_) => Access::Granted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserId;

    fn identity(role: Role) -> Identity {
        Identity::new(UserId::new("u1"), None, role)
    }

    #[test]
    fn test_anonymous_goes_to_landing() {
        for role in Role::ALL {
            assert_eq!(
                authorize(None, role),
                Access::Redirect(Destination::Landing)
            );
        }
    }

    #[test]
    fn test_wrong_role_goes_to_own_dashboard() {
        let consumer = identity(Role::Consumer);
        let access = authorize(Some(&consumer), Role::Producer);
        assert_eq!(
            access,
            Access::Redirect(Destination::Dashboard(Role::Consumer))
        );

        let producer = identity(Role::Producer);
        let Access::Redirect(dest) = authorize(Some(&producer), Role::Consumer) else {
            panic!("producer must not reach consumer views");
        };
        assert_eq!(dest.path(), "/producer/dashboard");
    }

    #[test]
    fn test_matching_role_is_granted() {
        for role in Role::ALL {
            assert_eq!(authorize(Some(&identity(role)), role), Access::Granted);
        }
    }

    #[test]
    fn test_landing_path() {
        assert_eq!(Destination::Landing.path(), "/");
    }
}
