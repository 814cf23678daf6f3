//! Client-held session state.

use cartwheel_core::{Cart, User, UserId, UserRole};

/// Authentication, user and cart state, sourced entirely from backend
/// responses.
///
/// [`crate::Store::session`] hands out copies; the live value sits behind the
/// store's lock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Whether a token is held.
    pub is_authenticated: bool,
    /// ID of the signed-in user (known before the profile is loaded).
    pub user_id: Option<UserId>,
    /// Profile of the signed-in user, once fetched.
    pub user: Option<User>,
    /// Role of the signed-in user.
    pub user_role: Option<UserRole>,
    /// Cart exactly as the backend last answered it.
    pub cart: Cart,
    /// A profile request is in flight.
    pub loading_user: bool,
}

impl Session {
    /// Whether the session belongs to an administrator.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user_role.as_ref().is_some_and(UserRole::is_admin)
    }

    /// ID of the signed-in user, from the profile if loaded.
    #[must_use]
    pub fn current_user_id(&self) -> Option<&UserId> {
        self.user
            .as_ref()
            .map(|user| &user.id)
            .or(self.user_id.as_ref())
    }

    /// Take id, role and profile from a fetched user.
    pub(crate) fn apply_user(&mut self, user: User) {
        self.user_id = Some(user.id.clone());
        self.user_role = Some(user.role.clone());
        self.user = Some(user);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_signed_out() {
        let session = Session::default();
        assert!(!session.is_authenticated);
        assert!(session.user.is_none());
        assert!(session.cart.is_empty());
        assert!(!session.is_admin());
    }

    #[test]
    fn test_current_user_id_prefers_profile() {
        let mut session = Session {
            user_id: Some(UserId::new("persisted")),
            ..Session::default()
        };
        assert_eq!(session.current_user_id(), Some(&UserId::new("persisted")));

        session.user = Some(User {
            id: UserId::new("profile"),
            name: "Ada".to_owned(),
            email: "ada@example.com".to_owned(),
            role: UserRole::Admin,
            previous_orders: Vec::new(),
        });
        assert_eq!(session.current_user_id(), Some(&UserId::new("profile")));
    }

    #[test]
    fn test_apply_user_sets_id_and_role() {
        let mut session = Session::default();
        session.apply_user(User {
            id: UserId::new("u1"),
            name: "Root".to_owned(),
            email: "root@example.com".to_owned(),
            role: UserRole::Admin,
            previous_orders: Vec::new(),
        });

        assert_eq!(session.user_id, Some(UserId::new("u1")));
        assert!(session.is_admin());
        assert_eq!(session.user.map(|u| u.name), Some("Root".to_owned()));
    }
}
