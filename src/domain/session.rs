use std::time::{SystemTime, UNIX_EPOCH};

use super::message::UserId;

/// The authenticated identity as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: UserId,
    pub display_name: String,
    pub email: String,
    pub avatar_url: String,
}

/// Explicit session context passed to everything that needs identity.
/// Replaces ambient "who is logged in" state; ending the session is the
/// signal to clear projections and cancel subscriptions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    identity: Option<AuthUser>,
}

impl Session {
    pub fn authenticated(user: AuthUser) -> Self {
        Self {
            identity: Some(user),
        }
    }

    pub fn current_user(&self) -> Option<&AuthUser> {
        self.identity.as_ref()
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.identity.as_ref().map(|user| &user.id)
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn begin(&mut self, user: AuthUser) {
        self.identity = Some(user);
    }

    pub fn end(&mut self) {
        self.identity = None;
    }
}

pub fn now_unix_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> AuthUser {
        AuthUser {
            id: UserId::new("alice"),
            display_name: "Alice".to_owned(),
            email: "alice@example.com".to_owned(),
            avatar_url: String::new(),
        }
    }

    #[test]
    fn default_session_is_unauthenticated() {
        let session = Session::default();

        assert!(!session.is_authenticated());
        assert_eq!(session.user_id(), None);
    }

    #[test]
    fn begin_and_end_toggle_the_identity() {
        let mut session = Session::default();

        session.begin(alice());
        assert!(session.is_authenticated());
        assert_eq!(session.user_id(), Some(&UserId::new("alice")));

        session.end();
        assert!(!session.is_authenticated());
        assert_eq!(session.current_user(), None);
    }
}
