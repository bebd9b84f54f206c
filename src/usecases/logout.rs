//! Logout workflow: publish offline presence, revoke the provider-side
//! session, then scrub the cached session file.

use std::{fs, io::ErrorKind, path::Path};

use crate::{
    infra::{error::AppError, storage_layout::StorageLayout},
    usecases::sign_in::{offline_profile, AuthSourceError, IdentityGateway, ProfilePublisher},
};

const OFFLINE_PUBLISH_FAILED: &str = "LOGOUT_OFFLINE_PUBLISH_FAILED";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoutOutcome {
    /// Whether the offline presence update reached the directory.
    pub went_offline: bool,
    /// Whether a cached session file existed and was removed.
    pub session_scrubbed: bool,
}

#[derive(Debug)]
pub enum LogoutError {
    /// The provider refused to end the session; nothing local is touched.
    SignOutRejected,
    TemporarilyUnavailable,
    Storage(AppError),
}

/// Logs the current user out.
///
/// The offline presence write is best-effort (a stale directory entry is
/// tolerable); a failed provider sign-out abandons the operation with the
/// cached session intact.
pub fn logout<B>(backend: &mut B) -> Result<LogoutOutcome, LogoutError>
where
    B: IdentityGateway + ProfilePublisher + ?Sized,
{
    let layout = StorageLayout::resolve().map_err(LogoutError::Storage)?;
    layout.ensure_dirs().map_err(LogoutError::Storage)?;

    let went_offline = match backend.current_identity() {
        Some(user) => match backend.publish_profile(&offline_profile(&user)) {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(
                    code = OFFLINE_PUBLISH_FAILED,
                    error = ?error,
                    "offline presence update failed; continuing logout"
                );
                false
            }
        },
        None => false,
    };

    backend.sign_out().map_err(|error| match error {
        AuthSourceError::InvalidCredentials => LogoutError::SignOutRejected,
        AuthSourceError::Unavailable | AuthSourceError::Unknown => {
            LogoutError::TemporarilyUnavailable
        }
    })?;

    let session_scrubbed =
        remove_if_exists(&layout.session_file()).map_err(LogoutError::Storage)?;

    Ok(LogoutOutcome {
        went_offline,
        session_scrubbed,
    })
}

fn remove_if_exists(path: &Path) -> Result<bool, AppError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(source) if source.kind() == ErrorKind::NotFound => Ok(false),
        Err(source) => Err(AppError::SessionScrub {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, env};

    use super::*;
    use crate::{
        domain::{message::UserId, session::AuthUser, user::UserProfile},
        test_support::env_lock,
        usecases::sign_in::{Credentials, ProfileWriteError},
    };

    struct StubBackend {
        identity: Option<AuthUser>,
        sign_out_result: Result<(), AuthSourceError>,
        signed_out: RefCell<bool>,
        fail_publish: bool,
        published: RefCell<Option<UserProfile>>,
    }

    impl StubBackend {
        fn new(identity: Option<AuthUser>, sign_out_result: Result<(), AuthSourceError>) -> Self {
            Self {
                identity,
                sign_out_result,
                signed_out: RefCell::new(false),
                fail_publish: false,
                published: RefCell::new(None),
            }
        }
    }

    impl IdentityGateway for StubBackend {
        fn current_identity(&self) -> Option<AuthUser> {
            self.identity.clone()
        }

        fn sign_in(&mut self, _credentials: &Credentials) -> Result<AuthUser, AuthSourceError> {
            Err(AuthSourceError::Unknown)
        }

        fn sign_out(&mut self) -> Result<(), AuthSourceError> {
            *self.signed_out.borrow_mut() = true;
            self.sign_out_result.clone()
        }
    }

    impl ProfilePublisher for StubBackend {
        fn publish_profile(&self, profile: &UserProfile) -> Result<(), ProfileWriteError> {
            if self.fail_publish {
                return Err(ProfileWriteError::Unavailable);
            }
            *self.published.borrow_mut() = Some(profile.clone());
            Ok(())
        }
    }

    fn alice() -> AuthUser {
        AuthUser {
            id: UserId::new("alice"),
            display_name: "Alice".to_owned(),
            email: "alice@example.com".to_owned(),
            avatar_url: String::new(),
        }
    }

    fn with_temp_xdg<F: FnOnce(&StorageLayout)>(test: F) {
        let _guard = env_lock();
        let root = tempfile::tempdir().expect("temp dir should be creatable");

        let old_xdg = env::var_os("XDG_CONFIG_HOME");
        env::set_var("XDG_CONFIG_HOME", root.path());

        let layout = StorageLayout::resolve().expect("layout should resolve");
        layout.ensure_dirs().expect("layout dirs should be created");
        test(&layout);

        match old_xdg {
            Some(value) => env::set_var("XDG_CONFIG_HOME", value),
            None => env::remove_var("XDG_CONFIG_HOME"),
        }
    }

    #[test]
    fn logout_publishes_offline_presence_and_scrubs_the_session() {
        with_temp_xdg(|layout| {
            fs::write(layout.session_file(), b"refresh-token").expect("session written");

            let mut backend = StubBackend::new(Some(alice()), Ok(()));

            let outcome = logout(&mut backend).expect("logout should succeed");

            assert!(outcome.went_offline);
            assert!(outcome.session_scrubbed);
            assert!(!layout.session_file().exists());
            assert!(*backend.signed_out.borrow());

            let published = backend.published.borrow().clone().expect("profile published");
            assert!(!published.is_online);
        });
    }

    #[test]
    fn logout_is_idempotent_when_no_session_file_exists() {
        with_temp_xdg(|_layout| {
            let mut backend = StubBackend::new(None, Ok(()));

            let outcome = logout(&mut backend).expect("logout should succeed");

            assert!(!outcome.went_offline);
            assert!(!outcome.session_scrubbed);
        });
    }

    #[test]
    fn failed_offline_publish_does_not_block_logout() {
        with_temp_xdg(|_layout| {
            let mut backend = StubBackend::new(Some(alice()), Ok(()));
            backend.fail_publish = true;

            let outcome = logout(&mut backend).expect("logout should succeed");

            assert!(!outcome.went_offline);
        });
    }

    #[test]
    fn rejected_sign_out_abandons_the_operation_with_the_session_intact() {
        with_temp_xdg(|layout| {
            fs::write(layout.session_file(), b"refresh-token").expect("session written");

            let mut backend = StubBackend::new(Some(alice()), Err(AuthSourceError::Unavailable));

            let result = logout(&mut backend);

            assert!(matches!(result, Err(LogoutError::TemporarilyUnavailable)));
            assert!(layout.session_file().exists());
        });
    }
}
