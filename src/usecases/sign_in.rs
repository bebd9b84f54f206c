//! Sign-in workflow: authenticate against the identity provider, then
//! publish the user's directory profile with presence set to online.

use crate::domain::{
    session::{now_unix_ms, AuthUser},
    user::UserProfile,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Errors the identity provider can report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthSourceError {
    InvalidCredentials,
    Unavailable,
    Unknown,
}

/// Errors the directory can report for a profile write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileWriteError {
    Unauthorized,
    Unavailable,
}

/// Seam toward the hosted identity provider.
pub trait IdentityGateway {
    /// Returns the already-established identity, if any (cached session).
    fn current_identity(&self) -> Option<AuthUser>;

    fn sign_in(&mut self, credentials: &Credentials) -> Result<AuthUser, AuthSourceError>;

    /// Tears down the provider-side session. Local cleanup is the caller's.
    fn sign_out(&mut self) -> Result<(), AuthSourceError>;
}

/// Seam toward the user directory for presence/profile writes.
pub trait ProfilePublisher {
    fn publish_profile(&self, profile: &UserProfile) -> Result<(), ProfileWriteError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInError {
    /// Email or password empty after trimming.
    MissingCredentials,
    InvalidCredentials,
    TemporarilyUnavailable,
    /// Authentication succeeded but the directory profile could not be
    /// published; the account would be invisible to other users.
    ProfileUnavailable,
}

/// Signs in and publishes the directory profile with `is_online = true`.
pub fn sign_in<B>(backend: &mut B, credentials: &Credentials) -> Result<AuthUser, SignInError>
where
    B: IdentityGateway + ProfilePublisher + ?Sized,
{
    if credentials.email.trim().is_empty() || credentials.password.is_empty() {
        return Err(SignInError::MissingCredentials);
    }

    let user = backend.sign_in(credentials).map_err(map_auth_error)?;

    backend
        .publish_profile(&online_profile(&user))
        .map_err(|_| SignInError::ProfileUnavailable)?;

    Ok(user)
}

/// The directory profile for a freshly signed-in user.
pub fn online_profile(user: &AuthUser) -> UserProfile {
    UserProfile {
        id: user.id.clone(),
        display_name: user.display_name.clone(),
        email: user.email.clone(),
        avatar_url: user.avatar_url.clone(),
        is_online: true,
        last_seen_unix_ms: now_unix_ms(),
    }
}

/// The presence update written just before signing out.
pub fn offline_profile(user: &AuthUser) -> UserProfile {
    UserProfile {
        is_online: false,
        last_seen_unix_ms: now_unix_ms(),
        ..online_profile(user)
    }
}

fn map_auth_error(error: AuthSourceError) -> SignInError {
    match error {
        AuthSourceError::InvalidCredentials => SignInError::InvalidCredentials,
        AuthSourceError::Unavailable | AuthSourceError::Unknown => {
            SignInError::TemporarilyUnavailable
        }
    }
}
