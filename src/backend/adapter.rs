//! The concrete backend adapter. Owns the async runtime and the REST
//! clients, implements the gateway traits the use cases depend on, and
//! spawns the live snapshot feeds.

use std::{fs, path::PathBuf, sync::mpsc::Sender, time::Duration};

use serde::{Deserialize, Serialize};
use tokio::runtime::Runtime;

use crate::{
    domain::{
        message::{Message, UserId},
        session::AuthUser,
        user::UserProfile,
    },
    infra::{config::BackendConfig, error::AppError, storage_layout::StorageLayout},
    usecases::{
        send_message::{MessageWriter, SendSourceError},
        sign_in::{
            AuthSourceError, Credentials, IdentityGateway, ProfilePublisher, ProfileWriteError,
        },
        sync_conversations::FeedHandle,
    },
};

use super::{
    feed::{FeedEvent, SnapshotFetchError, SnapshotMonitor},
    firestore::{
        parse_message_document, parse_user_document, FirestoreClient, StoreError, StoreErrorKind,
        MESSAGES_COLLECTION, USERS_COLLECTION,
    },
    identity::{IdentityClient, IdentityError, IdentityErrorKind, IdentitySession},
};

const SESSION_RESTORED: &str = "BACKEND_SESSION_RESTORED";
const SESSION_RESTORE_FAILED: &str = "BACKEND_SESSION_RESTORE_FAILED";
const SESSION_CACHE_WRITE_FAILED: &str = "BACKEND_SESSION_CACHE_WRITE_FAILED";
const SESSION_CACHE_SCRUBBED: &str = "BACKEND_SESSION_CACHE_SCRUBBED";

/// What survives a restart: the refresh token plus enough of the account
/// record to greet the user before the first network round-trip.
#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    refresh_token: String,
    uid: String,
    display_name: String,
    email: String,
    #[serde(default)]
    avatar_url: String,
}

enum AdapterInner {
    Real {
        identity: IdentityClient,
        store: FirestoreClient,
    },
    #[cfg(test)]
    Stub,
}

pub struct FirebaseAdapter {
    rt: Runtime,
    inner: AdapterInner,
    session_path: PathBuf,
    session: Option<IdentitySession>,
    poll_interval: Duration,
}

impl FirebaseAdapter {
    pub fn new(config: &BackendConfig, layout: &StorageLayout) -> Result<Self, AppError> {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .map_err(|error| AppError::Other(error.into()))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|error| AppError::Other(error.into()))?;

        Ok(Self {
            rt,
            inner: AdapterInner::Real {
                identity: IdentityClient::new(http.clone(), &config.api_key),
                store: FirestoreClient::new(http, &config.project_id),
            },
            session_path: layout.session_file(),
            session: None,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        })
    }

    #[cfg(test)]
    pub fn stub(layout: &StorageLayout) -> Self {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("stub runtime should build");
        Self {
            rt,
            inner: AdapterInner::Stub,
            session_path: layout.session_file(),
            session: None,
            poll_interval: Duration::from_millis(10),
        }
    }

    /// Attempts to restore the previous session from the cached refresh
    /// token. A rejected token scrubs the cache; transient failures keep
    /// it for the next run.
    pub fn restore_session(&mut self) -> Option<AuthUser> {
        if let Some(session) = &self.session {
            return Some(session.user.clone());
        }

        let identity = match &self.inner {
            AdapterInner::Real { identity, .. } => identity.clone(),
            #[cfg(test)]
            AdapterInner::Stub => return None,
        };
        let stored = self.load_stored_session()?;

        match self.rt.block_on(identity.refresh(&stored.refresh_token)) {
            Ok(session) => {
                let user = session.user.clone();
                tracing::info!(code = SESSION_RESTORED, "session restored from cache");
                self.install_session(session);
                Some(user)
            }
            Err(IdentityError {
                kind: IdentityErrorKind::InvalidCredentials,
                message,
            }) => {
                tracing::warn!(
                    code = SESSION_RESTORE_FAILED,
                    error = %message,
                    "cached refresh token rejected; scrubbing it"
                );
                if fs::remove_file(&self.session_path).is_ok() {
                    tracing::info!(code = SESSION_CACHE_SCRUBBED, "stale session cache removed");
                }
                None
            }
            Err(error) => {
                tracing::warn!(
                    code = SESSION_RESTORE_FAILED,
                    error = %error.message,
                    "session restore failed; will retry next run"
                );
                None
            }
        }
    }

    /// Spawns the split message feeds (sent by the user, received by the
    /// user). Requires an established session.
    pub fn subscribe_message_feeds(
        &self,
        update_tx: Sender<FeedEvent<Message>>,
    ) -> Vec<Box<dyn FeedHandle>> {
        let (store, session) = match (&self.inner, &self.session) {
            (AdapterInner::Real { store, .. }, Some(session)) => (store.clone(), session),
            _ => return Vec::new(),
        };

        let sides: [(&'static str, &'static str); 2] = [
            ("messages-sent", "senderId"),
            ("messages-received", "receiverId"),
        ];
        sides
            .into_iter()
            .map(|(name, field)| {
                let store = store.clone();
                let token = session.id_token.clone();
                let uid = session.user.id.as_str().to_owned();
                let monitor = SnapshotMonitor::start(
                    self.rt.handle(),
                    name,
                    self.poll_interval,
                    move || {
                        let store = store.clone();
                        let token = token.clone();
                        let uid = uid.clone();
                        async move {
                            let documents = store
                                .query_equal(&token, MESSAGES_COLLECTION, field, &uid)
                                .await
                                .map_err(fetch_error)?;
                            Ok(documents.iter().filter_map(parse_message_document).collect())
                        }
                    },
                    update_tx.clone(),
                );
                Box::new(monitor) as Box<dyn FeedHandle>
            })
            .collect()
    }

    /// Spawns the user-directory feed. Requires an established session.
    pub fn subscribe_directory_feed(
        &self,
        update_tx: Sender<FeedEvent<UserProfile>>,
    ) -> Vec<Box<dyn FeedHandle>> {
        let (store, session) = match (&self.inner, &self.session) {
            (AdapterInner::Real { store, .. }, Some(session)) => (store.clone(), session),
            _ => return Vec::new(),
        };

        let token = session.id_token.clone();
        let monitor = SnapshotMonitor::start(
            self.rt.handle(),
            "directory",
            self.poll_interval,
            move || {
                let store = store.clone();
                let token = token.clone();
                async move {
                    let documents = store
                        .list_documents(&token, USERS_COLLECTION)
                        .await
                        .map_err(fetch_error)?;
                    Ok(documents.iter().filter_map(parse_user_document).collect())
                }
            },
            update_tx,
        );
        vec![Box::new(monitor) as Box<dyn FeedHandle>]
    }

    fn install_session(&mut self, session: IdentitySession) {
        self.persist_stored_session(&session);
        self.session = Some(session);
    }

    fn load_stored_session(&self) -> Option<StoredSession> {
        let raw = fs::read_to_string(&self.session_path).ok()?;
        serde_json::from_str(&raw).ok()
    }

    fn persist_stored_session(&self, session: &IdentitySession) {
        let stored = StoredSession {
            refresh_token: session.refresh_token.clone(),
            uid: session.user.id.as_str().to_owned(),
            display_name: session.user.display_name.clone(),
            email: session.user.email.clone(),
            avatar_url: session.user.avatar_url.clone(),
        };
        let result = serde_json::to_string_pretty(&stored)
            .map_err(anyhow::Error::from)
            .and_then(|payload| {
                fs::write(&self.session_path, payload).map_err(anyhow::Error::from)
            });
        if let Err(error) = result {
            tracing::warn!(
                code = SESSION_CACHE_WRITE_FAILED,
                error = %error,
                "session cache not persisted; sign-in will be required next run"
            );
        }
    }
}

impl IdentityGateway for FirebaseAdapter {
    fn current_identity(&self) -> Option<AuthUser> {
        self.session.as_ref().map(|session| session.user.clone())
    }

    fn sign_in(&mut self, credentials: &Credentials) -> Result<AuthUser, AuthSourceError> {
        let identity = match &self.inner {
            AdapterInner::Real { identity, .. } => identity.clone(),
            #[cfg(test)]
            AdapterInner::Stub => return Err(AuthSourceError::Unavailable),
        };

        let session = self
            .rt
            .block_on(identity.sign_in_password(&credentials.email, &credentials.password))
            .map_err(map_identity_error)?;
        let user = session.user.clone();
        self.install_session(session);
        Ok(user)
    }

    fn sign_out(&mut self) -> Result<(), AuthSourceError> {
        #[cfg(test)]
        if matches!(self.inner, AdapterInner::Stub) {
            return Err(AuthSourceError::Unavailable);
        }
        // The identity provider has no server-side revocation for this
        // flow; forgetting the tokens ends the session.
        self.session = None;
        Ok(())
    }
}

impl ProfilePublisher for FirebaseAdapter {
    fn publish_profile(&self, profile: &UserProfile) -> Result<(), ProfileWriteError> {
        let store = match &self.inner {
            AdapterInner::Real { store, .. } => store,
            #[cfg(test)]
            AdapterInner::Stub => return Err(ProfileWriteError::Unavailable),
        };
        let session = self.session.as_ref().ok_or(ProfileWriteError::Unauthorized)?;

        self.rt
            .block_on(store.publish_profile(&session.id_token, profile))
            .map_err(|error| match error.kind {
                StoreErrorKind::Unauthorized => ProfileWriteError::Unauthorized,
                StoreErrorKind::Rejected | StoreErrorKind::Unavailable => {
                    ProfileWriteError::Unavailable
                }
            })
    }
}

impl MessageWriter for FirebaseAdapter {
    fn append(&self, receiver_id: &UserId, text: &str) -> Result<(), SendSourceError> {
        let store = match &self.inner {
            AdapterInner::Real { store, .. } => store,
            #[cfg(test)]
            AdapterInner::Stub => return Err(SendSourceError::Unavailable),
        };
        let session = self.session.as_ref().ok_or(SendSourceError::Unauthorized)?;

        self.rt
            .block_on(store.append_message(
                &session.id_token,
                &session.user.id,
                receiver_id,
                text,
            ))
            .map_err(map_store_send_error)
    }
}

fn map_identity_error(error: IdentityError) -> AuthSourceError {
    match error.kind {
        IdentityErrorKind::InvalidCredentials => AuthSourceError::InvalidCredentials,
        IdentityErrorKind::Unavailable => AuthSourceError::Unavailable,
        IdentityErrorKind::Unknown => AuthSourceError::Unknown,
    }
}

fn map_store_send_error(error: StoreError) -> SendSourceError {
    match error.kind {
        StoreErrorKind::Unauthorized => SendSourceError::Unauthorized,
        StoreErrorKind::Rejected => SendSourceError::Rejected,
        StoreErrorKind::Unavailable => SendSourceError::Unavailable,
    }
}

fn fetch_error(error: StoreError) -> SnapshotFetchError {
    SnapshotFetchError {
        code: error.code,
        message: error.message,
    }
}

#[cfg(test)]
mod tests {
    use std::env;

    use super::*;
    use crate::test_support::env_lock;

    fn with_temp_layout<F: FnOnce(&StorageLayout)>(test: F) {
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
    fn stub_has_no_identity_and_refuses_backend_calls() {
        with_temp_layout(|layout| {
            let mut adapter = FirebaseAdapter::stub(layout);

            assert_eq!(adapter.current_identity(), None);
            assert_eq!(adapter.restore_session(), None);
            assert!(matches!(
                adapter.append(&UserId::new("bob"), "hi"),
                Err(SendSourceError::Unavailable)
            ));

            let (tx, _rx) = std::sync::mpsc::channel();
            assert!(adapter.subscribe_message_feeds(tx).is_empty());
        });
    }

    #[test]
    fn stored_session_round_trips_through_the_cache_file() {
        with_temp_layout(|layout| {
            let adapter = FirebaseAdapter::stub(layout);
            let session = IdentitySession {
                id_token: "tok".to_owned(),
                refresh_token: "ref".to_owned(),
                user: AuthUser {
                    id: UserId::new("alice"),
                    display_name: "Alice".to_owned(),
                    email: "alice@example.com".to_owned(),
                    avatar_url: String::new(),
                },
            };

            adapter.persist_stored_session(&session);
            let stored = adapter.load_stored_session().expect("cache should load");

            assert_eq!(stored.refresh_token, "ref");
            assert_eq!(stored.uid, "alice");
            assert_eq!(stored.display_name, "Alice");
        });
    }

    #[test]
    fn append_without_a_session_is_unauthorized_for_a_real_backend() {
        with_temp_layout(|layout| {
            let config = BackendConfig {
                project_id: "demo".to_owned(),
                api_key: "key".to_owned(),
                poll_interval_ms: 2000,
                request_timeout_ms: 10_000,
            };
            let adapter = FirebaseAdapter::new(&config, layout).expect("adapter should build");

            assert!(matches!(
                adapter.append(&UserId::new("bob"), "hi"),
                Err(SendSourceError::Unauthorized)
            ));
        });
    }
}
