//! REST client for the hosted identity provider: password sign-in and
//! refresh-token exchange.

use serde_json::{json, Value};

use crate::domain::{message::UserId, session::AuthUser};

const IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const TOKEN_BASE_URL: &str = "https://securetoken.googleapis.com/v1";

const IDENTITY_REQUEST_FAILED: &str = "IDENTITY_REQUEST_FAILED";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityErrorKind {
    InvalidCredentials,
    Unavailable,
    Unknown,
}

#[derive(Debug)]
pub struct IdentityError {
    pub kind: IdentityErrorKind,
    pub message: String,
}

/// An established provider session: the short-lived bearer token plus the
/// long-lived refresh token used to restore it across runs.
#[derive(Debug, Clone)]
pub struct IdentitySession {
    pub id_token: String,
    pub refresh_token: String,
    pub user: AuthUser,
}

#[derive(Debug, Clone)]
pub struct IdentityClient {
    http: reqwest::Client,
    api_key: String,
}

impl IdentityClient {
    pub fn new(http: reqwest::Client, api_key: &str) -> Self {
        Self {
            http,
            api_key: api_key.to_owned(),
        }
    }

    pub async fn sign_in_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<IdentitySession, IdentityError> {
        let url = format!(
            "{IDENTITY_BASE_URL}/accounts:signInWithPassword?key={}",
            self.api_key
        );
        let body = json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        });
        let payload = self.post(&url, &body).await?;

        session_from_sign_in(&payload).ok_or_else(|| IdentityError {
            kind: IdentityErrorKind::Unknown,
            message: "sign-in response missing required fields".to_owned(),
        })
    }

    /// Exchanges a stored refresh token for a fresh session, then reloads
    /// the account record so the display name survives restarts.
    pub async fn refresh(&self, refresh_token: &str) -> Result<IdentitySession, IdentityError> {
        let url = format!("{TOKEN_BASE_URL}/token?key={}", self.api_key);
        let body = json!({
            "grant_type": "refresh_token",
            "refresh_token": refresh_token,
        });
        let payload = self.post(&url, &body).await?;

        let id_token = string_field(&payload, "id_token").ok_or_else(|| IdentityError {
            kind: IdentityErrorKind::Unknown,
            message: "token response missing id_token".to_owned(),
        })?;
        let refresh_token =
            string_field(&payload, "refresh_token").unwrap_or_else(|| refresh_token.to_owned());
        let uid = string_field(&payload, "user_id").ok_or_else(|| IdentityError {
            kind: IdentityErrorKind::Unknown,
            message: "token response missing user_id".to_owned(),
        })?;

        let account = self.lookup_account(&id_token).await?;
        Ok(IdentitySession {
            user: account_user(&uid, account.as_ref()),
            id_token,
            refresh_token,
        })
    }

    async fn lookup_account(&self, id_token: &str) -> Result<Option<Value>, IdentityError> {
        let url = format!("{IDENTITY_BASE_URL}/accounts:lookup?key={}", self.api_key);
        let body = json!({ "idToken": id_token });
        let payload = self.post(&url, &body).await?;
        Ok(payload
            .get("users")
            .and_then(Value::as_array)
            .and_then(|users| users.first())
            .cloned())
    }

    async fn post(&self, url: &str, body: &Value) -> Result<Value, IdentityError> {
        let response = self.http.post(url).json(body).send().await.map_err(|error| {
            tracing::warn!(code = IDENTITY_REQUEST_FAILED, error = %error, "identity provider unreachable");
            IdentityError {
                kind: IdentityErrorKind::Unavailable,
                message: error.to_string(),
            }
        })?;

        let status = response.status();
        let payload: Value = response.json().await.map_err(|error| IdentityError {
            kind: IdentityErrorKind::Unknown,
            message: format!("malformed identity response: {error}"),
        })?;

        if status.is_success() {
            return Ok(payload);
        }

        let provider_code = payload
            .pointer("/error/message")
            .and_then(Value::as_str)
            .unwrap_or("UNKNOWN")
            .to_owned();
        tracing::warn!(
            code = IDENTITY_REQUEST_FAILED,
            status = status.as_u16(),
            provider_code = %provider_code,
            "identity provider rejected the request"
        );
        Err(IdentityError {
            kind: classify_provider_code(&provider_code, status.as_u16()),
            message: provider_code,
        })
    }
}

fn classify_provider_code(provider_code: &str, status: u16) -> IdentityErrorKind {
    match provider_code {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "USER_DISABLED"
        | "TOKEN_EXPIRED" | "INVALID_REFRESH_TOKEN" | "USER_NOT_FOUND" => {
            IdentityErrorKind::InvalidCredentials
        }
        _ if status >= 500 => IdentityErrorKind::Unavailable,
        _ => IdentityErrorKind::Unknown,
    }
}

fn session_from_sign_in(payload: &Value) -> Option<IdentitySession> {
    let id_token = string_field(payload, "idToken")?;
    let refresh_token = string_field(payload, "refreshToken")?;
    let uid = string_field(payload, "localId")?;
    Some(IdentitySession {
        user: AuthUser {
            id: UserId::new(&uid),
            display_name: string_field(payload, "displayName")
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| "Anonymous".to_owned()),
            email: string_field(payload, "email").unwrap_or_default(),
            avatar_url: string_field(payload, "profilePicture").unwrap_or_default(),
        },
        id_token,
        refresh_token,
    })
}

fn account_user(uid: &str, account: Option<&Value>) -> AuthUser {
    AuthUser {
        id: UserId::new(uid),
        display_name: account
            .and_then(|value| string_field(value, "displayName"))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "Anonymous".to_owned()),
        email: account
            .and_then(|value| string_field(value, "email"))
            .unwrap_or_default(),
        avatar_url: account
            .and_then(|value| string_field(value, "photoUrl"))
            .unwrap_or_default(),
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_owned)
}
