//! REST client for the hosted document store, plus the codec between
//! store documents and domain records.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::domain::{
    message::{Message, MessageId, MessageStatus, UserId},
    user::UserProfile,
};

const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";

pub const MESSAGES_COLLECTION: &str = "messages";
pub const USERS_COLLECTION: &str = "users";

const STORE_REQUEST_FAILED: &str = "STORE_REQUEST_FAILED";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    Unauthorized,
    Rejected,
    Unavailable,
}

#[derive(Debug)]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct FirestoreClient {
    http: reqwest::Client,
    project_id: String,
}

impl FirestoreClient {
    pub fn new(http: reqwest::Client, project_id: &str) -> Self {
        Self {
            http,
            project_id: project_id.to_owned(),
        }
    }

    fn documents_root(&self) -> String {
        format!(
            "projects/{}/databases/(default)/documents",
            self.project_id
        )
    }

    /// Fetches every document of a collection, following pagination.
    pub async fn list_documents(
        &self,
        id_token: &str,
        collection: &str,
    ) -> Result<Vec<Value>, StoreError> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = format!(
                "{FIRESTORE_BASE_URL}/{}/{collection}?pageSize=300",
                self.documents_root()
            );
            if let Some(token) = &page_token {
                url.push_str("&pageToken=");
                url.push_str(token);
            }

            let payload = self.get(id_token, &url).await?;
            if let Some(page) = payload.get("documents").and_then(Value::as_array) {
                documents.extend(page.iter().cloned());
            }
            match payload.get("nextPageToken").and_then(Value::as_str) {
                Some(token) if !token.is_empty() => page_token = Some(token.to_owned()),
                _ => return Ok(documents),
            }
        }
    }

    /// Runs a single-field equality query against a collection and
    /// returns the matching documents.
    pub async fn query_equal(
        &self,
        id_token: &str,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Value>, StoreError> {
        let url = format!("{FIRESTORE_BASE_URL}/{}:runQuery", self.documents_root());
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": field },
                        "op": "EQUAL",
                        "value": { "stringValue": value },
                    }
                },
            }
        });

        let payload = self.post(id_token, &url, &body).await?;
        let rows = payload.as_array().cloned().unwrap_or_default();
        Ok(rows
            .into_iter()
            .filter_map(|row| row.get("document").cloned())
            .collect())
    }

    /// Appends one message document. The id is generated client-side;
    /// the timestamp is assigned by the store via a commit transform.
    pub async fn append_message(
        &self,
        id_token: &str,
        sender_id: &UserId,
        receiver_id: &UserId,
        text: &str,
    ) -> Result<(), StoreError> {
        let document_name = format!(
            "{}/{MESSAGES_COLLECTION}/{}",
            self.documents_root(),
            Uuid::new_v4().simple()
        );
        let url = format!("{FIRESTORE_BASE_URL}/{}:commit", self.documents_root());
        let body = json!({
            "writes": [
                {
                    "update": {
                        "name": document_name,
                        "fields": {
                            "text": { "stringValue": text },
                            "senderId": { "stringValue": sender_id.as_str() },
                            "receiverId": { "stringValue": receiver_id.as_str() },
                            "status": { "stringValue": MessageStatus::Sent.as_label() },
                        },
                    },
                },
                {
                    "transform": {
                        "document": document_name,
                        "fieldTransforms": [
                            { "fieldPath": "timestamp", "setToServerValue": "REQUEST_TIME" }
                        ],
                    },
                },
            ]
        });

        self.post(id_token, &url, &body).await.map(|_payload| ())
    }

    /// Upserts the caller's directory record.
    pub async fn publish_profile(
        &self,
        id_token: &str,
        profile: &UserProfile,
    ) -> Result<(), StoreError> {
        let url = format!(
            "{FIRESTORE_BASE_URL}/{}/{USERS_COLLECTION}/{}",
            self.documents_root(),
            profile.id.as_str()
        );
        let body = json!({ "fields": profile_fields(profile) });

        let response = self
            .http
            .patch(&url)
            .bearer_auth(id_token)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        Self::decode(response).await.map(|_payload| ())
    }

    async fn get(&self, id_token: &str, url: &str) -> Result<Value, StoreError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(id_token)
            .send()
            .await
            .map_err(transport_error)?;
        Self::decode(response).await
    }

    async fn post(&self, id_token: &str, url: &str, body: &Value) -> Result<Value, StoreError> {
        let response = self
            .http
            .post(url)
            .bearer_auth(id_token)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        Self::decode(response).await
    }

    async fn decode(response: reqwest::Response) -> Result<Value, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(
                code = STORE_REQUEST_FAILED,
                status = status.as_u16(),
                "store rejected the request"
            );
            return Err(status_error(status.as_u16(), message));
        }
        response.json().await.map_err(|error| StoreError {
            kind: StoreErrorKind::Unavailable,
            code: "STORE_MALFORMED_RESPONSE",
            message: error.to_string(),
        })
    }
}

fn transport_error(error: reqwest::Error) -> StoreError {
    tracing::warn!(code = STORE_REQUEST_FAILED, error = %error, "store unreachable");
    StoreError {
        kind: StoreErrorKind::Unavailable,
        code: "STORE_UNREACHABLE",
        message: error.to_string(),
    }
}

fn status_error(status: u16, message: String) -> StoreError {
    let kind = match status {
        401 | 403 => StoreErrorKind::Unauthorized,
        400..=499 => StoreErrorKind::Rejected,
        _ => StoreErrorKind::Unavailable,
    };
    StoreError {
        kind,
        code: "STORE_STATUS_ERROR",
        message,
    }
}

/// Last path segment of a document resource name.
fn document_id(document: &Value) -> Option<&str> {
    document
        .get("name")
        .and_then(Value::as_str)
        .and_then(|name| name.rsplit('/').next())
        .filter(|id| !id.is_empty())
}

fn string_value(fields: &Value, key: &str) -> Option<String> {
    fields
        .pointer(&format!("/{key}/stringValue"))
        .and_then(Value::as_str)
        .map(str::to_owned)
}

fn bool_value(fields: &Value, key: &str) -> Option<bool> {
    fields
        .pointer(&format!("/{key}/booleanValue"))
        .and_then(Value::as_bool)
}

fn timestamp_value_unix_ms(fields: &Value, key: &str) -> Option<i64> {
    let raw = fields
        .pointer(&format!("/{key}/timestampValue"))
        .and_then(Value::as_str)?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|moment| moment.timestamp_millis())
}

/// Decodes a message document. Fields the document lacks fall back to
/// neutral defaults; routing still drops records whose participants do
/// not include the current user.
pub fn parse_message_document(document: &Value) -> Option<Message> {
    let id = document_id(document)?;
    let fields = document.get("fields")?;
    Some(Message {
        id: MessageId::new(id),
        text: string_value(fields, "text").unwrap_or_default(),
        sender_id: UserId::new(&string_value(fields, "senderId").unwrap_or_default()),
        receiver_id: UserId::new(&string_value(fields, "receiverId").unwrap_or_default()),
        timestamp_unix_ms: timestamp_value_unix_ms(fields, "timestamp").unwrap_or(0),
        status: string_value(fields, "status")
            .as_deref()
            .and_then(MessageStatus::parse_label)
            .unwrap_or(MessageStatus::Sent),
    })
}

/// Decodes a directory document. The document id is authoritative for
/// the user id even when a `uid` field is present.
pub fn parse_user_document(document: &Value) -> Option<UserProfile> {
    let id = document_id(document)?;
    let fields = document.get("fields")?;
    Some(UserProfile {
        id: UserId::new(id),
        display_name: string_value(fields, "displayName")
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "Anonymous".to_owned()),
        email: string_value(fields, "email").unwrap_or_default(),
        avatar_url: string_value(fields, "photoURL").unwrap_or_default(),
        is_online: bool_value(fields, "isOnline").unwrap_or(false),
        last_seen_unix_ms: timestamp_value_unix_ms(fields, "lastSeen").unwrap_or(0),
    })
}

fn profile_fields(profile: &UserProfile) -> Value {
    let mut fields = json!({
        "uid": { "stringValue": profile.id.as_str() },
        "displayName": { "stringValue": profile.display_name },
        "email": { "stringValue": profile.email },
        "isOnline": { "booleanValue": profile.is_online },
    });
    if !profile.avatar_url.is_empty() {
        fields["photoURL"] = json!({ "stringValue": profile.avatar_url });
    }
    if let Some(moment) = Utc.timestamp_millis_opt(profile.last_seen_unix_ms).single() {
        fields["lastSeen"] = json!({
            "timestampValue": moment.to_rfc3339_opts(SecondsFormat::Millis, true)
        });
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message_document() -> Value {
        json!({
            "name": "projects/p/databases/(default)/documents/messages/m-1",
            "fields": {
                "text": { "stringValue": "hello" },
                "senderId": { "stringValue": "alice" },
                "receiverId": { "stringValue": "bob" },
                "timestamp": { "timestampValue": "2026-08-20T10:15:30.250Z" },
                "status": { "stringValue": "read" },
            }
        })
    }

    #[test]
    fn message_document_decodes() {
        let message = parse_message_document(&message_document()).expect("valid document");
        assert_eq!(message.id, MessageId::new("m-1"));
        assert_eq!(message.text, "hello");
        assert_eq!(message.sender_id, UserId::new("alice"));
        assert_eq!(message.receiver_id, UserId::new("bob"));
        assert_eq!(message.timestamp_unix_ms, 1_787_220_930_250);
        assert_eq!(message.status, MessageStatus::Read);
    }

    #[test]
    fn message_document_missing_fields_falls_back() {
        let document = json!({
            "name": "projects/p/databases/(default)/documents/messages/m-2",
            "fields": {
                "senderId": { "stringValue": "alice" },
                "receiverId": { "stringValue": "bob" },
            }
        });
        let message = parse_message_document(&document).expect("valid document");
        assert_eq!(message.text, "");
        assert_eq!(message.timestamp_unix_ms, 0);
        assert_eq!(message.status, MessageStatus::Sent);
    }

    #[test]
    fn message_document_without_name_is_dropped() {
        let document = json!({ "fields": { "text": { "stringValue": "x" } } });
        assert!(parse_message_document(&document).is_none());
    }

    #[test]
    fn user_document_decodes_with_document_id_as_user_id() {
        let document = json!({
            "name": "projects/p/databases/(default)/documents/users/bob",
            "fields": {
                "uid": { "stringValue": "stale-uid" },
                "displayName": { "stringValue": "Bob" },
                "email": { "stringValue": "bob@example.com" },
                "isOnline": { "booleanValue": true },
                "lastSeen": { "timestampValue": "2026-08-20T10:15:30Z" },
            }
        });
        let profile = parse_user_document(&document).expect("valid document");
        assert_eq!(profile.id, UserId::new("bob"));
        assert_eq!(profile.display_name, "Bob");
        assert!(profile.is_online);
        assert!(profile.last_seen_unix_ms > 0);
    }

    #[test]
    fn user_document_without_display_name_is_anonymous() {
        let document = json!({
            "name": "projects/p/databases/(default)/documents/users/carol",
            "fields": {}
        });
        let profile = parse_user_document(&document).expect("valid document");
        assert_eq!(profile.display_name, "Anonymous");
        assert!(!profile.is_online);
    }

    #[test]
    fn profile_fields_encode_presence_and_last_seen() {
        let profile = UserProfile {
            id: UserId::new("alice"),
            display_name: "Alice".to_owned(),
            email: "alice@example.com".to_owned(),
            avatar_url: String::new(),
            is_online: false,
            last_seen_unix_ms: 1_700_000_000_000,
        };
        let fields = profile_fields(&profile);
        assert_eq!(
            fields.pointer("/isOnline/booleanValue"),
            Some(&Value::Bool(false))
        );
        let raw = fields
            .pointer("/lastSeen/timestampValue")
            .and_then(Value::as_str)
            .expect("lastSeen encoded");
        assert!(raw.ends_with('Z'));
        assert_eq!(fields.get("photoURL"), None);
    }
}
