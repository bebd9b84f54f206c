use super::message::UserId;

/// Directory entry for a registered user, as published by the backing
/// store's user collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: UserId,
    pub display_name: String,
    pub email: String,
    pub avatar_url: String,
    pub is_online: bool,
    pub last_seen_unix_ms: i64,
}

impl UserProfile {
    /// Directory sort key: display name first, id as a stable tie-break.
    pub fn directory_key(&self) -> (String, UserId) {
        (self.display_name.clone(), self.id.clone())
    }
}
