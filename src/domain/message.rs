use std::fmt;

/// Opaque user identifier assigned by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque message identifier assigned by the backing store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Delivery status of a message. Ordered: a status only ever advances
/// sent -> delivered -> read, never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum MessageStatus {
    #[default]
    Sent,
    Delivered,
    Read,
}

impl MessageStatus {
    pub fn as_label(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Read => "read",
        }
    }

    pub fn parse_label(label: &str) -> Option<Self> {
        match label {
            "sent" => Some(Self::Sent),
            "delivered" => Some(Self::Delivered),
            "read" => Some(Self::Read),
            _ => None,
        }
    }

    /// Returns the later of the two statuses. A stale delivery must not
    /// regress an already-advanced status.
    pub fn advanced_to(self, incoming: MessageStatus) -> MessageStatus {
        self.max(incoming)
    }
}

/// A single direct message as held by the backing store. Immutable once
/// created except for `status`, which advances as the receiver sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    /// Server-assigned send time; the authoritative ordering key.
    pub timestamp_unix_ms: i64,
    pub status: MessageStatus,
}

impl Message {
    pub fn involves(&self, user: &UserId) -> bool {
        self.sender_id == *user || self.receiver_id == *user
    }

    /// Returns the counterpart of `user` in this message, or None when
    /// `user` is on neither side.
    pub fn peer_of(&self, user: &UserId) -> Option<&UserId> {
        if self.sender_id == *user {
            Some(&self.receiver_id)
        } else if self.receiver_id == *user {
            Some(&self.sender_id)
        } else {
            None
        }
    }

    pub fn is_unread_for(&self, user: &UserId) -> bool {
        self.sender_id != *user && self.status != MessageStatus::Read
    }
}
