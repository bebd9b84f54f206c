use super::message::{Message, UserId};

/// Derived per-peer view of the message log. Recomputed wholesale on every
/// feed update; never persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    /// The non-current-user participant.
    pub peer_id: UserId,
    /// Messages involving the current user and `peer_id`, ascending by
    /// server timestamp.
    pub messages: Vec<Message>,
    /// Text of the chronologically last message.
    pub last_message: String,
    pub last_message_unix_ms: i64,
    /// Incoming messages not yet marked read.
    pub unread_count: usize,
}

impl Conversation {
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}
