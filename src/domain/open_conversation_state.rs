use super::message::{Message, UserId};

/// Right-pane state for the conversation currently opened, if any. The
/// message list is replaced wholesale from the projection on every feed
/// update; this struct owns only the transient "which peer is open" bit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OpenConversationState {
    peer_id: Option<UserId>,
    peer_name: String,
    messages: Vec<Message>,
}

impl OpenConversationState {
    pub fn peer_id(&self) -> Option<&UserId> {
        self.peer_id.as_ref()
    }

    pub fn peer_name(&self) -> &str {
        &self.peer_name
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_open(&self) -> bool {
        self.peer_id.is_some()
    }

    pub fn open(&mut self, peer_id: UserId, peer_name: String) {
        self.peer_id = Some(peer_id);
        self.peer_name = peer_name;
        self.messages.clear();
    }

    pub fn set_messages(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    pub fn close(&mut self) {
        self.peer_id = None;
        self.peer_name.clear();
        self.messages.clear();
    }
}
