use super::{message::Message, user::UserProfile};

/// Which live feed an event originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    Messages,
    Directory,
}

impl FeedKind {
    pub fn as_label(self) -> &'static str {
        match self {
            Self::Messages => "messages",
            Self::Directory => "directory",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Tick,
    QuitRequested,
    InputKey(KeyInput),
    /// Complete current snapshot from a message feed (combined or one
    /// side of the sent/received split).
    MessagesSnapshot(Vec<Message>),
    /// Complete current snapshot of the user directory.
    DirectorySnapshot(Vec<UserProfile>),
    /// A feed transport failed; the last derived state stays visible.
    FeedFailed { kind: FeedKind, code: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInput {
    pub key: String,
    pub ctrl: bool,
}

impl KeyInput {
    pub fn new(key: impl Into<String>, ctrl: bool) -> Self {
        Self {
            key: key.into(),
            ctrl,
        }
    }
}
