//! Feed orchestration: owns the conversation projector and the live
//! subscription handles, and maps feed events onto projector lifecycle.

use std::collections::BTreeMap;

use crate::domain::{
    conversation::Conversation,
    events::FeedKind,
    message::{Message, UserId},
    projection::{ConversationProjector, FeedHealth},
};

const FEED_DEGRADED: &str = "SYNC_FEED_DEGRADED";
const SESSION_ENDED: &str = "SYNC_SESSION_ENDED";

/// Cancellable handle to a live subscription. Implementations must also
/// cancel on Drop so a dropped sync can never deliver against a stale
/// identity.
pub trait FeedHandle: Send {
    fn cancel(&mut self);
}

/// Live conversation state for one signed-in identity.
pub struct ConversationSync {
    projector: ConversationProjector,
    feeds: Vec<Box<dyn FeedHandle>>,
}

impl ConversationSync {
    /// Starts syncing for `identity` over the given subscriptions (a
    /// combined feed, or the sent/received split pair).
    pub fn start(identity: UserId, feeds: Vec<Box<dyn FeedHandle>>) -> Self {
        let mut projector = ConversationProjector::new();
        projector.set_identity(Some(identity));

        Self { projector, feeds }
    }

    pub fn conversations(&self) -> &BTreeMap<UserId, Conversation> {
        self.projector.conversations()
    }

    pub fn conversation(&self, peer: &UserId) -> Option<&Conversation> {
        self.projector.conversation(peer)
    }

    pub fn health(&self) -> FeedHealth {
        self.projector.health()
    }

    /// Applies a full snapshot from any subscribed message feed. Which
    /// side delivered it does not matter; the cache merges by id.
    pub fn apply_messages_snapshot(&mut self, snapshot: Vec<Message>) {
        self.projector.apply_snapshot(snapshot);
    }

    /// Records a feed transport failure: the projection freezes but stays
    /// available.
    pub fn on_feed_failed(&mut self, kind: FeedKind, code: &str) {
        tracing::warn!(
            code = FEED_DEGRADED,
            feed = kind.as_label(),
            source_code = code,
            "feed transport failed; keeping last projection"
        );
        self.projector.mark_degraded();
    }

    /// Ends the session: cancels every subscription and clears the
    /// projection.
    pub fn end_session(&mut self) {
        for feed in &mut self.feeds {
            feed.cancel();
        }
        self.feeds.clear();
        self.projector.set_identity(None);

        tracing::info!(code = SESSION_ENDED, "conversation sync stopped");
    }
}

impl Drop for ConversationSync {
    fn drop(&mut self) {
        for feed in &mut self.feeds {
            feed.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::message::{MessageId, MessageStatus};
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    struct CountingFeed {
        cancels: Arc<AtomicUsize>,
    }

    impl FeedHandle for CountingFeed {
        fn cancel(&mut self) {
            self.cancels.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn message(id: &str, sender: &str, receiver: &str, ts: i64) -> Message {
        Message {
            id: MessageId::new(id),
            text: "hi".to_owned(),
            sender_id: UserId::new(sender),
            receiver_id: UserId::new(receiver),
            timestamp_unix_ms: ts,
            status: MessageStatus::Sent,
        }
    }

    fn sync_with_feeds(cancels: &Arc<AtomicUsize>, count: usize) -> ConversationSync {
        let feeds: Vec<Box<dyn FeedHandle>> = (0..count)
            .map(|_| {
                Box::new(CountingFeed {
                    cancels: Arc::clone(cancels),
                }) as Box<dyn FeedHandle>
            })
            .collect();
        ConversationSync::start(UserId::new("alice"), feeds)
    }

    #[test]
    fn snapshots_from_either_split_side_merge_into_one_mapping() {
        let cancels = Arc::new(AtomicUsize::new(0));
        let mut sync = sync_with_feeds(&cancels, 2);

        sync.apply_messages_snapshot(vec![message("m1", "alice", "bob", 1)]);
        sync.apply_messages_snapshot(vec![message("m2", "bob", "alice", 2)]);

        let conversation = sync
            .conversation(&UserId::new("bob"))
            .expect("conversation exists");
        assert_eq!(conversation.messages.len(), 2);
        assert_eq!(conversation.unread_count, 1);
    }

    #[test]
    fn feed_failure_freezes_but_keeps_the_projection() {
        let cancels = Arc::new(AtomicUsize::new(0));
        let mut sync = sync_with_feeds(&cancels, 1);
        sync.apply_messages_snapshot(vec![message("m1", "bob", "alice", 1)]);

        sync.on_feed_failed(FeedKind::Messages, "FEED_POLL_FAILED");
        sync.apply_messages_snapshot(vec![
            message("m1", "bob", "alice", 1),
            message("m2", "bob", "alice", 2),
        ]);

        assert_eq!(sync.health(), FeedHealth::Degraded);
        assert_eq!(sync.conversations().len(), 1);
        assert_eq!(
            sync.conversation(&UserId::new("bob"))
                .expect("retained")
                .messages
                .len(),
            1
        );
    }

    #[test]
    fn end_session_clears_the_mapping_and_cancels_every_feed() {
        let cancels = Arc::new(AtomicUsize::new(0));
        let mut sync = sync_with_feeds(&cancels, 2);
        sync.apply_messages_snapshot(vec![message("m1", "bob", "alice", 1)]);
        assert_eq!(sync.conversations().len(), 1);

        sync.end_session();

        assert!(sync.conversations().is_empty());
        assert_eq!(cancels.load(Ordering::SeqCst), 2);

        // Dropping after an explicit end must not double-cancel.
        drop(sync);
        assert_eq!(cancels.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn dropping_the_sync_cancels_outstanding_feeds() {
        let cancels = Arc::new(AtomicUsize::new(0));
        let sync = sync_with_feeds(&cancels, 2);

        drop(sync);

        assert_eq!(cancels.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn snapshots_after_session_end_are_ignored() {
        let cancels = Arc::new(AtomicUsize::new(0));
        let mut sync = sync_with_feeds(&cancels, 1);
        sync.end_session();

        sync.apply_messages_snapshot(vec![message("m1", "bob", "alice", 1)]);

        assert!(sync.conversations().is_empty());
    }
}
