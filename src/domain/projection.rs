//! Conversation projection: folds the flat, append-only message log into
//! per-peer conversations with ordering, last-message summaries, and unread
//! counts.
//!
//! The projection is a pure function of (current user, message cache). The
//! cache is keyed by message id with upsert semantics, so re-delivering a
//! snapshot is idempotent and split sent/received feeds merge into the same
//! result as a single combined feed.

use std::collections::{BTreeMap, HashMap};

use super::{
    conversation::Conversation,
    message::{Message, MessageId, UserId},
};

#[derive(Debug, Clone, PartialEq, Eq)]
struct CachedMessage {
    message: Message,
    /// Arrival sequence, assigned at first sight. Tie-break for equal
    /// server timestamps, keeping the sort deterministic.
    seq: u64,
}

/// Message-id-keyed cache fed by one or more snapshot subscriptions.
///
/// A later delivery for an already-known id may only advance `status`;
/// `text`, participants, and the server timestamp are pinned at first
/// observation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageCache {
    records: HashMap<MessageId, CachedMessage>,
    next_seq: u64,
}

impl MessageCache {
    pub fn upsert(&mut self, incoming: Message) {
        match self.records.get_mut(&incoming.id) {
            Some(existing) => {
                existing.message.status = existing.message.status.advanced_to(incoming.status);
            }
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.records
                    .insert(incoming.id.clone(), CachedMessage { message: incoming, seq });
            }
        }
    }

    pub fn upsert_all(&mut self, snapshot: impl IntoIterator<Item = Message>) {
        for message in snapshot {
            self.upsert(message);
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.next_seq = 0;
    }

    fn iter(&self) -> impl Iterator<Item = &CachedMessage> {
        self.records.values()
    }
}

/// Projects the cached message set into the per-peer conversation mapping
/// for `current_user`.
///
/// Messages where neither side is `current_user` are dropped; an unfiltered
/// feed must not create foreign conversations. Within a conversation,
/// messages sort ascending by `(timestamp, arrival seq)`.
pub fn project(current_user: &UserId, cache: &MessageCache) -> BTreeMap<UserId, Conversation> {
    let mut groups: BTreeMap<UserId, Vec<&CachedMessage>> = BTreeMap::new();

    for cached in cache.iter() {
        let Some(peer) = cached.message.peer_of(current_user) else {
            continue;
        };
        groups.entry(peer.clone()).or_default().push(cached);
    }

    groups
        .into_iter()
        .map(|(peer_id, mut group)| {
            group.sort_by_key(|cached| (cached.message.timestamp_unix_ms, cached.seq));

            let messages: Vec<Message> =
                group.into_iter().map(|cached| cached.message.clone()).collect();
            let unread_count = messages
                .iter()
                .filter(|message| message.is_unread_for(current_user))
                .count();
            // The group is non-empty by construction.
            let last = &messages[messages.len() - 1];

            let conversation = Conversation {
                peer_id: peer_id.clone(),
                last_message: last.text.clone(),
                last_message_unix_ms: last.timestamp_unix_ms,
                unread_count,
                messages,
            };

            (peer_id, conversation)
        })
        .collect()
}

/// Whether the backing feed is still delivering updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedHealth {
    #[default]
    Live,
    /// The feed transport failed. The last projection stays available but
    /// no further snapshots are applied.
    Degraded,
}

/// Stateful wrapper owning the cache and the exposed mapping.
///
/// The mapping is replaced wholesale per recompute; observers never see a
/// conversation with stale messages but fresh summary fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationProjector {
    current_user: Option<UserId>,
    cache: MessageCache,
    conversations: BTreeMap<UserId, Conversation>,
    health: FeedHealth,
}

impl ConversationProjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_user(&self) -> Option<&UserId> {
        self.current_user.as_ref()
    }

    pub fn health(&self) -> FeedHealth {
        self.health
    }

    pub fn conversations(&self) -> &BTreeMap<UserId, Conversation> {
        &self.conversations
    }

    pub fn conversation(&self, peer: &UserId) -> Option<&Conversation> {
        self.conversations.get(peer)
    }

    /// Switches the owning identity. Any change drops the cache and the
    /// derived mapping; updates delivered against a stale identity must
    /// never survive the switch.
    pub fn set_identity(&mut self, identity: Option<UserId>) {
        if self.current_user == identity {
            return;
        }

        self.current_user = identity;
        self.cache.clear();
        self.conversations = BTreeMap::new();
        self.health = FeedHealth::Live;
    }

    /// Applies a full snapshot from any of the subscribed feeds and
    /// recomputes the mapping. Ignored while no identity is set or after
    /// the feed degraded.
    pub fn apply_snapshot(&mut self, snapshot: Vec<Message>) {
        let Some(current_user) = self.current_user.clone() else {
            return;
        };
        if self.health == FeedHealth::Degraded {
            return;
        }

        self.cache.upsert_all(snapshot);
        self.conversations = project(&current_user, &self.cache);
    }

    /// Freezes the projector after a feed transport failure. Stale but
    /// available beats empty.
    pub fn mark_degraded(&mut self) {
        self.health = FeedHealth::Degraded;
    }
}
