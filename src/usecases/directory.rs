//! Pure directory rules: who shows up in the peer list and in what order.

use std::collections::BTreeMap;

use crate::domain::{
    conversation::Conversation,
    message::UserId,
    peer_list_state::PeerEntry,
    user::UserProfile,
};

/// Orders a directory snapshot for display: the current user is excluded,
/// the rest sort by display name with the id as a stable tie-break.
pub fn order_directory(mut profiles: Vec<UserProfile>, current_user: &UserId) -> Vec<UserProfile> {
    profiles.retain(|profile| profile.id != *current_user);
    profiles.sort_by_key(UserProfile::directory_key);
    profiles
}

/// Joins the ordered directory with the projected conversations into the
/// rows the peer list renders. Directory order is kept; peers without any
/// messages still appear, just without summary fields.
pub fn assemble_roster(
    profiles: &[UserProfile],
    conversations: &BTreeMap<UserId, Conversation>,
) -> Vec<PeerEntry> {
    profiles
        .iter()
        .map(|profile| {
            let conversation = conversations.get(&profile.id);

            PeerEntry {
                peer_id: profile.id.clone(),
                display_name: profile.display_name.clone(),
                is_online: profile.is_online,
                unread_count: conversation.map_or(0, |c| c.unread_count),
                last_message_preview: conversation.map(|c| c.last_message.clone()),
                last_message_unix_ms: conversation.map(|c| c.last_message_unix_ms),
            }
        })
        .collect()
}
