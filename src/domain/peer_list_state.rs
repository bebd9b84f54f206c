use super::message::UserId;

/// One row of the left-hand peer list: a directory profile joined with the
/// summary fields of its projected conversation, when one exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerEntry {
    pub peer_id: UserId,
    pub display_name: String,
    pub is_online: bool,
    pub unread_count: usize,
    pub last_message_preview: Option<String>,
    pub last_message_unix_ms: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerListUiState {
    Loading,
    Ready,
    Empty,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerListState {
    ui_state: PeerListUiState,
    peers: Vec<PeerEntry>,
    selected_index: Option<usize>,
}

impl Default for PeerListState {
    fn default() -> Self {
        Self {
            ui_state: PeerListUiState::Loading,
            peers: Vec::new(),
            selected_index: None,
        }
    }
}

impl PeerListState {
    pub fn ui_state(&self) -> PeerListUiState {
        self.ui_state.clone()
    }

    pub fn peers(&self) -> &[PeerEntry] {
        &self.peers
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected_index
    }

    pub fn selected_peer(&self) -> Option<&PeerEntry> {
        self.selected_index.and_then(|index| self.peers.get(index))
    }

    pub fn set_loading(&mut self) {
        self.ui_state = PeerListUiState::Loading;
        self.peers.clear();
        self.selected_index = None;
    }

    pub fn set_ready(&mut self, peers: Vec<PeerEntry>) {
        if peers.is_empty() {
            self.set_empty();
            return;
        }

        let previous_selected_peer = self.selected_peer().map(|peer| peer.peer_id.clone());
        self.ui_state = PeerListUiState::Ready;
        self.peers = peers;
        self.selected_index = resolve_selection_index(&self.peers, previous_selected_peer);
    }

    pub fn set_empty(&mut self) {
        self.ui_state = PeerListUiState::Empty;
        self.peers.clear();
        self.selected_index = None;
    }

    pub fn set_error(&mut self) {
        self.ui_state = PeerListUiState::Error;
        self.peers.clear();
        self.selected_index = None;
    }

    pub fn select_next(&mut self) {
        let Some(index) = self.selected_index else {
            return;
        };

        let last_index = self.peers.len().saturating_sub(1);
        self.selected_index = Some(std::cmp::min(index.saturating_add(1), last_index));
    }

    pub fn select_previous(&mut self) {
        let Some(index) = self.selected_index else {
            return;
        };

        self.selected_index = Some(index.saturating_sub(1));
    }
}

fn resolve_selection_index(
    peers: &[PeerEntry],
    previous_selected_peer: Option<UserId>,
) -> Option<usize> {
    if peers.is_empty() {
        return None;
    }

    previous_selected_peer
        .and_then(|peer_id| peers.iter().position(|peer| peer.peer_id == peer_id))
        .or(Some(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(id: &str, name: &str) -> PeerEntry {
        PeerEntry {
            peer_id: UserId::new(id),
            display_name: name.to_owned(),
            is_online: false,
            unread_count: 0,
            last_message_preview: None,
            last_message_unix_ms: None,
        }
    }

    #[test]
    fn default_state_is_loading_without_selection() {
        let state = PeerListState::default();

        assert_eq!(state.ui_state(), PeerListUiState::Loading);
        assert!(state.peers().is_empty());
        assert_eq!(state.selected_index(), None);
    }

    #[test]
    fn set_ready_with_data_selects_the_first_peer() {
        let mut state = PeerListState::default();

        state.set_ready(vec![peer("bob", "Bob"), peer("carol", "Carol")]);

        assert_eq!(state.ui_state(), PeerListUiState::Ready);
        assert_eq!(state.selected_index(), Some(0));
        assert_eq!(
            state.selected_peer().map(|p| p.peer_id.as_str()),
            Some("bob")
        );
    }

    #[test]
    fn set_ready_with_empty_list_transitions_to_empty_state() {
        let mut state = PeerListState::default();

        state.set_ready(vec![]);

        assert_eq!(state.ui_state(), PeerListUiState::Empty);
        assert_eq!(state.selected_index(), None);
    }

    #[test]
    fn set_error_clears_entries_and_selection() {
        let mut state = PeerListState::default();
        state.set_ready(vec![peer("bob", "Bob")]);

        state.set_error();

        assert_eq!(state.ui_state(), PeerListUiState::Error);
        assert!(state.peers().is_empty());
        assert_eq!(state.selected_index(), None);
    }

    #[test]
    fn selection_moves_within_bounds() {
        let mut state = PeerListState::default();
        state.set_ready(vec![peer("bob", "Bob"), peer("carol", "Carol")]);

        state.select_next();
        state.select_next();
        state.select_previous();

        assert_eq!(state.selected_index(), Some(0));
    }

    #[test]
    fn set_ready_preserves_selection_by_peer_id() {
        let mut state = PeerListState::default();
        state.set_ready(vec![
            peer("bob", "Bob"),
            peer("carol", "Carol"),
            peer("dave", "Dave"),
        ]);
        state.select_next();

        state.set_ready(vec![
            peer("erin", "Erin"),
            peer("carol", "Carol"),
            peer("frank", "Frank"),
        ]);

        assert_eq!(
            state.selected_peer().map(|p| p.peer_id.as_str()),
            Some("carol")
        );
        assert_eq!(state.selected_index(), Some(1));
    }

    #[test]
    fn set_ready_falls_back_to_first_when_selection_disappears() {
        let mut state = PeerListState::default();
        state.set_ready(vec![peer("bob", "Bob"), peer("carol", "Carol")]);
        state.select_next();

        state.set_ready(vec![peer("erin", "Erin"), peer("frank", "Frank")]);

        assert_eq!(state.selected_index(), Some(0));
        assert_eq!(
            state.selected_peer().map(|p| p.peer_id.as_str()),
            Some("erin")
        );
    }
}
