use super::{
    compose_state::ComposeState, open_conversation_state::OpenConversationState,
    peer_list_state::PeerListState, session::Session,
};

/// Which panel owns keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivePane {
    #[default]
    PeerList,
    Compose,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellState {
    running: bool,
    active_pane: ActivePane,
    session: Session,
    peer_list: PeerListState,
    open_conversation: OpenConversationState,
    compose: ComposeState,
    feed_degraded: bool,
    status_note: Option<String>,
}

impl ShellState {
    pub fn new(session: Session) -> Self {
        Self {
            running: true,
            active_pane: ActivePane::PeerList,
            session,
            peer_list: PeerListState::default(),
            open_conversation: OpenConversationState::default(),
            compose: ComposeState::default(),
            feed_degraded: false,
            status_note: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn active_pane(&self) -> ActivePane {
        self.active_pane
    }

    pub fn focus(&mut self, pane: ActivePane) {
        self.active_pane = pane;
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn peer_list(&self) -> &PeerListState {
        &self.peer_list
    }

    pub fn peer_list_mut(&mut self) -> &mut PeerListState {
        &mut self.peer_list
    }

    pub fn open_conversation(&self) -> &OpenConversationState {
        &self.open_conversation
    }

    pub fn open_conversation_mut(&mut self) -> &mut OpenConversationState {
        &mut self.open_conversation
    }

    pub fn compose(&self) -> &ComposeState {
        &self.compose
    }

    pub fn compose_mut(&mut self) -> &mut ComposeState {
        &mut self.compose
    }

    pub fn is_feed_degraded(&self) -> bool {
        self.feed_degraded
    }

    pub fn set_feed_degraded(&mut self) {
        self.feed_degraded = true;
    }

    pub fn status_note(&self) -> Option<&str> {
        self.status_note.as_deref()
    }

    pub fn set_status_note(&mut self, note: impl Into<String>) {
        self.status_note = Some(note.into());
    }

    pub fn clear_status_note(&mut self) {
        self.status_note = None;
    }
}

impl Default for ShellState {
    fn default() -> Self {
        Self::new(Session::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_runs_with_the_peer_list_focused() {
        let state = ShellState::default();

        assert!(state.is_running());
        assert_eq!(state.active_pane(), ActivePane::PeerList);
        assert!(!state.is_feed_degraded());
    }

    #[test]
    fn stop_halts_the_shell() {
        let mut state = ShellState::default();

        state.stop();

        assert!(!state.is_running());
    }

    #[test]
    fn status_note_is_replace_and_clear() {
        let mut state = ShellState::default();

        state.set_status_note("send failed");
        assert_eq!(state.status_note(), Some("send failed"));

        state.clear_status_note();
        assert_eq!(state.status_note(), None);
    }
}
