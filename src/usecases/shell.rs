//! Shell orchestration: maps events from the terminal and the live feeds
//! onto the domain state.

use anyhow::Result;

use crate::{
    domain::{
        events::{AppEvent, KeyInput},
        shell_state::{ActivePane, ShellState},
        user::UserProfile,
    },
    usecases::{
        directory::{assemble_roster, order_directory},
        send_message::{send_message, MessageWriter, SendMessageCommand, SendMessageError},
        sync_conversations::ConversationSync,
    },
};

use super::contracts::ShellOrchestrator;

const SEND_FAILED: &str = "SHELL_SEND_FAILED";

pub struct DefaultShellOrchestrator<W: MessageWriter> {
    state: ShellState,
    sync: ConversationSync,
    writer: W,
    directory: Vec<UserProfile>,
    directory_loaded: bool,
}

impl<W: MessageWriter> DefaultShellOrchestrator<W> {
    pub fn new(state: ShellState, sync: ConversationSync, writer: W) -> Self {
        Self {
            state,
            sync,
            writer,
            directory: Vec::new(),
            directory_loaded: false,
        }
    }

    fn rebuild_views(&mut self) {
        // The peer list stays in its loading state until the directory
        // has reported at least once.
        if self.directory_loaded {
            let roster = assemble_roster(&self.directory, self.sync.conversations());
            self.state.peer_list_mut().set_ready(roster);
        }

        if let Some(peer) = self.state.open_conversation().peer_id().cloned() {
            let messages = self
                .sync
                .conversation(&peer)
                .map(|conversation| conversation.messages.clone())
                .unwrap_or_default();
            self.state.open_conversation_mut().set_messages(messages);
        }
    }

    /// Cancels the live subscriptions before stopping so nothing keeps
    /// polling against an identity that is going away.
    fn quit(&mut self) {
        self.sync.end_session();
        self.state.session_mut().end();
        self.state.stop();
    }

    fn handle_peer_list_key(&mut self, key: &KeyInput) {
        match key.key.as_str() {
            "q" => self.quit(),
            "j" | "down" => self.state.peer_list_mut().select_next(),
            "k" | "up" => self.state.peer_list_mut().select_previous(),
            "enter" => self.open_selected_peer(),
            "tab" => {
                if self.state.open_conversation().is_open() {
                    self.state.focus(ActivePane::Compose);
                }
            }
            _ => {}
        }
    }

    fn open_selected_peer(&mut self) {
        let Some(selected) = self.state.peer_list().selected_peer().cloned() else {
            return;
        };

        self.state
            .open_conversation_mut()
            .open(selected.peer_id, selected.display_name);
        self.state.focus(ActivePane::Compose);
        self.state.clear_status_note();
        self.rebuild_views();
    }

    fn handle_compose_key(&mut self, key: &KeyInput) {
        match key.key.as_str() {
            "esc" | "tab" => self.state.focus(ActivePane::PeerList),
            "enter" => self.try_send(),
            "backspace" => self.state.compose_mut().delete_char_before(),
            "left" => self.state.compose_mut().move_cursor_left(),
            "right" => self.state.compose_mut().move_cursor_right(),
            "home" => self.state.compose_mut().move_cursor_home(),
            "end" => self.state.compose_mut().move_cursor_end(),
            other => {
                if key.ctrl {
                    return;
                }
                let mut chars = other.chars();
                if let (Some(ch), None) = (chars.next(), chars.next()) {
                    self.state.compose_mut().insert_char(ch);
                }
            }
        }
    }

    /// Appends the draft to the store. Local state is untouched on
    /// success; the message shows up once the feed echoes it back.
    fn try_send(&mut self) {
        let Some(peer_id) = self.state.open_conversation().peer_id().cloned() else {
            return;
        };
        if !self.state.compose().can_send() {
            return;
        }

        let command = SendMessageCommand {
            receiver_id: peer_id,
            text: self.state.compose().text().to_owned(),
        };

        match send_message(&self.writer, command) {
            Ok(()) => {
                self.state.compose_mut().clear();
                self.state.clear_status_note();
            }
            Err(error) => {
                tracing::warn!(code = SEND_FAILED, error = ?error, "message send failed");
                self.state.set_status_note(send_failure_note(&error));
            }
        }
    }
}

fn send_failure_note(error: &SendMessageError) -> &'static str {
    match error {
        SendMessageError::EmptyMessage => "Nothing to send.",
        SendMessageError::Unauthorized => "Send failed: session expired. Sign in again.",
        SendMessageError::Rejected => "Send failed: the store rejected the message.",
        SendMessageError::TemporarilyUnavailable => {
            "Send failed: service unavailable. Press Enter to retry."
        }
    }
}

impl<W: MessageWriter> ShellOrchestrator for DefaultShellOrchestrator<W> {
    fn state(&self) -> &ShellState {
        &self.state
    }

    fn handle_event(&mut self, event: AppEvent) -> Result<()> {
        match event {
            AppEvent::Tick => {}
            AppEvent::QuitRequested => self.quit(),
            AppEvent::MessagesSnapshot(snapshot) => {
                self.sync.apply_messages_snapshot(snapshot);
                self.rebuild_views();
            }
            AppEvent::DirectorySnapshot(profiles) => {
                let current_user = self.state.session().user_id().cloned();
                self.directory = match current_user {
                    Some(user) => order_directory(profiles, &user),
                    None => Vec::new(),
                };
                self.directory_loaded = true;
                self.rebuild_views();
            }
            AppEvent::FeedFailed { kind, code } => {
                self.sync.on_feed_failed(kind, &code);
                self.state.set_feed_degraded();
                self.state
                    .set_status_note("Live updates lost. Showing last known state.");
            }
            AppEvent::InputKey(key) => match self.state.active_pane() {
                ActivePane::PeerList => self.handle_peer_list_key(&key),
                ActivePane::Compose => self.handle_compose_key(&key),
            },
        }

        Ok(())
    }
}
