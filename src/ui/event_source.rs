//! Event sources feeding the shell loop: terminal input, live feed
//! channels, and the composite that merges them.

use std::{sync::mpsc::Receiver, time::Duration};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};

use crate::{
    backend::feed::FeedEvent,
    domain::{
        events::{AppEvent, FeedKind, KeyInput},
        message::Message,
        user::UserProfile,
    },
    usecases::contracts::AppEventSource,
};

/// Keyboard input. When no key arrives within the poll window a `Tick`
/// is emitted so the shell keeps draining feeds and redrawing.
pub struct CrosstermEventSource {
    poll_timeout: Duration,
}

impl CrosstermEventSource {
    pub fn new(poll_timeout: Duration) -> Self {
        Self { poll_timeout }
    }
}

impl AppEventSource for CrosstermEventSource {
    fn next_event(&mut self) -> Result<Option<AppEvent>> {
        if !event::poll(self.poll_timeout)? {
            return Ok(Some(AppEvent::Tick));
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
                if ctrl && key.code == KeyCode::Char('c') {
                    return Ok(Some(AppEvent::QuitRequested));
                }
                Ok(key_name(key.code)
                    .map(|name| AppEvent::InputKey(KeyInput::new(name, ctrl))))
            }
            _ => Ok(Some(AppEvent::Tick)),
        }
    }
}

fn key_name(code: KeyCode) -> Option<String> {
    match code {
        KeyCode::Char(ch) => Some(ch.to_string()),
        KeyCode::Enter => Some("enter".to_owned()),
        KeyCode::Esc => Some("esc".to_owned()),
        KeyCode::Backspace => Some("backspace".to_owned()),
        KeyCode::Tab => Some("tab".to_owned()),
        KeyCode::Up => Some("up".to_owned()),
        KeyCode::Down => Some("down".to_owned()),
        KeyCode::Left => Some("left".to_owned()),
        KeyCode::Right => Some("right".to_owned()),
        KeyCode::Home => Some("home".to_owned()),
        KeyCode::End => Some("end".to_owned()),
        _ => None,
    }
}

/// Bridges the backend feed channels into shell events. Non-blocking:
/// returns `None` when nothing is pending.
pub struct ChannelFeedSource {
    messages_rx: Receiver<FeedEvent<Message>>,
    directory_rx: Receiver<FeedEvent<UserProfile>>,
}

impl ChannelFeedSource {
    pub fn new(
        messages_rx: Receiver<FeedEvent<Message>>,
        directory_rx: Receiver<FeedEvent<UserProfile>>,
    ) -> Self {
        Self {
            messages_rx,
            directory_rx,
        }
    }
}

impl AppEventSource for ChannelFeedSource {
    fn next_event(&mut self) -> Result<Option<AppEvent>> {
        if let Ok(event) = self.messages_rx.try_recv() {
            return Ok(Some(match event {
                FeedEvent::Snapshot(messages) => AppEvent::MessagesSnapshot(messages),
                FeedEvent::Lost { code } => AppEvent::FeedFailed {
                    kind: FeedKind::Messages,
                    code,
                },
            }));
        }
        if let Ok(event) = self.directory_rx.try_recv() {
            return Ok(Some(match event {
                FeedEvent::Snapshot(profiles) => AppEvent::DirectorySnapshot(profiles),
                FeedEvent::Lost { code } => AppEvent::FeedFailed {
                    kind: FeedKind::Directory,
                    code,
                },
            }));
        }
        Ok(None)
    }
}

/// Polls sources in order; the first pending event wins. Feed sources
/// go before the terminal source so snapshots are drained even while
/// keys are arriving.
pub struct CompositeEventSource {
    sources: Vec<Box<dyn AppEventSource>>,
}

impl CompositeEventSource {
    pub fn new(sources: Vec<Box<dyn AppEventSource>>) -> Self {
        Self { sources }
    }
}

impl AppEventSource for CompositeEventSource {
    fn next_event(&mut self) -> Result<Option<AppEvent>> {
        for source in &mut self.sources {
            if let Some(event) = source.next_event()? {
                return Ok(Some(event));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
pub mod test_support {
    use std::collections::VecDeque;

    use super::*;

    /// Scripted event source for shell-loop tests.
    pub struct MockEventSource {
        events: VecDeque<AppEvent>,
    }

    impl MockEventSource {
        pub fn scripted(events: Vec<AppEvent>) -> Self {
            Self {
                events: events.into(),
            }
        }
    }

    impl AppEventSource for MockEventSource {
        fn next_event(&mut self) -> Result<Option<AppEvent>> {
            Ok(self.events.pop_front())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::{test_support::MockEventSource, *};
    use crate::domain::message::{MessageId, MessageStatus, UserId};

    fn message() -> Message {
        Message {
            id: MessageId::new("m-1"),
            text: "hi".to_owned(),
            sender_id: UserId::new("alice"),
            receiver_id: UserId::new("bob"),
            timestamp_unix_ms: 1,
            status: MessageStatus::Sent,
        }
    }

    #[test]
    fn feed_source_translates_snapshots_and_losses() {
        let (messages_tx, messages_rx) = mpsc::channel();
        let (directory_tx, directory_rx) = mpsc::channel();
        let mut source = ChannelFeedSource::new(messages_rx, directory_rx);

        assert_eq!(source.next_event().ok().flatten(), None);

        messages_tx
            .send(FeedEvent::Snapshot(vec![message()]))
            .ok();
        assert_eq!(
            source.next_event().ok().flatten(),
            Some(AppEvent::MessagesSnapshot(vec![message()]))
        );

        directory_tx
            .send(FeedEvent::Lost {
                code: "STORE_UNREACHABLE".to_owned(),
            })
            .ok();
        assert_eq!(
            source.next_event().ok().flatten(),
            Some(AppEvent::FeedFailed {
                kind: FeedKind::Directory,
                code: "STORE_UNREACHABLE".to_owned(),
            })
        );
    }

    #[test]
    fn composite_prefers_earlier_sources() {
        let first = MockEventSource::scripted(vec![AppEvent::QuitRequested]);
        let second = MockEventSource::scripted(vec![AppEvent::Tick]);
        let mut composite = CompositeEventSource::new(vec![Box::new(first), Box::new(second)]);

        assert_eq!(
            composite.next_event().ok().flatten(),
            Some(AppEvent::QuitRequested)
        );
        assert_eq!(composite.next_event().ok().flatten(), Some(AppEvent::Tick));
        assert_eq!(composite.next_event().ok().flatten(), None);
    }
}
