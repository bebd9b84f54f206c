//! Renders the two-pane shell: peer directory on the left, the open
//! conversation plus compose input on the right, one status line below.

use chrono::{TimeZone, Utc};
use ratatui::{
    layout::{Constraint, Layout, Position, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthChar;

use crate::domain::{
    message::{Message, MessageStatus},
    peer_list_state::{PeerEntry, PeerListUiState},
    shell_state::{ActivePane, ShellState},
};

use super::styles;

pub fn render(frame: &mut Frame, state: &ShellState) {
    let [main, status] =
        Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).areas(frame.area());
    let [left, right] =
        Layout::horizontal([Constraint::Percentage(32), Constraint::Percentage(68)]).areas(main);

    render_peer_list(frame, left, state);
    render_conversation_pane(frame, right, state);
    render_status_line(frame, status, state);
}

fn render_peer_list(frame: &mut Frame, area: Rect, state: &ShellState) {
    let active = state.active_pane() == ActivePane::PeerList;
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" people ")
        .border_style(if active {
            styles::active_border()
        } else {
            styles::inactive_border()
        });

    match state.peer_list().ui_state() {
        PeerListUiState::Loading => {
            frame.render_widget(
                Paragraph::new(Span::styled("loading directory...", styles::meta())).block(block),
                area,
            );
        }
        PeerListUiState::Empty => {
            frame.render_widget(
                Paragraph::new(Span::styled("no one else is here yet", styles::meta()))
                    .block(block),
                area,
            );
        }
        PeerListUiState::Error => {
            frame.render_widget(
                Paragraph::new(Span::styled("directory unavailable", styles::error()))
                    .block(block),
                area,
            );
        }
        PeerListUiState::Ready => {
            let width = area.width.saturating_sub(2) as usize;
            let items: Vec<ListItem> = state
                .peer_list()
                .peers()
                .iter()
                .map(|peer| ListItem::new(peer_line(peer, width)))
                .collect();
            let list = List::new(items)
                .block(block)
                .highlight_style(styles::selected_row());
            let mut list_state =
                ListState::default().with_selected(state.peer_list().selected_index());
            frame.render_stateful_widget(list, area, &mut list_state);
        }
    }
}

fn peer_line(peer: &PeerEntry, width: usize) -> Line<'static> {
    let marker = Span::styled(
        if peer.is_online { "● " } else { "○ " },
        if peer.is_online {
            styles::online_marker()
        } else {
            styles::offline_marker()
        },
    );
    let mut spans = vec![marker, Span::raw(peer.display_name.clone())];
    if peer.unread_count > 0 {
        spans.push(Span::styled(
            format!(" ({})", peer.unread_count),
            styles::unread_badge(),
        ));
    }
    if let Some(preview) = &peer.last_message_preview {
        let used: usize = spans.iter().map(|span| span.width()).sum();
        let room = width.saturating_sub(used + 3);
        if room > 1 {
            spans.push(Span::styled(
                format!("  {}", truncate_to_width(preview, room)),
                styles::meta(),
            ));
        }
    }
    Line::from(spans)
}

fn render_conversation_pane(frame: &mut Frame, area: Rect, state: &ShellState) {
    let [messages_area, compose_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(3)]).areas(area);

    render_messages(frame, messages_area, state);
    render_compose(frame, compose_area, state);
}

fn render_messages(frame: &mut Frame, area: Rect, state: &ShellState) {
    let conversation = state.open_conversation();
    let title = if conversation.is_open() {
        format!(" {} ", conversation.peer_name())
    } else {
        " messages ".to_owned()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(styles::inactive_border());

    if !conversation.is_open() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "select someone and press enter to start chatting",
                styles::meta(),
            ))
            .block(block),
            area,
        );
        return;
    }

    let own_id = state.session().user_id().cloned();
    let lines: Vec<Line> = conversation
        .messages()
        .iter()
        .map(|message| {
            let own = own_id.as_ref() == Some(&message.sender_id);
            message_line(message, own, conversation.peer_name())
        })
        .collect();

    // Keep the newest messages visible.
    let visible = area.height.saturating_sub(2) as usize;
    let skip = lines.len().saturating_sub(visible) as u16;
    frame.render_widget(Paragraph::new(lines).block(block).scroll((skip, 0)), area);
}

fn message_line(message: &Message, own: bool, peer_name: &str) -> Line<'static> {
    let mut spans = vec![
        Span::styled(format!("[{}] ", format_clock(message.timestamp_unix_ms)), styles::meta()),
        Span::styled(
            if own { "you".to_owned() } else { peer_name.to_owned() },
            if own {
                styles::own_author()
            } else {
                styles::peer_author()
            },
        ),
        Span::raw(": "),
        Span::raw(message.text.clone()),
    ];
    if own {
        spans.push(Span::styled(
            format!(" {}", status_ticks(message.status)),
            if message.status == MessageStatus::Read {
                styles::read_receipt()
            } else {
                styles::meta()
            },
        ));
    }
    Line::from(spans)
}

fn render_compose(frame: &mut Frame, area: Rect, state: &ShellState) {
    let active = state.active_pane() == ActivePane::Compose;
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" compose ")
        .border_style(if active {
            styles::active_border()
        } else {
            styles::inactive_border()
        });

    frame.render_widget(Paragraph::new(state.compose().text()).block(block), area);

    if active {
        let prefix_width: usize = state
            .compose()
            .text()
            .chars()
            .take(state.compose().cursor_position())
            .map(|ch| ch.width().unwrap_or(0))
            .sum();
        frame.set_cursor_position(Position::new(
            area.x + 1 + prefix_width as u16,
            area.y + 1,
        ));
    }
}

fn render_status_line(frame: &mut Frame, area: Rect, state: &ShellState) {
    let mut spans = Vec::new();
    match state.session().current_user() {
        Some(user) => spans.push(Span::raw(user.email.clone())),
        None => spans.push(Span::styled("signed out", styles::meta())),
    }
    if state.is_feed_degraded() {
        spans.push(Span::styled(
            "  live feed lost - showing last known state",
            styles::warning(),
        ));
    }
    if let Some(note) = state.status_note() {
        spans.push(Span::styled(format!("  {note}"), styles::error()));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

pub(crate) fn format_clock(unix_ms: i64) -> String {
    match Utc.timestamp_millis_opt(unix_ms).single() {
        Some(moment) => moment.format("%H:%M").to_string(),
        None => "--:--".to_owned(),
    }
}

fn status_ticks(status: MessageStatus) -> &'static str {
    match status {
        MessageStatus::Sent => "✓",
        MessageStatus::Delivered | MessageStatus::Read => "✓✓",
    }
}

fn truncate_to_width(text: &str, max_width: usize) -> String {
    let mut width = 0;
    let mut out = String::new();
    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > max_width {
            out.push('…');
            return out;
        }
        width += ch_width;
        out.push(ch);
    }
    out
}
