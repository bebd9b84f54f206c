use ratatui::style::{Color, Modifier, Style};

pub fn active_border() -> Style {
    Style::default().fg(Color::Cyan)
}

pub fn inactive_border() -> Style {
    Style::default().fg(Color::DarkGray)
}

pub fn selected_row() -> Style {
    Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
}

pub fn online_marker() -> Style {
    Style::default().fg(Color::Green)
}

pub fn offline_marker() -> Style {
    Style::default().fg(Color::DarkGray)
}

pub fn unread_badge() -> Style {
    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
}

pub fn meta() -> Style {
    Style::default().fg(Color::DarkGray)
}

pub fn own_author() -> Style {
    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
}

pub fn peer_author() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

pub fn read_receipt() -> Style {
    Style::default().fg(Color::Blue)
}

pub fn warning() -> Style {
    Style::default().fg(Color::Yellow)
}

pub fn error() -> Style {
    Style::default().fg(Color::Red)
}
