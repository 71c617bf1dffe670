use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::domain::{
    message_input_state::InputMode,
    shell_state::{ActivePane, ShellState},
};

use super::message_input::render_message_input;
use super::message_rendering::{build_message_rows, row_to_list_item};
use super::styles;

/// Lines a message row occupies at minimum (header + body).
const ROW_LINES: usize = 2;

pub fn render(frame: &mut Frame<'_>, state: &mut ShellState) {
    let [header_area, messages_area, input_area, status_area] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .areas(frame.area());

    frame.render_widget(Paragraph::new(header_line(state)), header_area);

    let active_pane = state.active_pane();
    render_messages_panel(frame, messages_area, state, active_pane);
    render_message_input(frame, input_area, state.message_input(), active_pane);

    frame.render_widget(Paragraph::new(status_line(state)), status_area);
}

fn header_line(state: &ShellState) -> Line<'static> {
    let mut spans = vec![
        Span::raw("FriendlyChat | "),
        Span::styled(state.username().to_owned(), styles::header_user_style()),
    ];

    if let Some(email) = state.user().and_then(|user| user.email.as_deref()) {
        spans.push(Span::styled(format!(" <{email}>"), styles::hint_style()));
    }

    if state.is_uploading() {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled("uploading photo...", styles::progress_style()));
    }

    Line::from(spans)
}

fn render_messages_panel(
    frame: &mut Frame<'_>,
    area: Rect,
    state: &mut ShellState,
    active_pane: ActivePane,
) {
    let border_style = if active_pane == ActivePane::Messages {
        styles::active_panel_border_style()
    } else {
        styles::inactive_panel_border_style()
    };
    let block = Block::default()
        .title("Messages")
        .borders(Borders::ALL)
        .border_style(border_style);

    if state.messages().is_empty() {
        frame.render_widget(Paragraph::new("No messages yet").block(block), area);
        return;
    }

    let rows = build_message_rows(state.messages().entries());
    let items: Vec<ListItem<'static>> = rows.iter().map(row_to_list_item).collect();

    let viewport_rows = (area.height.saturating_sub(2) as usize / ROW_LINES).max(1);
    let selected = state.messages().selected_index();
    if let Some(index) = selected {
        state
            .messages_mut()
            .update_scroll_offset(index, viewport_rows);
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD));

    let mut list_state = ListState::default();
    list_state.select(selected);
    *list_state.offset_mut() = state.messages().scroll_offset();
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn status_line(state: &ShellState) -> Line<'static> {
    if let Some(notice) = state.notice() {
        return Line::from(Span::styled(
            notice.text.clone(),
            styles::notice_style(notice.kind),
        ));
    }

    let hint = match (state.active_pane(), state.message_input().mode()) {
        (ActivePane::Messages, _) => {
            "j/k: navigate | i: compose | p: photo | o: open | y: copy | s: sign out | q: quit"
        }
        (ActivePane::MessageInput, InputMode::Message) => "Enter: send | Esc: back",
        (ActivePane::MessageInput, InputMode::PhotoPath) => "Enter: upload | Esc: cancel",
    };

    Line::from(Span::styled(hint, styles::hint_style()))
}
