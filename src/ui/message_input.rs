//! Compose field rendering.

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::domain::{
    message_input_state::{InputMode, MessageInputState},
    shell_state::ActivePane,
};

use super::styles;

const MESSAGE_PLACEHOLDER: &str = "Press 'i' to type a message, 'p' to share a photo...";
const PHOTO_PLACEHOLDER: &str = "Path of the image to upload";

const PROMPT_SYMBOL: &str = "> ";

pub fn render_message_input(
    frame: &mut Frame<'_>,
    area: Rect,
    input_state: &MessageInputState,
    active_pane: ActivePane,
) {
    let is_focused = active_pane == ActivePane::MessageInput;

    let border_style = if is_focused {
        styles::active_panel_border_style()
    } else {
        styles::inactive_panel_border_style()
    };

    let paragraph = Paragraph::new(build_input_line(input_state, is_focused)).block(
        Block::default()
            .title(input_title(input_state.mode()))
            .borders(Borders::ALL)
            .border_style(border_style),
    );

    frame.render_widget(paragraph, area);

    if is_focused {
        let column = input_state
            .cursor_display_column()
            .min(u16::MAX as usize) as u16;
        let cursor_x = area
            .x
            .saturating_add(1)
            .saturating_add(PROMPT_SYMBOL.len() as u16)
            .saturating_add(column);
        let cursor_y = area.y.saturating_add(1);
        frame.set_cursor_position((cursor_x, cursor_y));
    }
}

fn input_title(mode: InputMode) -> &'static str {
    match mode {
        InputMode::Message => "Message",
        InputMode::PhotoPath => "Photo path (Enter: upload, Esc: cancel)",
    }
}

fn build_input_line(input_state: &MessageInputState, is_focused: bool) -> Line<'static> {
    let prompt = Span::styled(PROMPT_SYMBOL, styles::input_prompt_style());

    if !input_state.is_empty() {
        return Line::from(vec![
            prompt,
            Span::styled(input_state.text().to_owned(), styles::input_text_style()),
        ]);
    }

    let placeholder = match (is_focused, input_state.mode()) {
        (false, _) => MESSAGE_PLACEHOLDER,
        (true, InputMode::PhotoPath) => PHOTO_PLACEHOLDER,
        (true, InputMode::Message) => "",
    };

    Line::from(vec![
        prompt,
        Span::styled(placeholder, styles::input_placeholder_style()),
    ])
}
