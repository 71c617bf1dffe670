//! Message row rendering.
//!
//! Each entry becomes one row with a header line (time + author) and a body.
//! Text and photo messages use different body layouts.

use chrono::{Local, TimeZone};
use ratatui::{
    text::{Line, Span},
    widgets::ListItem,
};

use crate::domain::message::{ChatEntry, MessageBody};

use super::styles;

const PHOTO_MARKER: &str = "[Photo]";
const INDENT: &str = "      ";

/// Which visual layout a row uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLayout {
    Text,
    Photo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRow {
    pub time: String,
    pub author: String,
    pub layout: RowLayout,
    /// Message text, or the photo URL for photo rows.
    pub content: String,
}

/// Maps every entry to exactly one row, preserving order.
pub fn build_message_rows(entries: &[ChatEntry]) -> Vec<MessageRow> {
    entries.iter().map(message_row).collect()
}

fn message_row(entry: &ChatEntry) -> MessageRow {
    let layout = match entry.message.body() {
        MessageBody::Text(_) => RowLayout::Text,
        MessageBody::Photo(_) => RowLayout::Photo,
    };

    MessageRow {
        time: entry
            .sent_at_ms()
            .map(format_time)
            .unwrap_or_else(|| "--:--".to_owned()),
        author: entry.message.author().to_owned(),
        layout,
        content: entry.message.content().to_owned(),
    }
}

pub fn row_to_list_item(row: &MessageRow) -> ListItem<'static> {
    let mut lines = vec![Line::from(vec![
        Span::styled(format!("{:>5} ", row.time), styles::message_time_style()),
        Span::styled(format!("{}:", row.author), styles::message_sender_style()),
    ])];

    match row.layout {
        RowLayout::Text => {
            for text_line in row.content.lines() {
                lines.push(Line::from(vec![
                    Span::raw(INDENT),
                    Span::styled(text_line.to_owned(), styles::message_text_style()),
                ]));
            }
        }
        RowLayout::Photo => {
            lines.push(Line::from(vec![
                Span::raw(INDENT),
                Span::styled(PHOTO_MARKER, styles::message_media_style()),
                Span::raw(" "),
                Span::styled(row.content.clone(), styles::message_media_style()),
            ]));
        }
    }

    ListItem::new(lines)
}

fn format_time(timestamp_ms: i64) -> String {
    match Local.timestamp_millis_opt(timestamp_ms) {
        chrono::LocalResult::Single(dt) => dt.format("%H:%M").to_string(),
        chrono::LocalResult::Ambiguous(dt, _) => dt.format("%H:%M").to_string(),
        chrono::LocalResult::None => "--:--".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::message::FriendlyMessage;

    fn text_entry(key: &str, author: &str, text: &str) -> ChatEntry {
        ChatEntry::new(key, FriendlyMessage::text(author, text).expect("valid text"))
    }

    fn photo_entry(key: &str, author: &str, url: &str) -> ChatEntry {
        ChatEntry::new(key, FriendlyMessage::photo(author, url).expect("valid photo"))
    }

    #[test]
    fn builds_one_row_per_entry_in_order() {
        let entries: Vec<_> = (0..5)
            .map(|i| text_entry(&format!("k{i}"), "Ada", &format!("message {i}")))
            .collect();

        let rows = build_message_rows(&entries);

        assert_eq!(rows.len(), 5);
        let contents: Vec<_> = rows.iter().map(|row| row.content.as_str()).collect();
        assert_eq!(
            contents,
            vec!["message 0", "message 1", "message 2", "message 3", "message 4"]
        );
    }

    #[test]
    fn chooses_layout_from_populated_field() {
        let rows = build_message_rows(&[
            text_entry("k1", "Ada", "hello"),
            photo_entry("k2", "Grace", "https://cdn.example/cat.jpg"),
        ]);

        assert_eq!(rows[0].layout, RowLayout::Text);
        assert_eq!(rows[1].layout, RowLayout::Photo);
        assert_eq!(rows[1].content, "https://cdn.example/cat.jpg");
        assert_eq!(rows[1].author, "Grace");
    }

    #[test]
    fn keys_without_push_time_show_placeholder_time() {
        let rows = build_message_rows(&[text_entry("not-a-push-key", "Ada", "hi")]);

        assert_eq!(rows[0].time, "--:--");
    }

    #[test]
    fn photo_rows_take_two_lines_and_text_rows_grow_with_the_text() {
        let text = message_row(&text_entry("k1", "Ada", "first\nsecond"));
        let photo = message_row(&photo_entry("k2", "Ada", "https://cdn.example/a.png"));

        assert_eq!(row_to_list_item(&text).height(), 3);
        assert_eq!(row_to_list_item(&photo).height(), 2);
    }
}
