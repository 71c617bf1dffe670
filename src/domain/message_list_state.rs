use super::message::ChatEntry;

/// Scroll margin - number of rows to keep visible above/below the cursor before scrolling.
const SCROLL_MARGIN: usize = 3;

/// Rows received since the listener was attached, in arrival order.
///
/// The list only grows while the screen is alive; it is emptied on cleanup.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageListState {
    entries: Vec<ChatEntry>,
    /// `None` follows the newest row.
    selected_index: Option<usize>,
    scroll_offset: usize,
}

impl MessageListState {
    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, entry: ChatEntry) {
        self.entries.push(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.selected_index = None;
        self.scroll_offset = 0;
    }

    /// Returns the highlighted row: the explicit selection or the newest row.
    pub fn selected_index(&self) -> Option<usize> {
        match self.selected_index {
            Some(idx) => Some(idx),
            None => self.entries.len().checked_sub(1),
        }
    }

    pub fn selected_entry(&self) -> Option<&ChatEntry> {
        self.selected_index().and_then(|idx| self.entries.get(idx))
    }

    #[cfg(test)]
    pub fn is_following_newest(&self) -> bool {
        self.selected_index.is_none()
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    /// Moves the cursor down; reaching the last row resumes following new rows.
    pub fn select_next(&mut self) {
        let Some(current) = self.selected_index() else {
            return;
        };

        let next = current + 1;
        self.selected_index = if next + 1 >= self.entries.len() {
            None
        } else {
            Some(next)
        };
    }

    pub fn select_previous(&mut self) {
        if let Some(current) = self.selected_index() {
            self.selected_index = Some(current.saturating_sub(1));
        }
    }

    pub fn select_newest(&mut self) {
        self.selected_index = None;
    }

    /// Keeps the cursor visible with a margin of rows above and below it.
    pub fn update_scroll_offset(&mut self, row_index: usize, viewport_height: usize) {
        if viewport_height == 0 {
            return;
        }

        let effective_margin = SCROLL_MARGIN.min(viewport_height / 2);

        if row_index < self.scroll_offset + effective_margin {
            self.scroll_offset = row_index.saturating_sub(effective_margin);
        }

        let visible_bottom = self.scroll_offset + viewport_height;
        if row_index + effective_margin >= visible_bottom {
            self.scroll_offset = (row_index + effective_margin + 1).saturating_sub(viewport_height);
        }
    }
}
