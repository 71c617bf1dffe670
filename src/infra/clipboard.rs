use anyhow::{Context, Result};
use arboard::Clipboard;

use crate::infra::contracts::ClipboardWriter;

/// System clipboard, connected lazily on first use.
#[derive(Default)]
pub struct SystemClipboard {
    clipboard: Option<Clipboard>,
}

impl ClipboardWriter for SystemClipboard {
    fn copy_text(&mut self, text: &str) -> Result<()> {
        let clipboard = match self.clipboard.take() {
            Some(clipboard) => clipboard,
            None => Clipboard::new().context("system clipboard is unavailable")?,
        };
        let clipboard = self.clipboard.insert(clipboard);

        clipboard
            .set_text(text.to_owned())
            .context("failed to write to the clipboard")
    }
}
