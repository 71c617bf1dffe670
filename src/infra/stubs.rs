use anyhow::Result;

use crate::infra::contracts::{ClipboardWriter, ExternalOpener};

/// Records opened targets instead of launching anything.
#[derive(Debug, Clone, Default)]
pub struct RecordingOpener {
    pub opened: std::cell::RefCell<Vec<String>>,
}

impl ExternalOpener for RecordingOpener {
    fn open(&self, target: &str) -> Result<()> {
        self.opened.borrow_mut().push(target.to_owned());
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    pub contents: Option<String>,
}

impl ClipboardWriter for MemoryClipboard {
    fn copy_text(&mut self, text: &str) -> Result<()> {
        self.contents = Some(text.to_owned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_opener_keeps_targets_in_order() {
        let opener = RecordingOpener::default();
        opener.open("https://a").expect("open");
        opener.open("https://b").expect("open");

        assert_eq!(*opener.opened.borrow(), vec!["https://a", "https://b"]);
    }
}
