#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Tick,
    QuitRequested,
    InputKey(KeyInput),
    /// The terminal lost focus; maps to the screen being paused.
    FocusLost,
    /// The terminal regained focus; maps to the screen being resumed.
    FocusGained,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInput {
    pub key: String,
    pub ctrl: bool,
}

impl KeyInput {
    pub fn new(key: impl Into<String>, ctrl: bool) -> Self {
        Self {
            key: key.into(),
            ctrl,
        }
    }

    /// Returns the typed character for single-character keys without modifiers.
    pub fn as_char(&self) -> Option<char> {
        if self.ctrl {
            return None;
        }

        let mut chars = self.key.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => Some(ch),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_character_keys_are_typed_characters() {
        assert_eq!(KeyInput::new("x", false).as_char(), Some('x'));
        assert_eq!(KeyInput::new("ж", false).as_char(), Some('ж'));
    }

    #[test]
    fn named_and_control_keys_are_not_characters() {
        assert_eq!(KeyInput::new("enter", false).as_char(), None);
        assert_eq!(KeyInput::new("c", true).as_char(), None);
    }
}
