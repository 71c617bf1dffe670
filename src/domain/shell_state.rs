use std::time::{Duration, Instant};

use super::{
    message::ANONYMOUS,
    message_input_state::{InputMode, MessageInputState},
    message_list_state::MessageListState,
    user::AuthUser,
};

/// How long a short notice stays on screen.
pub const NOTICE_SHORT: Duration = Duration::from_millis(2_000);
/// How long a long notice stays on screen.
pub const NOTICE_LONG: Duration = Duration::from_millis(3_500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivePane {
    #[default]
    Messages,
    MessageInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// A transient status message, the terminal counterpart of a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub kind: NoticeKind,
    pub expires_at: Instant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellState {
    running: bool,
    sign_in_requested: bool,
    active_pane: ActivePane,
    user: Option<AuthUser>,
    username: String,
    messages: MessageListState,
    message_input: MessageInputState,
    notice: Option<Notice>,
    uploading: bool,
}

impl Default for ShellState {
    fn default() -> Self {
        Self::new(MessageInputState::default())
    }
}

impl ShellState {
    pub fn new(message_input: MessageInputState) -> Self {
        Self {
            running: true,
            sign_in_requested: false,
            active_pane: ActivePane::Messages,
            user: None,
            username: ANONYMOUS.to_owned(),
            messages: MessageListState::default(),
            message_input,
            notice: None,
            uploading: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// True while the screen waits for the sign-in flow to run.
    pub fn sign_in_requested(&self) -> bool {
        self.sign_in_requested
    }

    pub fn request_sign_in(&mut self) {
        self.sign_in_requested = true;
    }

    pub fn clear_sign_in_request(&mut self) {
        self.sign_in_requested = false;
    }

    pub fn active_pane(&self) -> ActivePane {
        self.active_pane
    }

    pub fn focus_messages(&mut self) {
        self.active_pane = ActivePane::Messages;
        self.message_input.set_mode(InputMode::Message);
    }

    pub fn focus_input(&mut self, mode: InputMode) {
        self.active_pane = ActivePane::MessageInput;
        self.message_input.set_mode(mode);
    }

    pub fn user(&self) -> Option<&AuthUser> {
        self.user.as_ref()
    }

    pub fn set_user(&mut self, user: Option<AuthUser>) {
        self.user = user;
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn set_username(&mut self, username: impl Into<String>) {
        self.username = username.into();
    }

    pub fn messages(&self) -> &MessageListState {
        &self.messages
    }

    pub fn messages_mut(&mut self) -> &mut MessageListState {
        &mut self.messages
    }

    pub fn message_input(&self) -> &MessageInputState {
        &self.message_input
    }

    pub fn message_input_mut(&mut self) -> &mut MessageInputState {
        &mut self.message_input
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn show_notice(&mut self, text: impl Into<String>, kind: NoticeKind, duration: Duration) {
        self.notice = Some(Notice {
            text: text.into(),
            kind,
            expires_at: Instant::now() + duration,
        });
    }

    /// Removes the notice so it can be shown somewhere else.
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    /// Drops the notice once its display time is over.
    pub fn expire_notice(&mut self, now: Instant) {
        if self
            .notice
            .as_ref()
            .is_some_and(|notice| notice.expires_at <= now)
        {
            self.notice = None;
        }
    }

    /// Whether a photo upload is in flight (the progress indicator).
    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn set_uploading(&mut self, uploading: bool) {
        self.uploading = uploading;
    }
}
