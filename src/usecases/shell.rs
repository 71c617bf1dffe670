//! Chat screen controller.
//!
//! Wires key presses to backend calls and reflects auth state and incoming
//! messages back into the [`ShellState`] the view renders.

use std::{path::PathBuf, time::Instant};

use anyhow::Result;

use crate::{
    domain::{
        events::{AppEvent, KeyInput},
        message_input_state::{InputMode, MessageInputState},
        shell_state::{ActivePane, NoticeKind, ShellState, NOTICE_LONG, NOTICE_SHORT},
        user::AuthUser,
    },
    infra::{
        config::ChatConfig,
        contracts::{ClipboardWriter, ExternalOpener},
    },
};

use super::{
    contracts::{ChatBackend, ShellOrchestrator},
    message_feed::ActiveFeed,
    send_message::{send_text, SendMessageError},
    sign_in::SignInResult,
    upload_photo::{upload_and_send_photo, StorageSourceError, UploadPhotoError},
};

const APP_NAME: &str = "FriendlyChat";

pub const GOODBYE_NOTICE: &str = "Goodbye! Come back soon.";
pub const SORRY_NOTICE: &str = "Sorry, something went wrong. Please try again later.";
pub const SEND_FAILED_NOTICE: &str = "Message could not be sent.";

const LISTENER_ATTACH_FAILED: &str = "CHAT_LISTENER_ATTACH_FAILED";
const MESSAGE_SEND_FAILED: &str = "CHAT_MESSAGE_SEND_FAILED";
const PHOTO_UPLOAD_DROPPED: &str = "CHAT_PHOTO_UPLOAD_DROPPED";
const SIGN_IN_FAILED: &str = "CHAT_SIGN_IN_FAILED";
const SIGN_OUT_FAILED: &str = "CHAT_SIGN_OUT_FAILED";

fn welcome_notice(username: &str) -> String {
    format!("Welcome {username} to {APP_NAME}!")
}

pub struct ChatOrchestrator<B, O, C>
where
    B: ChatBackend,
    O: ExternalOpener,
    C: ClipboardWriter,
{
    state: ShellState,
    backend: B,
    opener: O,
    clipboard: C,
    anonymous_name: String,
    pause_on_focus_loss: bool,
    auth_listener_registered: bool,
    feed: Option<ActiveFeed>,
    pending_photo: Option<PathBuf>,
}

impl<B, O, C> ChatOrchestrator<B, O, C>
where
    B: ChatBackend,
    O: ExternalOpener,
    C: ClipboardWriter,
{
    pub fn new(backend: B, opener: O, clipboard: C, chat: &ChatConfig) -> Self {
        let mut state = ShellState::new(MessageInputState::with_limit(chat.message_length_limit));
        state.set_username(chat.anonymous_name.clone());

        Self {
            state,
            backend,
            opener,
            clipboard,
            anonymous_name: chat.anonymous_name.clone(),
            pause_on_focus_loss: chat.pause_on_focus_loss,
            auth_listener_registered: false,
            feed: None,
            pending_photo: None,
        }
    }

    /// Reacts to the signed-in user changing, including the initial report on resume.
    pub fn on_auth_state_changed(&mut self, user: Option<AuthUser>) {
        match user {
            Some(user) => self.initialize_ui(user),
            None => {
                self.cleanup_ui();
                self.state.set_user(None);
                self.state.set_username(self.anonymous_name.clone());
                self.state.request_sign_in();
            }
        }
    }

    fn initialize_ui(&mut self, user: AuthUser) {
        let username = user.chat_name(&self.anonymous_name);
        let attached_for_user = self
            .feed
            .as_ref()
            .is_some_and(|feed| feed.owner_uid() == user.uid);

        if !attached_for_user {
            self.cleanup_ui();
            self.state.show_notice(welcome_notice(&username), NoticeKind::Info, NOTICE_SHORT);
            self.attach_feed(&user.uid);
        }

        self.state.set_username(username);
        self.state.set_user(Some(user));
        self.state.clear_sign_in_request();
    }

    fn attach_feed(&mut self, uid: &str) {
        match ActiveFeed::attach(&self.backend, uid) {
            Ok(feed) => {
                tracing::debug!(uid, "message listener attached");
                self.feed = Some(feed);
            }
            Err(error) => tracing::warn!(
                code = LISTENER_ATTACH_FAILED,
                error = ?error,
                "message listener could not be attached"
            ),
        }
    }

    fn cleanup_ui(&mut self) {
        if self.feed.take().is_some() {
            tracing::debug!("message listener detached");
        }
        self.state.messages_mut().clear();
        self.pending_photo = None;
        self.state.set_uploading(false);
    }

    fn drain_feed(&mut self) {
        let Some(feed) = self.feed.as_ref() else {
            return;
        };

        for entry in feed.drain() {
            self.state.messages_mut().push(entry);
        }
    }

    fn reevaluate_auth(&mut self) {
        if self.auth_listener_registered {
            let user = self.backend.current_user();
            self.on_auth_state_changed(user);
        }
    }

    pub fn submit_text(&mut self) {
        if !self.state.message_input().can_send() {
            return;
        }

        let text = self.state.message_input_mut().take_text();
        match send_text(&self.backend, self.state.username(), &text) {
            Ok(key) => tracing::debug!(key = %key, "message sent"),
            Err(error) => {
                tracing::warn!(code = MESSAGE_SEND_FAILED, error = ?error, "message send failed");
                self.state
                    .show_notice(SEND_FAILED_NOTICE, NoticeKind::Error, NOTICE_SHORT);
                if error == SendMessageError::Unauthorized {
                    self.reevaluate_auth();
                }
            }
        }
    }

    /// Opens the path prompt that stands in for a file picker.
    pub fn pick_photo(&mut self) {
        self.state.focus_input(InputMode::PhotoPath);
    }

    /// Schedules the upload of a picked file; it runs on the next tick.
    pub fn on_photo_picked(&mut self, path: PathBuf) {
        self.pending_photo = Some(path);
        self.state.set_uploading(true);
        self.state.focus_messages();
    }

    fn run_pending_upload(&mut self) {
        let Some(path) = self.pending_photo.take() else {
            return;
        };

        let result = upload_and_send_photo(&self.backend, self.state.username(), &path);
        self.state.set_uploading(false);

        match result {
            Ok(key) => tracing::debug!(key = %key, "photo message sent"),
            Err(UploadPhotoError::Send(SendMessageError::Unauthorized))
            | Err(UploadPhotoError::Upload(StorageSourceError::Unauthorized)) => {
                tracing::debug!(code = PHOTO_UPLOAD_DROPPED, "photo upload was not authorized");
                self.reevaluate_auth();
            }
            Err(error) => {
                tracing::debug!(code = PHOTO_UPLOAD_DROPPED, error = ?error, "photo upload dropped");
            }
        }
    }

    pub fn sign_out(&mut self) {
        if let Err(error) = self.backend.sign_out() {
            tracing::warn!(code = SIGN_OUT_FAILED, error = ?error, "sign-out failed");
        }
        self.state
            .show_notice(GOODBYE_NOTICE, NoticeKind::Info, NOTICE_SHORT);
        self.reevaluate_auth();
    }

    fn open_selected_photo(&mut self) {
        let Some(url) = self
            .state
            .messages()
            .selected_entry()
            .and_then(|entry| entry.message.photo_url())
            .map(ToOwned::to_owned)
        else {
            self.state
                .show_notice("Selected message has no photo.", NoticeKind::Info, NOTICE_SHORT);
            return;
        };

        if let Err(error) = self.opener.open(&url) {
            tracing::warn!(error = %error, "photo could not be opened");
            self.state
                .show_notice("Could not open the photo.", NoticeKind::Error, NOTICE_SHORT);
        }
    }

    fn copy_selected(&mut self) {
        let Some(content) = self
            .state
            .messages()
            .selected_entry()
            .map(|entry| entry.message.content().to_owned())
        else {
            return;
        };

        match self.clipboard.copy_text(&content) {
            Ok(()) => self
                .state
                .show_notice("Copied to clipboard.", NoticeKind::Info, NOTICE_SHORT),
            Err(error) => {
                tracing::warn!(error = %error, "clipboard write failed");
                self.state
                    .show_notice("Clipboard is unavailable.", NoticeKind::Error, NOTICE_SHORT);
            }
        }
    }

    fn handle_messages_key(&mut self, key: &KeyInput) {
        if key.ctrl {
            return;
        }

        match key.key.as_str() {
            "q" => self.state.stop(),
            "j" | "down" => self.state.messages_mut().select_next(),
            "k" | "up" => self.state.messages_mut().select_previous(),
            "G" | "end" => self.state.messages_mut().select_newest(),
            "i" | "enter" => self.state.focus_input(InputMode::Message),
            "p" => self.pick_photo(),
            "o" => self.open_selected_photo(),
            "y" => self.copy_selected(),
            "s" => self.sign_out(),
            _ => {}
        }
    }

    fn handle_input_key(&mut self, key: &KeyInput) {
        if key.ctrl {
            return;
        }

        let input = self.state.message_input_mut();
        match key.key.as_str() {
            "esc" => self.state.focus_messages(),
            "enter" => match input.mode() {
                InputMode::Message => self.submit_text(),
                InputMode::PhotoPath => {
                    let path = input.take_text();
                    let path = path.trim();
                    if path.is_empty() {
                        self.state.focus_messages();
                    } else {
                        self.on_photo_picked(PathBuf::from(path));
                    }
                }
            },
            "backspace" => input.delete_char_before(),
            "delete" => input.delete_char_at(),
            "left" => input.move_cursor_left(),
            "right" => input.move_cursor_right(),
            "home" => input.move_cursor_home(),
            "end" => input.move_cursor_end(),
            _ => {
                if let Some(ch) = key.as_char() {
                    input.insert_char(ch);
                }
            }
        }
    }
}

impl<B, O, C> ShellOrchestrator for ChatOrchestrator<B, O, C>
where
    B: ChatBackend,
    O: ExternalOpener,
    C: ClipboardWriter,
{
    fn state(&self) -> &ShellState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ShellState {
        &mut self.state
    }

    fn handle_event(&mut self, event: AppEvent) -> Result<()> {
        self.drain_feed();

        match event {
            AppEvent::Tick => {
                self.state.expire_notice(Instant::now());
                self.run_pending_upload();
            }
            AppEvent::QuitRequested => self.state.stop(),
            AppEvent::FocusLost => {
                if self.pause_on_focus_loss {
                    self.pause();
                }
            }
            AppEvent::FocusGained => {
                if self.pause_on_focus_loss {
                    self.resume();
                }
            }
            AppEvent::InputKey(key) => match self.state.active_pane() {
                ActivePane::Messages => self.handle_messages_key(&key),
                ActivePane::MessageInput => self.handle_input_key(&key),
            },
        }

        Ok(())
    }

    fn resume(&mut self) {
        self.auth_listener_registered = true;
        let user = self.backend.current_user();
        self.on_auth_state_changed(user);
    }

    fn pause(&mut self) {
        self.auth_listener_registered = false;
        self.cleanup_ui();
    }

    fn on_sign_in_result(&mut self, result: SignInResult) {
        match result {
            SignInResult::SignedIn(user) => {
                tracing::info!(uid = %user.uid, "sign-in completed");
            }
            SignInResult::Cancelled => {
                self.state
                    .show_notice(GOODBYE_NOTICE, NoticeKind::Info, NOTICE_SHORT);
                self.state.stop();
            }
            SignInResult::Failed(failure) => {
                tracing::error!(code = SIGN_IN_FAILED, failure = %failure.code, "sign-in failed");
                self.state
                    .show_notice(SORRY_NOTICE, NoticeKind::Error, NOTICE_LONG);
                self.state.stop();
            }
        }

        self.state.clear_sign_in_request();
    }
}
