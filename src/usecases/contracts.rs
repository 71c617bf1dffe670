use anyhow::Result;

use crate::domain::{events::AppEvent, shell_state::ShellState};

use super::{
    message_feed::MessageFeed, send_message::MessageStore, sign_in::AuthGateway,
    sign_in::SignInResult, upload_photo::PhotoStorage,
};

pub trait AppEventSource {
    fn next_event(&mut self) -> Result<Option<AppEvent>>;
}

pub trait ShellOrchestrator {
    fn state(&self) -> &ShellState;
    fn state_mut(&mut self) -> &mut ShellState;
    fn handle_event(&mut self, event: AppEvent) -> Result<()>;
    /// The screen became visible: start following the auth state.
    fn resume(&mut self);
    /// The screen went away: stop following the auth state and drop the messages.
    fn pause(&mut self);
    fn on_sign_in_result(&mut self, result: SignInResult);
}

/// Everything the chat screen needs from the backend platform.
pub trait ChatBackend: AuthGateway + MessageStore + MessageFeed + PhotoStorage {}

impl<T> ChatBackend for T where T: AuthGateway + MessageStore + MessageFeed + PhotoStorage {}
