use anyhow::Result;

use crate::{
    domain::shell_state::ShellState,
    usecases::{
        context::AppContext,
        contracts::{AppEventSource, ShellOrchestrator},
    },
};

use super::{terminal::TerminalSession, view};

/// Runs the chat screen until the user quits or the sign-in flow must take over the terminal.
pub fn start(
    context: &AppContext,
    event_source: &mut dyn AppEventSource,
    orchestrator: &mut dyn ShellOrchestrator,
) -> Result<()> {
    tracing::info!(
        log_level = %context.config.logging.level,
        backend = ?context.backend,
        "starting TUI shell"
    );

    let mut terminal = TerminalSession::new()?;

    drive(event_source, orchestrator, |state| {
        terminal.draw(|frame| view::render(frame, state))
    })
}

fn drive<F>(
    event_source: &mut dyn AppEventSource,
    orchestrator: &mut dyn ShellOrchestrator,
    mut redraw: F,
) -> Result<()>
where
    F: FnMut(&mut ShellState) -> Result<()>,
{
    while should_continue(orchestrator.state()) {
        redraw(orchestrator.state_mut())?;

        if let Some(event) = event_source.next_event()? {
            orchestrator.handle_event(event)?;
        }
    }

    Ok(())
}

fn should_continue(state: &ShellState) -> bool {
    state.is_running() && !state.sign_in_requested()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::events::{AppEvent, KeyInput},
        infra::{
            config::ChatConfig,
            stubs::{MemoryClipboard, RecordingOpener},
        },
        test_support::{user, MemoryBackend},
        ui::event_source::MockEventSource,
        usecases::shell::ChatOrchestrator,
    };

    fn key(name: &str) -> AppEvent {
        AppEvent::InputKey(KeyInput::new(name, false))
    }

    fn orchestrator(
        backend: &MemoryBackend,
    ) -> ChatOrchestrator<MemoryBackend, RecordingOpener, MemoryClipboard> {
        ChatOrchestrator::new(
            backend.clone(),
            RecordingOpener::default(),
            MemoryClipboard::default(),
            &ChatConfig::default(),
        )
    }

    #[test]
    fn mock_source_produces_quit_event() {
        let mut source = MockEventSource::from(vec![AppEvent::QuitRequested]);
        let event = source.next_event().expect("must read mock event");

        assert_eq!(event, Some(AppEvent::QuitRequested));
    }

    #[test]
    fn loop_stops_on_quit_and_redraws_every_iteration() {
        let backend = MemoryBackend::signed_in(user("uid-1", "Ada"));
        let mut orchestrator = orchestrator(&backend);
        orchestrator.resume();
        let mut source = MockEventSource::from(vec![AppEvent::Tick, key("q")]);
        let mut redraws = 0;

        drive(&mut source, &mut orchestrator, |_| {
            redraws += 1;
            Ok(())
        })
        .expect("loop should finish");

        assert!(!orchestrator.state().is_running());
        assert_eq!(redraws, 2);
    }

    #[test]
    fn loop_hands_over_when_sign_in_is_requested() {
        let backend = MemoryBackend::default();
        let mut orchestrator = orchestrator(&backend);
        orchestrator.resume();
        let mut source = MockEventSource::from(vec![AppEvent::Tick]);
        let mut redraws = 0;

        drive(&mut source, &mut orchestrator, |_| {
            redraws += 1;
            Ok(())
        })
        .expect("loop should finish");

        assert!(orchestrator.state().is_running());
        assert!(orchestrator.state().sign_in_requested());
        assert_eq!(redraws, 0);
    }

    #[test]
    fn typed_message_reaches_the_backend_through_the_loop() {
        let backend = MemoryBackend::signed_in(user("uid-1", "Ada"));
        let mut orchestrator = orchestrator(&backend);
        orchestrator.resume();
        let mut events = vec![key("i")];
        events.extend("hi".chars().map(|ch| key(&ch.to_string())));
        events.extend([key("enter"), key("esc"), key("q")]);
        let mut source = MockEventSource::from(events);

        drive(&mut source, &mut orchestrator, |_| Ok(())).expect("loop should finish");

        let records = backend.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message.text_body(), Some("hi"));
    }
}
