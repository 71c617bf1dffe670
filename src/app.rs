use std::time::Duration;

use anyhow::Result;

use crate::{
    cli::{Cli, Command},
    domain::{self, shell_state::ShellState},
    firebase, infra,
    infra::storage_layout::StorageLayout,
    ui,
    usecases::{
        self, bootstrap,
        context::AppContext,
        logout::logout_and_reset,
        sign_in::{run_sign_in, AuthTerminal, RetryPolicy, StdTerminal},
        startup::{plan_startup, StartupFlowState},
    },
};

pub fn run(cli: Cli) -> Result<()> {
    tracing::debug!(
        ui = ui::module_name(),
        domain = domain::module_name(),
        firebase = firebase::module_name(),
        usecases = usecases::module_name(),
        infra = infra::module_name(),
        "module boundaries loaded"
    );

    match cli.command_or_default() {
        Command::Run => {
            let context = bootstrap::bootstrap(cli.config.as_deref())?;
            let startup = plan_startup(
                context.layout.clone(),
                &context.backend,
                Duration::from_millis(context.config.startup.session_probe_timeout_ms),
            )?;

            if let Some(code) = startup.probe_warning {
                tracing::warn!(code, "session probe failed, keeping the saved session");
            }
            if startup.state == StartupFlowState::SignIn {
                tracing::info!("no usable session, sign-in required");
            }

            if let Some(line) = run_chat(&context)? {
                println!("{line}");
            }
        }
        Command::Logout => {
            let layout = StorageLayout::resolve()?;
            let outcome = logout_and_reset(&layout)?;
            tracing::info!(session_removed = outcome.session_removed, "logout completed");
            println!("{}", logout_message(outcome.session_removed));
        }
    }

    Ok(())
}

/// Alternates between the chat screen and the guided sign-in until the user leaves.
///
/// Returns the last notice so it stays visible after the screen is torn down.
fn run_chat(context: &AppContext) -> Result<Option<String>> {
    let mut shell = bootstrap::compose_shell(context);

    loop {
        shell.orchestrator.resume();
        if !shell.orchestrator.state().sign_in_requested() {
            ui::shell::start(
                context,
                shell.event_source.as_mut(),
                shell.orchestrator.as_mut(),
            )?;
        }
        shell.orchestrator.pause();

        if !shell.orchestrator.state().is_running() {
            break;
        }

        if shell.orchestrator.state().sign_in_requested() {
            let mut terminal = StdTerminal;
            if let Some(line) = handoff_notice(shell.orchestrator.state_mut()) {
                terminal.print_line(&line)?;
            }
            let result = run_sign_in(&mut terminal, &context.backend, &RetryPolicy::default())?;
            shell.orchestrator.on_sign_in_result(result);

            if !shell.orchestrator.state().is_running() {
                break;
            }
        }
    }

    Ok(farewell_line(shell.orchestrator.state()))
}

/// The notice the screen had no chance to show before handing over the terminal.
fn handoff_notice(state: &mut ShellState) -> Option<String> {
    state.take_notice().map(|notice| notice.text)
}

fn farewell_line(state: &ShellState) -> Option<String> {
    state.notice().map(|notice| notice.text.clone())
}

fn logout_message(session_removed: bool) -> &'static str {
    if session_removed {
        "Signed out. The next run will ask you to sign in."
    } else {
        "No saved session found. Nothing to sign out."
    }
}

#[cfg(test)]
mod tests {
    use std::{env, fs};

    use super::*;
    use crate::{
        domain::{
            events::{AppEvent, KeyInput},
            shell_state::{NoticeKind, NOTICE_SHORT},
        },
        infra::{
            config::ChatConfig,
            stubs::{MemoryClipboard, RecordingOpener},
        },
        test_support::{env_lock, user, MemoryBackend},
        usecases::{
            contracts::ShellOrchestrator,
            shell::{ChatOrchestrator, GOODBYE_NOTICE},
        },
    };

    #[test]
    fn farewell_line_repeats_the_last_notice() {
        let mut state = ShellState::default();
        assert_eq!(farewell_line(&state), None);

        state.show_notice("Goodbye! Come back soon.", NoticeKind::Info, NOTICE_SHORT);

        assert_eq!(
            farewell_line(&state).as_deref(),
            Some("Goodbye! Come back soon.")
        );
    }

    #[test]
    fn goodbye_after_sign_out_is_handed_to_the_plain_terminal() {
        let backend = MemoryBackend::signed_in(user("uid-1", "Ada"));
        let mut orchestrator = ChatOrchestrator::new(
            backend.clone(),
            RecordingOpener::default(),
            MemoryClipboard::default(),
            &ChatConfig::default(),
        );
        orchestrator.resume();

        orchestrator
            .handle_event(AppEvent::InputKey(KeyInput::new("s", false)))
            .expect("sign-out key should be handled");

        assert!(orchestrator.state().sign_in_requested());
        assert_eq!(
            handoff_notice(orchestrator.state_mut()).as_deref(),
            Some(GOODBYE_NOTICE)
        );
        assert_eq!(handoff_notice(orchestrator.state_mut()), None);
    }

    #[test]
    fn logout_message_reflects_whether_a_session_existed() {
        assert!(logout_message(true).starts_with("Signed out"));
        assert!(logout_message(false).contains("No saved session"));
    }

    #[test]
    fn logout_succeeds_without_a_valid_config() {
        let _guard = env_lock();
        let root = tempfile::tempdir().expect("temp dir");
        let xdg = root.path().join("xdg");
        fs::create_dir_all(&xdg).expect("xdg dir should be creatable");

        let old_xdg = env::var_os("XDG_CONFIG_HOME");
        // SAFETY: env is guarded by process-wide test mutex.
        unsafe { env::set_var("XDG_CONFIG_HOME", &xdg) };

        let config_path = root.path().join("invalid-config.toml");
        fs::write(&config_path, "[firebase]\napi_key = \"\"\n")
            .expect("invalid config fixture should be writable");

        let layout = StorageLayout::resolve().expect("layout");
        layout.ensure_dirs().expect("layout dirs should be created");
        fs::write(layout.session_file(), b"{}").expect("session should be written");

        let cli = Cli {
            config: Some(config_path),
            command: Some(Command::Logout),
        };

        let result = run(cli);

        match old_xdg {
            Some(value) => {
                // SAFETY: restoring env while guard is held.
                unsafe { env::set_var("XDG_CONFIG_HOME", value) }
            }
            None => {
                // SAFETY: restoring env while guard is held.
                unsafe { env::remove_var("XDG_CONFIG_HOME") }
            }
        }

        result.expect("logout should not need the backend config");
        assert!(!layout.session_file().exists());
    }
}
