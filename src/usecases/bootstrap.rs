use std::path::Path;

use crate::{
    firebase::FirebaseAdapter,
    infra::{
        self, clipboard::SystemClipboard, config::AppConfig, config::FileConfigAdapter,
        contracts::ConfigAdapter, error::AppError, opener::SystemOpener,
        storage_layout::StorageLayout,
    },
    ui::CrosstermEventSource,
    usecases::{
        context::AppContext,
        contracts::{AppEventSource, ShellOrchestrator},
        shell::ChatOrchestrator,
    },
};

pub struct ShellComposition<'a> {
    pub event_source: Box<dyn AppEventSource>,
    pub orchestrator: Box<dyn ShellOrchestrator + 'a>,
}

pub fn bootstrap(config_path: Option<&Path>) -> Result<AppContext, AppError> {
    let config = load_config(config_path)?;

    let layout = StorageLayout::resolve()?;
    layout.ensure_dirs()?;
    let log_guard = infra::logging::init(&config.logging, &layout.log_dir)?;

    let backend = FirebaseAdapter::new(&config.firebase, &layout.session_file())?;
    tracing::debug!(backend = ?backend, "backend adapter initialized");

    Ok(AppContext::new(config, layout, backend, log_guard))
}

pub fn compose_shell(context: &AppContext) -> ShellComposition<'_> {
    let orchestrator = ChatOrchestrator::new(
        &context.backend,
        SystemOpener,
        SystemClipboard::default(),
        &context.config.chat,
    );

    ShellComposition {
        event_source: Box::new(CrosstermEventSource),
        orchestrator: Box::new(orchestrator),
    }
}

fn load_config(config_path: Option<&Path>) -> Result<AppConfig, AppError> {
    FileConfigAdapter::new(config_path)
        .load()
        .map_err(AppError::Other)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_file_loads_defaults() {
        let config = load_config(Some(Path::new("./missing-config.toml")))
            .expect("config should load from defaults");

        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn placeholder_config_cannot_build_the_backend() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = load_config(Some(Path::new("./missing-config.toml"))).expect("config");

        let result = FirebaseAdapter::new(&config.firebase, &dir.path().join("session.json"));

        assert!(matches!(result, Err(AppError::ConfigInvalid { .. })));
    }
}
