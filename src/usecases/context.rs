use tracing_appender::non_blocking::WorkerGuard;

use crate::{
    firebase::FirebaseAdapter,
    infra::{config::AppConfig, storage_layout::StorageLayout},
};

#[derive(Debug)]
pub struct AppContext {
    pub config: AppConfig,
    pub layout: StorageLayout,
    pub backend: FirebaseAdapter,
    _log_guard: WorkerGuard,
}

impl AppContext {
    pub fn new(
        config: AppConfig,
        layout: StorageLayout,
        backend: FirebaseAdapter,
        log_guard: WorkerGuard,
    ) -> Self {
        Self {
            config,
            layout,
            backend,
            _log_guard: log_guard,
        }
    }
}
