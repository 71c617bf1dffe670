use crate::{
    infra::{error::AppError, session_store::SessionStore, storage_layout::StorageLayout},
    usecases::startup::acquire_session_lock,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoutOutcome {
    pub session_removed: bool,
}

/// Forgets the persisted session without contacting the backend.
///
/// Refuses to run while another instance holds the session lock.
pub fn logout_and_reset(layout: &StorageLayout) -> Result<LogoutOutcome, AppError> {
    layout.ensure_dirs()?;
    let _lock = acquire_session_lock(layout.session_lock_file())?;

    let session_removed = SessionStore::new(layout.session_file()).clear()?;

    Ok(LogoutOutcome { session_removed })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn logout_removes_persisted_session() {
        let dir = tempfile::tempdir().expect("temp dir");
        let layout = StorageLayout::under(dir.path().join("friendlychat"));
        layout.ensure_dirs().expect("dirs should be created");
        fs::write(layout.session_file(), b"{}").expect("session should be written");

        let outcome = logout_and_reset(&layout).expect("logout should succeed");

        assert!(outcome.session_removed);
        assert!(!layout.session_file().exists());
    }

    #[test]
    fn logout_is_idempotent_when_no_session_exists() {
        let dir = tempfile::tempdir().expect("temp dir");
        let layout = StorageLayout::under(dir.path().join("friendlychat"));

        let first = logout_and_reset(&layout).expect("logout should succeed");
        let second = logout_and_reset(&layout).expect("logout should succeed again");

        assert!(!first.session_removed);
        assert!(!second.session_removed);
    }

    #[test]
    fn logout_is_refused_while_an_instance_runs() {
        let dir = tempfile::tempdir().expect("temp dir");
        let layout = StorageLayout::under(dir.path().join("friendlychat"));
        layout.ensure_dirs().expect("dirs should be created");
        let _running = acquire_session_lock(layout.session_lock_file()).expect("lock");

        assert!(matches!(
            logout_and_reset(&layout),
            Err(AppError::SessionStoreBusy { .. })
        ));
    }
}
