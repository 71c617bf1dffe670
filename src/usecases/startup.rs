use std::{
    fs::{File, OpenOptions},
    path::PathBuf,
    time::Duration,
};

use fs2::FileExt;

use crate::{
    domain::user::AuthUser,
    infra::{error::AppError, storage_layout::StorageLayout},
};

/// Outcome of bringing back the session saved by a previous run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionRestore {
    NoSession,
    Restored(AuthUser),
    /// The session was kept although the identity provider could not confirm it.
    Unverified {
        user: AuthUser,
        code: &'static str,
    },
    /// The identity provider refused the session; it has been removed.
    Rejected,
}

pub trait SessionRestorer {
    fn restore_session(&self, probe_timeout: Duration) -> SessionRestore;
}

impl<T: SessionRestorer + ?Sized> SessionRestorer for &T {
    fn restore_session(&self, probe_timeout: Duration) -> SessionRestore {
        (*self).restore_session(probe_timeout)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupFlowState {
    LaunchTui,
    SignIn,
}

/// Exclusive hold on the profile's session; released on drop.
#[derive(Debug)]
pub struct SessionLockGuard {
    file: File,
    path: PathBuf,
}

impl Drop for SessionLockGuard {
    fn drop(&mut self) {
        if let Err(error) = FileExt::unlock(&self.file) {
            tracing::debug!(path = %self.path.display(), error = %error, "session lock release failed");
        }
    }
}

#[derive(Debug)]
pub struct StartupPlan {
    pub layout: StorageLayout,
    pub lock_guard: SessionLockGuard,
    pub state: StartupFlowState,
    pub probe_warning: Option<&'static str>,
}

pub fn plan_startup(
    layout: StorageLayout,
    restorer: &dyn SessionRestorer,
    probe_timeout: Duration,
) -> Result<StartupPlan, AppError> {
    layout.ensure_dirs()?;
    let lock_guard = acquire_session_lock(layout.session_lock_file())?;

    let (state, probe_warning) = match restorer.restore_session(probe_timeout) {
        SessionRestore::Restored(user) => {
            tracing::info!(uid = %user.uid, "restored persisted session");
            (StartupFlowState::LaunchTui, None)
        }
        SessionRestore::Unverified { user, code } => {
            tracing::info!(uid = %user.uid, "restored persisted session without verification");
            (StartupFlowState::LaunchTui, Some(code))
        }
        SessionRestore::NoSession | SessionRestore::Rejected => (StartupFlowState::SignIn, None),
    };

    Ok(StartupPlan {
        layout,
        lock_guard,
        state,
        probe_warning,
    })
}

pub fn acquire_session_lock(path: PathBuf) -> Result<SessionLockGuard, AppError> {
    let file = match OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(&path)
    {
        Ok(file) => file,
        Err(source) => return Err(AppError::SessionLockCreate { path, source }),
    };

    match file.try_lock_exclusive() {
        Ok(()) => Ok(SessionLockGuard { file, path }),
        Err(error) if error.raw_os_error() == fs2::lock_contended_error().raw_os_error() => {
            Err(AppError::SessionStoreBusy { path })
        }
        Err(source) => Err(AppError::SessionLockCreate { path, source }),
    }
}
