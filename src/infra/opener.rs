use anyhow::{Context, Result};

use crate::infra::contracts::ExternalOpener;

/// Opens URLs with the desktop's default application.
#[derive(Debug, Clone, Default)]
pub struct SystemOpener;

impl ExternalOpener for SystemOpener {
    fn open(&self, target: &str) -> Result<()> {
        open::that_detached(target).with_context(|| "failed to launch the default URL handler")
    }
}
