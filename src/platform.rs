//! Hand-off to the host OS: opening exported files in the default viewer.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

/// Opens a file with whatever the desktop associates with it.
pub trait Opener {
    fn open(&self, path: &Path) -> Result<()>;
}

/// Uses the platform's default handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemOpener;

impl Opener for SystemOpener {
    fn open(&self, path: &Path) -> Result<()> {
        debug!(path = %path.display(), "opening file");
        open::that(path).with_context(|| format!("failed to open {}", path.display()))
    }
}
