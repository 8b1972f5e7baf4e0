//! CLI command implementations over the pack execution pipeline.
pub mod adopt;
pub mod fill;
pub mod init;
pub mod off;
pub mod on;
pub mod status;

use anyhow::Result;

use crate::cli::GlobalOpts;
use crate::checksum::ChecksumCache;
use crate::exec::SystemExecutor;
use crate::fsys::OsFileSystem;
use crate::logging::Logger;
use crate::paths::Paths;

/// Process exit code for a clean run.
pub const EXIT_OK: i32 = 0;
/// Process exit code when one or more packs failed.
pub const EXIT_PACK_FAILURES: i32 = 1;

/// Shared per-invocation environment for the OS-backed commands.
#[derive(Debug)]
pub(crate) struct Session {
    pub fs: OsFileSystem,
    pub paths: Paths,
    pub checksums: ChecksumCache,
    pub executor: SystemExecutor,
}

impl Session {
    /// Resolve paths from the CLI options and the process environment.
    pub fn new(global: &GlobalOpts, log: &Logger) -> Result<Self> {
        let paths = Paths::resolve(global.root.as_deref())?;
        if paths.used_fallback() {
            log.warn(&format!(
                "no dotfiles root configured; using current directory {}",
                paths.dotfiles_root().display()
            ));
        }
        Ok(Self {
            fs: OsFileSystem::new(),
            paths,
            checksums: ChecksumCache::new(),
            executor: SystemExecutor,
        })
    }
}
