//! The content-addressed datastore under the XDG data directory.
//!
//! Owns every piece of persistent state: intermediate symlink trees,
//! generated shell-profile and PATH entries, run-once sentinels keyed by
//! content checksum, forced-overwrite backups, and the authoritative
//! "handler has state for pack" query. All writes are atomic (stage to a
//! sibling temp name, then rename) so an interrupted run never leaves a
//! half-written entry.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use serde::Serialize;

use crate::error::HandlerError;
use crate::fsys::FileSystem;
use crate::handlers::HandlerKind;
use crate::paths::Paths;

/// Suffix used for staged writes next to their final location.
const TMP_SUFFIX: &str = ".dodot-tmp";

/// Shell integration script shipped into the data directory. The user's
/// shell rc sources this at login; it wires up everything under
/// `deployed/shell_profile/` and `deployed/path/`.
const INIT_SCRIPT: &str = r#"#!/bin/sh
# dodot shell integration. Source this from your shell rc:
#   . "${XDG_DATA_HOME:-$HOME/.local/share}/dodot/shell/dodot-init.sh"
DODOT_DATA_DIR="${DODOT_DATA_DIR:-${XDG_DATA_HOME:-$HOME/.local/share}/dodot}"

if [ -d "$DODOT_DATA_DIR/deployed/shell_profile" ]; then
    for f in "$DODOT_DATA_DIR/deployed/shell_profile"/*.sh; do
        [ -r "$f" ] && . "$f"
    done
fi

if [ -d "$DODOT_DATA_DIR/deployed/path" ]; then
    for d in "$DODOT_DATA_DIR/deployed/path"/*; do
        [ -d "$d" ] && PATH="$d:$PATH"
    done
    export PATH
fi
"#;

/// Which sentinel family a code-execution handler uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentinelKind {
    /// `install/sentinels/<pack>/`
    Install,
    /// `homebrew/<pack>/`
    Homebrew,
}

impl SentinelKind {
    fn base_dir(self, paths: &Paths) -> PathBuf {
        match self {
            Self::Install => paths.install_sentinel_dir(),
            Self::Homebrew => paths.homebrew_dir(),
        }
    }
}

/// Run record written next to the sentinels after a successful
/// code-execution run. Informational only; the sentinel is authoritative.
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    /// Handler that ran.
    pub handler: String,
    /// Checksum of the source at the moment of execution.
    pub checksum: String,
    /// Exit code of the provisioning command.
    pub exit_code: i32,
    /// RFC 3339 timestamp of the run.
    pub ran_at: String,
}

/// View over the on-disk state for one run.
#[derive(Debug, Clone, Copy)]
pub struct Datastore<'a> {
    fs: &'a dyn FileSystem,
    paths: &'a Paths,
}

impl<'a> Datastore<'a> {
    /// Create a datastore view.
    #[must_use]
    pub const fn new(fs: &'a dyn FileSystem, paths: &'a Paths) -> Self {
        Self { fs, paths }
    }

    // -----------------------------------------------------------------------
    // Intermediate symlink tree
    // -----------------------------------------------------------------------

    /// Location of the intermediate link for one pack file:
    /// `deployed/symlink/<pack>/<handler>/<relpath>`.
    #[must_use]
    pub fn intermediate_link_path(&self, pack: &str, handler: &str, relative: &Path) -> PathBuf {
        self.paths
            .deployed_symlink_dir()
            .join(pack)
            .join(handler)
            .join(relative)
    }

    /// Create (or confirm) the intermediate link pointing at `source`.
    ///
    /// An existing link pointing at the same source is left untouched. A
    /// link pointing elsewhere is an error unless `force` is set, in which
    /// case it is atomically replaced.
    ///
    /// # Errors
    ///
    /// Returns an error on conflicting existing state without `force`, or
    /// on filesystem failure.
    pub fn create_intermediate_link(
        &self,
        pack: &str,
        handler: &str,
        relative: &Path,
        source: &Path,
        force: bool,
    ) -> Result<PathBuf> {
        let link = self.intermediate_link_path(pack, handler, relative);
        if let Some(parent) = link.parent() {
            self.fs
                .create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        if self.fs.lexists(&link) {
            if self.fs.read_link(&link).is_ok_and(|t| t == source) {
                return Ok(link);
            }
            if !force {
                return Err(HandlerError::WrongSource.into());
            }
        }
        self.write_link_atomic(source, &link)
            .with_context(|| format!("linking {}", link.display()))?;
        Ok(link)
    }

    /// The intermediate links currently recorded for `(pack, handler)`, as
    /// `(pack-relative path, link path)` pairs. Nested relative paths (from
    /// mapping-prefix directories) are walked recursively.
    ///
    /// # Errors
    ///
    /// Returns an error if the state directory exists but cannot be read.
    pub fn list_intermediate_links(
        &self,
        pack: &str,
        handler: &str,
    ) -> Result<Vec<(PathBuf, PathBuf)>> {
        let dir = self.paths.deployed_symlink_dir().join(pack).join(handler);
        let mut links = Vec::new();
        if self.fs.is_dir(&dir) {
            self.walk_links(&dir, Path::new(""), &mut links)?;
        }
        Ok(links)
    }

    fn walk_links(
        &self,
        dir: &Path,
        relative: &Path,
        links: &mut Vec<(PathBuf, PathBuf)>,
    ) -> Result<()> {
        for entry in self
            .fs
            .read_dir(dir)
            .with_context(|| format!("reading {}", dir.display()))?
        {
            let Some(name) = entry.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let rel = relative.join(name);
            if self.fs.is_dir(&entry) && !self.fs.is_symlink(&entry) {
                self.walk_links(&entry, &rel, links)?;
            } else {
                links.push((rel, entry));
            }
        }
        Ok(())
    }

    /// Remove the whole intermediate tree for `pack`.
    ///
    /// # Errors
    ///
    /// Returns an error if existing state cannot be removed.
    pub fn clear_symlink_state(&self, pack: &str) -> Result<()> {
        let dir = self.paths.deployed_symlink_dir().join(pack);
        if self.fs.lexists(&dir) {
            self.fs
                .remove_dir_all(&dir)
                .with_context(|| format!("removing {}", dir.display()))?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Shell-profile and PATH entries
    // -----------------------------------------------------------------------

    /// Location of a shell-profile entry: `deployed/shell_profile/<pack>-<name>`.
    #[must_use]
    pub fn shell_profile_entry(&self, pack: &str, basename: &str) -> PathBuf {
        self.paths
            .shell_profile_dir()
            .join(format!("{pack}-{basename}"))
    }

    /// Install (or refresh) a shell-profile entry pointing at `source`.
    ///
    /// # Errors
    ///
    /// Returns an error on filesystem failure.
    pub fn add_shell_profile_entry(&self, pack: &str, source: &Path) -> Result<PathBuf> {
        let basename = file_name(source)?;
        let entry = self.shell_profile_entry(pack, &basename);
        self.install_entry_link(source, &entry)?;
        Ok(entry)
    }

    /// Location of a PATH entry: `deployed/path/<pack>-<dirname>`.
    #[must_use]
    pub fn path_entry(&self, pack: &str, dirname: &str) -> PathBuf {
        self.paths.path_dir().join(format!("{pack}-{dirname}"))
    }

    /// Install (or refresh) a PATH entry pointing at the pack directory
    /// `source`.
    ///
    /// # Errors
    ///
    /// Returns an error on filesystem failure.
    pub fn add_path_entry(&self, pack: &str, source: &Path) -> Result<PathBuf> {
        let dirname = file_name(source)?;
        let entry = self.path_entry(pack, &dirname);
        self.install_entry_link(source, &entry)?;
        Ok(entry)
    }

    /// Remove every `<pack>-` prefixed entry in `dir`, returning the removed
    /// paths.
    fn clear_prefixed_entries(&self, dir: &Path, pack: &str) -> Result<Vec<PathBuf>> {
        if !self.fs.is_dir(dir) {
            return Ok(Vec::new());
        }
        let prefix = format!("{pack}-");
        let mut removed = Vec::new();
        for entry in self
            .fs
            .read_dir(dir)
            .with_context(|| format!("reading {}", dir.display()))?
        {
            let Some(name) = entry.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.starts_with(&prefix) {
                self.fs
                    .remove_file(&entry)
                    .with_context(|| format!("removing {}", entry.display()))?;
                removed.push(entry);
            }
        }
        Ok(removed)
    }

    /// Remove every shell-profile entry belonging to `pack`.
    ///
    /// # Errors
    ///
    /// Returns an error if existing entries cannot be removed.
    pub fn clear_shell_profile(&self, pack: &str) -> Result<Vec<PathBuf>> {
        self.clear_prefixed_entries(&self.paths.shell_profile_dir(), pack)
    }

    /// Remove every PATH entry belonging to `pack`.
    ///
    /// # Errors
    ///
    /// Returns an error if existing entries cannot be removed.
    pub fn clear_path_entries(&self, pack: &str) -> Result<Vec<PathBuf>> {
        self.clear_prefixed_entries(&self.paths.path_dir(), pack)
    }

    // -----------------------------------------------------------------------
    // Run-once sentinels
    // -----------------------------------------------------------------------

    /// Location of the sentinel for `(pack, file, checksum)`.
    #[must_use]
    pub fn sentinel_path(
        &self,
        kind: SentinelKind,
        pack: &str,
        file_name: &str,
        checksum: &str,
    ) -> PathBuf {
        kind.base_dir(self.paths)
            .join(pack)
            .join(format!("{file_name}-{checksum}"))
    }

    /// The checksum recorded for `file_name`, if any sentinel exists.
    #[must_use]
    pub fn sentinel_checksum(
        &self,
        kind: SentinelKind,
        pack: &str,
        file_name: &str,
    ) -> Option<String> {
        let dir = kind.base_dir(self.paths).join(pack);
        let prefix = format!("{file_name}-");
        self.fs.read_dir(&dir).ok().and_then(|entries| {
            entries.iter().find_map(|entry| {
                entry
                    .file_name()
                    .and_then(|n| n.to_str())
                    .and_then(|n| n.strip_prefix(&prefix))
                    .map(ToString::to_string)
            })
        })
    }

    /// Whether a sentinel exists for exactly this checksum.
    #[must_use]
    pub fn has_sentinel(
        &self,
        kind: SentinelKind,
        pack: &str,
        file_name: &str,
        checksum: &str,
    ) -> bool {
        self.fs
            .lexists(&self.sentinel_path(kind, pack, file_name, checksum))
    }

    /// Record that a code-execution handler ran for this content.
    ///
    /// Stale sentinels for the same file (older checksums) are removed so
    /// the directory carries at most one sentinel per source file.
    ///
    /// # Errors
    ///
    /// Returns an error on filesystem failure.
    pub fn write_sentinel(
        &self,
        kind: SentinelKind,
        pack: &str,
        file_name: &str,
        checksum: &str,
    ) -> Result<()> {
        let dir = kind.base_dir(self.paths).join(pack);
        self.fs
            .create_dir_all(&dir)
            .with_context(|| format!("creating {}", dir.display()))?;

        let prefix = format!("{file_name}-");
        for entry in self.fs.read_dir(&dir).unwrap_or_default() {
            let stale = entry
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(&prefix));
            if stale {
                self.fs
                    .remove_file(&entry)
                    .with_context(|| format!("removing stale sentinel {}", entry.display()))?;
            }
        }

        let sentinel = self.sentinel_path(kind, pack, file_name, checksum);
        let tmp = sibling_tmp(&sentinel)?;
        self.fs
            .write(&tmp, b"")
            .with_context(|| format!("writing {}", tmp.display()))?;
        self.fs
            .rename(&tmp, &sentinel)
            .with_context(|| format!("renaming into {}", sentinel.display()))?;
        Ok(())
    }

    /// Remove the whole sentinel directory for `pack`.
    ///
    /// # Errors
    ///
    /// Returns an error if existing sentinels cannot be removed.
    pub fn clear_sentinels(&self, kind: SentinelKind, pack: &str) -> Result<()> {
        let dir = kind.base_dir(self.paths).join(pack);
        if self.fs.lexists(&dir) {
            self.fs
                .remove_dir_all(&dir)
                .with_context(|| format!("removing {}", dir.display()))?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // State queries
    // -----------------------------------------------------------------------

    /// The authoritative "handler has state for pack" query.
    #[must_use]
    pub fn has_handler_state(&self, pack: &str, kind: HandlerKind) -> bool {
        match kind {
            HandlerKind::Symlink => {
                self.dir_non_empty(&self.paths.deployed_symlink_dir().join(pack))
            }
            HandlerKind::Install => {
                self.dir_non_empty(&self.paths.install_sentinel_dir().join(pack))
            }
            HandlerKind::Homebrew => self.dir_non_empty(&self.paths.homebrew_dir().join(pack)),
            HandlerKind::Shell => self.has_prefixed_entry(&self.paths.shell_profile_dir(), pack),
            HandlerKind::Path => self.has_prefixed_entry(&self.paths.path_dir(), pack),
        }
    }

    fn dir_non_empty(&self, dir: &Path) -> bool {
        self.fs.read_dir(dir).is_ok_and(|entries| !entries.is_empty())
    }

    fn has_prefixed_entry(&self, dir: &Path, pack: &str) -> bool {
        let prefix = format!("{pack}-");
        self.fs.read_dir(dir).is_ok_and(|entries| {
            entries.iter().any(|entry| {
                entry
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(&prefix))
            })
        })
    }

    // -----------------------------------------------------------------------
    // Backups, run records, shell integration
    // -----------------------------------------------------------------------

    /// Move a conflicting user file into `backups/<pack>/`, appending a
    /// numeric suffix on collision. Returns the backup location.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be moved.
    pub fn backup(&self, pack: &str, target: &Path) -> Result<PathBuf> {
        let dir = self.paths.backups_dir().join(pack);
        self.fs
            .create_dir_all(&dir)
            .with_context(|| format!("creating {}", dir.display()))?;
        let name = file_name(target)?;
        let mut dest = dir.join(&name);
        let mut n = 0;
        while self.fs.lexists(&dest) {
            n += 1;
            dest = dir.join(format!("{name}.{n}"));
        }
        if self.fs.rename(target, &dest).is_err() {
            // Rename can cross a filesystem boundary (home and data dir on
            // different mounts); fall back to copy + delete.
            copy_recursive(self.fs, target, &dest)
                .with_context(|| format!("backing up {}", target.display()))?;
            if self.fs.is_dir(target) && !self.fs.is_symlink(target) {
                self.fs.remove_dir_all(target)
            } else {
                self.fs.remove_file(target)
            }
            .with_context(|| format!("removing {}", target.display()))?;
        }
        Ok(dest)
    }

    /// Write the informational run record for `(pack, handler)`.
    ///
    /// # Errors
    ///
    /// Returns an error on filesystem failure or serialization failure.
    pub fn write_run_record(&self, pack: &str, record: &RunRecord) -> Result<()> {
        let path = self.paths.handler_state_file(pack, &record.handler);
        if let Some(parent) = path.parent() {
            self.fs
                .create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let json = serde_json::to_vec_pretty(record).context("serializing run record")?;
        let tmp = sibling_tmp(&path)?;
        self.fs
            .write(&tmp, &json)
            .with_context(|| format!("writing {}", tmp.display()))?;
        self.fs
            .rename(&tmp, &path)
            .with_context(|| format!("renaming into {}", path.display()))?;
        Ok(())
    }

    /// Remove the run record for `(pack, handler)`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing record cannot be removed.
    pub fn clear_run_record(&self, pack: &str, handler: &str) -> Result<()> {
        let path = self.paths.handler_state_file(pack, handler);
        if self.fs.lexists(&path) {
            self.fs
                .remove_file(&path)
                .with_context(|| format!("removing {}", path.display()))?;
        }
        Ok(())
    }

    /// Ensure the shell integration script is present, writing the shipped
    /// template on first use.
    ///
    /// # Errors
    ///
    /// Returns an error on filesystem failure.
    pub fn ensure_init_script(&self) -> Result<PathBuf> {
        let path = self.paths.init_script_path();
        if !self.fs.exists(&path) {
            if let Some(parent) = path.parent() {
                self.fs
                    .create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            self.fs
                .write(&path, INIT_SCRIPT.as_bytes())
                .with_context(|| format!("writing {}", path.display()))?;
        }
        Ok(path)
    }

    /// Atomically install a symlink entry, replacing whatever is there.
    fn install_entry_link(&self, source: &Path, entry: &Path) -> Result<()> {
        if let Some(parent) = entry.parent() {
            self.fs
                .create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        if self.fs.lexists(entry) && self.fs.read_link(entry).is_ok_and(|t| t == source) {
            return Ok(());
        }
        self.write_link_atomic(source, entry)
            .with_context(|| format!("linking {}", entry.display()))
    }

    /// Stage a symlink at a sibling temp name and rename it into place.
    fn write_link_atomic(&self, target: &Path, link: &Path) -> io::Result<()> {
        let tmp = sibling_tmp(link).map_err(|_| io::Error::from(io::ErrorKind::InvalidInput))?;
        if self.fs.lexists(&tmp) {
            self.fs.remove_file(&tmp)?;
        }
        self.fs.symlink(target, &tmp)?;
        self.fs.rename(&tmp, link)
    }
}

/// Recursively copy a file or directory tree through the filesystem
/// capability. Symlinks within the source are followed, so their content is
/// materialized rather than the link itself.
pub(crate) fn copy_recursive(fs: &dyn FileSystem, src: &Path, dst: &Path) -> Result<()> {
    if fs.is_dir(src) {
        fs.create_dir_all(dst)
            .with_context(|| format!("creating directory {}", dst.display()))?;
        for entry in fs
            .read_dir(src)
            .with_context(|| format!("reading directory {}", src.display()))?
        {
            let name = file_name(&entry)?;
            copy_recursive(fs, &entry, &dst.join(name))?;
        }
        Ok(())
    } else {
        let data = fs
            .read(src)
            .with_context(|| format!("reading {}", src.display()))?;
        fs.write(dst, &data)
            .with_context(|| format!("writing {}", dst.display()))
    }
}

/// UTF-8 file name of a path, as an owned string.
fn file_name(path: &Path) -> Result<String> {
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => Ok(name.to_string()),
        None => bail!("{} has no usable file name", path.display()),
    }
}

/// Sibling temp path for staged writes.
fn sibling_tmp(path: &Path) -> Result<PathBuf> {
    let name = file_name(path)?;
    let parent = path.parent().unwrap_or_else(|| Path::new("/"));
    Ok(parent.join(format!("{name}{TMP_SUFFIX}")))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::fsys::MemoryFileSystem;
    use crate::paths::Env;

    fn paths() -> Paths {
        Paths::resolve_with(
            Some(Path::new("/dotfiles")),
            &Env::empty().with_var("HOME", "/home/user"),
            Path::new("/cwd"),
            None,
        )
        .expect("resolve paths")
    }

    fn setup() -> (MemoryFileSystem, Paths) {
        let fs = MemoryFileSystem::new();
        fs.create_dir_all(Path::new("/dotfiles/vim")).unwrap();
        fs.write(Path::new("/dotfiles/vim/vimrc"), b"set number")
            .unwrap();
        (fs, paths())
    }

    #[test]
    fn intermediate_link_is_created_and_idempotent() {
        let (fs, paths) = setup();
        let store = Datastore::new(&fs, &paths);
        let source = Path::new("/dotfiles/vim/vimrc");

        let link = store
            .create_intermediate_link("vim", "symlink", Path::new("vimrc"), source, false)
            .unwrap();
        assert_eq!(fs.read_link(&link).unwrap(), source);

        // Second call with the same source is a no-op.
        let again = store
            .create_intermediate_link("vim", "symlink", Path::new("vimrc"), source, false)
            .unwrap();
        assert_eq!(link, again);
    }

    #[test]
    fn conflicting_intermediate_link_requires_force() {
        let (fs, paths) = setup();
        let store = Datastore::new(&fs, &paths);
        fs.write(Path::new("/dotfiles/vim/other"), b"").unwrap();

        store
            .create_intermediate_link(
                "vim",
                "symlink",
                Path::new("vimrc"),
                Path::new("/dotfiles/vim/other"),
                false,
            )
            .unwrap();

        let err = store
            .create_intermediate_link(
                "vim",
                "symlink",
                Path::new("vimrc"),
                Path::new("/dotfiles/vim/vimrc"),
                false,
            )
            .unwrap_err();
        assert!(err.to_string().contains("wrong source"));

        let link = store
            .create_intermediate_link(
                "vim",
                "symlink",
                Path::new("vimrc"),
                Path::new("/dotfiles/vim/vimrc"),
                true,
            )
            .unwrap();
        assert_eq!(
            fs.read_link(&link).unwrap(),
            Path::new("/dotfiles/vim/vimrc")
        );
    }

    #[test]
    fn shell_profile_entries_are_prefixed_and_cleared() {
        let (fs, paths) = setup();
        let store = Datastore::new(&fs, &paths);
        fs.write(Path::new("/dotfiles/vim/aliases.sh"), b"alias v=vim")
            .unwrap();

        let entry = store
            .add_shell_profile_entry("vim", Path::new("/dotfiles/vim/aliases.sh"))
            .unwrap();
        assert!(entry.ends_with("vim-aliases.sh"));
        assert!(store.has_handler_state("vim", HandlerKind::Shell));
        assert!(!store.has_handler_state("tmux", HandlerKind::Shell));

        let removed = store.clear_shell_profile("vim").unwrap();
        assert_eq!(removed, vec![entry]);
        assert!(!store.has_handler_state("vim", HandlerKind::Shell));

        // Clearing again is a no-op.
        assert!(store.clear_shell_profile("vim").unwrap().is_empty());
    }

    #[test]
    fn path_entries_link_pack_directories() {
        let (fs, paths) = setup();
        let store = Datastore::new(&fs, &paths);
        fs.create_dir_all(Path::new("/dotfiles/vim/bin")).unwrap();

        let entry = store
            .add_path_entry("vim", Path::new("/dotfiles/vim/bin"))
            .unwrap();
        assert!(entry.ends_with("vim-bin"));
        assert_eq!(
            fs.read_link(&entry).unwrap(),
            Path::new("/dotfiles/vim/bin")
        );
        assert!(store.has_handler_state("vim", HandlerKind::Path));
    }

    #[test]
    fn sentinel_lifecycle() {
        let (fs, paths) = setup();
        let store = Datastore::new(&fs, &paths);

        assert_eq!(
            store.sentinel_checksum(SentinelKind::Install, "app", "install.sh"),
            None
        );

        store
            .write_sentinel(SentinelKind::Install, "app", "install.sh", "aaaa")
            .unwrap();
        assert!(store.has_sentinel(SentinelKind::Install, "app", "install.sh", "aaaa"));
        assert_eq!(
            store
                .sentinel_checksum(SentinelKind::Install, "app", "install.sh")
                .as_deref(),
            Some("aaaa")
        );
        assert!(store.has_handler_state("app", HandlerKind::Install));

        // A new checksum replaces the stale sentinel.
        store
            .write_sentinel(SentinelKind::Install, "app", "install.sh", "bbbb")
            .unwrap();
        assert!(!store.has_sentinel(SentinelKind::Install, "app", "install.sh", "aaaa"));
        assert!(store.has_sentinel(SentinelKind::Install, "app", "install.sh", "bbbb"));

        store.clear_sentinels(SentinelKind::Install, "app").unwrap();
        assert!(!store.has_handler_state("app", HandlerKind::Install));
        // Idempotent.
        store.clear_sentinels(SentinelKind::Install, "app").unwrap();
    }

    #[test]
    fn homebrew_sentinels_are_separate_from_install() {
        let (fs, paths) = setup();
        let store = Datastore::new(&fs, &paths);

        store
            .write_sentinel(SentinelKind::Homebrew, "app", "Brewfile", "cccc")
            .unwrap();
        assert!(store.has_handler_state("app", HandlerKind::Homebrew));
        assert!(!store.has_handler_state("app", HandlerKind::Install));
        assert!(
            store
                .sentinel_path(SentinelKind::Homebrew, "app", "Brewfile", "cccc")
                .starts_with(paths.homebrew_dir())
        );
    }

    #[test]
    fn backup_moves_conflicts_and_numbers_collisions() {
        let (fs, paths) = setup();
        let store = Datastore::new(&fs, &paths);
        fs.create_dir_all(Path::new("/home/user")).unwrap();

        fs.write(Path::new("/home/user/.vimrc"), b"one").unwrap();
        let first = store.backup("vim", Path::new("/home/user/.vimrc")).unwrap();
        assert!(!fs.lexists(Path::new("/home/user/.vimrc")));
        assert_eq!(fs.read(&first).unwrap(), b"one");

        fs.write(Path::new("/home/user/.vimrc"), b"two").unwrap();
        let second = store.backup("vim", Path::new("/home/user/.vimrc")).unwrap();
        assert_ne!(first, second);
        assert_eq!(fs.read(&second).unwrap(), b"two");
        assert_eq!(fs.read(&first).unwrap(), b"one");
    }

    #[test]
    fn symlink_state_query_tracks_intermediate_tree() {
        let (fs, paths) = setup();
        let store = Datastore::new(&fs, &paths);
        assert!(!store.has_handler_state("vim", HandlerKind::Symlink));

        store
            .create_intermediate_link(
                "vim",
                "symlink",
                Path::new("vimrc"),
                Path::new("/dotfiles/vim/vimrc"),
                false,
            )
            .unwrap();
        assert!(store.has_handler_state("vim", HandlerKind::Symlink));

        store.clear_symlink_state("vim").unwrap();
        assert!(!store.has_handler_state("vim", HandlerKind::Symlink));
    }

    #[test]
    fn run_record_is_written_as_json() {
        let (fs, paths) = setup();
        let store = Datastore::new(&fs, &paths);
        store
            .write_run_record(
                "app",
                &RunRecord {
                    handler: "install".to_string(),
                    checksum: "abcd".to_string(),
                    exit_code: 0,
                    ran_at: "2026-01-01T00:00:00Z".to_string(),
                },
            )
            .unwrap();

        let path = paths.handler_state_file("app", "install");
        let json: serde_json::Value =
            serde_json::from_slice(&fs.read(&path).unwrap()).unwrap();
        assert_eq!(json["checksum"], "abcd");
        assert_eq!(json["exit_code"], 0);
    }

    #[test]
    fn init_script_is_written_once() {
        let (fs, paths) = setup();
        let store = Datastore::new(&fs, &paths);
        let path = store.ensure_init_script().unwrap();
        let content = fs.read_to_string(&path).unwrap();
        assert!(content.contains("shell_profile"));

        // A second call leaves the file alone.
        fs.write(&path, b"user edited").unwrap();
        store.ensure_init_script().unwrap();
        assert_eq!(fs.read(&path).unwrap(), b"user edited");
    }
}
