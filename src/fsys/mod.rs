//! Filesystem capability used by every component that touches disk.
//!
//! All engine I/O goes through the [`FileSystem`] trait so the same code runs
//! against the real OS ([`OsFileSystem`]) in production and against an
//! in-memory tree ([`MemoryFileSystem`]) in tests. The in-memory
//! implementation preserves POSIX symlink semantics: [`FileSystem::metadata`]
//! resolves links, [`FileSystem::symlink_metadata`] does not, and symlinks in
//! intermediate path components are followed.

pub mod memory;
pub mod os;

pub use memory::MemoryFileSystem;
pub use os::OsFileSystem;

use std::io;
use std::path::{Path, PathBuf};

/// Kind of a filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Regular file.
    File,
    /// Directory.
    Dir,
    /// Symbolic link (only reported by lstat-style queries).
    Symlink,
}

/// Metadata subset the engine cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInfo {
    /// Entry kind.
    pub kind: FileKind,
    /// Content length in bytes (0 for directories).
    pub len: u64,
}

impl FileInfo {
    /// Whether this entry is a directory.
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        matches!(self.kind, FileKind::Dir)
    }

    /// Whether this entry is a regular file.
    #[must_use]
    pub const fn is_file(&self) -> bool {
        matches!(self.kind, FileKind::File)
    }

    /// Whether this entry is a symbolic link.
    #[must_use]
    pub const fn is_symlink(&self) -> bool {
        matches!(self.kind, FileKind::Symlink)
    }
}

/// Abstraction over the filesystem operations the engine performs.
///
/// Mirrors the POSIX calls the deployment kernel needs: stat, lstat, read,
/// write, mkdir -p, symlink, readlink, unlink, rm -r, rename, readdir.
/// Implementations must be safe to share across threads.
pub trait FileSystem: Send + Sync + std::fmt::Debug {
    /// Stat `path`, following symlinks.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry does not exist (including broken links)
    /// or cannot be inspected.
    fn metadata(&self, path: &Path) -> io::Result<FileInfo>;

    /// Lstat `path`: like [`Self::metadata`] but without following a symlink
    /// in the final component.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry does not exist or cannot be inspected.
    fn symlink_metadata(&self, path: &Path) -> io::Result<FileInfo>;

    /// Read the full contents of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be read.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Write `data` to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory does not exist or the write
    /// fails.
    fn write(&self, path: &Path, data: &[u8]) -> io::Result<()>;

    /// Create `path` and all missing parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if a non-directory entry occupies any component.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Create a symbolic link at `link` pointing to `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if `link` already exists or cannot be created.
    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()>;

    /// Read the target of the symbolic link at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is not a symlink or cannot be read.
    fn read_link(&self, path: &Path) -> io::Result<PathBuf>;

    /// Remove the file or symlink at `path` (the link itself, never its
    /// target).
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is a directory or removal fails.
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Remove the directory at `path` and everything beneath it. Removes
    /// just the link when `path` is a symlink.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` does not exist or removal fails.
    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Rename `from` to `to`, replacing `to` if it is a file or symlink.
    ///
    /// # Errors
    ///
    /// Returns an error if `from` does not exist or the rename fails.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Return the immediate children of the directory at `path`, sorted by
    /// name for deterministic iteration.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is not a directory or cannot be read.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Whether `path` exists (following symlinks).
    fn exists(&self, path: &Path) -> bool {
        self.metadata(path).is_ok()
    }

    /// Whether `path` exists without following a final symlink, so broken
    /// links still count.
    fn lexists(&self, path: &Path) -> bool {
        self.symlink_metadata(path).is_ok()
    }

    /// Whether `path` is a directory (following symlinks).
    fn is_dir(&self, path: &Path) -> bool {
        self.metadata(path).is_ok_and(|m| m.is_dir())
    }

    /// Whether `path` is a regular file (following symlinks).
    fn is_file(&self, path: &Path) -> bool {
        self.metadata(path).is_ok_and(|m| m.is_file())
    }

    /// Whether `path` itself is a symbolic link.
    fn is_symlink(&self, path: &Path) -> bool {
        self.symlink_metadata(path).is_ok_and(|m| m.is_symlink())
    }

    /// Read the file at `path` as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid UTF-8.
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        String::from_utf8(self.read(path)?)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}
