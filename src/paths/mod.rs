//! Path resolution for the dotfiles root, XDG directories, and every
//! derived datastore location.
//!
//! [`Paths`] is a plain value computed once per run. It captures the
//! environment at construction time so that the rest of the engine never
//! consults `std::env`, which keeps path logic deterministic under test.

pub mod mapping;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};

/// Environment variables consulted during path resolution.
const ENV_KEYS: &[&str] = &[
    "DOTFILES_ROOT",
    "DODOT_DATA_DIR",
    "DODOT_CONFIG_DIR",
    "DODOT_CACHE_DIR",
    "HOME",
    "USERPROFILE",
    "XDG_CONFIG_HOME",
    "XDG_DATA_HOME",
    "XDG_STATE_HOME",
    "XDG_CACHE_HOME",
];

/// A captured snapshot of the environment variables path resolution reads.
#[derive(Debug, Default, Clone)]
pub struct Env {
    vars: HashMap<String, String>,
}

impl Env {
    /// Capture the relevant variables from the process environment.
    #[must_use]
    pub fn from_process() -> Self {
        let vars = ENV_KEYS
            .iter()
            .filter_map(|k| std::env::var(k).ok().map(|v| ((*k).to_string(), v)))
            .collect();
        Self { vars }
    }

    /// Build an empty snapshot (no variables set).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Return a copy with `key` set to `value`.
    #[must_use]
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_string(), value.to_string());
        self
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }
}

/// Resolved locations for a single run.
///
/// Everything the engine writes lands under [`Paths::data_dir`]; the only
/// exception is the final user-visible symlink a handler installs at its
/// mapped target.
#[derive(Debug, Clone)]
pub struct Paths {
    dotfiles_root: PathBuf,
    used_fallback: bool,
    home: PathBuf,
    xdg_config_home: PathBuf,
    data_dir: PathBuf,
    config_dir: PathBuf,
    cache_dir: PathBuf,
    state_dir: PathBuf,
}

impl Paths {
    /// Resolve all paths from the process environment.
    ///
    /// The dotfiles root falls back from `explicit_root` to the
    /// `DOTFILES_ROOT` variable, then the enclosing git repository work
    /// tree, then the current directory (recorded via
    /// [`Paths::used_fallback`] so the CLI can surface it).
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined or the
    /// current directory is unreadable.
    pub fn resolve(explicit_root: Option<&Path>) -> Result<Self> {
        let env = Env::from_process();
        let cwd = std::env::current_dir().context("cannot determine current directory")?;
        let git_root = git_repo_root(&cwd);
        Self::resolve_with(explicit_root, &env, &cwd, git_root.as_deref())
    }

    /// Resolve all paths from an explicit environment snapshot.
    ///
    /// `git_root` is the pre-discovered enclosing repository work tree, if
    /// any; tests pass `None` or a fixed path instead of touching a real
    /// repository.
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory is present in `env`.
    pub fn resolve_with(
        explicit_root: Option<&Path>,
        env: &Env,
        cwd: &Path,
        git_root: Option<&Path>,
    ) -> Result<Self> {
        let home = match env.get("HOME").or_else(|| env.get("USERPROFILE")) {
            Some(h) => PathBuf::from(h),
            None => bail!("cannot determine home directory (HOME is unset)"),
        };

        let mut used_fallback = false;
        let dotfiles_root = if let Some(root) = explicit_root {
            expand_tilde(root, &home)
        } else if let Some(root) = env.get("DOTFILES_ROOT") {
            expand_tilde(Path::new(root), &home)
        } else if let Some(root) = git_root {
            root.to_path_buf()
        } else {
            used_fallback = true;
            cwd.to_path_buf()
        };

        let xdg_config_home = env_dir(env, "XDG_CONFIG_HOME", &home, ".config");
        let xdg_data_home = env_dir(env, "XDG_DATA_HOME", &home, ".local/share");
        let xdg_state_home = env_dir(env, "XDG_STATE_HOME", &home, ".local/state");
        let xdg_cache_home = env_dir(env, "XDG_CACHE_HOME", &home, ".cache");

        let data_dir = override_dir(env, "DODOT_DATA_DIR", &home)
            .unwrap_or_else(|| xdg_data_home.join("dodot"));
        let config_dir = override_dir(env, "DODOT_CONFIG_DIR", &home)
            .unwrap_or_else(|| xdg_config_home.join("dodot"));
        let cache_dir = override_dir(env, "DODOT_CACHE_DIR", &home)
            .unwrap_or_else(|| xdg_cache_home.join("dodot"));
        let state_dir = xdg_state_home.join("dodot");

        Ok(Self {
            dotfiles_root,
            used_fallback,
            home,
            xdg_config_home,
            data_dir,
            config_dir,
            cache_dir,
            state_dir,
        })
    }

    /// The directory whose immediate children are packs.
    #[must_use]
    pub fn dotfiles_root(&self) -> &Path {
        &self.dotfiles_root
    }

    /// Whether the root fell back to the current directory.
    #[must_use]
    pub const fn used_fallback(&self) -> bool {
        self.used_fallback
    }

    /// The user's home directory.
    #[must_use]
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// `$XDG_CONFIG_HOME` (defaulted to `~/.config`).
    #[must_use]
    pub fn xdg_config_home(&self) -> &Path {
        &self.xdg_config_home
    }

    /// Root of all persistent dodot state.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Configuration directory (`dodot.toml` overrides live here too).
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Cache directory.
    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// State directory (log files, run records).
    #[must_use]
    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    /// Root config file at the top of the dotfiles tree.
    #[must_use]
    pub fn root_config_file(&self) -> PathBuf {
        self.dotfiles_root.join("dodot.toml")
    }

    /// Directory of intermediate symlink trees:
    /// `deployed/symlink/<pack>/<handler>/<relpath>`.
    #[must_use]
    pub fn deployed_symlink_dir(&self) -> PathBuf {
        self.data_dir.join("deployed").join("symlink")
    }

    /// Directory of shell-profile entries sourced at login.
    #[must_use]
    pub fn shell_profile_dir(&self) -> PathBuf {
        self.data_dir.join("deployed").join("shell_profile")
    }

    /// Directory of PATH entries prepended at login.
    #[must_use]
    pub fn path_dir(&self) -> PathBuf {
        self.data_dir.join("deployed").join("path")
    }

    /// Reserved directory for sourced-at-startup snippets.
    #[must_use]
    pub fn shell_source_dir(&self) -> PathBuf {
        self.data_dir.join("deployed").join("shell_source")
    }

    /// Run-once sentinels for the install handler.
    #[must_use]
    pub fn install_sentinel_dir(&self) -> PathBuf {
        self.data_dir.join("install").join("sentinels")
    }

    /// Run-once sentinels for the homebrew handler.
    #[must_use]
    pub fn homebrew_dir(&self) -> PathBuf {
        self.data_dir.join("homebrew")
    }

    /// Where files displaced by `--force` are moved.
    #[must_use]
    pub fn backups_dir(&self) -> PathBuf {
        self.data_dir.join("backups")
    }

    /// The shipped shell integration script.
    #[must_use]
    pub fn init_script_path(&self) -> PathBuf {
        self.data_dir.join("shell").join("dodot-init.sh")
    }

    /// Optional per-handler run record.
    #[must_use]
    pub fn handler_state_file(&self, pack: &str, handler: &str) -> PathBuf {
        self.data_dir
            .join("state")
            .join(pack)
            .join(format!("{handler}.json"))
    }

    /// The persistent log file.
    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.state_dir.join("dodot.log")
    }

    /// Absolute path of the named pack directory.
    #[must_use]
    pub fn pack_path(&self, name: &str) -> PathBuf {
        self.dotfiles_root.join(name)
    }
}

/// Resolve an XDG base variable, expanding tildes, with a home-relative
/// default.
fn env_dir(env: &Env, key: &str, home: &Path, default: &str) -> PathBuf {
    env.get(key).map_or_else(
        || home.join(default),
        |v| expand_tilde(Path::new(v), home),
    )
}

/// Resolve a `DODOT_*_DIR` override, expanding tildes.
fn override_dir(env: &Env, key: &str, home: &Path) -> Option<PathBuf> {
    env.get(key).map(|v| expand_tilde(Path::new(v), home))
}

/// Expand a leading `~` or `~/` against the home directory.
fn expand_tilde(path: &Path, home: &Path) -> PathBuf {
    if path == Path::new("~") {
        return home.to_path_buf();
    }
    path.strip_prefix("~")
        .map_or_else(|_| path.to_path_buf(), |rest| home.join(rest))
}

/// Work tree of the git repository enclosing `start`, if any.
fn git_repo_root(start: &Path) -> Option<PathBuf> {
    git2::Repository::discover(start)
        .ok()
        .and_then(|repo| repo.workdir().map(Path::to_path_buf))
}
