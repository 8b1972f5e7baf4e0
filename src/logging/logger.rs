//! Thin structured logger over [`tracing`] with dry-run awareness.

/// Structured logger for command output.
///
/// All messages are routed through [`tracing`], so they reach both the
/// console formatter and the persistent log file at
/// `$XDG_STATE_HOME/dodot/dodot.log` (see
/// [`init_subscriber`](super::init_subscriber)). Stage and dry-run messages
/// use dedicated targets so the formatters can style them.
#[derive(Debug, Default, Clone, Copy)]
pub struct Logger;

impl Logger {
    /// Create a new logger.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: "dodot::stage", "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message (suppressed on console unless verbose; always
    /// written to the log file).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a dry-run action message.
    pub fn dry_run(&self, msg: &str) {
        tracing::info!(target: "dodot::dry_run", "{msg}");
    }
}
