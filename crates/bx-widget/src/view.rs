//! Display surface driven by the controller.

use std::io::Write;

use parking_lot::Mutex;

/// What the widget draws on.
///
/// Calls come from the controller and from detached error-clear timers, so
/// implementations must be shareable across tasks.
pub trait SummaryView: Send + Sync {
    /// Enables or disables the connect trigger.
    fn set_connect_enabled(&self, enabled: bool);

    /// Shows the loading indicator.
    fn show_loading(&self);

    /// Hides the loading indicator.
    fn hide_loading(&self);

    /// Shows the rendered total, e.g. `"Total Rewards: 1.2346 ICP"`.
    fn show_total(&self, text: &str);

    /// Shows an error message, replacing any shown one.
    fn show_error(&self, message: &str);

    /// Removes the shown error, if any.
    fn clear_error(&self);
}

/// View that writes to the terminal.
///
/// Totals go to stdout, everything else to stderr.
#[derive(Debug, Default)]
pub struct TerminalView {
    last_total: Mutex<Option<String>>,
    last_error: Mutex<Option<String>>,
}

impl TerminalView {
    /// Creates a terminal view.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The last total shown.
    #[must_use]
    pub fn last_total(&self) -> Option<String> {
        self.last_total.lock().clone()
    }

    /// The error currently on display.
    #[must_use]
    pub fn current_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }
}

impl SummaryView for TerminalView {
    fn set_connect_enabled(&self, enabled: bool) {
        tracing::trace!(enabled, "Connect trigger");
    }

    fn show_loading(&self) {
        eprintln!("Loading holdings...");
    }

    fn hide_loading(&self) {
        tracing::trace!("Loading indicator hidden");
    }

    fn show_total(&self, text: &str) {
        *self.last_total.lock() = Some(text.to_string());
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{text}");
    }

    fn show_error(&self, message: &str) {
        *self.last_error.lock() = Some(message.to_string());
        eprintln!("Error: {message}");
    }

    fn clear_error(&self) {
        *self.last_error.lock() = None;
    }
}
