//! Transient error display.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::view::SummaryView;

/// Default time an error stays on screen.
pub const DEFAULT_ERROR_CLEAR_DELAY: Duration = Duration::from_secs(5);

/// Shows errors that clear themselves.
///
/// Every shown error gets its own timer. Timers are never cancelled: a newer
/// error overwrites the text, and an older timer firing later clears
/// whatever is on display.
#[derive(Clone)]
pub struct ErrorNotice {
    view: Arc<dyn SummaryView>,
    delay: Duration,
}

impl ErrorNotice {
    /// Creates a notice that clears after `delay`.
    pub fn new(view: Arc<dyn SummaryView>, delay: Duration) -> Self {
        Self { view, delay }
    }

    /// Time an error stays on screen.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Shows `message` and schedules its clear.
    ///
    /// Must be called from within a tokio runtime.
    pub fn show(&self, message: &str) -> JoinHandle<()> {
        self.view.show_error(message);

        let deadline = Instant::now() + self.delay;
        let view = Arc::clone(&self.view);
        tokio::spawn(async move {
            sleep_until(deadline).await;
            view.clear_error();
            tracing::trace!("Error display cleared");
        })
    }
}

impl std::fmt::Debug for ErrorNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorNotice")
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}
