//! Progress bar fed by the download queue

use crate::core::progress::ProgressUpdate;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

const TEMPLATE: &str = "{spinner:.green} [{bar:30.cyan/blue}] {msg}";

/// Terminal rendering of [`ProgressUpdate`]s
///
/// Status updates replace the bar message. Warnings are printed above the bar
/// and kept in a log.
pub struct ProgressDisplay {
    bar: ProgressBar,
    log: Mutex<Vec<String>>,
}

impl ProgressDisplay {
    pub fn new() -> Self {
        Self::with_bar(ProgressBar::new(100))
    }

    /// A display that draws nowhere
    #[allow(dead_code)]
    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::hidden())
    }

    fn with_bar(bar: ProgressBar) -> Self {
        bar.set_length(100);
        if let Ok(style) = ProgressStyle::default_bar().template(TEMPLATE) {
            bar.set_style(style.progress_chars("=> "));
        }
        bar.enable_steady_tick(Duration::from_millis(100));
        Self {
            bar,
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn apply(&self, update: &ProgressUpdate) {
        if update.is_warning() {
            self.bar.println(&update.message);
            if let Ok(mut log) = self.log.lock() {
                log.push(update.message.clone());
            }
            return;
        }

        if let Some(percent) = update.percent {
            self.bar.set_position(percent.round().clamp(0.0, 100.0) as u64);
        }
        self.bar.set_message(update.message.clone());
    }

    /// Consume updates until the worker drops its sender
    pub async fn drain(&self, receiver: &mut UnboundedReceiver<ProgressUpdate>) {
        while let Some(update) = receiver.recv().await {
            tracing::trace!(message = %update.message, "progress");
            self.apply(&update);
        }
    }

    #[allow(dead_code)]
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    #[allow(dead_code)]
    pub fn message(&self) -> String {
        self.bar.message()
    }

    /// Warnings printed so far, oldest first
    #[allow(dead_code)]
    pub fn warnings(&self) -> Vec<String> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    pub fn finish(&self, message: impl Into<String>) {
        self.bar.finish_with_message(message.into());
    }

    pub fn abandon(&self, message: impl Into<String>) {
        self.bar.abandon_with_message(message.into());
    }
}
