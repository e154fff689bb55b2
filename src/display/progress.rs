//! Progress indicators for model loading and corpus embedding.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a styled progress bar counting embedded labels.
pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Create a spinner for indeterminate progress.
pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Helper to display a temporary spinner during an operation.
///
/// The spinner is skipped entirely when `enabled` is false, e.g. for JSON output.
pub fn with_spinner<F, T>(message: &str, enabled: bool, operation: F) -> T
where
    F: FnOnce() -> T,
{
    if !enabled {
        return operation();
    }
    let spinner = create_spinner(message);
    let result = operation();
    spinner.finish_and_clear();
    result
}

/// Progress reporting for an embedding build, driven by batch callbacks.
///
/// The bar is created on the first update, so a cache hit shows nothing.
pub struct EmbeddingProgress {
    enabled: bool,
    bar: Option<ProgressBar>,
}

impl EmbeddingProgress {
    pub fn new(enabled: bool) -> Self {
        Self { enabled, bar: None }
    }

    /// Record that `done` of `total` labels have been embedded.
    pub fn update(&mut self, done: usize, total: usize) {
        if !self.enabled {
            return;
        }
        let bar = self
            .bar
            .get_or_insert_with(|| create_progress_bar(total as u64, "embedding labels"));
        bar.set_position(done as u64);
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_spinner_runs_operation() {
        let value = with_spinner("working", false, || 42);
        assert_eq!(value, 42);
    }

    #[test]
    fn test_progress_bar_tracks_position() {
        let pb = create_progress_bar(10, "embedding labels");
        pb.set_position(4);
        assert_eq!(pb.position(), 4);
        assert_eq!(pb.length(), Some(10));
        pb.finish_and_clear();

        let mut silent = EmbeddingProgress::new(false);
        silent.update(5, 10);
        assert!(silent.bar.is_none());
        silent.finish();
    }
}
