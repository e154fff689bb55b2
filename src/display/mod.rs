//! Rich terminal display utilities for CLI output.
//!
//! Provides styled tables, progress bars, and themed status lines.

pub mod progress;
pub mod tables;
pub mod theme;

pub use progress::{EmbeddingProgress, create_progress_bar, create_spinner, with_spinner};
pub use tables::{create_domains_table, create_results_table, create_summary_table};
pub use theme::{THEME, Theme};
