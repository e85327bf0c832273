//! Cross-cutting utilities.

pub mod progress;

pub use progress::ProgressBar;
