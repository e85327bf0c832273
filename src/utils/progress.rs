//! Progress indicators for multi-branch passes.
//!
//! Thin wrapper over `indicatif` that renders a consistent bar style and
//! silently disables itself in automation environments:
//!
//! - `MSYNC_NO_PROGRESS` set to any value
//! - stderr is not a terminal (CI, pipes, redirects)
//!
//! Log lines keep flowing either way; the bar is presentation only.

use std::io::IsTerminal;

/// Progress bar for a known amount of work.
#[derive(Debug, Clone)]
pub struct ProgressBar {
    inner: indicatif::ProgressBar,
}

impl ProgressBar {
    /// Create a bar for `len` units of work.
    ///
    /// Returns a hidden bar when progress display is disabled.
    pub fn new(len: u64) -> Self {
        let inner = if progress_disabled() {
            indicatif::ProgressBar::hidden()
        } else {
            let bar = indicatif::ProgressBar::new(len);
            bar.set_style(
                indicatif::ProgressStyle::with_template(
                    "{msg} [{bar:30.cyan/blue}] {pos}/{len}",
                )
                .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar()),
            );
            bar
        };
        Self {
            inner,
        }
    }

    /// Set the message shown next to the bar.
    pub fn set_message(&self, message: impl Into<String>) {
        self.inner.set_message(message.into());
    }

    /// Advance the bar by `delta` units.
    pub fn inc(&self, delta: u64) {
        self.inner.inc(delta);
    }

    /// Complete the bar and leave a final message.
    pub fn finish_with_message(&self, message: impl Into<String>) {
        self.inner.finish_with_message(message.into());
    }
}

fn progress_disabled() -> bool {
    std::env::var_os("MSYNC_NO_PROGRESS").is_some() || !std::io::stderr().is_terminal()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_bar_still_counts() {
        let bar = ProgressBar::new(3);
        bar.inc(1);
        bar.inc(2);
        bar.finish_with_message("done");
    }
}
