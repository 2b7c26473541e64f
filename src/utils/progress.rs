//! Progress indicators for folder compilation.
//!
//! A thin wrapper around `indicatif` with one consistent style. Progress is
//! drawn on stderr and is hidden entirely when disabled (`--no-progress`,
//! `ATREF_NO_PROGRESS`, or a non-terminal stderr), so compiled output on
//! stdout is never interleaved with bar redraws.

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle as IndicatifStyle};
use std::io::IsTerminal;

/// A progress bar with consistent styling.
///
/// # Examples
///
/// ```rust
/// use atref_cli::utils::progress::ProgressBar;
///
/// let progress = ProgressBar::new(3, false);
/// for doc in ["a.md", "b.md", "c.md"] {
///     progress.set_message(doc);
///     progress.inc(1);
/// }
/// progress.finish_and_clear();
/// ```
#[derive(Clone)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// Creates a progress bar over `len` units, hidden unless `enabled`
    /// and stderr is a terminal.
    pub fn new(len: u64, enabled: bool) -> Self {
        let bar = if enabled && std::io::stderr().is_terminal() {
            let bar = IndicatifBar::new(len);
            bar.set_style(default_style());
            bar.set_prefix("Compiling");
            bar
        } else {
            IndicatifBar::hidden()
        };
        Self {
            inner: bar,
        }
    }

    /// Sets the message displayed next to the bar.
    pub fn set_message(&self, msg: impl Into<String>) {
        self.inner.set_message(msg.into());
    }

    /// Advances the bar by `delta` units.
    pub fn inc(&self, delta: u64) {
        self.inner.inc(delta);
    }

    /// Removes the bar from the terminal.
    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }

    /// Whether the bar draws anything at all.
    pub fn is_hidden(&self) -> bool {
        self.inner.is_hidden()
    }
}

fn default_style() -> IndicatifStyle {
    IndicatifStyle::default_bar()
        .template("{prefix:.bold} [{bar:40.cyan/blue}] {pos}/{len} {wide_msg}")
        .unwrap_or_else(|_| IndicatifStyle::default_bar())
        .progress_chars("━╸━")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_progress_is_hidden() {
        let progress = ProgressBar::new(10, false);
        assert!(progress.is_hidden());
        progress.set_message("doc.md");
        progress.inc(1);
        progress.finish_and_clear();
    }
}
