//! Progress indicators with CI fallback

use super::context::UiContext;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Progress bar for artifact placement during reconstruction
///
/// Hidden when not attached to an interactive terminal, so CI logs only
/// carry `tracing` output.
#[derive(Clone)]
pub struct FetchProgress {
    bar: ProgressBar,
}

impl FetchProgress {
    /// Create a progress bar for `total` artifacts
    pub fn new(ctx: &UiContext, total: u64) -> Self {
        if !ctx.use_fancy_output() {
            return Self::hidden();
        }

        let bar = ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::stderr());
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg:.dim}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
        bar.set_style(style);
        Self { bar }
    }

    /// A progress bar that never draws
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Record one placed artifact
    pub fn advance(&self, url: &str) {
        self.bar.set_message(url.to_string());
        self.bar.inc(1);
    }

    /// Clear the bar from the terminal
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    /// Number of artifacts recorded so far
    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_bar_still_counts() {
        let progress = FetchProgress::new(&UiContext::non_interactive(), 3);
        progress.advance("https://repo/a.jar");
        progress.advance("https://repo/b.jar");
        assert_eq!(progress.position(), 2);
        progress.finish();
    }
}
