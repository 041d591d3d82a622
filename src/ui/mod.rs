//! Terminal output helpers
//!
//! Plain status lines plus an `indicatif` progress bar that only draws on
//! an interactive stderr.

mod context;
mod output;
mod progress;

pub use context::UiContext;
pub use output::{step_info, step_ok_detail, step_warn_hint};
pub use progress::FetchProgress;
