//! Orchestration of external build tools
//!
//! Everything that spawns sbt, Coursier or pre-build shell commands lives
//! here. Processes run through the [`ProcessRunner`] seam so the driver can
//! be exercised without a JVM.

pub mod driver;
pub mod home;
pub mod process;
pub mod runner;

#[cfg(test)]
pub(crate) mod testing;

pub use driver::RunDriver;
pub use home::BuildHome;
pub use process::TokioProcessRunner;
pub use runner::{Invocation, ProcessOutput, ProcessRunner};

/// Max number of output lines to include in run failure messages.
const BUILD_ERROR_TAIL_LINES: usize = 50;

/// Extract the useful tail of build output for error diagnostics.
///
/// Combines stdout and stderr, then returns the last `BUILD_ERROR_TAIL_LINES`
/// lines so error messages are actionable without being overwhelming.
pub(crate) fn build_error_output(stdout: &str, stderr: &str) -> String {
    let lines: Vec<&str> = stdout.lines().chain(stderr.lines()).collect();
    let total = lines.len();
    let tail: Vec<&str> = if total > BUILD_ERROR_TAIL_LINES {
        lines[total - BUILD_ERROR_TAIL_LINES..].to_vec()
    } else {
        lines
    };
    tail.join("\n")
}
