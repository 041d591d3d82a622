//! Reconstruct command - rebuild a cache from a lockfile

use crate::cache::{ReconstructOptions, Reconstructor};
use crate::cli::args::ReconstructArgs;
use crate::config::Config;
use crate::error::SquishResult;
use crate::fetch::HttpFetcher;
use crate::lockfile::Lockfile;
use crate::ui::{self, FetchProgress, UiContext};
use std::sync::Arc;
use std::time::Duration;

/// Execute the reconstruct command
pub async fn execute(args: ReconstructArgs, config: &Config) -> SquishResult<()> {
    let lockfile = Lockfile::load(&args.lockfile)?;
    let settings = &config.reconstruct;

    let options = ReconstructOptions {
        jobs: args.jobs.unwrap_or(settings.jobs),
        retries: args.retries.unwrap_or(settings.retries),
        backoff: Duration::from_millis(settings.backoff_ms),
    };

    let ctx = UiContext::detect();
    let fetcher = HttpFetcher::new(Duration::from_secs(settings.timeout_secs));
    let report = Reconstructor::new(Arc::new(fetcher))
        .with_options(options)
        .with_progress(FetchProgress::new(&ctx, lockfile.len() as u64))
        .reconstruct(&lockfile, &args.target)
        .await?;

    ui::step_ok_detail(
        &format!(
            "Cache ready: {} fetched, {} already present",
            report.fetched, report.reused
        ),
        &args.target.display().to_string(),
    );
    Ok(())
}
