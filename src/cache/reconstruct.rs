//! Cache reconstruction from a lockfile
//!
//! Every artifact is streamed into a temporary file next to its
//! destination, hashed on the way in, checked against its pinned hash and
//! renamed into place. A
//! final path therefore either does not exist or holds verified bytes;
//! an interrupted run leaves at most hidden `.squish-*.tmp` files behind.

use crate::cache::path;
use crate::error::{SquishError, SquishResult};
use crate::fetch::{FetchFailure, Fetcher};
use crate::lockfile::{ContentHash, HashingWriter, Lockfile, LockfileEntry};
use crate::ui::FetchProgress;
use futures_util::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Ceiling for the exponential retry delay
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Tuning for a reconstruction run
#[derive(Debug, Clone)]
pub struct ReconstructOptions {
    /// Maximum artifacts in flight
    pub jobs: usize,
    /// Extra attempts after a retryable fetch failure
    pub retries: u32,
    /// Delay before the first retry; doubles each time
    pub backoff: Duration,
}

impl Default for ReconstructOptions {
    fn default() -> Self {
        Self {
            jobs: 8,
            retries: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

/// Outcome counts of a reconstruction run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconstructReport {
    /// Artifacts downloaded and placed
    pub fetched: usize,
    /// Artifacts already present with the pinned hash
    pub reused: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Fetched,
    Reused,
}

/// Rebuilds a cache directory from a lockfile
pub struct Reconstructor {
    fetcher: Arc<dyn Fetcher>,
    options: ReconstructOptions,
    progress: FetchProgress,
}

impl Reconstructor {
    /// Create a reconstructor with default options
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            options: ReconstructOptions::default(),
            progress: FetchProgress::hidden(),
        }
    }

    pub fn with_options(mut self, options: ReconstructOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_progress(mut self, progress: FetchProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Place every lockfile artifact under `target`
    ///
    /// Runs up to `jobs` artifacts concurrently. The first integrity or
    /// exhausted fetch failure aborts the run; artifacts placed before it
    /// stay valid and are reused by the next attempt.
    pub async fn reconstruct(
        &self,
        lockfile: &Lockfile,
        target: &Path,
    ) -> SquishResult<ReconstructReport> {
        tokio::fs::create_dir_all(target)
            .await
            .map_err(|e| SquishError::io(format!("creating {}", target.display()), e))?;

        info!(
            "Reconstructing {} artifacts into {}",
            lockfile.len(),
            target.display()
        );

        let mut placements = stream::iter(lockfile.artifacts.iter())
            .map(|entry| self.place(entry, target))
            .buffer_unordered(self.options.jobs.max(1));

        let mut report = ReconstructReport::default();
        while let Some(result) = placements.next().await {
            let (url, placement) = result?;
            match placement {
                Placement::Fetched => report.fetched += 1,
                Placement::Reused => report.reused += 1,
            }
            self.progress.advance(url);
        }
        self.progress.finish();

        info!(
            "Reconstruction complete: {} fetched, {} reused",
            report.fetched, report.reused
        );
        Ok(report)
    }

    async fn place<'a>(
        &self,
        entry: &'a LockfileEntry,
        target: &Path,
    ) -> SquishResult<(&'a str, Placement)> {
        let dest = target.join(path::encode(&entry.url)?);

        if matches_pinned(&dest, &entry.sha256).await? {
            debug!("Reusing {}", dest.display());
            return Ok((&entry.url, Placement::Reused));
        }

        self.fetch_with_retry(entry, &dest).await?;
        Ok((&entry.url, Placement::Fetched))
    }

    async fn fetch_with_retry(&self, entry: &LockfileEntry, dest: &Path) -> SquishResult<()> {
        let mut delay = self.options.backoff;
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let fetcher = Arc::clone(&self.fetcher);
            let owned = entry.clone();
            let dest = dest.to_path_buf();
            let outcome = tokio::task::spawn_blocking(move || {
                download_verified(fetcher.as_ref(), &owned, &dest)
            })
            .await
            .map_err(|e| SquishError::Internal(format!("download task failed: {}", e)))??;

            match outcome {
                Ok(()) => return Ok(()),
                Err(failure) if failure.retryable && attempts <= self.options.retries => {
                    warn!(
                        "Fetch of {} failed (attempt {}): {}; retrying in {:?}",
                        entry.url, attempts, failure, delay
                    );
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(MAX_BACKOFF);
                }
                Err(failure) => {
                    return Err(SquishError::FetchError {
                        url: entry.url.clone(),
                        attempts,
                        reason: failure.reason,
                    })
                }
            }
        }
    }
}

/// Whether `dest` already holds the pinned artifact
async fn matches_pinned(dest: &Path, expected: &str) -> SquishResult<bool> {
    match tokio::fs::metadata(dest).await {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => {
            return Err(SquishError::io(
                format!("{} exists and is not a file", dest.display()),
                std::io::Error::from(std::io::ErrorKind::AlreadyExists),
            ))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(SquishError::io(format!("inspecting {}", dest.display()), e)),
    }

    let path = dest.to_path_buf();
    let actual = tokio::task::spawn_blocking(move || ContentHash::of_file(&path))
        .await
        .map_err(|e| SquishError::Internal(format!("hash task failed: {}", e)))??
        .to_nix_base32();

    if actual == expected {
        Ok(true)
    } else {
        warn!("Replacing {} (hash {} != {})", dest.display(), actual, expected);
        Ok(false)
    }
}

/// Stream one artifact into a temp file beside `dest`, verify, then rename
///
/// The body is hashed as it is written. A failed fetch comes back as the
/// inner `Err` so the caller can retry; on any failure the temp file is
/// dropped (and deleted) and `dest` is left exactly as it was.
fn download_verified(
    fetcher: &dyn Fetcher,
    entry: &LockfileEntry,
    dest: &Path,
) -> SquishResult<Result<(), FetchFailure>> {
    let parent: PathBuf = dest
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| SquishError::Internal(format!("{} has no parent", dest.display())))?;
    std::fs::create_dir_all(&parent)
        .map_err(|e| SquishError::io(format!("creating {}", parent.display()), e))?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".squish-")
        .suffix(".tmp")
        .tempfile_in(&parent)
        .map_err(|e| SquishError::io(format!("creating temp file in {}", parent.display()), e))?;

    let mut writer = HashingWriter::new(tmp.as_file_mut());
    if let Err(failure) = fetcher.fetch(&entry.url, &mut writer) {
        return Ok(Err(failure));
    }
    let (_, hash) = writer.finish();
    tmp.as_file()
        .sync_all()
        .map_err(|e| SquishError::io(format!("writing {}", tmp.path().display()), e))?;

    let actual = hash.to_nix_base32();
    if actual != entry.sha256 {
        return Err(SquishError::IntegrityError {
            url: entry.url.clone(),
            expected: entry.sha256.clone(),
            actual,
        });
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))
            .map_err(|e| SquishError::io(format!("setting permissions on {}", dest.display()), e))?;
    }

    tmp.persist(dest)
        .map_err(|e| SquishError::io(format!("moving artifact to {}", dest.display()), e.error))?;
    debug!("Placed {}", dest.display());
    Ok(Ok(()))
}
