//! Lockfile model and codec
//!
//! A lockfile is the only persisted output of generation:
//!
//! ```json
//! {
//!   "version": 1,
//!   "artifacts": [
//!     { "url": "https://repo1.maven.org/...", "sha256": "0mdqa9w1..." }
//!   ]
//! }
//! ```
//!
//! Artifacts are unique by URL and sorted byte-wise by URL, so the same
//! dependency closure always serializes to the same bytes.

pub mod hash;

use crate::cache::path;
use crate::error::{SquishError, SquishResult};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::{BTreeMap, Entry};
use std::path::Path;
use tracing::debug;

pub use hash::{ContentHash, HashingWriter};

/// Lockfile format version written by this release
///
/// Version 1 pins hashes to SHA-256 in Nix base-32.
pub const LOCKFILE_VERSION: u32 = 1;

/// Default file name for generated lockfiles
pub const DEFAULT_LOCKFILE_NAME: &str = "deps.lock.json";

/// One pinned artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LockfileEntry {
    /// Canonical fetch location
    pub url: String,
    /// SHA-256 of the artifact, Nix base-32
    pub sha256: String,
}

impl LockfileEntry {
    pub fn new(url: impl Into<String>, sha256: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            sha256: sha256.into(),
        }
    }
}

/// Sorted, deduplicated set of pinned artifacts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lockfile {
    pub version: u32,
    pub artifacts: Vec<LockfileEntry>,
}

/// Only the version is read first, so an unknown format fails before its
/// body is interpreted.
#[derive(Deserialize)]
struct VersionHeader {
    version: Option<u64>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct LockfileV1 {
    #[allow(dead_code)]
    version: u32,
    artifacts: Vec<LockfileEntry>,
}

impl Lockfile {
    /// Build a lockfile from scanned entries
    ///
    /// Duplicate URLs collapse into one entry when their hashes agree. A
    /// URL seen with two different hashes is a non-reproducible remote
    /// artifact and fails with `InconsistentEntry`.
    pub fn from_entries<I>(entries: I) -> SquishResult<Self>
    where
        I: IntoIterator<Item = LockfileEntry>,
    {
        let mut by_url: BTreeMap<String, String> = BTreeMap::new();
        let mut duplicates = 0usize;

        for entry in entries {
            match by_url.entry(entry.url) {
                Entry::Vacant(slot) => {
                    slot.insert(entry.sha256);
                }
                Entry::Occupied(slot) => {
                    if *slot.get() != entry.sha256 {
                        return Err(SquishError::InconsistentEntry {
                            url: slot.key().clone(),
                            first: slot.get().clone(),
                            second: entry.sha256,
                        });
                    }
                    duplicates += 1;
                }
            }
        }

        if duplicates > 0 {
            debug!("Collapsed {} duplicate lockfile entries", duplicates);
        }

        // BTreeMap<String, _> iterates in byte-wise key order
        let artifacts = by_url
            .into_iter()
            .map(|(url, sha256)| LockfileEntry { url, sha256 })
            .collect();

        Ok(Self {
            version: LOCKFILE_VERSION,
            artifacts,
        })
    }

    /// Number of pinned artifacts
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    /// Whether the lockfile pins nothing
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Serialize as pretty JSON with a trailing newline
    pub fn to_json(&self) -> SquishResult<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    /// Parse and validate a serialized lockfile
    pub fn parse(content: &str) -> SquishResult<Self> {
        let header: VersionHeader = serde_json::from_str(content)
            .map_err(|e| SquishError::LockfileInvalid(e.to_string()))?;

        match header.version {
            Some(v) if v == u64::from(LOCKFILE_VERSION) => {}
            Some(found) => {
                return Err(SquishError::UnsupportedLockfileVersion {
                    found,
                    expected: LOCKFILE_VERSION,
                })
            }
            None => return Err(SquishError::LockfileInvalid("missing 'version'".to_string())),
        }

        let body: LockfileV1 = serde_json::from_str(content)
            .map_err(|e| SquishError::LockfileInvalid(e.to_string()))?;

        let lockfile = Self {
            version: LOCKFILE_VERSION,
            artifacts: body.artifacts,
        };
        lockfile.validate()?;
        Ok(lockfile)
    }

    /// Read and parse a lockfile from disk
    pub fn load(path: &Path) -> SquishResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SquishError::io(format!("reading lockfile {}", path.display()), e))?;
        Self::parse(&content)
    }

    /// Check ordering, uniqueness, hash encoding and URL layout
    fn validate(&self) -> SquishResult<()> {
        for pair in self.artifacts.windows(2) {
            if pair[0].url >= pair[1].url {
                return Err(SquishError::LockfileInvalid(format!(
                    "artifacts not strictly sorted by url at {}",
                    pair[1].url
                )));
            }
        }

        for entry in &self.artifacts {
            if !hash::is_valid_encoding(&entry.sha256) {
                return Err(SquishError::LockfileInvalid(format!(
                    "malformed sha256 for {}: {}",
                    entry.url, entry.sha256
                )));
            }
            path::encode(&entry.url)?;
        }

        Ok(())
    }
}
