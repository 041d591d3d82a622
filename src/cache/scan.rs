//! Cache scanning
//!
//! Walks a Coursier cache populated by sbt and pairs every real artifact
//! with the URL it was downloaded from. The URL is rebuilt from the path
//! components below a known scheme root while walking, never by searching
//! an absolute path for a scheme-like segment.

use crate::cache::path;
use crate::error::{SquishError, SquishResult};
use crate::lockfile::{ContentHash, LockfileEntry};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// URL schemes Coursier stores as top-level cache directories
pub const SCHEMES: &[&str] = &["https", "http"];

/// Prefixes under the cache root where scheme directories may live
///
/// Newer Coursier releases nest everything under `cache/`.
const LAYOUT_PREFIXES: &[&str] = &["cache", ""];

/// File suffixes Coursier uses for its own bookkeeping
const INTERNAL_SUFFIXES: &[&str] = &[".lock", ".part", ".checked", ".error", ".tmp"];

/// Maven path of sbt's compiler bridge modules
const COMPILER_BRIDGE_DIR: &str = "repo1.maven.org/maven2/org/scala-sbt";
const COMPILER_BRIDGE_PREFIX: &str = "compiler-bridge_";

/// A cached artifact discovered during a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// URL the artifact was downloaded from
    pub url: String,
    /// Absolute path of the file
    pub path: PathBuf,
}

/// Whether a file name belongs to the tool's internal bookkeeping
///
/// Hidden files cover Coursier's `.<artifact>.checked` and
/// `.structure.lock` markers.
pub fn is_internal_file(name: &str) -> bool {
    name.starts_with('.') || INTERNAL_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// Scanner for one cache directory
pub struct CacheScanner {
    cache_dir: PathBuf,
}

impl CacheScanner {
    /// Create a scanner for a cache directory
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Find every artifact in the cache, sorted by URL
    ///
    /// Symlinks are followed, but every file must resolve to a location
    /// inside the cache directory.
    pub fn scan(&self) -> SquishResult<Vec<CacheEntry>> {
        let mut entries = Vec::new();
        let root = std::fs::canonicalize(&self.cache_dir)
            .map_err(|e| SquishError::scan(&self.cache_dir, e.to_string()))?;

        for prefix in LAYOUT_PREFIXES {
            let layout_root = self.cache_dir.join(prefix);
            for scheme in SCHEMES {
                let scheme_root = layout_root.join(scheme);
                if !scheme_root.is_dir() {
                    continue;
                }
                debug!("Scanning {}", scheme_root.display());
                scan_scheme_root(&root, &scheme_root, scheme, &mut entries)?;
            }
        }

        entries.sort_by(|a, b| a.url.cmp(&b.url).then_with(|| a.path.cmp(&b.path)));
        info!("Found {} cached artifacts", entries.len());
        Ok(entries)
    }

    /// Scan and hash, producing lockfile entries
    ///
    /// An empty cache is an error: sbt always downloads at least its own
    /// launcher dependencies, so nothing cached means nothing resolved.
    pub fn collect(&self) -> SquishResult<Vec<LockfileEntry>> {
        let entries = self.scan()?;
        if entries.is_empty() {
            return Err(SquishError::NoArtifacts(self.cache_dir.clone()));
        }

        let mut locked = Vec::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            let hash = ContentHash::of_file(&entry.path).map_err(|e| {
                SquishError::scan(&entry.path, format!("cannot hash: {}", e))
            })?;
            locked.push(LockfileEntry::new(entry.url.clone(), hash.to_nix_base32()));

            if (i + 1) % 100 == 0 {
                info!("Hashed {} artifacts...", i + 1);
            }
        }

        Ok(locked)
    }

    /// List `(scala_version, bridge_version)` pairs of cached compiler bridges
    ///
    /// sbt compiles the bridge from sources it never caches, so these need
    /// an explicit sources fetch before the cache is complete.
    pub fn compiler_bridges(&self) -> SquishResult<Vec<(String, String)>> {
        let mut bridges = Vec::new();

        for prefix in LAYOUT_PREFIXES {
            let base = self
                .cache_dir
                .join(prefix)
                .join("https")
                .join(COMPILER_BRIDGE_DIR);
            if !base.is_dir() {
                continue;
            }

            for module in read_dir_sorted(&base)? {
                let Some(scala_version) = module
                    .file_name()
                    .and_then(|n| n.to_str())
                    .and_then(|n| n.strip_prefix(COMPILER_BRIDGE_PREFIX))
                    .map(str::to_string)
                else {
                    continue;
                };
                if !module.is_dir() {
                    continue;
                }

                for version in read_dir_sorted(&module)? {
                    if !version.is_dir() {
                        continue;
                    }
                    if let Some(v) = version.file_name().and_then(|n| n.to_str()) {
                        bridges.push((scala_version.clone(), v.to_string()));
                    }
                }
            }
        }

        bridges.sort();
        bridges.dedup();
        Ok(bridges)
    }
}

/// Fail if a legacy Ivy cache holds artifacts
///
/// Modern sbt resolves through Coursier only; anything under the Ivy cache
/// would be missing from the lockfile.
pub fn check_legacy_ivy_cache(ivy_cache: &Path) -> SquishResult<()> {
    if !ivy_cache.exists() {
        return Ok(());
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(ivy_cache) {
        let entry = entry.map_err(|err| walk_error(err, ivy_cache))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        if matches!(path.extension().and_then(|e| e.to_str()), Some("jar" | "pom")) {
            found.push(path);
        }
    }

    if found.is_empty() {
        return Ok(());
    }

    found.sort();
    Err(SquishError::LegacyIvyArtifacts {
        count: found.len(),
        first: found.swap_remove(0),
    })
}

fn walk_error(err: walkdir::Error, fallback: &Path) -> SquishError {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| fallback.to_path_buf());
    SquishError::scan(path, err.to_string())
}

fn scan_scheme_root(
    cache_root: &Path,
    scheme_root: &Path,
    scheme: &str,
    entries: &mut Vec<CacheEntry>,
) -> SquishResult<()> {
    let walker = WalkDir::new(scheme_root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !e
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.starts_with('.') && e.file_type().is_dir())
        });

    for entry in walker {
        let entry = entry.map_err(|err| walk_error(err, scheme_root))?;

        if !entry.file_type().is_file() {
            continue;
        }

        let file_name = entry.file_name().to_str().ok_or_else(|| {
            SquishError::scan(entry.path(), "file name is not valid UTF-8")
        })?;
        if is_internal_file(file_name) {
            debug!("Skipping internal file {}", entry.path().display());
            continue;
        }

        let resolved = std::fs::canonicalize(entry.path())
            .map_err(|e| SquishError::scan(entry.path(), e.to_string()))?;
        if !resolved.starts_with(cache_root) {
            return Err(SquishError::scan(
                entry.path(),
                format!("resolves outside the cache to {}", resolved.display()),
            ));
        }

        let url = url_for(scheme_root, scheme, entry.path())?;
        entries.push(CacheEntry {
            url,
            path: entry.path().to_path_buf(),
        });
    }

    Ok(())
}

/// Rebuild the URL of a file below a scheme root and check that it encodes
/// back to the same location
fn url_for(scheme_root: &Path, scheme: &str, file: &Path) -> SquishResult<String> {
    let relative = file
        .strip_prefix(scheme_root)
        .map_err(|e| SquishError::scan(file, e.to_string()))?;

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str().ok_or_else(|| {
                SquishError::scan(file, "path component is not valid UTF-8")
            })?),
            _ => return Err(SquishError::scan(file, "unexpected path component")),
        }
    }

    let url = format!("{}{}{}", scheme, path::SCHEME_SEPARATOR, parts.join("/"));
    let encoded = path::encode(&url).map_err(|e| SquishError::scan(file, e.to_string()))?;
    if encoded != Path::new(scheme).join(relative) {
        return Err(SquishError::scan(
            file,
            format!("URL {} does not map back to this file", url),
        ));
    }

    Ok(url)
}

fn read_dir_sorted(dir: &Path) -> SquishResult<Vec<PathBuf>> {
    let mut paths = std::fs::read_dir(dir)
        .map_err(|e| SquishError::io(format!("listing {}", dir.display()), e))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| SquishError::io(format!("listing {}", dir.display()), e))?;
    paths.sort();
    Ok(paths)
}
