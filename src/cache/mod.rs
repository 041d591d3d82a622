//! Coursier-layout artifact caches
//!
//! A cache directory maps every artifact URL to exactly one relative path
//! (see [`path`]). Generation reads such a cache; reconstruction writes one
//! that sbt can use offline.
//!
//! # Layout
//!
//! | URL | Cache path |
//! |-----|------------|
//! | `https://repo1.maven.org/maven2/a/b.jar` | `https/repo1.maven.org/maven2/a/b.jar` |
//! | `http://host/x.pom` | `http/host/x.pom` |
//!
//! Scanning also accepts Coursier's versioned `cache/` subdirectory.

pub mod path;
pub mod reconstruct;
pub mod scan;

pub use reconstruct::{ReconstructOptions, ReconstructReport, Reconstructor};
pub use scan::{check_legacy_ivy_cache, CacheEntry, CacheScanner};
