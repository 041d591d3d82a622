//! squish - Lockfiles and offline caches for sbt builds
//!
//! Generation runs sbt in an isolated home and pins every artifact it
//! downloaded by URL and content hash. Reconstruction rebuilds that
//! Coursier cache from the lockfile alone, so the build can run offline.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod generate;
pub mod lockfile;
pub mod orchestration;
pub mod ui;

pub use error::{SquishError, SquishResult};
