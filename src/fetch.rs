//! Artifact fetching
//!
//! Reconstruction only needs "stream the body at this URL somewhere", so
//! fetching is a one-method trait. `HttpFetcher` is the production
//! implementation; tests substitute an in-memory map.

use std::fmt;
use std::io::{self, Read, Write};
use std::time::Duration;
use tracing::debug;

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("squish/", env!("CARGO_PKG_VERSION"));

/// Upper bound on a single artifact body
const MAX_ARTIFACT_BYTES: u64 = 2 * 1024 * 1024 * 1024;

const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// A failed fetch attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    /// Human-readable cause
    pub reason: String,
    /// Whether another attempt may succeed
    pub retryable: bool,
}

impl FetchFailure {
    /// A failure worth retrying (timeouts, resets, 5xx)
    pub fn transient(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            retryable: true,
        }
    }

    /// A failure that will not go away on retry (404, 403)
    pub fn permanent(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            retryable: false,
        }
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reason)
    }
}

/// Source of artifact bytes
///
/// Blocking: callers run it on a blocking thread. After a failed attempt
/// the sink may hold a partial body and must be discarded.
pub trait Fetcher: Send + Sync {
    /// Stream the body at `url` into `sink`, returning the bytes written
    fn fetch(&self, url: &str, sink: &mut dyn Write) -> Result<u64, FetchFailure>;
}

/// Fetcher backed by a blocking `ureq` agent
#[derive(Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    /// Create a fetcher with a per-request timeout
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, sink: &mut dyn Write) -> Result<u64, FetchFailure> {
        debug!("GET {}", url);
        let mut response = self
            .agent
            .get(url)
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(classify)?;

        let mut reader = response
            .body_mut()
            .with_config()
            .limit(MAX_ARTIFACT_BYTES)
            .reader();
        copy_body(&mut reader, sink)
    }
}

/// Copy a response body in fixed-size chunks
///
/// Read failures are classified like request failures; write failures are
/// local and never retried.
fn copy_body(reader: &mut dyn Read, sink: &mut dyn Write) -> Result<u64, FetchFailure> {
    let mut buf = vec![0_u8; STREAM_CHUNK_SIZE];
    let mut written = 0u64;
    loop {
        let read = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(classify_read(e)),
        };
        sink.write_all(&buf[..read])
            .map_err(|e| FetchFailure::permanent(format!("writing body: {}", e)))?;
        written += read as u64;
    }
    Ok(written)
}

/// Map a `ureq` error onto retry semantics
///
/// Server-side and rate-limit statuses are retried, other statuses are
/// final. Errors that repeat identically on every attempt (bad URI, body
/// over the size cap, redirect loops) are final; remaining transport
/// errors (DNS, connect, timeout, reset) are retried.
fn classify(err: ureq::Error) -> FetchFailure {
    if let ureq::Error::StatusCode(code) = err {
        let reason = format!("HTTP status {}", code);
        return if is_retryable_status(code) {
            FetchFailure::transient(reason)
        } else {
            FetchFailure::permanent(reason)
        };
    }

    let reason = err.to_string();
    if is_deterministic(&err) {
        FetchFailure::permanent(reason)
    } else {
        FetchFailure::transient(reason)
    }
}

/// Body read errors wrap the `ureq` error that caused them
fn classify_read(err: io::Error) -> FetchFailure {
    let message = err.to_string();
    match err.into_inner().map(|inner| inner.downcast::<ureq::Error>()) {
        Some(Ok(cause)) => classify(*cause),
        _ => FetchFailure::transient(format!("reading body: {}", message)),
    }
}

fn is_deterministic(err: &ureq::Error) -> bool {
    matches!(
        err,
        ureq::Error::BadUri(_)
            | ureq::Error::Http(_)
            | ureq::Error::BodyExceedsLimit(_)
            | ureq::Error::TooManyRedirects
            | ureq::Error::RedirectFailed
            | ureq::Error::InvalidProxyUrl
            | ureq::Error::RequireHttpsOnly(_)
            | ureq::Error::LargeResponseHeader(..)
            | ureq::Error::TlsRequired
    )
}

fn is_retryable_status(code: u16) -> bool {
    code == 408 || code == 429 || code >= 500
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert!(is_retryable_status(503));
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(408));
        assert!(!is_retryable_status(404));
        assert!(!is_retryable_status(403));
    }

    #[test]
    fn classify_status_errors() {
        assert!(!classify(ureq::Error::StatusCode(404)).retryable);
        assert!(classify(ureq::Error::StatusCode(502)).retryable);
    }

    #[test]
    fn deterministic_errors_are_not_retried() {
        assert!(!classify(ureq::Error::BodyExceedsLimit(MAX_ARTIFACT_BYTES)).retryable);
        assert!(!classify(ureq::Error::BadUri("no scheme".to_string())).retryable);
        assert!(!classify(ureq::Error::TooManyRedirects).retryable);
        assert!(classify(ureq::Error::HostNotFound).retryable);
        assert!(classify(ureq::Error::ConnectionFailed).retryable);
    }

    #[test]
    fn body_read_errors_keep_their_cause() {
        let over_limit = io::Error::other(ureq::Error::BodyExceedsLimit(10));
        assert!(!classify_read(over_limit).retryable);

        let reset = io::Error::from(io::ErrorKind::ConnectionReset);
        assert!(classify_read(reset).retryable);
    }

    #[test]
    fn invalid_url_fails_without_retry() {
        let fetcher = HttpFetcher::new(Duration::from_secs(1));
        let mut sink = Vec::new();

        let failure = fetcher.fetch("not a url", &mut sink).unwrap_err();
        assert!(!failure.retryable, "{failure}");
        assert!(sink.is_empty());
    }

    /// Yields `chunks`, then fails like a dropped connection
    struct BrokenReader {
        chunks: Vec<&'static [u8]>,
    }

    impl Read for BrokenReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.chunks.is_empty() {
                return Err(io::Error::from(io::ErrorKind::ConnectionReset));
            }
            let chunk = self.chunks.remove(0);
            buf[..chunk.len()].copy_from_slice(chunk);
            Ok(chunk.len())
        }
    }

    #[test]
    fn copies_body_in_chunks() {
        let mut body: &[u8] = b"artifact bytes";
        let mut sink = Vec::new();

        assert_eq!(copy_body(&mut body, &mut sink).unwrap(), 14);
        assert_eq!(sink, b"artifact bytes");
    }

    #[test]
    fn interrupted_body_is_transient() {
        let mut reader = BrokenReader {
            chunks: vec![b"part", b"ial"],
        };
        let mut sink = Vec::new();

        let failure = copy_body(&mut reader, &mut sink).unwrap_err();
        assert!(failure.retryable);
        assert_eq!(sink, b"partial");
    }

    #[test]
    fn user_agent_names_crate() {
        assert!(USER_AGENT.starts_with("squish/"));
    }

    #[test]
    fn failure_display_is_reason() {
        assert_eq!(FetchFailure::permanent("HTTP status 404").to_string(), "HTTP status 404");
    }
}
