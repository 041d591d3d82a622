//! Content hashing for lockfile entries
//!
//! Artifacts are identified by their SHA-256 digest rendered in Nix's
//! base-32 encoding, so lockfile hashes can be handed to `fetchurl`-style
//! fetchers without re-encoding.

use crate::error::{SquishError, SquishResult};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

/// Alphabet of Nix base-32 (no `e`, `o`, `u`, `t`)
pub const NIX_BASE32_ALPHABET: &[u8; 32] = b"0123456789abcdfghijklmnpqrsvwxyz";

/// Encoded length of a SHA-256 digest: ceil(256 / 5)
pub const ENCODED_LEN: usize = 52;

const READ_CHUNK_SIZE: usize = 64 * 1024;

/// SHA-256 digest of an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hash an in-memory buffer
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(Sha256::digest(bytes).into())
    }

    /// Hash a file by streaming it in fixed-size chunks
    pub fn of_file(path: &Path) -> SquishResult<Self> {
        let mut file = File::open(path)
            .map_err(|e| SquishError::io(format!("opening {} for hashing", path.display()), e))?;

        let mut hasher = Sha256::new();
        let mut buf = vec![0_u8; READ_CHUNK_SIZE];
        loop {
            let read = file
                .read(&mut buf)
                .map_err(|e| SquishError::io(format!("reading {}", path.display()), e))?;
            if read == 0 {
                break;
            }
            hasher.update(&buf[..read]);
        }

        Ok(Self(hasher.finalize().into()))
    }

    /// Render the digest in Nix base-32
    ///
    /// The digest is read as a little-endian integer and emitted most
    /// significant quintet first.
    pub fn to_nix_base32(&self) -> String {
        let bytes = &self.0;
        let mut out = String::with_capacity(ENCODED_LEN);

        for n in (0..ENCODED_LEN).rev() {
            let bit = n * 5;
            let i = bit / 8;
            let j = bit % 8;
            let low = u16::from(bytes[i]) >> j;
            let high = if i + 1 < bytes.len() {
                u16::from(bytes[i + 1]) << (8 - j)
            } else {
                0
            };
            let quintet = ((low | high) & 0x1f) as usize;
            out.push(char::from(NIX_BASE32_ALPHABET[quintet]));
        }

        out
    }
}

/// Writer that hashes everything passed through to `inner`
///
/// Lets a download be verified while it streams to disk.
pub struct HashingWriter<W> {
    inner: W,
    hasher: Sha256,
}

impl<W: Write> HashingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
        }
    }

    /// Hash of the bytes written so far
    pub fn finish(self) -> (W, ContentHash) {
        (self.inner, ContentHash(self.hasher.finalize().into()))
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.hasher.update(&buf[..written]);
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Check that a string is a well-formed Nix base-32 SHA-256
///
/// The leading character carries only the top bit of the digest, so it
/// must be `0` or `1`.
pub fn is_valid_encoding(encoded: &str) -> bool {
    let bytes = encoded.as_bytes();
    bytes.len() == ENCODED_LEN
        && matches!(bytes[0], b'0' | b'1')
        && bytes.iter().all(|b| NIX_BASE32_ALPHABET.contains(b))
}
