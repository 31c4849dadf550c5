//! Content digests.
//!
//! A thin wrapper around `oci_spec::image::Digest` that plugs into the crate's
//! error type and adds sha256 content verification for downloaded blobs.

use crate::error::{CantusError, Result};
use oci_spec::image::{Digest as OciDigest, DigestAlgorithm};
use serde::{Serialize, Serializer};
use sha2::Digest as _;
use std::fmt;
use std::str::FromStr;


/// Represents a content digest, wrapping the `oci_spec::image::Digest` type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest(OciDigest);

impl Digest {
    /// Computes the sha256 digest of `data`.
    ///
    /// # Examples
    ///
    /// ```
    /// use libcantus::digest::Digest;
    ///
    /// let digest = Digest::sha256_of(b"").unwrap();
    /// assert_eq!(
    ///     digest.to_string(),
    ///     "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    /// );
    /// ```
    pub fn sha256_of(data: &[u8]) -> Result<Self> {
        format!("sha256:{}", sha256_hex(data)).parse()
    }

    /// The hex-encoded hash part, without the algorithm prefix.
    pub fn hex(&self) -> &str {
        self.0.digest()
    }

    /// Checks `data` against this digest.
    ///
    /// Returns `None` when the algorithm is not one we can compute (only
    /// sha256 is verified).
    pub fn verify(&self, data: &[u8]) -> Option<bool> {
        match self.0.algorithm() {
            DigestAlgorithm::Sha256 => Some(sha256_hex(data) == self.hex()),
            _ => None,
        }
    }
}

impl FromStr for Digest {
    type Err = CantusError;

    fn from_str(s: &str) -> Result<Self> {
        let oci_digest = OciDigest::from_str(s)
            .map_err(|e| CantusError::invalid_request(format!("Invalid digest '{}': {}", s, e)))?;
        Ok(Digest(oci_digest))
    }
}

impl From<OciDigest> for Digest {
    fn from(digest: OciDigest) -> Self {
        Digest(digest)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = sha2::Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
