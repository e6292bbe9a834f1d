use serde::{Deserialize, Serialize};
use std::fmt;

/// Digest algorithm recorded for a package payload.
///
/// Installer metadata carries sha256 for modern packages and md5 for old
/// channel archives; both stay representable so existing environments can
/// be locked without re-downloading anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Md5,
    Sha256,
}

impl HashAlgorithm {
    /// Length of a valid hex digest for this algorithm.
    pub fn digest_len(self) -> usize {
        match self {
            HashAlgorithm::Md5 => 32,
            HashAlgorithm::Sha256 => 64,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha256 => "sha256",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Algorithm-tagged hex digest of a package payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageHash {
    pub algorithm: HashAlgorithm,
    pub digest: String,
}

impl PackageHash {
    pub fn md5(digest: impl Into<String>) -> Self {
        Self {
            algorithm: HashAlgorithm::Md5,
            digest: digest.into(),
        }
    }

    pub fn sha256(digest: impl Into<String>) -> Self {
        Self {
            algorithm: HashAlgorithm::Sha256,
            digest: digest.into(),
        }
    }

    /// Whether the digest is valid hex of the length the algorithm demands.
    pub fn is_well_formed(&self) -> bool {
        self.digest.len() == self.algorithm.digest_len()
            && self.digest.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

impl fmt::Display for PackageHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.digest)
    }
}
