use crate::hash::PackageHash;
use crate::types::{PackageName, Platform};
use crate::version::compare_versions;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Identity and declared dependencies of one installed package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub name: PackageName,
    pub version: String,
    pub build: String,
    pub platform: Platform,
    /// Declared dependency specs exactly as the installer recorded them
    /// (e.g. `openssl >=3.0,<4`). Resolution reduces these to names.
    #[serde(default)]
    pub depends: Vec<String>,
}

impl PackageRecord {
    /// Canonical lock order: name, then version, then build identifier.
    ///
    /// Name comparison is case-sensitive byte-wise; versions compare
    /// numeric-segment-aware via [`compare_versions`].
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.name
            .as_str()
            .cmp(other.name.as_str())
            .then_with(|| compare_versions(&self.version, &other.version))
            .then_with(|| self.build.cmp(&other.build))
    }
}

/// Verified origin of one installed package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceInfo {
    /// Canonical source URL of the package payload.
    pub url: String,
    /// Payload digest, taken from the record or recomputed from disk.
    pub hash: PackageHash,
    /// Payload size in bytes, when known.
    pub size: Option<u64>,
    /// Dependency names resolved against the same target, sorted and
    /// deduplicated.
    pub depends: Vec<PackageName>,
}

/// One record paired with its resolved provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackage {
    pub record: PackageRecord,
    pub provenance: ProvenanceInfo,
}

impl ResolvedPackage {
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.record.canonical_cmp(&other.record)
    }
}

/// All packages destined for one platform of a lock document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockTarget {
    pub platform: Platform,
    pub packages: Vec<ResolvedPackage>,
}

impl LockTarget {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            packages: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }
}
