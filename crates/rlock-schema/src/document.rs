//! The lock document: on-disk schema, canonical rendering, and verification.
//!
//! A document written by the builder is canonical: entries sorted in lock
//! order, map keys in byte order, and the TOML rendering reproducible byte
//! for byte from the parsed form. [`LockDocument::verify_file`] re-checks
//! all of that before trusting a file on disk.

use crate::hash::PackageHash;
use crate::record::{LockTarget, ResolvedPackage};
use crate::types::PackageName;
use crate::version::compare_versions;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Current lock document schema version.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("lock file I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("lock file parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("lock file serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("unsupported lock schema version {found}, this build supports version {SCHEMA_VERSION}")]
    UnsupportedSchema { found: u32 },
    #[error("malformed {algorithm} digest for package '{package}': {detail}")]
    MalformedHash {
        package: String,
        algorithm: String,
        detail: String,
    },
    #[error("package '{package}' depends on '{dependency}', which is not locked for {platform}")]
    DanglingReference {
        package: String,
        dependency: String,
        platform: String,
    },
    #[error("lock file is not in canonical form: {0}")]
    NotCanonical(String),
}

/// One locked package entry as it appears in the document.
///
/// Field order matters for rendering: `hash` is a sub-table and must come
/// after all plain values, or TOML serialization fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedPackage {
    pub name: String,
    pub version: String,
    pub build: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default)]
    pub depends: Vec<String>,
    pub hash: PackageHash,
}

impl LockedPackage {
    /// Canonical lock order: name, then version, then build identifier.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| compare_versions(&self.version, &other.version))
            .then_with(|| self.build.cmp(&other.build))
    }
}

impl From<ResolvedPackage> for LockedPackage {
    fn from(pkg: ResolvedPackage) -> Self {
        Self {
            name: pkg.record.name.into_inner(),
            version: pkg.record.version,
            build: pkg.record.build,
            url: pkg.provenance.url,
            size: pkg.provenance.size,
            depends: pkg
                .provenance
                .depends
                .into_iter()
                .map(PackageName::into_inner)
                .collect(),
            hash: pkg.provenance.hash,
        }
    }
}

/// Generation metadata. Excluded from the determinism contract: two runs
/// over the same prefix differ only in `generated_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    /// Prefix the document was generated from.
    pub prefix: String,
    /// RFC 3339 generation time.
    pub generated_at: String,
}

/// A complete lock document.
///
/// `environments` maps environment name to platform tag to the canonically
/// ordered entry list. `BTreeMap` keeps key order independent of insertion
/// and hashing, which the byte-stability guarantee relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockDocument {
    pub version: u32,
    pub meta: DocumentMeta,
    /// Channel URLs per environment, sorted and deduplicated.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub channels: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub environments: BTreeMap<String, BTreeMap<String, Vec<LockedPackage>>>,
}

impl LockDocument {
    pub fn new(meta: DocumentMeta) -> Self {
        Self {
            version: SCHEMA_VERSION,
            meta,
            channels: BTreeMap::new(),
            environments: BTreeMap::new(),
        }
    }

    /// Add one platform's packages to an environment. The target's entry
    /// order is preserved, so callers sort before inserting.
    pub fn insert_target(&mut self, environment: &str, target: LockTarget) {
        let entries: Vec<LockedPackage> =
            target.packages.into_iter().map(LockedPackage::from).collect();
        self.environments
            .entry(environment.to_owned())
            .or_default()
            .insert(target.platform.into_inner(), entries);
    }

    /// Record the channel URLs an environment's packages came from.
    pub fn set_channels(&mut self, environment: &str, channels: Vec<String>) {
        if channels.is_empty() {
            return;
        }
        self.channels.insert(environment.to_owned(), channels);
    }

    /// Entries locked for one environment/platform pair, if present.
    pub fn packages_for(&self, environment: &str, platform: &str) -> Option<&[LockedPackage]> {
        self.environments
            .get(environment)
            .and_then(|platforms| platforms.get(platform))
            .map(Vec::as_slice)
    }

    /// Total number of locked entries across all environments.
    pub fn package_count(&self) -> usize {
        self.environments
            .values()
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }

    /// Render to the canonical TOML representation.
    pub fn render_to_string(&self) -> Result<String, LockError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn parse_str(content: &str) -> Result<Self, LockError> {
        Ok(toml::from_str(content)?)
    }

    pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self, LockError> {
        let content = fs::read_to_string(path)?;
        Self::parse_str(&content)
    }

    /// Atomically replace `path` with this document.
    ///
    /// The rendering goes to a temp file in the destination directory,
    /// is synced, then renamed over the target. A crash at any point
    /// leaves either the old file or the new one, never a torn write.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), LockError> {
        let path = path.as_ref();
        let content = self.render_to_string()?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        std::io::Write::write_all(&mut tmp, content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| LockError::Io(e.error))?;
        // Fsync parent directory to ensure rename durability on power loss.
        if let Ok(f) = fs::File::open(dir) {
            let _ = f.sync_all();
        }
        Ok(())
    }

    /// Structural verification: schema version, entry uniqueness, digest
    /// well-formedness, closed dependency references, and canonical entry
    /// order. Stops at the first violation.
    pub fn verify(&self) -> Result<(), LockError> {
        if self.version != SCHEMA_VERSION {
            return Err(LockError::UnsupportedSchema {
                found: self.version,
            });
        }
        for (environment, platforms) in &self.environments {
            for (platform, entries) in platforms {
                let mut names: BTreeSet<&str> = BTreeSet::new();
                for entry in entries {
                    if !names.insert(entry.name.as_str()) {
                        return Err(LockError::NotCanonical(format!(
                            "duplicate entry for package '{}' in {environment}/{platform}",
                            entry.name
                        )));
                    }
                    if !entry.hash.is_well_formed() {
                        return Err(LockError::MalformedHash {
                            package: entry.name.clone(),
                            algorithm: entry.hash.algorithm.to_string(),
                            detail: format!(
                                "expected {} hex characters, got '{}'",
                                entry.hash.algorithm.digest_len(),
                                entry.hash.digest
                            ),
                        });
                    }
                }
                for entry in entries {
                    for dependency in &entry.depends {
                        if !names.contains(dependency.as_str()) {
                            return Err(LockError::DanglingReference {
                                package: entry.name.clone(),
                                dependency: dependency.clone(),
                                platform: platform.clone(),
                            });
                        }
                    }
                }
                for pair in entries.windows(2) {
                    if pair[0].canonical_cmp(&pair[1]) == Ordering::Greater {
                        return Err(LockError::NotCanonical(format!(
                            "entries for {environment}/{platform} out of order: '{}' before '{}'",
                            pair[0].name, pair[1].name
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Full file verification: parse, structural checks, and the
    /// re-serialization check that proves the file is byte-identical to
    /// its own canonical rendering.
    pub fn verify_file(path: impl AsRef<Path>) -> Result<Self, LockError> {
        let content = fs::read_to_string(path)?;
        let doc = Self::parse_str(&content)?;
        doc.verify()?;
        let rendered = doc.render_to_string()?;
        if rendered != content {
            return Err(LockError::NotCanonical(
                "re-serialization does not reproduce the file byte for byte".to_owned(),
            ));
        }
        Ok(doc)
    }
}
