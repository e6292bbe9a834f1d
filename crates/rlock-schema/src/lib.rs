//! Lock document model and on-disk schema for rlock.
//!
//! This crate defines the schema layer: typed package identifiers
//! (`PackageName`, `Platform`), the installed-package model
//! (`PackageRecord`, `ProvenanceInfo`, `LockTarget`), canonical version
//! ordering (`compare_versions`), and the lock document itself
//! (`LockDocument`) with deterministic TOML rendering, atomic writes, and
//! verification.

pub mod document;
pub mod hash;
pub mod record;
pub mod types;
pub mod version;

pub use document::{
    DocumentMeta, LockDocument, LockError, LockedPackage, SCHEMA_VERSION,
};
pub use hash::{HashAlgorithm, PackageHash};
pub use record::{LockTarget, PackageRecord, ProvenanceInfo, ResolvedPackage};
pub use types::{PackageName, Platform};
pub use version::compare_versions;
