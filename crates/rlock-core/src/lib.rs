//! Core lock pipeline for rlock.
//!
//! This crate ties together prefix reading, provenance resolution, and the
//! lock document schema into the functions that turn an installed prefix
//! into a verified lock file: `lock_prefix` for the in-memory pipeline,
//! `lock_prefix_to_file` for the atomic write, plus the installer hook and
//! the advisory guard that serializes concurrent writers.

pub mod concurrency;
pub mod engine;
pub mod hook;
pub mod order;
pub mod resolve;

pub use concurrency::{guard_path, WriteGuard};
pub use engine::{
    build_document, lock_prefix, lock_prefix_to_file, LockOptions, LockOutcome, LockWarning,
    DEFAULT_ENVIRONMENT,
};
pub use hook::{run_post_command, HookOutcome, HookSettings, DEFAULT_LOCK_FILE_NAME};
pub use order::canonical_sort;
pub use resolve::{resolve_records, ResolveError, ResolvedPrefix};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("prefix error: {0}")]
    Prefix(#[from] rlock_prefix::PrefixError),
    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),
    #[error("lock error: {0}")]
    Lock(#[from] rlock_schema::LockError),
    #[error("settings error: {0}")]
    Settings(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
