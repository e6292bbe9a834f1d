//! Read boundary against materialized package prefixes.
//!
//! A prefix is a directory of installed packages whose installer left one
//! JSON record per package under `conda-meta/`. This crate enumerates and
//! parses those records into the typed model (`PrefixRecord`) and provides
//! local payload hashing for packages whose records carry no usable
//! digest. The record format is owned by the external installer; parsing
//! here is tolerant of unknown fields but strict about the ones the lock
//! pipeline needs.

pub mod payload;
pub mod reader;
pub mod record;

pub use payload::{file_sha256, file_size};
pub use reader::{read_prefix, META_DIR};
pub use record::{PrefixRecord, RecordSource};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrefixError {
    #[error("no package metadata directory under '{0}'")]
    PrefixNotFound(String),
    #[error("corrupt installation record '{record}': {detail}")]
    CorruptRecord { record: String, detail: String },
    #[error("prefix I/O error: {0}")]
    Io(#[from] std::io::Error),
}
