use crate::record::{parse_record, PrefixRecord};
use crate::PrefixError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directory under the prefix that holds one JSON record per package.
pub const META_DIR: &str = "conda-meta";

/// Read every installation record under `<prefix>/conda-meta`.
///
/// A prefix without the metadata directory is an error; a metadata
/// directory with no record files is a valid empty environment. Files
/// without a `.json` extension (the installer keeps e.g. `history` there)
/// and dotfiles are skipped. Results are sorted by file name so callers
/// never observe directory iteration order.
///
/// Any unparseable record aborts the read: a lock generated from a
/// partially readable prefix would silently drop packages.
pub fn read_prefix(prefix: &Path) -> Result<Vec<PrefixRecord>, PrefixError> {
    let meta_dir = prefix.join(META_DIR);
    if !meta_dir.is_dir() {
        return Err(PrefixError::PrefixNotFound(prefix.display().to_string()));
    }

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(&meta_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let name_str = name.to_str().unwrap_or("");
        if name_str.starts_with('.') || !name_str.ends_with(".json") {
            debug!("skipping non-record file '{name_str}'");
            continue;
        }
        files.push(entry.path());
    }
    files.sort();

    let mut records = Vec::with_capacity(files.len());
    for path in files {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content = fs::read_to_string(&path)?;
        records.push(parse_record(&file_name, &content)?);
    }

    info!(
        "read {} installation records from {}",
        records.len(),
        meta_dir.display()
    );
    Ok(records)
}
