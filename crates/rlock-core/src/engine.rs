use std::fmt;
use std::path::Path;

use rlock_prefix::read_prefix;
use rlock_schema::{DocumentMeta, LockDocument, Platform};
use tracing::{debug, info, warn};

use crate::order::canonical_sort;
use crate::resolve::{resolve_records, ResolvedPrefix};
use crate::EngineError;

/// Environment name used when the caller does not pick one.
pub const DEFAULT_ENVIRONMENT: &str = "default";

/// Knobs for one lock run.
#[derive(Debug, Clone)]
pub struct LockOptions {
    /// Environment name the document files the entries under.
    pub environment: String,
    /// Target platform override. When unset the platform is derived from
    /// the records, falling back to the host platform.
    pub platform: Option<Platform>,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            environment: DEFAULT_ENVIRONMENT.to_owned(),
            platform: None,
        }
    }
}

/// Conditions worth reporting that do not abort a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockWarning {
    /// The prefix held no packages. The environment is still recorded,
    /// with an empty entry list, so the emptiness is explicit.
    EmptyEnvironment {
        environment: String,
        platform: String,
    },
}

impl fmt::Display for LockWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEnvironment {
                environment,
                platform,
            } => write!(
                f,
                "environment '{environment}' has no packages; recording an empty {platform} entry list"
            ),
        }
    }
}

/// What a successful run hands back.
#[derive(Debug, Clone)]
pub struct LockOutcome {
    pub document: LockDocument,
    pub warnings: Vec<LockWarning>,
}

/// Assemble the lock document for one resolved prefix.
pub fn build_document(
    prefix: &Path,
    options: &LockOptions,
    resolved: ResolvedPrefix,
) -> (LockDocument, Vec<LockWarning>) {
    let mut warnings = Vec::new();
    if resolved.target.is_empty() {
        warnings.push(LockWarning::EmptyEnvironment {
            environment: options.environment.clone(),
            platform: resolved.target.platform.as_str().to_owned(),
        });
    }

    let meta = DocumentMeta {
        prefix: prefix.display().to_string(),
        generated_at: chrono::Utc::now().to_rfc3339(),
    };
    let mut document = LockDocument::new(meta);
    document.set_channels(&options.environment, resolved.channels);
    document.insert_target(&options.environment, resolved.target);
    (document, warnings)
}

/// Run the pipeline without writing anything: read the prefix, resolve
/// provenance, sort into canonical order, assemble and verify the document.
///
/// The returned document has already passed [`LockDocument::verify`]. Two
/// runs over the same prefix produce byte-identical documents except for
/// the `generated_at` metadata field.
pub fn lock_prefix(prefix: &Path, options: &LockOptions) -> Result<LockOutcome, EngineError> {
    info!("locking prefix {}", prefix.display());
    let records = read_prefix(prefix)?;
    debug!("resolving provenance for {} records", records.len());
    let mut resolved = resolve_records(records, options.platform.as_ref())?;
    canonical_sort(&mut resolved.target);

    let (document, warnings) = build_document(prefix, options, resolved);
    document.verify()?;
    for warning in &warnings {
        warn!("{warning}");
    }
    Ok(LockOutcome { document, warnings })
}

/// Run the pipeline and write the document atomically to `out_path`.
/// Nothing is written when any earlier stage fails, so a pre-existing
/// lock file survives a failed run unchanged.
pub fn lock_prefix_to_file(
    prefix: &Path,
    out_path: &Path,
    options: &LockOptions,
) -> Result<LockOutcome, EngineError> {
    let outcome = lock_prefix(prefix, options)?;
    outcome.document.write_to_file(out_path)?;
    info!(
        "wrote {} ({} packages)",
        out_path.display(),
        outcome.document.package_count()
    );
    Ok(outcome)
}
