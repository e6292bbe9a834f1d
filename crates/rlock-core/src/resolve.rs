use std::collections::BTreeSet;

use rlock_prefix::{file_sha256, file_size, PrefixRecord};
use rlock_schema::{
    HashAlgorithm, LockTarget, PackageHash, PackageName, Platform, ProvenanceInfo, ResolvedPackage,
};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors surfaced while resolving prefix records into lock entries.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A record carries neither a usable source URL nor enough material to
    /// derive or recompute one.
    #[error("cannot establish provenance for package '{package}': {reason}")]
    UnverifiableSource { package: String, reason: String },

    /// Two records claim the same package name for one platform.
    #[error("multiple records claim package '{name}' on {platform}")]
    AmbiguousDependency { name: String, platform: String },

    /// A declared dependency does not correspond to any installed package.
    #[error(
        "package '{package}' depends on '{dependency}', which is not installed on {platform}"
    )]
    DanglingDependency {
        package: String,
        dependency: String,
        platform: String,
    },

    /// The prefix mixes records from more than one concrete platform, or
    /// its records contradict the platform the caller asked for.
    #[error("prefix records span conflicting platforms: {first} vs {second}")]
    ConflictingPlatforms { first: String, second: String },
}

/// Everything resolution extracts from one prefix: the lock target and the
/// sorted set of channel URLs its packages came from.
#[derive(Debug, Clone)]
pub struct ResolvedPrefix {
    pub target: LockTarget,
    pub channels: Vec<String>,
}

/// Resolve raw prefix records into a lock target.
///
/// The target platform is `requested` when given, otherwise the single
/// concrete platform tagged on the records, otherwise the host platform
/// (covers all-noarch and empty prefixes). Noarch records fold into the
/// target; records tagged with a second concrete platform are an error.
///
/// Resolution is all-or-nothing: a single record without usable provenance
/// fails the whole run rather than producing a lock file that silently
/// omits packages.
pub fn resolve_records(
    records: Vec<PrefixRecord>,
    requested: Option<&Platform>,
) -> Result<ResolvedPrefix, ResolveError> {
    let platform = target_platform(&records, requested)?;

    let mut names: BTreeSet<String> = BTreeSet::new();
    for rec in &records {
        if !names.insert(rec.record.name.as_str().to_owned()) {
            return Err(ResolveError::AmbiguousDependency {
                name: rec.record.name.as_str().to_owned(),
                platform: platform.to_string(),
            });
        }
    }

    let mut channels: BTreeSet<String> = BTreeSet::new();
    let mut target = LockTarget::new(platform.clone());
    for mut rec in records {
        let depends = resolve_depends(&rec, &names, &platform)?;
        let provenance = resolve_provenance(&rec, depends)?;
        if let Some(channel) = channel_of(&rec, &provenance.url) {
            channels.insert(channel);
        }
        if rec.record.platform.is_noarch() {
            rec.record.platform = platform.clone();
        }
        target.packages.push(ResolvedPackage {
            record: rec.record,
            provenance,
        });
    }
    debug!(
        "resolved {} packages for {platform} from {} channels",
        target.len(),
        channels.len()
    );

    Ok(ResolvedPrefix {
        target,
        channels: channels.into_iter().collect(),
    })
}

/// Decide which platform the lock target describes.
fn target_platform(
    records: &[PrefixRecord],
    requested: Option<&Platform>,
) -> Result<Platform, ResolveError> {
    let mut concrete: Option<&Platform> = None;
    for rec in records {
        let tagged = &rec.record.platform;
        if tagged.is_noarch() {
            continue;
        }
        match concrete {
            None => concrete = Some(tagged),
            Some(existing) if existing == tagged => {}
            Some(existing) => {
                return Err(ResolveError::ConflictingPlatforms {
                    first: existing.to_string(),
                    second: tagged.to_string(),
                })
            }
        }
    }
    if let (Some(asked), Some(found)) = (requested, concrete) {
        if asked != found {
            return Err(ResolveError::ConflictingPlatforms {
                first: found.to_string(),
                second: asked.to_string(),
            });
        }
    }
    Ok(requested
        .or(concrete)
        .cloned()
        .unwrap_or_else(Platform::current))
}

/// Validate and normalize one record's dependency edges: extract the name
/// token from each spec string, drop virtual (`__`-prefixed) capabilities,
/// require every remaining name to be installed, then sort and dedup.
fn resolve_depends(
    rec: &PrefixRecord,
    installed: &BTreeSet<String>,
    platform: &Platform,
) -> Result<Vec<PackageName>, ResolveError> {
    let package = rec.record.name.as_str();
    let mut depends: Vec<PackageName> = Vec::new();
    for spec in &rec.record.depends {
        let name = dependency_name(spec);
        if name.is_empty() {
            warn!("ignoring unparseable dependency spec '{spec}' on '{package}'");
            continue;
        }
        if name.starts_with("__") {
            debug!("skipping virtual dependency '{name}' of '{package}'");
            continue;
        }
        if !installed.contains(name) {
            return Err(ResolveError::DanglingDependency {
                package: package.to_owned(),
                dependency: name.to_owned(),
                platform: platform.to_string(),
            });
        }
        depends.push(PackageName::from(name));
    }
    depends.sort();
    depends.dedup();
    Ok(depends)
}

/// Leading name token of a dependency spec string, e.g. `"openssl >=3.0"`
/// yields `"openssl"`. Names are ASCII alphanumerics plus `.`, `-`, `_`.
fn dependency_name(spec: &str) -> &str {
    let spec = spec.trim_start();
    let end = spec
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_'))
        .unwrap_or(spec.len());
    &spec[..end]
}

/// Establish URL, hash, and size for one record.
fn resolve_provenance(
    rec: &PrefixRecord,
    depends: Vec<PackageName>,
) -> Result<ProvenanceInfo, ResolveError> {
    let package = rec.record.name.as_str();

    let url = match rec.source.url.as_deref().filter(|u| !u.is_empty()) {
        Some(url) => url.to_owned(),
        None => derive_url(rec).ok_or_else(|| ResolveError::UnverifiableSource {
            package: package.to_owned(),
            reason: "record carries no URL and no channel/filename to derive one".to_owned(),
        })?,
    };

    let hash = resolve_hash(rec)?;

    let size = match rec.source.size {
        Some(size) => Some(size),
        None => rec
            .source
            .payload_path
            .as_deref()
            .and_then(|path| file_size(path).ok()),
    };

    Ok(ProvenanceInfo {
        url,
        hash,
        size,
        depends,
    })
}

/// Reassemble a package URL from channel, subdir, and file name. Noarch
/// records keep their `noarch` subdir here even though the entry itself
/// folds into the concrete target.
fn derive_url(rec: &PrefixRecord) -> Option<String> {
    let channel = rec.source.channel.as_deref().filter(|c| !c.is_empty())?;
    let file_name = rec.source.file_name.as_deref().filter(|f| !f.is_empty())?;
    Some(format!(
        "{}/{}/{file_name}",
        channel.trim_end_matches('/'),
        rec.record.platform
    ))
}

/// Pick the strongest available content hash: recorded sha256, then
/// recorded md5, then a sha256 recomputed from the local payload archive.
fn resolve_hash(rec: &PrefixRecord) -> Result<PackageHash, ResolveError> {
    let package = rec.record.name.as_str();

    if let Some(raw) = rec.source.sha256.as_deref() {
        match recorded_hash(raw, HashAlgorithm::Sha256) {
            Some(hash) => return Ok(hash),
            None => warn!("ignoring malformed sha256 digest on '{package}'"),
        }
    }
    if let Some(raw) = rec.source.md5.as_deref() {
        match recorded_hash(raw, HashAlgorithm::Md5) {
            Some(hash) => return Ok(hash),
            None => warn!("ignoring malformed md5 digest on '{package}'"),
        }
    }
    if let Some(path) = rec.source.payload_path.as_deref() {
        if path.is_file() {
            let digest =
                file_sha256(path).map_err(|e| ResolveError::UnverifiableSource {
                    package: package.to_owned(),
                    reason: format!("payload at {} is unreadable: {e}", path.display()),
                })?;
            debug!("recomputed sha256 for '{package}' from {}", path.display());
            return Ok(PackageHash::sha256(digest));
        }
    }

    Err(ResolveError::UnverifiableSource {
        package: package.to_owned(),
        reason: "record carries no usable digest and no local payload archive".to_owned(),
    })
}

/// Normalize a recorded digest, rejecting anything that is not plain hex
/// of the algorithm's length.
fn recorded_hash(raw: &str, algorithm: HashAlgorithm) -> Option<PackageHash> {
    let hash = PackageHash {
        algorithm,
        digest: raw.trim().to_lowercase(),
    };
    hash.is_well_formed().then_some(hash)
}

/// Channel URL a record came from: the recorded channel when present,
/// otherwise the package URL with its `<subdir>/<file>` tail removed.
fn channel_of(rec: &PrefixRecord, url: &str) -> Option<String> {
    if let Some(channel) = rec.source.channel.as_deref().filter(|c| !c.is_empty()) {
        return Some(channel.trim_end_matches('/').to_owned());
    }
    channel_from_url(url)
}

fn channel_from_url(url: &str) -> Option<String> {
    let (rest, _file) = url.rsplit_once('/')?;
    let (channel, _subdir) = rest.rsplit_once('/')?;
    // Refuse to strip into the URL scheme for short paths.
    channel.contains("://").then(|| channel.to_owned())
}
