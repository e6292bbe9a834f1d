use crate::PrefixError;
use rlock_schema::{PackageRecord, Platform};
use serde::Deserialize;
use std::path::PathBuf;

/// Raw serde view of a record file. Only the fields the lock pipeline
/// consumes are modeled; unknown fields are ignored so records written by
/// newer installer versions keep parsing. Callers get the normalized
/// [`PrefixRecord`].
#[derive(Debug, Deserialize)]
struct RawRecord {
    name: String,
    version: String,
    build: String,
    #[serde(default)]
    subdir: Option<String>,
    #[serde(default)]
    depends: Vec<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default, rename = "fn")]
    file_name: Option<String>,
    #[serde(default)]
    sha256: Option<String>,
    #[serde(default)]
    md5: Option<String>,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    package_tarball_full_path: Option<String>,
}

/// Origin fields of a record, consumed by provenance resolution.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordSource {
    pub url: Option<String>,
    pub channel: Option<String>,
    pub file_name: Option<String>,
    pub sha256: Option<String>,
    pub md5: Option<String>,
    pub size: Option<u64>,
    /// Local path of the downloaded payload, when the installer kept it.
    pub payload_path: Option<PathBuf>,
}

/// One parsed installation record: package identity plus origin fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixRecord {
    pub record: PackageRecord,
    pub source: RecordSource,
}

/// Parse one record file. `file_name` is only used to attribute errors.
pub fn parse_record(file_name: &str, content: &str) -> Result<PrefixRecord, PrefixError> {
    let raw: RawRecord = serde_json::from_str(content).map_err(|e| PrefixError::CorruptRecord {
        record: file_name.to_owned(),
        detail: e.to_string(),
    })?;

    if raw.name.trim().is_empty() {
        return Err(PrefixError::CorruptRecord {
            record: file_name.to_owned(),
            detail: "empty package name".to_owned(),
        });
    }
    if raw.version.trim().is_empty() {
        return Err(PrefixError::CorruptRecord {
            record: file_name.to_owned(),
            detail: "empty package version".to_owned(),
        });
    }

    // Records from before per-platform subdirectories carry no subdir;
    // treat them like architecture-independent packages.
    let platform = raw
        .subdir
        .filter(|s| !s.is_empty())
        .map_or_else(|| Platform::new(Platform::NOARCH), Platform::new);

    Ok(PrefixRecord {
        record: PackageRecord {
            name: raw.name.into(),
            version: raw.version,
            build: raw.build,
            platform,
            depends: raw.depends,
        },
        source: RecordSource {
            url: raw.url,
            channel: raw.channel,
            file_name: raw.file_name,
            sha256: raw.sha256,
            md5: raw.md5,
            size: raw.size,
            payload_path: raw.package_tarball_full_path.map(PathBuf::from),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_RECORD: &str = r#"{
        "name": "openssl",
        "version": "3.1.4",
        "build": "hd590300_0",
        "build_number": 0,
        "subdir": "linux-64",
        "depends": ["ca-certificates", "libgcc-ng >=12"],
        "url": "https://conda.anaconda.org/conda-forge/linux-64/openssl-3.1.4-hd590300_0.conda",
        "channel": "https://conda.anaconda.org/conda-forge",
        "fn": "openssl-3.1.4-hd590300_0.conda",
        "sha256": "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
        "md5": "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb",
        "size": 2862719,
        "package_tarball_full_path": "/opt/pkgs/openssl-3.1.4-hd590300_0.conda",
        "license": "Apache-2.0",
        "files": ["lib/libssl.so.3"]
    }"#;

    #[test]
    fn full_record_parses() {
        let rec = parse_record("openssl.json", FULL_RECORD).unwrap();
        assert_eq!(rec.record.name.as_str(), "openssl");
        assert_eq!(rec.record.version, "3.1.4");
        assert_eq!(rec.record.build, "hd590300_0");
        assert_eq!(rec.record.platform.as_str(), "linux-64");
        assert_eq!(rec.record.depends.len(), 2);
        assert_eq!(rec.source.size, Some(2_862_719));
        assert_eq!(
            rec.source.payload_path.as_deref(),
            Some(std::path::Path::new(
                "/opt/pkgs/openssl-3.1.4-hd590300_0.conda"
            ))
        );
    }

    #[test]
    fn unknown_fields_are_tolerated() {
        let content = r#"{"name": "a", "version": "1", "build": "0",
            "subdir": "noarch", "some_future_field": {"nested": true}}"#;
        let rec = parse_record("a.json", content).unwrap();
        assert!(rec.record.platform.is_noarch());
    }

    #[test]
    fn minimal_record_parses_with_defaults() {
        let content = r#"{"name": "tiny", "version": "0.1", "build": "py_0"}"#;
        let rec = parse_record("tiny.json", content).unwrap();
        assert!(rec.record.platform.is_noarch());
        assert!(rec.record.depends.is_empty());
        assert_eq!(rec.source, RecordSource::default());
    }

    #[test]
    fn invalid_json_is_corrupt() {
        let err = parse_record("broken.json", "{ not json").unwrap_err();
        match err {
            PrefixError::CorruptRecord { record, .. } => assert_eq!(record, "broken.json"),
            other => panic!("expected CorruptRecord, got {other:?}"),
        }
    }

    #[test]
    fn missing_name_is_corrupt() {
        let err = parse_record("x.json", r#"{"version": "1", "build": "0"}"#).unwrap_err();
        assert!(matches!(err, PrefixError::CorruptRecord { .. }));
    }

    #[test]
    fn empty_name_is_corrupt() {
        let err =
            parse_record("x.json", r#"{"name": " ", "version": "1", "build": "0"}"#).unwrap_err();
        match err {
            PrefixError::CorruptRecord { detail, .. } => {
                assert!(detail.contains("empty package name"));
            }
            other => panic!("expected CorruptRecord, got {other:?}"),
        }
    }

    #[test]
    fn empty_version_is_corrupt() {
        let err =
            parse_record("x.json", r#"{"name": "a", "version": "", "build": "0"}"#).unwrap_err();
        assert!(matches!(err, PrefixError::CorruptRecord { .. }));
    }

    #[test]
    fn empty_subdir_treated_as_noarch() {
        let content = r#"{"name": "a", "version": "1", "build": "0", "subdir": ""}"#;
        let rec = parse_record("a.json", content).unwrap();
        assert!(rec.record.platform.is_noarch());
    }
}
