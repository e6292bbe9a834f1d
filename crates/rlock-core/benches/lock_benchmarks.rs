use criterion::{criterion_group, criterion_main, Criterion};
use std::fs;
use std::path::Path;

use rlock_core::{canonical_sort, lock_prefix, lock_prefix_to_file, LockOptions};
use rlock_schema::{
    LockDocument, LockTarget, PackageHash, PackageName, PackageRecord, Platform, ProvenanceInfo,
    ResolvedPackage,
};

const DIGEST: &str = "dddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddd";

fn populate_prefix(prefix: &Path, packages: usize) {
    let meta = prefix.join("conda-meta");
    fs::create_dir_all(&meta).unwrap();
    for i in 0..packages {
        // Chain dependencies so resolution exercises edge validation.
        let depends = if i == 0 {
            String::new()
        } else {
            format!("\"pkg-{:03} >=1.0\"", i - 1)
        };
        let content = format!(
            r#"{{
  "name": "pkg-{i:03}",
  "version": "1.0.{i}",
  "build": "h{i:03}_0",
  "subdir": "linux-64",
  "depends": [{depends}],
  "url": "https://conda.anaconda.org/conda-forge/linux-64/pkg-{i:03}-1.0.{i}-h{i:03}_0.conda",
  "channel": "https://conda.anaconda.org/conda-forge",
  "sha256": "{DIGEST}",
  "size": 4096
}}"#
        );
        fs::write(meta.join(format!("pkg-{i:03}.json")), content).unwrap();
    }
}

fn shuffled_target(entries: usize) -> LockTarget {
    let mut target = LockTarget::new(Platform::new("linux-64"));
    // Reverse insertion order so the sort has real work to do.
    target.packages = (0..entries)
        .rev()
        .map(|i| ResolvedPackage {
            record: PackageRecord {
                name: PackageName::from(format!("pkg-{i:04}")),
                version: format!("1.0.{i}"),
                build: "0".to_owned(),
                platform: Platform::new("linux-64"),
                depends: Vec::new(),
            },
            provenance: ProvenanceInfo {
                url: format!("https://example.invalid/linux-64/pkg-{i:04}.conda"),
                hash: PackageHash::sha256(DIGEST),
                size: None,
                depends: Vec::new(),
            },
        })
        .collect();
    target
}

fn bench_lock_pipeline(c: &mut Criterion) {
    c.bench_function("lock_prefix_100pkg", |b| {
        b.iter_with_setup(
            || {
                let prefix = tempfile::tempdir().unwrap();
                populate_prefix(prefix.path(), 100);
                prefix
            },
            |prefix| {
                lock_prefix(prefix.path(), &LockOptions::default()).unwrap();
            },
        );
    });
}

fn bench_lock_to_file(c: &mut Criterion) {
    c.bench_function("lock_prefix_to_file_100pkg", |b| {
        b.iter_with_setup(
            || {
                let prefix = tempfile::tempdir().unwrap();
                populate_prefix(prefix.path(), 100);
                prefix
            },
            |prefix| {
                let out = prefix.path().join("rlock.lock");
                lock_prefix_to_file(prefix.path(), &out, &LockOptions::default()).unwrap();
            },
        );
    });
}

fn bench_canonical_sort(c: &mut Criterion) {
    c.bench_function("canonical_sort_1000entries", |b| {
        b.iter_with_setup(
            || shuffled_target(1000),
            |mut target| {
                canonical_sort(&mut target);
            },
        );
    });
}

fn bench_verify_file(c: &mut Criterion) {
    c.bench_function("verify_file_100pkg", |b| {
        b.iter_with_setup(
            || {
                let prefix = tempfile::tempdir().unwrap();
                populate_prefix(prefix.path(), 100);
                let out = prefix.path().join("rlock.lock");
                lock_prefix_to_file(prefix.path(), &out, &LockOptions::default()).unwrap();
                (prefix, out)
            },
            |(_prefix, out)| {
                LockDocument::verify_file(&out).unwrap();
            },
        );
    });
}

criterion_group!(
    benches,
    bench_lock_pipeline,
    bench_lock_to_file,
    bench_canonical_sort,
    bench_verify_file,
);
criterion_main!(benches);
