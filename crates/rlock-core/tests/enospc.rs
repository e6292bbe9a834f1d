//! True disk-full (ENOSPC) simulation tests for the atomic lock write.
//!
//! These tests mount a tiny tmpfs to trigger real ENOSPC conditions.
//! They require root (or equivalent) to mount tmpfs, so they are ignored
//! by default and run in CI with: `sudo -E cargo test --test enospc -- --ignored`

use std::path::{Path, PathBuf};
use std::process::Command;

use rlock_core::{lock_prefix_to_file, EngineError, LockOptions};
use rlock_schema::{LockDocument, LockError};

const DIGEST: &str = "dddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddd";

/// Mount a tmpfs of the given size (in KB) at `path`.
/// Returns true if successful. Requires root.
fn mount_tiny_tmpfs(path: &Path, size_kb: u64) -> bool {
    std::fs::create_dir_all(path).unwrap();
    let status = Command::new("mount")
        .args(["-t", "tmpfs", "-o", &format!("size={size_kb}k"), "tmpfs"])
        .arg(path)
        .status();
    matches!(status, Ok(s) if s.success())
}

/// Unmount the tmpfs at `path`.
fn unmount(path: &Path) {
    let _ = Command::new("umount").arg(path).status();
}

/// RAII guard that unmounts on drop.
struct TmpfsGuard {
    path: PathBuf,
}

impl TmpfsGuard {
    fn mount(path: &Path, size_kb: u64) -> Option<Self> {
        if mount_tiny_tmpfs(path, size_kb) {
            Some(Self {
                path: path.to_path_buf(),
            })
        } else {
            None
        }
    }
}

impl Drop for TmpfsGuard {
    fn drop(&mut self) {
        unmount(&self.path);
    }
}

fn write_record(prefix: &Path, name: &str, version: &str, build: &str) {
    let meta = prefix.join("conda-meta");
    std::fs::create_dir_all(&meta).unwrap();
    let content = format!(
        r#"{{
  "name": "{name}",
  "version": "{version}",
  "build": "{build}",
  "subdir": "linux-64",
  "depends": [],
  "url": "https://conda.anaconda.org/conda-forge/linux-64/{name}-{version}-{build}.conda",
  "channel": "https://conda.anaconda.org/conda-forge",
  "fn": "{name}-{version}-{build}.conda",
  "sha256": "{DIGEST}",
  "size": 4096
}}"#
    );
    std::fs::write(meta.join(format!("{name}-{version}-{build}.json")), content).unwrap();
}

/// Names of entries under `dir` that match neither the fillers nor `keep`.
fn unexpected_entries(dir: &Path, keep: &[&str]) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(Result::ok)
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| !name.starts_with("filler_") && !keep.contains(&name.as_str()))
        .collect()
}

#[test]
#[ignore = "requires root for tmpfs mount"]
fn enospc_lock_write_fails_cleanly() {
    let base = tempfile::tempdir().unwrap();
    let mount_point = base.path().join("tiny");
    let _guard = TmpfsGuard::mount(&mount_point, 8)
        .expect("failed to mount tmpfs — are you running as root?");

    // Prefix lives outside the tmpfs; only the destination is constrained.
    write_record(base.path(), "alpha", "1.0", "0");

    // Fill the tmpfs
    for i in 0..200 {
        let path = mount_point.join(format!("filler_{i}"));
        if std::fs::write(&path, [0u8; 256]).is_err() {
            break;
        }
    }

    let out = mount_point.join("rlock.lock");
    let result = lock_prefix_to_file(base.path(), &out, &LockOptions::default());
    assert!(result.is_err(), "lock write on full disk MUST fail, not panic");
    assert!(
        matches!(
            result.as_ref().unwrap_err(),
            EngineError::Lock(LockError::Io(_))
        ),
        "expected EngineError::Lock(LockError::Io), got: {:?}",
        result.unwrap_err()
    );

    // No partial document and no temp droppings.
    assert!(!out.exists(), "destination must not exist after failed write");
    let leftovers = unexpected_entries(&mount_point, &[]);
    assert!(
        leftovers.is_empty(),
        "no temp files after failed write, found: {leftovers:?}"
    );
}

#[test]
#[ignore = "requires root for tmpfs mount"]
fn enospc_existing_lock_survives_failed_rewrite() {
    let base = tempfile::tempdir().unwrap();
    let mount_point = base.path().join("tiny");
    // 64KB — enough for the first lock, but not for a rewrite once filled
    let _guard = TmpfsGuard::mount(&mount_point, 64)
        .expect("failed to mount tmpfs — are you running as root?");

    write_record(base.path(), "alpha", "1.0", "0");
    let out = mount_point.join("rlock.lock");

    let first = lock_prefix_to_file(base.path(), &out, &LockOptions::default());
    assert!(
        first.is_ok(),
        "first lock on 64KB tmpfs must succeed for the rewrite test to be valid: {:?}",
        first.err()
    );
    let before = std::fs::read(&out).unwrap();

    // Write enough data to fill the disk
    let mut filled = false;
    for i in 0..500 {
        let path = mount_point.join(format!("filler_{i}"));
        if std::fs::write(&path, [0xAB; 1024]).is_err() {
            filled = true;
            break;
        }
    }
    assert!(
        filled,
        "must fill disk before the rewrite — 64KB tmpfs should be exhaustible"
    );

    // The rewrite MUST fail during the write itself, after every earlier
    // stage succeeded.
    write_record(base.path(), "beta", "2.0", "1");
    let rewrite = lock_prefix_to_file(base.path(), &out, &LockOptions::default());
    assert!(rewrite.is_err(), "rewrite on full disk MUST fail, not panic");

    // The previous document survives byte for byte, with no torn write.
    assert_eq!(
        std::fs::read(&out).unwrap(),
        before,
        "destination bytes must be unchanged after failed rewrite"
    );
    LockDocument::verify_file(&out).unwrap();
    let leftovers = unexpected_entries(&mount_point, &["rlock.lock"]);
    assert!(
        leftovers.is_empty(),
        "no temp files after failed rewrite, found: {leftovers:?}"
    );
}

#[test]
#[ignore = "requires root for tmpfs mount"]
fn enospc_lock_recovers_after_freeing_space() {
    let base = tempfile::tempdir().unwrap();
    let mount_point = base.path().join("recov");
    let _guard = TmpfsGuard::mount(&mount_point, 64)
        .expect("failed to mount tmpfs — are you running as root?");

    write_record(base.path(), "alpha", "1.0", "0");
    let out = mount_point.join("rlock.lock");
    lock_prefix_to_file(base.path(), &out, &LockOptions::default()).unwrap();

    let mut fillers = Vec::new();
    for i in 0..500 {
        let path = mount_point.join(format!("filler_{i}"));
        if std::fs::write(&path, [0xAB; 1024]).is_err() {
            break;
        }
        fillers.push(path);
    }

    write_record(base.path(), "beta", "2.0", "1");
    let err_result = lock_prefix_to_file(base.path(), &out, &LockOptions::default());
    assert!(
        err_result.is_err(),
        "64KB tmpfs must be full after filling — test setup invalid if the write succeeds"
    );

    for path in &fillers {
        let _ = std::fs::remove_file(path);
    }

    // Now the rewrite should succeed again and verify end to end
    let recovered = lock_prefix_to_file(base.path(), &out, &LockOptions::default());
    assert!(
        recovered.is_ok(),
        "lock must succeed after freeing space: {:?}",
        recovered.err()
    );
    let document = LockDocument::verify_file(&out).unwrap();
    assert_eq!(document.packages_for("default", "linux-64").unwrap().len(), 2);
}
