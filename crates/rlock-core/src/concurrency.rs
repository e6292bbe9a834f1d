use crate::EngineError;
use fs2::FileExt;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Guard file used to serialize writers of `target`: the same path with
/// `.guard` appended to the file name.
pub fn guard_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map_or_else(|| OsString::from("rlock.lock"), ToOwned::to_owned);
    name.push(".guard");
    target.with_file_name(name)
}

/// Exclusive advisory lock serializing writers of one output path.
///
/// The lock lives in a sibling guard file rather than on the output
/// itself, because the output is replaced by rename on every write and a
/// lock on a replaced inode protects nothing. Released on drop; the guard
/// file is left behind, which is harmless.
pub struct WriteGuard {
    guard_file: File,
}

impl WriteGuard {
    /// Block until the guard for `target` is held.
    pub fn acquire(target: &Path) -> Result<Self, EngineError> {
        let file = Self::open_guard(target)?;
        file.lock_exclusive()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::WouldBlock, e))
            .map_err(EngineError::Io)?;
        Ok(Self { guard_file: file })
    }

    /// Take the guard for `target` if nobody holds it, without blocking.
    pub fn try_acquire(target: &Path) -> Result<Option<Self>, EngineError> {
        let file = Self::open_guard(target)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { guard_file: file })),
            Err(_) => Ok(None),
        }
    }

    fn open_guard(target: &Path) -> Result<File, EngineError> {
        let path = guard_path(target);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(EngineError::Io)?;
            }
        }
        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(EngineError::Io)
    }
}

impl Drop for WriteGuard {
    fn drop(&mut self) {
        let _ = self.guard_file.unlock();
    }
}
