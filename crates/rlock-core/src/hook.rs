use std::path::{Path, PathBuf};

use rlock_prefix::META_DIR;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::concurrency::WriteGuard;
use crate::engine::{lock_prefix_to_file, LockOptions};
use crate::EngineError;

/// Lock file name used when the settings do not pick one.
pub const DEFAULT_LOCK_FILE_NAME: &str = "rlock.lock";

/// Hook behavior, loaded from a small TOML file. Unknown keys are
/// ignored and missing keys fall back to the defaults, so old settings
/// files keep working.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HookSettings {
    /// Whether the post-command hook locks at all.
    pub auto_lock: bool,
    /// File name of the lock document, created inside the prefix.
    pub lock_file_name: String,
}

impl Default for HookSettings {
    fn default() -> Self {
        Self {
            auto_lock: true,
            lock_file_name: DEFAULT_LOCK_FILE_NAME.to_owned(),
        }
    }
}

impl HookSettings {
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| EngineError::Settings(format!("invalid hook settings: {e}")))
    }

    /// Like [`HookSettings::load`], but a missing file means defaults. A
    /// present but unparseable file stays an error; ignoring it would
    /// switch off locking without a trace.
    pub fn load_or_default(path: &Path) -> Result<Self, EngineError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content)
                .map_err(|e| EngineError::Settings(format!("invalid hook settings: {e}"))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(EngineError::Io(e)),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), EngineError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| EngineError::Settings(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// What the post-command hook did, for logging and JSON reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    /// Auto-locking is switched off in the settings.
    Disabled,
    /// The command left no prefix behind, e.g. the environment was removed.
    SkippedMissingPrefix,
    /// Another writer holds the guard for this lock file.
    SkippedBusy,
    /// Lock file refreshed.
    Locked { path: PathBuf, packages: usize },
    /// The run failed; the failure lives here and in the log, never in
    /// the host command's exit status.
    Failed { error: String },
}

/// Refresh `<prefix>/<lock file>` after an installer transaction.
///
/// Hooks run inside someone else's command, so this never fails the host:
/// every failure is logged and folded into the returned [`HookOutcome`].
pub fn run_post_command(settings: &HookSettings, prefix: &Path) -> HookOutcome {
    if !settings.auto_lock {
        debug!("auto-lock disabled; skipping {}", prefix.display());
        return HookOutcome::Disabled;
    }
    if !prefix.join(META_DIR).is_dir() {
        debug!("no {META_DIR} under {}; nothing to lock", prefix.display());
        return HookOutcome::SkippedMissingPrefix;
    }

    let out_path = prefix.join(&settings.lock_file_name);
    let _guard = match WriteGuard::try_acquire(&out_path) {
        Ok(Some(guard)) => guard,
        Ok(None) => {
            debug!("another writer holds {}; skipping", out_path.display());
            return HookOutcome::SkippedBusy;
        }
        Err(e) => {
            warn!("post-command lock skipped: {e}");
            return HookOutcome::Failed {
                error: e.to_string(),
            };
        }
    };

    match lock_prefix_to_file(prefix, &out_path, &LockOptions::default()) {
        Ok(outcome) => {
            info!("refreshed {} after installer transaction", out_path.display());
            HookOutcome::Locked {
                path: out_path,
                packages: outcome.document.package_count(),
            }
        }
        Err(e) => {
            warn!("post-command lock failed for {}: {e}", prefix.display());
            HookOutcome::Failed {
                error: e.to_string(),
            }
        }
    }
}
