use super::{json_pretty, EXIT_SUCCESS};
use rlock_core::{run_post_command, HookOutcome, HookSettings};
use std::path::Path;

/// Always exits 0: a lock failure is reported but must never fail the
/// installer command that triggered the hook.
#[allow(clippy::unnecessary_wraps)]
pub fn run(prefix: &Path, settings_path: Option<&Path>, json: bool) -> Result<u8, String> {
    let settings = match settings_path {
        Some(path) => match HookSettings::load_or_default(path) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("warning: {e}; using default hook settings");
                HookSettings::default()
            }
        },
        None => HookSettings::default(),
    };

    let outcome = run_post_command(&settings, prefix);
    if json {
        let payload = match &outcome {
            HookOutcome::Disabled => serde_json::json!({"status": "disabled"}),
            HookOutcome::SkippedMissingPrefix => {
                serde_json::json!({"status": "skipped", "reason": "missing prefix"})
            }
            HookOutcome::SkippedBusy => {
                serde_json::json!({"status": "skipped", "reason": "another writer is active"})
            }
            HookOutcome::Locked { path, packages } => serde_json::json!({
                "status": "locked",
                "file": path.display().to_string(),
                "packages": packages,
            }),
            HookOutcome::Failed { error } => {
                serde_json::json!({"status": "failed", "error": error})
            }
        };
        match json_pretty(&payload) {
            Ok(rendered) => println!("{rendered}"),
            Err(e) => eprintln!("rlock: {e}"),
        }
    } else {
        match &outcome {
            HookOutcome::Disabled | HookOutcome::SkippedMissingPrefix => {}
            HookOutcome::SkippedBusy => {
                eprintln!("rlock: another writer is active; lock file left as is");
            }
            HookOutcome::Locked { path, packages } => {
                println!("rlock: refreshed {} ({packages} packages)", path.display());
            }
            HookOutcome::Failed { error } => {
                eprintln!("rlock: lock refresh failed: {error}");
            }
        }
    }
    Ok(EXIT_SUCCESS)
}
