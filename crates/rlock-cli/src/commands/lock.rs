use super::{json_pretty, spin_fail, spin_ok, spinner, EXIT_SUCCESS};
use rlock_core::{lock_prefix_to_file, LockOptions, WriteGuard};
use rlock_schema::Platform;
use std::path::Path;

pub fn run(
    prefix: &Path,
    file: &Path,
    environment: &str,
    platform: Option<&str>,
    json: bool,
) -> Result<u8, String> {
    let _guard = WriteGuard::acquire(file).map_err(|e| format!("write guard: {e}"))?;

    let options = LockOptions {
        environment: environment.to_owned(),
        platform: platform.map(Platform::new),
    };

    let pb = if json {
        None
    } else {
        Some(spinner("locking prefix..."))
    };
    let outcome = match lock_prefix_to_file(prefix, file, &options) {
        Ok(outcome) => {
            if let Some(ref pb) = pb {
                spin_ok(pb, "prefix locked");
            }
            outcome
        }
        Err(e) => {
            if let Some(ref pb) = pb {
                spin_fail(pb, "lock failed");
            }
            return Err(e.to_string());
        }
    };

    let packages = outcome.document.package_count();
    let locked_platform = outcome
        .document
        .environments
        .get(environment)
        .and_then(|platforms| platforms.keys().next().cloned())
        .unwrap_or_default();

    if json {
        let payload = serde_json::json!({
            "file": file.display().to_string(),
            "environment": environment,
            "platform": locked_platform,
            "packages": packages,
            "warnings": outcome
                .warnings
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        for warning in &outcome.warnings {
            eprintln!("warning: {warning}");
        }
        println!(
            "locked {packages} packages ({locked_platform}) to {}",
            file.display()
        );
    }
    Ok(EXIT_SUCCESS)
}
