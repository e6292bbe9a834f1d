use super::{json_pretty, EXIT_FAILURE, EXIT_SUCCESS};
use console::Style;
use rlock_schema::LockDocument;
use std::path::Path;

pub fn run(file: &Path, json: bool) -> Result<u8, String> {
    match LockDocument::verify_file(file) {
        Ok(document) => {
            if json {
                let payload = serde_json::json!({
                    "file": file.display().to_string(),
                    "status": "ok",
                    "version": document.version,
                    "packages": document.package_count(),
                });
                println!("{}", json_pretty(&payload)?);
            } else {
                let ok = Style::new().green().apply_to("ok");
                println!(
                    "{}: {ok} ({} packages)",
                    file.display(),
                    document.package_count()
                );
            }
            Ok(EXIT_SUCCESS)
        }
        Err(e) => {
            if json {
                let payload = serde_json::json!({
                    "file": file.display().to_string(),
                    "status": "failed",
                    "error": e.to_string(),
                });
                println!("{}", json_pretty(&payload)?);
            } else {
                let failed = Style::new().red().bold().apply_to("failed");
                println!("{}: {failed}", file.display());
                println!("  {e}");
            }
            Ok(EXIT_FAILURE)
        }
    }
}
