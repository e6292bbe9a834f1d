use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::Path;

/// Streaming sha256 of a file, as a lowercase hex string.
pub fn file_sha256(path: &Path) -> io::Result<String> {
    let file = fs::File::open(path)?;
    let mut reader = io::BufReader::new(file);
    let mut hasher = Sha256::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Size of a file in bytes.
pub fn file_size(path: &Path) -> io::Result<u64> {
    Ok(fs::metadata(path)?.len())
}
