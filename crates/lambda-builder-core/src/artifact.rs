use crate::CoreError;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Unpack the archive at `archive_path` into `destination`, preserving
/// relative paths and unix modes. Returns the number of files written.
///
/// Entries whose names would escape `destination` are rejected.
pub fn extract_artifact(archive_path: &Path, destination: &Path) -> Result<usize, CoreError> {
    let fail = |message: String| CoreError::ArtifactExtraction {
        path: archive_path.to_path_buf(),
        message,
    };

    let file = File::open(archive_path).map_err(|e| fail(e.to_string()))?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))
        .map_err(|e| fail(format!("not a zip archive: {e}")))?;

    let mut written = 0;
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| fail(format!("unreadable entry {i}: {e}")))?;
        let relative = entry
            .enclosed_name()
            .ok_or_else(|| fail(format!("entry '{}' escapes the destination", entry.name())))?;
        let dest_path = destination.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&dest_path).map_err(|e| fail(e.to_string()))?;
            continue;
        }

        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent).map_err(|e| fail(e.to_string()))?;
        }
        let mut out = File::create(&dest_path).map_err(|e| fail(e.to_string()))?;
        std::io::copy(&mut entry, &mut out)
            .map_err(|e| fail(format!("{}: {e}", dest_path.display())))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                fs::set_permissions(&dest_path, fs::Permissions::from_mode(mode & 0o7777))
                    .map_err(|e| fail(e.to_string()))?;
            }
        }
        written += 1;
    }

    debug!(
        "extracted {written} files from {} into {}",
        archive_path.display(),
        destination.display()
    );
    Ok(written)
}
