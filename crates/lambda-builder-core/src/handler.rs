use crate::CoreError;
use lambda_builder_schema::{BuildConfig, PROCFILE_NAME};
use std::fs;
use std::path::Path;
use tracing::debug;

/// The function entrypoint for an extracted build.
///
/// An explicit handler always wins. Otherwise the first handler-map file
/// present directly in `extracted_dir` decides; no match yields an empty
/// string, which callers treat as "unknown" rather than an error.
pub fn resolve_handler(extracted_dir: &Path, config: &BuildConfig) -> String {
    if let Some(handler) = &config.handler {
        return handler.clone();
    }
    config
        .handler_map
        .iter()
        .find(|(file, _)| extracted_dir.join(file).exists())
        .map(|(file, handler)| {
            debug!("handler {handler} inferred from {file}");
            handler.to_owned()
        })
        .unwrap_or_default()
}

/// Write `web: <handler>` to `directory/Procfile`, replacing any existing one.
pub fn write_procfile(handler: &str, directory: &Path) -> Result<(), CoreError> {
    fs::write(directory.join(PROCFILE_NAME), format!("web: {handler}\n"))?;
    Ok(())
}
