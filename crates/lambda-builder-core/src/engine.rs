use crate::artifact::extract_artifact;
use crate::concurrency::WorkdirLock;
use crate::executor::ContainerExecutor;
use crate::handler::{resolve_handler, write_procfile};
use crate::image::RunImageBuilder;
use crate::registry::BuilderRegistry;
use crate::variants::LanguageVariant;
use crate::CoreError;
use lambda_builder_runtime::ContainerEngine;
use lambda_builder_schema::{read_manifest, BuildConfig, PROCFILE_NAME};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// AWS Lambda rejects direct zip uploads at or above this size.
pub const ZIP_SIZE_LIMIT: u64 = 50 * 1024 * 1024;

/// Outcome of a successful build.
#[derive(Debug, Clone, Serialize)]
pub struct BuildResult {
    pub identifier: String,
    pub builder: String,
    pub build_image: String,
    pub run_image: String,
    pub artifact: PathBuf,
    pub artifact_size: u64,
    /// Empty when no handler was given or found.
    pub handler: String,
    pub procfile_written: bool,
    /// Tag of the run image, when one was generated.
    pub image: Option<String>,
}

impl BuildResult {
    pub fn exceeds_zip_limit(&self) -> bool {
        self.artifact_size >= ZIP_SIZE_LIMIT
    }
}

/// The build pipeline: detect, build in a container, extract, resolve the
/// handler, write the `Procfile` and optionally commit a run image.
pub struct Pipeline {
    engine: Box<dyn ContainerEngine>,
}

impl Pipeline {
    pub fn new(engine: Box<dyn ContainerEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &dyn ContainerEngine {
        self.engine.as_ref()
    }

    /// Select the variant for `config` without building anything.
    pub fn detect(&self, config: &BuildConfig) -> Result<LanguageVariant, CoreError> {
        let manifest = read_manifest(&config.working_directory)?;
        BuilderRegistry::new(config, &manifest)?.select(config, &manifest)
    }

    pub fn build(&self, config: BuildConfig) -> Result<BuildResult, CoreError> {
        let _lock = WorkdirLock::try_acquire(&config.working_directory)?;

        let artifact = config.artifact_path();
        remove_stale_artifact(&artifact)?;

        let variant = self.detect(&config)?;
        let config = config.with_handler_map(variant.handler_map());

        ContainerExecutor::new(self.engine()).run(&variant, &config)?;

        let artifact_size = fs::metadata(&artifact)
            .map_err(|e| CoreError::ArtifactExtraction {
                path: artifact.clone(),
                message: format!("build produced no archive: {e}"),
            })?
            .len();
        info!("wrote {} ({artifact_size} bytes)", artifact.display());

        let build_dir = tempfile::Builder::new()
            .prefix("lambda-builder-")
            .tempdir()?;
        extract_artifact(&artifact, build_dir.path())?;

        let handler = resolve_handler(build_dir.path(), &config);
        let procfile_written = config.write_procfile
            && write_procfiles(&handler, build_dir.path(), &config.working_directory)?;

        let image = if config.generate_run_image {
            let tag = RunImageBuilder::new(self.engine()).build(
                &handler,
                build_dir.path(),
                &variant,
                &config,
            )?;
            Some(tag)
        } else {
            None
        };

        Ok(BuildResult {
            identifier: config.identifier.to_string(),
            builder: variant.name().to_owned(),
            build_image: variant.build_image().to_owned(),
            run_image: variant.run_image().to_owned(),
            artifact,
            artifact_size,
            handler,
            procfile_written,
            image,
        })
    }
}

/// A `lambda.zip` left by an earlier run must never be mistaken for this
/// run's output.
fn remove_stale_artifact(path: &Path) -> Result<(), CoreError> {
    match fs::remove_file(path) {
        Ok(()) => {
            warn!("removing existing {} from working directory", path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Write the `Procfile` into both the working directory and the build
/// directory. A `Procfile` shipped inside the build is left alone, and an
/// empty handler writes nothing. Returns whether anything was written.
fn write_procfiles(
    handler: &str,
    build_dir: &Path,
    working_directory: &Path,
) -> Result<bool, CoreError> {
    if build_dir.join(PROCFILE_NAME).exists() {
        info!("build contains a Procfile, not overwriting it");
        return Ok(false);
    }
    if handler.is_empty() {
        warn!("unable to detect handler in build directory, skipping Procfile");
        return Ok(false);
    }
    info!("writing Procfile from handler: {handler}");
    write_procfile(handler, working_directory)?;
    write_procfile(handler, build_dir)?;
    Ok(true)
}
