//! Builder detection and build orchestration for lambda-builder.
//!
//! This crate ties together the configuration and manifest layer and the
//! container engine into the `Pipeline`: it selects a language variant for a
//! project, renders and runs that variant's build script inside a container,
//! extracts the resulting `lambda.zip`, infers the function handler, writes a
//! `Procfile` and optionally commits a runnable image.

pub mod artifact;
pub mod cleanup;
pub mod concurrency;
pub mod engine;
pub mod executor;
pub mod handler;
pub mod image;
pub mod registry;
pub mod script;
pub mod variants;
pub mod version;

pub use artifact::extract_artifact;
pub use concurrency::{install_signal_handler, shutdown_requested, WorkdirLock};
pub use engine::{BuildResult, Pipeline, ZIP_SIZE_LIMIT};
pub use executor::ContainerExecutor;
pub use handler::{resolve_handler, write_procfile};
pub use image::RunImageBuilder;
pub use registry::BuilderRegistry;
pub use script::{PackageTarget, ScriptParams};
pub use variants::LanguageVariant;
pub use version::{resolve_python_version, VersionError, SUPPORTED_PYTHON_VERSIONS};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(#[from] lambda_builder_schema::ConfigError),
    #[error("manifest error: {0}")]
    Manifest(#[from] lambda_builder_schema::ManifestError),
    #[error("no builder detected{}", requested.as_ref().map(|n| format!(" (requested '{n}')")).unwrap_or_default())]
    NoBuilderDetected { requested: Option<String> },
    #[error("version resolution error: {0}")]
    Version(#[from] VersionError),
    #[error("build failed: {message}")]
    BuildExecution {
        exit_code: Option<i32>,
        message: String,
    },
    #[error("failed to extract {}: {message}", path.display())]
    ArtifactExtraction { path: PathBuf, message: String },
    #[error("image build failed for {tag}, exit code {}", exit_code.map_or_else(|| "unknown".to_owned(), |c| c.to_string()))]
    ImageBuild { tag: String, exit_code: Option<i32> },
    #[error("another build is already running in {}", .0.display())]
    Locked(PathBuf),
    #[error("runtime error: {0}")]
    Runtime(#[from] lambda_builder_runtime::RuntimeError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    pub(crate) fn build_failed(exit_code: Option<i32>) -> Self {
        let message = match exit_code {
            Some(code) => format!("build container exited with code {code}"),
            None => "build container was terminated by a signal".to_owned(),
        };
        Self::BuildExecution { exit_code, message }
    }
}
