use crate::manifest::non_empty;
use crate::types::{BuildId, HandlerMap};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("working directory '{}' does not exist or is not a directory", .0.display())]
    InvalidWorkingDirectory(PathBuf),
    #[error("invalid environment assignment '{0}', expected KEY=VALUE")]
    InvalidEnvAssignment(String),
    #[error("unknown build strategy '{0}', expected 'container' or 'image'")]
    UnknownStrategy(String),
}

/// How the build script reaches the build image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStrategy {
    /// One auto-removed container with the working directory mounted.
    #[default]
    Container,
    /// Bake the sources into a transient build-stage image, then copy the
    /// artifact out with an extractor container.
    Image,
}

impl FromStr for BuildStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "container" => Ok(Self::Container),
            "image" => Ok(Self::Image),
            other => Err(ConfigError::UnknownStrategy(other.to_owned())),
        }
    }
}

impl fmt::Display for BuildStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Container => f.write_str("container"),
            Self::Image => f.write_str("image"),
        }
    }
}

/// Raw caller-supplied settings, before validation and defaulting.
#[derive(Debug, Clone, Default)]
pub struct BuildOverrides {
    pub build_env: Vec<String>,
    pub builder: Option<String>,
    pub build_image: Option<String>,
    pub run_image: Option<String>,
    pub generate_run_image: bool,
    pub handler: Option<String>,
    pub image_env: Vec<String>,
    pub image_labels: Vec<String>,
    pub image_tag: Option<String>,
    pub port: Option<u16>,
    pub quiet: bool,
    pub working_directory: PathBuf,
    pub write_procfile: bool,
    pub strategy: BuildStrategy,
    pub build_timeout: Option<Duration>,
}

/// The effective configuration threaded through one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct BuildConfig {
    pub build_env: Vec<String>,
    pub builder: Option<String>,
    pub build_image: Option<String>,
    pub run_image: Option<String>,
    pub generate_run_image: bool,
    pub handler: Option<String>,
    pub handler_map: HandlerMap,
    pub identifier: BuildId,
    pub image_env: Vec<String>,
    pub image_labels: Vec<String>,
    pub image_tag: Option<String>,
    /// Listen port baked into the run image; `None` leaves it unset.
    pub port: Option<u16>,
    pub quiet: bool,
    pub working_directory: PathBuf,
    pub write_procfile: bool,
    pub strategy: BuildStrategy,
    pub build_timeout: Option<Duration>,
}

impl BuildConfig {
    /// Validate `overrides` and produce a config with a fresh build identifier.
    pub fn resolve(overrides: BuildOverrides) -> Result<Self, ConfigError> {
        let working_directory = absolute_directory(&overrides.working_directory)?;

        for assignment in overrides.build_env.iter().chain(&overrides.image_env) {
            validate_env_assignment(assignment)?;
        }

        Ok(Self {
            build_env: overrides.build_env,
            builder: owned_non_empty(overrides.builder),
            build_image: owned_non_empty(overrides.build_image),
            run_image: owned_non_empty(overrides.run_image),
            generate_run_image: overrides.generate_run_image,
            handler: owned_non_empty(overrides.handler),
            handler_map: HandlerMap::new(),
            identifier: BuildId::generate(),
            image_env: overrides.image_env,
            image_labels: overrides.image_labels,
            image_tag: owned_non_empty(overrides.image_tag),
            port: overrides.port,
            quiet: overrides.quiet,
            working_directory,
            write_procfile: overrides.write_procfile,
            strategy: overrides.strategy,
            build_timeout: overrides.build_timeout,
        })
    }

    /// Explicit tag, else `lambda-builder/<working-dir-name>:latest`.
    pub fn image_tag(&self) -> String {
        if let Some(tag) = &self.image_tag {
            return tag.clone();
        }
        let app_name = self
            .working_directory
            .file_name()
            .map_or_else(|| "app".to_owned(), |n| n.to_string_lossy().to_lowercase());
        format!("lambda-builder/{app_name}:latest")
    }

    /// Tag of the transient image used by the image build strategy. Keyed by
    /// the build identifier so concurrent builds on one daemon never share it.
    pub fn build_stage_tag(&self) -> String {
        format!("lambda-builder-build:{}", self.identifier)
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.working_directory.join(crate::ARTIFACT_NAME)
    }

    pub fn with_handler_map(mut self, handler_map: HandlerMap) -> Self {
        self.handler_map = handler_map;
        self
    }
}

fn owned_non_empty(value: Option<String>) -> Option<String> {
    non_empty(value.as_deref()).map(str::to_owned)
}

fn absolute_directory(path: &Path) -> Result<PathBuf, ConfigError> {
    let invalid = || ConfigError::InvalidWorkingDirectory(path.to_path_buf());
    let absolute = std::path::absolute(path).map_err(|_| invalid())?;
    if absolute.is_dir() {
        Ok(absolute)
    } else {
        Err(invalid())
    }
}

fn validate_env_assignment(assignment: &str) -> Result<(), ConfigError> {
    match assignment.split_once('=') {
        // Whitespace would split the key when rendered into a Dockerfile ENV.
        Some((key, _)) if !key.is_empty() && !key.contains(char::is_whitespace) => Ok(()),
        _ => Err(ConfigError::InvalidEnvAssignment(assignment.to_owned())),
    }
}
