//! Configuration and project-manifest layer for lambda-builder.
//!
//! This crate defines the values every pipeline stage reads: the caller's raw
//! `BuildOverrides`, the validated `BuildConfig` (with its per-invocation
//! `BuildId`), the optional `lambda.yml` `ProjectManifest`, the closed
//! `Language` set and the ordered `HandlerMap`.

pub mod config;
pub mod manifest;
pub mod types;

pub use config::{BuildConfig, BuildOverrides, BuildStrategy, ConfigError};
pub use manifest::{parse_manifest_str, read_manifest, ManifestError, ProjectManifest, MANIFEST_FILE};
pub use types::{BuildId, HandlerMap, Language};

/// File name of the archive a successful build leaves in the working directory.
pub const ARTIFACT_NAME: &str = "lambda.zip";

/// File name of the process declaration written next to the artifact.
pub const PROCFILE_NAME: &str = "Procfile";
