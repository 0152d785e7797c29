use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the optional per-project manifest.
pub const MANIFEST_FILE: &str = "lambda.yml";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse manifest {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Per-project overrides for builder selection and images.
///
/// Every field is optional; an absent manifest is equivalent to
/// `ProjectManifest::default()`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ProjectManifest {
    #[serde(default)]
    pub builder: Option<String>,
    #[serde(default)]
    pub build_image: Option<String>,
    #[serde(default)]
    pub run_image: Option<String>,
}

impl ProjectManifest {
    pub fn builder(&self) -> Option<&str> {
        non_empty(self.builder.as_deref())
    }

    pub fn build_image(&self) -> Option<&str> {
        non_empty(self.build_image.as_deref())
    }

    pub fn run_image(&self) -> Option<&str> {
        non_empty(self.run_image.as_deref())
    }
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub fn parse_manifest_str(input: &str) -> Result<ProjectManifest, serde_yaml::Error> {
    if input.trim().is_empty() {
        return Ok(ProjectManifest::default());
    }
    serde_yaml::from_str(input)
}

/// Read `lambda.yml` from `directory`.
///
/// A missing file is not an error and yields an empty manifest; a file that
/// exists but cannot be read or parsed is.
pub fn read_manifest(directory: impl AsRef<Path>) -> Result<ProjectManifest, ManifestError> {
    let path = directory.as_ref().join(MANIFEST_FILE);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(ProjectManifest::default()),
        Err(source) => return Err(ManifestError::Io { path, source }),
    };
    parse_manifest_str(&content).map_err(|source| ManifestError::Parse { path, source })
}
