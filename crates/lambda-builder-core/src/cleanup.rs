//! Scoped guards for everything a build creates outside its temp directory.
//!
//! Each guard releases its resource on drop, so early returns and panics clean
//! up the same way a successful build does. Removal is best-effort: failures
//! are logged and never replace the error that caused the unwind.

use lambda_builder_runtime::ContainerEngine;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A generated file that must not outlive the build, such as the build script
/// written into the working directory.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub fn create(path: impl Into<PathBuf>, contents: &str) -> io::Result<Self> {
        let path = path.into();
        fs::write(&path, contents)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("failed to remove {}: {e}", self.path.display()),
        }
    }
}

/// A build-stage image removed once the artifact is out of it.
pub struct TransientImage<'a> {
    engine: &'a dyn ContainerEngine,
    tag: String,
}

impl<'a> TransientImage<'a> {
    pub fn new(engine: &'a dyn ContainerEngine, tag: impl Into<String>) -> Self {
        Self {
            engine,
            tag: tag.into(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl Drop for TransientImage<'_> {
    fn drop(&mut self) {
        debug!("removing build image {}", self.tag);
        if let Err(e) = self.engine.remove_image(&self.tag) {
            warn!("failed to remove build image {}: {e}", self.tag);
        }
    }
}

/// A named container that normally removes itself (`--rm`). If the run does
/// not finish normally the guard force-removes whatever is left.
pub struct TransientContainer<'a> {
    engine: &'a dyn ContainerEngine,
    name: String,
    armed: bool,
}

impl<'a> TransientContainer<'a> {
    pub fn new(engine: &'a dyn ContainerEngine, name: impl Into<String>) -> Self {
        Self {
            engine,
            name: name.into(),
            armed: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The container exited on its own and `--rm` took care of it.
    pub fn finished(mut self) {
        self.armed = false;
    }
}

impl Drop for TransientContainer<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(e) = self.engine.remove_container(&self.name) {
            debug!("no leftover container {}: {e}", self.name);
        }
    }
}
