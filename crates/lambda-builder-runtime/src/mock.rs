use crate::engine::{ContainerEngine, ExitReport, ImageBuildSpec, RunSpec};
use crate::RuntimeError;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Mount point the build container sees the working directory at.
const TASK_MOUNT: &str = "/tmp/task";

/// Files the mock never packs into its fake artifact.
const SKIPPED: &[&str] = &["lambda.zip", ".lambda-builder"];

/// One recorded engine call.
#[derive(Debug, Clone)]
pub enum Invocation {
    Run(RunSpec),
    BuildImage {
        spec: ImageBuildSpec,
        /// Dockerfile contents captured at build time, before cleanup removes it.
        dockerfile: String,
    },
    RemoveImage(String),
    RemoveContainer(String),
}

#[derive(Debug)]
struct MockState {
    invocations: Vec<Invocation>,
    run_exit: i32,
    build_exit: i32,
    produce_artifact: bool,
}

/// An in-process engine for tests and `LAMBDA_BUILDER_ENGINE=mock`.
///
/// A successful `run` with the working directory mounted at `/tmp/task` packs
/// that directory into `lambda.zip`, standing in for the build script. Clones
/// share state, so a test can keep a handle while the pipeline owns another.
#[derive(Debug, Clone)]
pub struct MockEngine {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                invocations: Vec::new(),
                run_exit: 0,
                build_exit: 0,
                produce_artifact: true,
            })),
        }
    }
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_run_exit(self, code: i32) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.run_exit = code;
        }
        self
    }

    pub fn with_build_exit(self, code: i32) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.build_exit = code;
        }
        self
    }

    /// Whether a successful run leaves `lambda.zip` behind.
    pub fn with_artifact(self, produce: bool) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.produce_artifact = produce;
        }
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.state
            .lock()
            .map(|s| s.invocations.clone())
            .unwrap_or_default()
    }

    pub fn runs(&self) -> Vec<RunSpec> {
        self.invocations()
            .into_iter()
            .filter_map(|i| match i {
                Invocation::Run(spec) => Some(spec),
                _ => None,
            })
            .collect()
    }

    pub fn image_builds(&self) -> Vec<(ImageBuildSpec, String)> {
        self.invocations()
            .into_iter()
            .filter_map(|i| match i {
                Invocation::BuildImage { spec, dockerfile } => Some((spec, dockerfile)),
                _ => None,
            })
            .collect()
    }

    pub fn removed_images(&self) -> Vec<String> {
        self.invocations()
            .into_iter()
            .filter_map(|i| match i {
                Invocation::RemoveImage(tag) => Some(tag),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MockState>, RuntimeError> {
        self.state
            .lock()
            .map_err(|e| RuntimeError::ExecFailed(format!("mutex poisoned: {e}")))
    }
}

impl ContainerEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    fn available(&self) -> bool {
        true
    }

    fn run(&self, spec: &RunSpec) -> Result<ExitReport, RuntimeError> {
        let (code, produce) = {
            let mut state = self.lock()?;
            state.invocations.push(Invocation::Run(spec.clone()));
            (state.run_exit, state.produce_artifact)
        };

        if code == 0 && produce {
            if let Some(mount) = spec.volumes.iter().find(|v| v.target == TASK_MOUNT) {
                pack_directory(&mount.source, &mount.source.join("lambda.zip"))?;
            }
        }
        Ok(ExitReport::from_code(code))
    }

    fn build_image(&self, spec: &ImageBuildSpec) -> Result<ExitReport, RuntimeError> {
        let dockerfile = fs::read_to_string(&spec.dockerfile)?;
        let mut state = self.lock()?;
        state.invocations.push(Invocation::BuildImage {
            spec: spec.clone(),
            dockerfile,
        });
        Ok(ExitReport::from_code(state.build_exit))
    }

    fn remove_image(&self, tag: &str) -> Result<(), RuntimeError> {
        self.lock()?
            .invocations
            .push(Invocation::RemoveImage(tag.to_owned()));
        Ok(())
    }

    fn remove_container(&self, name: &str) -> Result<(), RuntimeError> {
        self.lock()?
            .invocations
            .push(Invocation::RemoveContainer(name.to_owned()));
        Ok(())
    }
}

fn pack_directory(source: &Path, target: &Path) -> Result<(), RuntimeError> {
    let mut writer = ZipWriter::new(fs::File::create(target)?);
    pack_entries(&mut writer, source, source)?;
    writer
        .finish()
        .map_err(|e| RuntimeError::ExecFailed(format!("mock artifact: {e}")))?;
    Ok(())
}

fn pack_entries(
    writer: &mut ZipWriter<fs::File>,
    root: &Path,
    dir: &Path,
) -> Result<(), RuntimeError> {
    let mut entries = fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(fs::DirEntry::file_name);

    for entry in entries {
        let path = entry.path();
        let name = entry.file_name();
        if dir == root && SKIPPED.iter().any(|s| name == *s) {
            continue;
        }
        let relative = path
            .strip_prefix(root)
            .map_err(|e| RuntimeError::ExecFailed(e.to_string()))?
            .to_string_lossy()
            .replace('\\', "/");

        let metadata = entry.metadata()?;
        if metadata.is_dir() {
            writer
                .add_directory(format!("{relative}/"), SimpleFileOptions::default())
                .map_err(|e| RuntimeError::ExecFailed(format!("mock artifact: {e}")))?;
            pack_entries(writer, root, &path)?;
        } else if metadata.is_file() {
            let options = SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .unix_permissions(file_mode(&metadata));
            writer
                .start_file(relative, options)
                .map_err(|e| RuntimeError::ExecFailed(format!("mock artifact: {e}")))?;
            writer.write_all(&fs::read(&path)?)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn file_mode(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn file_mode(_metadata: &fs::Metadata) -> u32 {
    0o644
}
