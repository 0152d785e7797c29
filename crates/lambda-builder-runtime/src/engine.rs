use crate::RuntimeError;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

/// A host directory bind-mounted read-write into a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeMount {
    pub source: PathBuf,
    pub target: String,
}

impl VolumeMount {
    pub fn new(source: impl Into<PathBuf>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    pub fn to_arg(&self) -> String {
        format!("{}:{}", self.source.display(), self.target)
    }
}

/// One `container run` invocation.
#[derive(Debug, Clone)]
pub struct RunSpec {
    pub image: String,
    pub name: String,
    pub labels: Vec<String>,
    pub volumes: Vec<VolumeMount>,
    pub env: Vec<String>,
    pub command: Vec<String>,
    /// Directory the engine process itself is started in.
    pub cwd: PathBuf,
    pub quiet: bool,
    pub timeout: Option<Duration>,
    /// Polled while the container runs; returning true aborts it.
    pub interrupted: Option<fn() -> bool>,
}

impl RunSpec {
    pub fn new(image: impl Into<String>, name: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            image: image.into(),
            name: name.into(),
            labels: Vec::new(),
            volumes: Vec::new(),
            env: Vec::new(),
            command: Vec::new(),
            cwd: cwd.into(),
            quiet: false,
            timeout: None,
            interrupted: None,
        }
    }

    /// Arguments after the engine binary, always auto-removing the container.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["container".to_owned(), "run".to_owned(), "--rm".to_owned()];
        for label in &self.labels {
            args.push("--label".to_owned());
            args.push(label.clone());
        }
        args.push("--name".to_owned());
        args.push(self.name.clone());
        for volume in &self.volumes {
            args.push("--volume".to_owned());
            args.push(volume.to_arg());
        }
        for env in &self.env {
            args.push("--env".to_owned());
            args.push(env.clone());
        }
        args.push(self.image.clone());
        args.extend(self.command.iter().cloned());
        args
    }

    pub fn has_env(&self, assignment: &str) -> bool {
        self.env.iter().any(|e| e == assignment)
    }
}

/// One `image build` invocation.
#[derive(Debug, Clone)]
pub struct ImageBuildSpec {
    pub dockerfile: PathBuf,
    pub context: PathBuf,
    pub tag: String,
    pub labels: Vec<String>,
    pub cwd: PathBuf,
    pub quiet: bool,
    /// Kill the build client after this long.
    pub timeout: Option<Duration>,
    pub interrupted: Option<fn() -> bool>,
}

impl ImageBuildSpec {
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "image".to_owned(),
            "build".to_owned(),
            "--file".to_owned(),
            self.dockerfile.display().to_string(),
            "--progress".to_owned(),
            "plain".to_owned(),
            "--tag".to_owned(),
            self.tag.clone(),
        ];
        for label in &self.labels {
            args.push("--label".to_owned());
            args.push(label.clone());
        }
        args.push(self.context.display().to_string());
        args
    }
}

/// How an engine process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitReport {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
}

impl ExitReport {
    pub fn success() -> Self {
        Self { code: Some(0) }
    }

    pub fn from_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<ExitStatus> for ExitReport {
    fn from(status: ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

pub trait ContainerEngine: Send + Sync {
    fn name(&self) -> &str;

    fn available(&self) -> bool;

    /// Run a container to completion. A non-zero exit is reported, not raised;
    /// only a failure to drive the engine at all is an error.
    fn run(&self, spec: &RunSpec) -> Result<ExitReport, RuntimeError>;

    fn build_image(&self, spec: &ImageBuildSpec) -> Result<ExitReport, RuntimeError>;

    fn remove_image(&self, tag: &str) -> Result<(), RuntimeError>;

    fn remove_container(&self, name: &str) -> Result<(), RuntimeError>;
}

pub fn select_engine(name: &str) -> Result<Box<dyn ContainerEngine>, RuntimeError> {
    match name {
        "docker" => Ok(Box::new(crate::docker::DockerCli::new())),
        "mock" => Ok(Box::new(crate::mock::MockEngine::new())),
        other => Err(RuntimeError::EngineUnavailable(other.to_owned())),
    }
}
