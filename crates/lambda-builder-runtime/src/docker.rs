use crate::engine::{ContainerEngine, ExitReport, ImageBuildSpec, RunSpec};
use crate::RuntimeError;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Drives the `docker` command-line client.
pub struct DockerCli {
    program: String,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self {
            program: "docker".to_owned(),
        }
    }
}

impl DockerCli {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different client binary with a docker-compatible CLI.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, args: &[String], cwd: &Path, quiet: bool) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(args).current_dir(cwd).stdin(Stdio::null());
        if quiet {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        } else {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        }
        cmd
    }

    fn spawn(&self, mut cmd: Command) -> Result<Child, RuntimeError> {
        cmd.spawn().map_err(|source| RuntimeError::Spawn {
            program: self.program.clone(),
            source,
        })
    }

    fn silent(&self, args: &[&str]) -> Result<bool, RuntimeError> {
        let status = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| RuntimeError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        Ok(status.success())
    }

    /// Wait for `child`. If the deadline passes or the interrupt flag is raised,
    /// force-remove the named container (when there is one) and kill the client.
    fn supervise(&self, mut child: Child, watch: &Watch<'_>) -> Result<ExitReport, RuntimeError> {
        let started = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status.into());
            }

            let timed_out = watch.timeout.is_some_and(|t| started.elapsed() >= t);
            let interrupted = watch.interrupted.is_some_and(|requested| requested());
            if timed_out || interrupted {
                warn!("stopping {}", watch.name);
                if let Some(container) = watch.container {
                    if let Err(e) = self.remove_container(container) {
                        warn!("failed to remove container {container}: {e}");
                    }
                }
                let _ = child.kill();
                let _ = child.wait();
                return Err(if interrupted {
                    RuntimeError::Interrupted(watch.name.to_owned())
                } else {
                    RuntimeError::TimedOut {
                        name: watch.name.to_owned(),
                        timeout: watch.timeout.unwrap_or_default(),
                    }
                });
            }

            thread::sleep(POLL_INTERVAL);
        }
    }

    fn wait(&self, mut child: Child, watch: &Watch<'_>) -> Result<ExitReport, RuntimeError> {
        if watch.timeout.is_none() && watch.interrupted.is_none() {
            return Ok(child.wait()?.into());
        }
        self.supervise(child, watch)
    }
}

/// What `supervise` polls for, and what it names in errors.
struct Watch<'a> {
    name: &'a str,
    container: Option<&'a str>,
    timeout: Option<Duration>,
    interrupted: Option<fn() -> bool>,
}

impl<'a> Watch<'a> {
    fn run(spec: &'a RunSpec) -> Self {
        Self {
            name: &spec.name,
            container: Some(&spec.name),
            timeout: spec.timeout,
            interrupted: spec.interrupted,
        }
    }

    // `image build` has no container to remove; killing the client cancels it.
    fn image_build(spec: &'a ImageBuildSpec) -> Self {
        Self {
            name: &spec.tag,
            container: None,
            timeout: spec.timeout,
            interrupted: spec.interrupted,
        }
    }
}

impl ContainerEngine for DockerCli {
    fn name(&self) -> &str {
        &self.program
    }

    fn available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|s| s.success())
    }

    fn run(&self, spec: &RunSpec) -> Result<ExitReport, RuntimeError> {
        let args = spec.to_args();
        debug!("{} {}", self.program, args.join(" "));
        let child = self.spawn(self.command(&args, &spec.cwd, spec.quiet))?;
        self.wait(child, &Watch::run(spec))
    }

    fn build_image(&self, spec: &ImageBuildSpec) -> Result<ExitReport, RuntimeError> {
        let args = spec.to_args();
        debug!("{} {}", self.program, args.join(" "));
        let child = self.spawn(self.command(&args, &spec.cwd, spec.quiet))?;
        self.wait(child, &Watch::image_build(spec))
    }

    fn remove_image(&self, tag: &str) -> Result<(), RuntimeError> {
        if self.silent(&["image", "rm", "--force", tag])? {
            Ok(())
        } else {
            Err(RuntimeError::ExecFailed(format!("failed to remove image {tag}")))
        }
    }

    fn remove_container(&self, name: &str) -> Result<(), RuntimeError> {
        if self.silent(&["container", "rm", "--force", name])? {
            Ok(())
        } else {
            Err(RuntimeError::ExecFailed(format!(
                "failed to remove container {name}"
            )))
        }
    }
}
