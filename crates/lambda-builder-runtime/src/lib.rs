//! Container engine layer for lambda-builder.
//!
//! This crate implements the execution seam: a pluggable `ContainerEngine`
//! trait with a `docker` CLI backend and an in-process mock, the argument
//! specs for `container run` and `image build`, Dockerfile rendering for the
//! build and run stages, and prerequisite checking.

pub mod dockerfile;
pub mod docker;
pub mod engine;
pub mod mock;
pub mod prereq;

pub use docker::DockerCli;
pub use dockerfile::{BuildStageDockerfile, RunStageDockerfile, BUILDER_LABEL, EXTRACTOR_LABEL};
pub use engine::{
    select_engine, ContainerEngine, ExitReport, ImageBuildSpec, RunSpec, VolumeMount,
};
pub use mock::{Invocation, MockEngine};
pub use prereq::{check_docker_prereqs, format_missing, MissingPrereq};

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("container engine '{0}' is not available on this system")]
    EngineUnavailable(String),
    #[error("failed to invoke '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("container '{name}' timed out after {}s", timeout.as_secs())]
    TimedOut { name: String, timeout: Duration },
    #[error("container '{0}' was interrupted")]
    Interrupted(String),
    #[error("runtime execution failed: {0}")]
    ExecFailed(String),
}
