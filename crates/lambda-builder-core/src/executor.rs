use crate::cleanup::{ScratchFile, TransientContainer, TransientImage};
use crate::concurrency::shutdown_requested;
use crate::script::{PACKAGE_FLAG, SOURCE_MOUNT};
use crate::variants::LanguageVariant;
use crate::CoreError;
use lambda_builder_runtime::{
    BuildStageDockerfile, ContainerEngine, ImageBuildSpec, RunSpec, RuntimeError, VolumeMount,
    BUILDER_LABEL, EXTRACTOR_LABEL,
};
use lambda_builder_schema::{BuildConfig, BuildStrategy, ARTIFACT_NAME};
use std::io::Write;
use tracing::{debug, info};

/// Name of the build script inside the image build context.
pub const SCRIPT_FILE: &str = ".lambda-builder";

/// Runs a variant's build script in its build image and leaves `lambda.zip`
/// in the working directory. Only exit code 0 counts as success.
pub struct ContainerExecutor<'a> {
    engine: &'a dyn ContainerEngine,
}

impl<'a> ContainerExecutor<'a> {
    pub fn new(engine: &'a dyn ContainerEngine) -> Self {
        Self { engine }
    }

    pub fn run(&self, variant: &LanguageVariant, config: &BuildConfig) -> Result<(), CoreError> {
        info!(
            "building {} with {} ({} strategy)",
            config.working_directory.display(),
            variant.build_image(),
            config.strategy
        );
        match config.strategy {
            BuildStrategy::Container => self.run_in_container(variant, config),
            BuildStrategy::Image => self.run_in_image(variant, config),
        }
    }

    /// One auto-removed container with the working directory mounted at
    /// `/tmp/task`; the script copies the sources in and the archive out.
    fn run_in_container(
        &self,
        variant: &LanguageVariant,
        config: &BuildConfig,
    ) -> Result<(), CoreError> {
        let name = format!("lambda-builder-build-{}", config.identifier);
        let mut spec = RunSpec::new(variant.build_image(), &name, &config.working_directory);
        spec.labels.push(format!("{BUILDER_LABEL}={}", variant.name()));
        spec.volumes.push(VolumeMount::new(&config.working_directory, SOURCE_MOUNT));
        spec.env.push(format!("{PACKAGE_FLAG}=1"));
        spec.env.extend(config.build_env.iter().cloned());
        spec.command = vec![
            "/bin/bash".to_owned(),
            "-c".to_owned(),
            variant.build_script(BuildStrategy::Container),
        ];
        spec.quiet = config.quiet;
        spec.timeout = config.build_timeout;
        spec.interrupted = Some(shutdown_requested);

        self.run_container(&spec)
    }

    /// Bake the sources into a `<tag>-build` image whose last step runs the
    /// script, then move the archive out with an extractor container. The
    /// build-stage image is removed afterwards either way.
    fn run_in_image(
        &self,
        variant: &LanguageVariant,
        config: &BuildConfig,
    ) -> Result<(), CoreError> {
        let build_tag = config.build_stage_tag();
        let working_directory = &config.working_directory;

        {
            let _script = ScratchFile::create(
                working_directory.join(SCRIPT_FILE),
                &variant.build_script(BuildStrategy::Image),
            )?;

            let mut dockerfile = tempfile::Builder::new()
                .prefix("lambda-builder-")
                .suffix(".Dockerfile")
                .tempfile()?;
            let contents = BuildStageDockerfile {
                build_image: variant.build_image(),
                builder_name: variant.name(),
                task_dir: variant.task_dir(),
                env: &config.build_env,
                script_name: SCRIPT_FILE,
            }
            .render();
            dockerfile.write_all(contents.as_bytes())?;
            dockerfile.flush()?;
            debug!("build-stage Dockerfile:\n{contents}");

            let spec = ImageBuildSpec {
                dockerfile: dockerfile.path().to_path_buf(),
                context: working_directory.clone(),
                tag: build_tag.clone(),
                // Labels belong to the run image only.
                labels: Vec::new(),
                cwd: working_directory.clone(),
                quiet: config.quiet,
                timeout: config.build_timeout,
                interrupted: Some(shutdown_requested),
            };
            let report = self.engine.build_image(&spec).map_err(execution_error)?;
            if !report.is_success() {
                return Err(CoreError::BuildExecution {
                    exit_code: report.code,
                    message: format!(
                        "build image {build_tag} failed with exit code {}",
                        report.code.map_or_else(|| "unknown".to_owned(), |c| c.to_string())
                    ),
                });
            }
        }
        let build_image = TransientImage::new(self.engine, &build_tag);

        let name = format!("lambda-builder-extractor-{}", config.identifier);
        let mut spec = RunSpec::new(build_image.tag(), &name, working_directory);
        spec.labels.push(EXTRACTOR_LABEL.to_owned());
        spec.volumes.push(VolumeMount::new(working_directory, SOURCE_MOUNT));
        spec.command = vec![
            "/bin/bash".to_owned(),
            "-c".to_owned(),
            format!(
                "mv {}/{ARTIFACT_NAME} {SOURCE_MOUNT}/{ARTIFACT_NAME}",
                variant.task_dir()
            ),
        ];
        spec.quiet = config.quiet;
        spec.timeout = config.build_timeout;
        spec.interrupted = Some(shutdown_requested);

        self.run_container(&spec)
    }

    fn run_container(&self, spec: &RunSpec) -> Result<(), CoreError> {
        let container = TransientContainer::new(self.engine, &spec.name);
        let report = self.engine.run(spec).map_err(execution_error)?;
        container.finished();
        if report.is_success() {
            Ok(())
        } else {
            Err(CoreError::build_failed(report.code))
        }
    }
}

fn execution_error(err: RuntimeError) -> CoreError {
    CoreError::BuildExecution {
        exit_code: None,
        message: err.to_string(),
    }
}
