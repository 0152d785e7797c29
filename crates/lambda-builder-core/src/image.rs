use crate::concurrency::shutdown_requested;
use crate::variants::LanguageVariant;
use crate::CoreError;
use lambda_builder_runtime::{ContainerEngine, ImageBuildSpec, RunStageDockerfile};
use lambda_builder_schema::BuildConfig;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Where the run image expects the function code.
pub const RUN_TASK_DIR: &str = "/var/task";

/// Commits an extracted build into a runnable image tagged with
/// `config.image_tag()`.
pub struct RunImageBuilder<'a> {
    engine: &'a dyn ContainerEngine,
}

impl<'a> RunImageBuilder<'a> {
    pub fn new(engine: &'a dyn ContainerEngine) -> Self {
        Self { engine }
    }

    pub fn build(
        &self,
        handler: &str,
        source_dir: &Path,
        variant: &LanguageVariant,
        config: &BuildConfig,
    ) -> Result<String, CoreError> {
        let tag = config.image_tag();
        let contents = RunStageDockerfile {
            run_image: variant.run_image(),
            port: config.port,
            env: &config.image_env,
            command: handler,
            task_dir: RUN_TASK_DIR,
        }
        .render();
        debug!("run-stage Dockerfile:\n{contents}");

        let mut dockerfile = tempfile::Builder::new()
            .prefix("lambda-builder-")
            .suffix(".Dockerfile")
            .tempfile()?;
        dockerfile.write_all(contents.as_bytes())?;
        dockerfile.flush()?;

        info!("building image {tag} from {}", variant.run_image());
        let spec = ImageBuildSpec {
            dockerfile: dockerfile.path().to_path_buf(),
            context: source_dir.to_path_buf(),
            tag: tag.clone(),
            labels: config.image_labels.clone(),
            cwd: source_dir.to_path_buf(),
            quiet: config.quiet,
            timeout: None,
            interrupted: Some(shutdown_requested),
        };
        let report = self.engine.build_image(&spec)?;
        if !report.is_success() {
            return Err(CoreError::ImageBuild {
                tag,
                exit_code: report.code,
            });
        }
        Ok(tag)
    }
}
