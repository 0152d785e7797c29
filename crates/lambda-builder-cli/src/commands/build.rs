use super::{human_size, json_pretty, spin_fail, spin_ok, OutputMode, EXIT_SUCCESS};
use clap::Args;
use lambda_builder_core::{BuildResult, Pipeline};
use lambda_builder_runtime::select_engine;
use lambda_builder_schema::{BuildConfig, BuildOverrides, BuildStrategy};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Project directory to build.
    #[arg(long, default_value = ".")]
    pub working_directory: PathBuf,

    /// Force a builder by name (dotnet, go, nodejs, python, ruby).
    #[arg(long)]
    pub builder: Option<String>,

    /// Override the image the build runs in.
    #[arg(long)]
    pub build_image: Option<String>,

    /// Override the base image of the generated run image.
    #[arg(long)]
    pub run_image: Option<String>,

    /// KEY=VALUE passed to the build. May be repeated.
    #[arg(long = "build-env", value_name = "KEY=VALUE")]
    pub build_env: Vec<String>,

    /// KEY=VALUE baked into the run image. May be repeated.
    #[arg(long = "image-env", value_name = "KEY=VALUE")]
    pub image_env: Vec<String>,

    /// Label applied to built images. May be repeated.
    #[arg(long = "label", value_name = "KEY=VALUE")]
    pub labels: Vec<String>,

    /// Tag for the run image.
    #[arg(short = 't', long)]
    pub tag: Option<String>,

    /// Port the run image's lambda runtime listens on.
    #[arg(long)]
    pub port: Option<u16>,

    /// Handler for the Procfile and run image; inferred when omitted.
    #[arg(long)]
    pub handler: Option<String>,

    /// Also build a runnable image from the artifact.
    #[arg(long, default_value_t = false)]
    pub generate_image: bool,

    /// Write a Procfile declaring the handler.
    #[arg(long, default_value_t = false)]
    pub write_procfile: bool,

    /// Suppress build container output.
    #[arg(long, default_value_t = false)]
    pub quiet: bool,

    /// How the build reaches the build image: container or image.
    #[arg(long, default_value = "container")]
    pub strategy: BuildStrategy,

    /// Abort the build after this many seconds.
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,
}

impl BuildArgs {
    /// JSON mode forces `quiet` so stdout carries nothing but the result
    /// document.
    fn into_overrides(self, out: OutputMode) -> BuildOverrides {
        BuildOverrides {
            build_env: self.build_env,
            builder: self.builder,
            build_image: self.build_image,
            run_image: self.run_image,
            generate_run_image: self.generate_image,
            handler: self.handler,
            image_env: self.image_env,
            image_labels: self.labels,
            image_tag: self.tag,
            port: self.port,
            quiet: self.quiet || out.json,
            working_directory: self.working_directory,
            write_procfile: self.write_procfile,
            strategy: self.strategy,
            build_timeout: self.timeout.map(Duration::from_secs),
        }
    }
}

pub fn run(engine_name: &str, args: BuildArgs, out: OutputMode) -> Result<u8, String> {
    let engine = select_engine(engine_name).map_err(|e| e.to_string())?;
    let config = BuildConfig::resolve(args.into_overrides(out)).map_err(|e| e.to_string())?;
    let pipeline = Pipeline::new(engine);

    out.header("Detecting builder");
    let variant = pipeline.detect(&config).map_err(|e| e.to_string())?;
    out.step(&format!("Detected {} builder", variant.name()));
    out.header(&format!("Building app with image {}", variant.build_image()));

    let pb = out.spinner(config.quiet, "building...");
    let result = match pipeline.build(config) {
        Ok(r) => {
            if let Some(ref pb) = pb {
                spin_ok(pb, "build finished");
            }
            r
        }
        Err(e) => {
            if let Some(ref pb) = pb {
                spin_fail(pb, "build failed");
            }
            return Err(e.to_string());
        }
    };

    if out.json {
        println!("{}", json_pretty(&result)?);
    } else {
        print_summary(out, &result);
    }
    Ok(EXIT_SUCCESS)
}

fn print_summary(out: OutputMode, result: &BuildResult) {
    if result.procfile_written {
        out.header(&format!("Wrote Procfile from handler: {}", result.handler));
    }
    if let Some(tag) = &result.image {
        out.header(&format!("Built image {tag}"));
    }
    out.header(&format!("Wrote {}", result.artifact.display()));

    let (mb, kb) = human_size(result.artifact_size);
    if result.exceeds_zip_limit() {
        out.warning(&format!(
            "Surpassed AWS Lambda 50MB zip file limit: {mb}MB ({kb}KB)"
        ));
        out.warning("Consider using Docker Images for lambda function distribution");
    } else {
        out.step(&format!("Current zip file size: {mb}MB ({kb}KB)"));
    }
}
