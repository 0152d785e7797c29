mod commands;

use clap::{Parser, Subcommand};
use commands::build::BuildArgs;
use commands::{OutputMode, EXIT_FAILURE};
use lambda_builder_core::install_signal_handler;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "lambda-builder",
    version,
    about = "Builds serverless function artifacts inside language-specific build containers"
)]
struct Cli {
    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build a lambda.zip (and optionally a run image) from a project directory.
    Build(BuildArgs),
    /// Show which builder and images would be used, without building.
    Detect {
        /// Project directory to inspect.
        #[arg(long, default_value = ".")]
        working_directory: PathBuf,
        /// Force a builder by name.
        #[arg(long)]
        builder: Option<String>,
        /// Override the build image.
        #[arg(long)]
        build_image: Option<String>,
        /// Override the run image.
        #[arg(long)]
        run_image: Option<String>,
    },
    /// Check that docker is installed and its daemon is reachable.
    Doctor,
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("LAMBDA_BUILDER_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    install_signal_handler();

    let engine_name =
        std::env::var("LAMBDA_BUILDER_ENGINE").unwrap_or_else(|_| "docker".to_owned());
    let out = OutputMode::detect(cli.json);

    let needs_engine = matches!(cli.command, Commands::Build(_));
    if needs_engine
        && engine_name == "docker"
        && std::env::var("LAMBDA_BUILDER_SKIP_PREREQS").as_deref() != Ok("1")
    {
        let missing = lambda_builder_runtime::check_docker_prereqs();
        if !missing.is_empty() {
            eprintln!("error: {}", lambda_builder_runtime::format_missing(&missing));
            return ExitCode::from(EXIT_FAILURE);
        }
    }

    let result = match cli.command {
        Commands::Build(args) => commands::build::run(&engine_name, args, out),
        Commands::Detect {
            working_directory,
            builder,
            build_image,
            run_image,
        } => commands::detect::run(
            working_directory,
            builder,
            build_image,
            run_image,
            out,
        ),
        Commands::Doctor => commands::doctor::run(out),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}
