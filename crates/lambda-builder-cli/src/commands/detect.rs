use super::{json_pretty, OutputMode, EXIT_SUCCESS};
use lambda_builder_core::BuilderRegistry;
use lambda_builder_schema::{read_manifest, BuildConfig, BuildOverrides};
use std::path::PathBuf;

pub fn run(
    working_directory: PathBuf,
    builder: Option<String>,
    build_image: Option<String>,
    run_image: Option<String>,
    out: OutputMode,
) -> Result<u8, String> {
    let config = BuildConfig::resolve(BuildOverrides {
        working_directory,
        builder,
        build_image,
        run_image,
        ..BuildOverrides::default()
    })
    .map_err(|e| e.to_string())?;
    let manifest = read_manifest(&config.working_directory).map_err(|e| e.to_string())?;
    let variant = BuilderRegistry::new(&config, &manifest)
        .and_then(|registry| registry.select(&config, &manifest))
        .map_err(|e| e.to_string())?;

    let handlers: Vec<_> = variant
        .handler_map()
        .iter()
        .map(|(file, entrypoint)| serde_json::json!({ "file": file, "handler": entrypoint }))
        .collect();

    if out.json {
        let payload = serde_json::json!({
            "builder": variant.name(),
            "build_image": variant.build_image(),
            "run_image": variant.run_image(),
            "handlers": handlers,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("builder:     {}", variant.name());
        println!("build image: {}", variant.build_image());
        println!("run image:   {}", variant.run_image());
        for (file, entrypoint) in variant.handler_map().iter() {
            println!("handler:     {file} -> {entrypoint}");
        }
    }
    Ok(EXIT_SUCCESS)
}
