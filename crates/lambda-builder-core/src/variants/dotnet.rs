use super::VariantSpec;
use crate::script::PackageTarget;
use lambda_builder_schema::Language;

// The handler names an assembly, type and method; none of that can be read
// off the file names, so there is no handler map.
pub(super) static SPEC: VariantSpec = VariantSpec {
    language: Language::Dotnet,
    markers: &["Function.cs"],
    build_image: "mlupin/docker-lambda:dotnet6-build",
    run_image: "mlupin/docker-lambda:dotnet6",
    versioned: false,
    handlers: &[],
    task_dir: "/var/task",
    package: PackageTarget::TaskDir,
    preamble: "export DOTNET_CLI_TELEMETRY_OPTOUT=1",
    install: r#"install-dependencies() {
  puts-step "Compiling via dotnet publish"
  dotnet publish -c Release -o pub 2>&1 | indent
}"#,
};
