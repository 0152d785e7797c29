use super::VariantSpec;
use crate::script::PackageTarget;
use lambda_builder_schema::Language;

pub(super) static SPEC: VariantSpec = VariantSpec {
    language: Language::Go,
    markers: &["go.sum", "go.mod"],
    build_image: "lambci/lambda:build-go1.x",
    run_image: "lambci/lambda:go1.x",
    versioned: false,
    handlers: &[("bootstrap", "bootstrap")],
    task_dir: "/go/src/handler",
    package: PackageTarget::File("bootstrap"),
    preamble: "",
    install: r#"install-dependencies() {
  puts-step "Downloading dependencies via go mod"
  go mod download 2>&1 | indent

  puts-step "Compiling via go build"
  go build -o bootstrap main.go 2>&1 | indent
}"#,
};
