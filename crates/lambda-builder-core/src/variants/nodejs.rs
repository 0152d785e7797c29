use super::VariantSpec;
use crate::script::PackageTarget;
use lambda_builder_schema::Language;

pub(super) static SPEC: VariantSpec = VariantSpec {
    language: Language::Nodejs,
    markers: &["package-lock.json"],
    build_image: "mlupin/docker-lambda:nodejs14.x-build",
    run_image: "mlupin/docker-lambda:nodejs14.x",
    versioned: false,
    handlers: &[
        ("app.js", "app.handler"),
        ("function.js", "function.handler"),
        ("index.js", "index.handler"),
        ("lambda_function.js", "lambda_function.handler"),
        ("main.js", "main.handler"),
    ],
    task_dir: "/var/task",
    package: PackageTarget::TaskDir,
    preamble: "",
    install: r#"install-dependencies() {
  if [[ -f package-lock.json ]]; then
    puts-step "Installing dependencies via npm ci"
    npm ci 2>&1 | indent
  else
    puts-step "Installing dependencies via npm"
    npm install 2>&1 | indent
  fi
}"#,
};
