use super::VariantSpec;
use crate::script::PackageTarget;
use lambda_builder_schema::Language;

pub(super) static SPEC: VariantSpec = VariantSpec {
    language: Language::Ruby,
    markers: &["Gemfile.lock"],
    build_image: "mlupin/docker-lambda:ruby2.7-build",
    run_image: "mlupin/docker-lambda:ruby2.7",
    versioned: false,
    handlers: &[
        ("app.rb", "app.handler"),
        ("function.rb", "function.handler"),
        ("lambda_function.rb", "lambda_function.handler"),
        ("main.rb", "main.handler"),
    ],
    task_dir: "/var/task",
    package: PackageTarget::TaskDir,
    preamble: "",
    install: r#"install-dependencies() {
  puts-step "Downloading dependencies via bundler"
  bundle config set --local path 'vendor/bundle' 2>&1 | indent
  bundle install 2>&1 | indent
}"#,
};
