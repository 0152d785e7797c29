//! The five language variants.
//!
//! Each variant is one static `VariantSpec` row; `LanguageVariant` pairs a row
//! with the images resolved for a particular project.

mod dotnet;
mod go;
mod nodejs;
mod python;
mod ruby;

use crate::script::{
    PackageTarget, ScriptParams, PACKAGE_FLAG, POST_COMPILE_HOOK, PRE_COMPILE_HOOK, SOURCE_MOUNT,
};
use crate::version::{resolve_python_version, SUPPORTED_PYTHON_VERSIONS};
use crate::CoreError;
use lambda_builder_schema::{
    BuildConfig, BuildStrategy, HandlerMap, Language, ProjectManifest, ARTIFACT_NAME,
};
use std::path::Path;
use tracing::debug;

/// Placeholder substituted with the resolved python version in image names.
const VERSION_PLACEHOLDER: &str = "{version}";

pub(crate) struct VariantSpec {
    pub language: Language,
    /// Any of these directly in the working directory selects the variant.
    pub markers: &'static [&'static str],
    pub build_image: &'static str,
    pub run_image: &'static str,
    /// Image names contain `{version}` and need python version resolution.
    pub versioned: bool,
    pub handlers: &'static [(&'static str, &'static str)],
    pub task_dir: &'static str,
    pub package: PackageTarget,
    pub preamble: &'static str,
    pub install: &'static str,
}

fn spec_for(language: Language) -> &'static VariantSpec {
    match language {
        Language::Dotnet => &dotnet::SPEC,
        Language::Go => &go::SPEC,
        Language::Nodejs => &nodejs::SPEC,
        Language::Python => &python::SPEC,
        Language::Ruby => &ruby::SPEC,
    }
}

/// A variant with its build and run images resolved for one project.
#[derive(Clone)]
pub struct LanguageVariant {
    spec: &'static VariantSpec,
    build_image: String,
    run_image: String,
}

impl std::fmt::Debug for LanguageVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageVariant")
            .field("language", &self.spec.language)
            .field("build_image", &self.build_image)
            .field("run_image", &self.run_image)
            .finish()
    }
}

impl LanguageVariant {
    /// Resolve images with the precedence override > manifest > default.
    ///
    /// The python defaults depend on the project's declared interpreter
    /// version, which is only inspected when a default is actually needed.
    pub fn new(
        language: Language,
        config: &BuildConfig,
        manifest: &ProjectManifest,
    ) -> Result<Self, CoreError> {
        let spec = spec_for(language);
        let build_override = config.build_image.as_deref().or(manifest.build_image());
        let run_override = config.run_image.as_deref().or(manifest.run_image());

        let version = if spec.versioned && (build_override.is_none() || run_override.is_none()) {
            let v = resolve_python_version(&config.working_directory, SUPPORTED_PYTHON_VERSIONS)?;
            debug!("{language}: using version {v} for default images");
            v
        } else {
            String::new()
        };
        let default = |template: &str| template.replace(VERSION_PLACEHOLDER, &version);

        Ok(Self {
            spec,
            build_image: build_override.map_or_else(|| default(spec.build_image), str::to_owned),
            run_image: run_override.map_or_else(|| default(spec.run_image), str::to_owned),
        })
    }

    pub fn language(&self) -> Language {
        self.spec.language
    }

    pub fn name(&self) -> &'static str {
        self.spec.language.name()
    }

    pub fn detect(&self, directory: &Path) -> bool {
        self.spec
            .markers
            .iter()
            .any(|marker| directory.join(marker).is_file())
    }

    pub fn build_image(&self) -> &str {
        &self.build_image
    }

    pub fn run_image(&self) -> &str {
        &self.run_image
    }

    pub fn task_dir(&self) -> &'static str {
        self.spec.task_dir
    }

    pub fn handler_map(&self) -> HandlerMap {
        self.spec
            .handlers
            .iter()
            .map(|(file, handler)| ((*file).to_owned(), (*handler).to_owned()))
            .collect()
    }

    /// Render the build script for the given strategy.
    ///
    /// With the container strategy the sources arrive through the bind mount
    /// and the archive is moved back onto it; with the image strategy the
    /// sources are already in the task directory and the archive stays there
    /// for the extractor.
    pub fn build_script(&self, strategy: BuildStrategy) -> String {
        let (source_mount, output_dir) = match strategy {
            BuildStrategy::Container => (Some(SOURCE_MOUNT), SOURCE_MOUNT),
            BuildStrategy::Image => (None, self.spec.task_dir),
        };
        ScriptParams {
            task_dir: self.spec.task_dir,
            source_mount,
            output_dir,
            pre_compile_hook: PRE_COMPILE_HOOK,
            post_compile_hook: POST_COMPILE_HOOK,
            package: self.spec.package,
            package_flag: PACKAGE_FLAG,
            artifact_name: ARTIFACT_NAME,
            preamble: self.spec.preamble,
            install: self.spec.install,
        }
        .render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambda_builder_schema::BuildOverrides;
    use std::fs;

    fn config_for(dir: &Path) -> BuildConfig {
        BuildConfig::resolve(BuildOverrides {
            working_directory: dir.to_path_buf(),
            ..BuildOverrides::default()
        })
        .unwrap()
    }

    #[test]
    fn each_marker_detects_its_variant() {
        let cases = [
            (Language::Dotnet, "Function.cs"),
            (Language::Go, "go.mod"),
            (Language::Go, "go.sum"),
            (Language::Nodejs, "package-lock.json"),
            (Language::Python, "requirements.txt"),
            (Language::Python, "poetry.lock"),
            (Language::Python, "Pipfile.lock"),
            (Language::Ruby, "Gemfile.lock"),
        ];
        for (language, marker) in cases {
            let dir = tempfile::tempdir().unwrap();
            let content = if marker.ends_with(".json") || marker == "Pipfile.lock" {
                "{}"
            } else {
                ""
            };
            fs::write(dir.path().join(marker), content).unwrap();
            let config = config_for(dir.path());
            for other in Language::ALL {
                let variant =
                    LanguageVariant::new(other, &config, &ProjectManifest::default()).unwrap();
                assert_eq!(
                    variant.detect(dir.path()),
                    other == language,
                    "{marker} vs {other}"
                );
            }
        }
    }

    #[test]
    fn marker_directory_does_not_detect() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("go.mod")).unwrap();
        let config = config_for(dir.path());
        let go = LanguageVariant::new(Language::Go, &config, &ProjectManifest::default()).unwrap();
        assert!(!go.detect(dir.path()));
    }

    #[test]
    fn default_images() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        let manifest = ProjectManifest::default();
        let ruby = LanguageVariant::new(Language::Ruby, &config, &manifest).unwrap();
        assert_eq!(ruby.build_image(), "mlupin/docker-lambda:ruby2.7-build");
        assert_eq!(ruby.run_image(), "mlupin/docker-lambda:ruby2.7");

        let go = LanguageVariant::new(Language::Go, &config, &manifest).unwrap();
        assert_eq!(go.build_image(), "lambci/lambda:build-go1.x");
        assert_eq!(go.task_dir(), "/go/src/handler");
    }

    #[test]
    fn python_images_follow_declared_version() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("requirements.txt"), "").unwrap();
        fs::write(dir.path().join("runtime.txt"), "python-3.9.16\n").unwrap();
        let config = config_for(dir.path());
        let python =
            LanguageVariant::new(Language::Python, &config, &ProjectManifest::default()).unwrap();
        assert_eq!(python.build_image(), "mlupin/docker-lambda:python3.9-build");
        assert_eq!(python.run_image(), "mlupin/docker-lambda:python3.9");
    }

    #[test]
    fn image_precedence_override_then_manifest_then_default() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = ProjectManifest {
            builder: None,
            build_image: Some("manifest/build".to_owned()),
            run_image: Some("manifest/run".to_owned()),
        };

        let config = config_for(dir.path());
        let v = LanguageVariant::new(Language::Nodejs, &config, &manifest).unwrap();
        assert_eq!(v.build_image(), "manifest/build");
        assert_eq!(v.run_image(), "manifest/run");

        let mut config = config_for(dir.path());
        config.build_image = Some("override/build".to_owned());
        let v = LanguageVariant::new(Language::Nodejs, &config, &manifest).unwrap();
        assert_eq!(v.build_image(), "override/build");
        assert_eq!(v.run_image(), "manifest/run");
    }

    #[test]
    fn explicit_python_images_skip_version_resolution() {
        let dir = tempfile::tempdir().unwrap();
        // Would fail resolution if it were consulted.
        fs::write(dir.path().join("runtime.txt"), "python-2.7.18").unwrap();
        let mut config = config_for(dir.path());
        config.build_image = Some("custom/build".to_owned());
        config.run_image = Some("custom/run".to_owned());
        let python =
            LanguageVariant::new(Language::Python, &config, &ProjectManifest::default()).unwrap();
        assert_eq!(python.build_image(), "custom/build");

        config.run_image = None;
        let err = LanguageVariant::new(Language::Python, &config, &ProjectManifest::default())
            .unwrap_err();
        assert!(matches!(err, CoreError::Version(_)));
    }

    #[test]
    fn handler_maps_are_ordered() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        let manifest = ProjectManifest::default();

        let python = LanguageVariant::new(Language::Python, &config, &manifest).unwrap();
        let map = python.handler_map();
        let files: Vec<&str> = map.iter().map(|(f, _)| f).collect();
        assert_eq!(files, ["app.py", "function.py", "lambda_function.py", "main.py"]);
        assert_eq!(map.get("main.py"), Some("main.handler"));

        let go = LanguageVariant::new(Language::Go, &config, &manifest).unwrap();
        assert_eq!(go.handler_map().get("bootstrap"), Some("bootstrap"));

        let dotnet = LanguageVariant::new(Language::Dotnet, &config, &manifest).unwrap();
        assert!(dotnet.handler_map().is_empty());
    }

    #[test]
    fn scripts_carry_variant_install_steps() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        let manifest = ProjectManifest::default();
        let expect = [
            (Language::Dotnet, "dotnet publish -c Release -o pub"),
            (Language::Go, "go build -o bootstrap"),
            (Language::Nodejs, "npm ci"),
            (Language::Python, "pip install --target"),
            (Language::Ruby, "bundle install"),
        ];
        for (language, needle) in expect {
            let v = LanguageVariant::new(language, &config, &manifest).unwrap();
            let script = v.build_script(BuildStrategy::Container);
            assert!(script.contains(needle), "{language} script lacks {needle}");
            assert!(script.contains("cp -a /tmp/task/."));
        }

        let go = LanguageVariant::new(Language::Go, &config, &manifest).unwrap();
        let baked = go.build_script(BuildStrategy::Image);
        assert!(!baked.contains("cp -a /tmp/task/."));
        assert!(baked.contains("zip -q -r lambda.zip bootstrap"));
    }
}
