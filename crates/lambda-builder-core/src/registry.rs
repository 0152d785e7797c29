use crate::variants::LanguageVariant;
use crate::CoreError;
use lambda_builder_schema::{BuildConfig, Language, ProjectManifest};
use tracing::{debug, info};

/// The ordered set of variants a build chooses from.
///
/// Order is dotnet, go, nodejs, python, ruby; it breaks ties when more than
/// one variant would detect the same project.
#[derive(Debug)]
pub struct BuilderRegistry {
    variants: Vec<LanguageVariant>,
}

impl BuilderRegistry {
    /// Construct every variant for this project. Construction reads project
    /// files (python version resolution) and its errors propagate.
    pub fn new(config: &BuildConfig, manifest: &ProjectManifest) -> Result<Self, CoreError> {
        let variants = Language::ALL
            .into_iter()
            .map(|language| LanguageVariant::new(language, config, manifest))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { variants })
    }

    pub fn variants(&self) -> &[LanguageVariant] {
        &self.variants
    }

    /// Pick the variant for the working directory.
    ///
    /// A requested name (override, else manifest) consults only that variant's
    /// detection; otherwise the first detecting variant wins.
    pub fn select(
        self,
        config: &BuildConfig,
        manifest: &ProjectManifest,
    ) -> Result<LanguageVariant, CoreError> {
        let dir = &config.working_directory;
        let requested = config.builder.as_deref().or(manifest.builder());

        if let Some(name) = requested {
            debug!("builder '{name}' requested");
            let not_detected = || CoreError::NoBuilderDetected {
                requested: Some(name.to_owned()),
            };
            let language = Language::from_name(name).ok_or_else(not_detected)?;
            let variant = self
                .variants
                .into_iter()
                .find(|v| v.language() == language)
                .ok_or_else(not_detected)?;
            if !variant.detect(dir) {
                return Err(not_detected());
            }
            info!("using {} builder", variant.name());
            return Ok(variant);
        }

        let variant = self
            .variants
            .into_iter()
            .find(|v| v.detect(dir))
            .ok_or(CoreError::NoBuilderDetected { requested: None })?;
        info!("detected {} builder", variant.name());
        Ok(variant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambda_builder_schema::BuildOverrides;
    use std::fs;
    use std::path::Path;

    fn config_for(dir: &Path, builder: Option<&str>) -> BuildConfig {
        BuildConfig::resolve(BuildOverrides {
            working_directory: dir.to_path_buf(),
            builder: builder.map(str::to_owned),
            ..BuildOverrides::default()
        })
        .unwrap()
    }

    fn select(
        dir: &Path,
        builder: Option<&str>,
        manifest: &ProjectManifest,
    ) -> Result<Language, CoreError> {
        let config = config_for(dir, builder);
        BuilderRegistry::new(&config, manifest)?
            .select(&config, manifest)
            .map(|v| v.language())
    }

    #[test]
    fn registry_order() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path(), None);
        let registry = BuilderRegistry::new(&config, &ProjectManifest::default()).unwrap();
        let names: Vec<&str> = registry.variants().iter().map(LanguageVariant::name).collect();
        assert_eq!(names, ["dotnet", "go", "nodejs", "python", "ruby"]);
    }

    #[test]
    fn auto_detects_single_marker() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Gemfile.lock"), "").unwrap();
        let language = select(dir.path(), None, &ProjectManifest::default()).unwrap();
        assert_eq!(language, Language::Ruby);
    }

    #[test]
    fn first_in_order_wins_ties() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("go.mod"), "module x\n").unwrap();
        fs::write(dir.path().join("package-lock.json"), "{}").unwrap();
        fs::write(dir.path().join("requirements.txt"), "").unwrap();
        let language = select(dir.path(), None, &ProjectManifest::default()).unwrap();
        assert_eq!(language, Language::Go);
    }

    #[test]
    fn explicit_name_consults_only_that_variant() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("go.mod"), "module x\n").unwrap();
        fs::write(dir.path().join("requirements.txt"), "").unwrap();
        let language = select(dir.path(), Some("python"), &ProjectManifest::default()).unwrap();
        assert_eq!(language, Language::Python);
    }

    #[test]
    fn explicit_name_without_marker_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("requirements.txt"), "").unwrap();
        let err = select(dir.path(), Some("go"), &ProjectManifest::default()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::NoBuilderDetected { requested: Some(ref n) } if n == "go"
        ));
    }

    #[test]
    fn unknown_name_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("requirements.txt"), "").unwrap();
        let err = select(dir.path(), Some("rust"), &ProjectManifest::default()).unwrap_err();
        assert!(matches!(err, CoreError::NoBuilderDetected { .. }));
        assert!(err.to_string().contains("rust"));
    }

    #[test]
    fn manifest_builder_is_used_when_not_overridden() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("go.mod"), "module x\n").unwrap();
        fs::write(dir.path().join("Gemfile.lock"), "").unwrap();
        let manifest = ProjectManifest {
            builder: Some("ruby".to_owned()),
            ..ProjectManifest::default()
        };
        assert_eq!(select(dir.path(), None, &manifest).unwrap(), Language::Ruby);
        assert_eq!(select(dir.path(), Some("go"), &manifest).unwrap(), Language::Go);
    }

    #[test]
    fn empty_directory_detects_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let err = select(dir.path(), None, &ProjectManifest::default()).unwrap_err();
        assert!(matches!(err, CoreError::NoBuilderDetected { requested: None }));
    }

    #[test]
    fn construction_errors_propagate() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Gemfile.lock"), "").unwrap();
        fs::write(dir.path().join("runtime.txt"), "not-a-version").unwrap();
        let err = select(dir.path(), None, &ProjectManifest::default()).unwrap_err();
        assert!(matches!(err, CoreError::Version(_)));
    }
}
