//! Executor configuration loaded from TOML
//!
//! ```toml
//! [executables]
//! maven = "/opt/maven/bin/mvn"
//! gradle = "gradle"
//!
//! [build]
//! timeout_secs = 3600
//! verbosity = "info"
//! skip_tests = true
//! forward_properties = ["srcbuild.*"]
//! ```
//!
//! Every key is optional.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::builder::ToolKind;
use crate::models::{BuildRequest, BuildRequestBuilder, Verbosity};

/// File name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "srcbuild.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub executables: ExecutablesConfig,
    pub build: BuildDefaults,
}

/// Executables for the non-wrapper tool kinds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutablesConfig {
    pub maven: String,
    pub gradle: String,
}

impl Default for ExecutablesConfig {
    fn default() -> Self {
        Self {
            maven: ToolKind::Maven.default_executable().to_string(),
            gradle: ToolKind::Gradle.default_executable().to_string(),
        }
    }
}

/// Defaults for every [`BuildRequest`] created from this configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildDefaults {
    /// Absent means no deadline
    pub timeout_secs: Option<u64>,
    pub verbosity: Verbosity,
    pub skip_tests: bool,
    pub add_default_build_arguments: bool,
    pub add_default_build_environment: bool,
    pub forward_properties: Vec<String>,
}

impl Default for BuildDefaults {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            verbosity: Verbosity::default(),
            skip_tests: true,
            add_default_build_arguments: true,
            add_default_build_environment: true,
            forward_properties: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse srcbuild configuration")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Load configuration from the first location that exists:
    ///
    /// 1. `explicit`, which must exist when given
    /// 2. `./srcbuild.toml`
    /// 3. `<config dir>/srcbuild/config.toml`
    ///
    /// Falls back to built-in defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::candidate_paths().into_iter().find(|p| p.is_file()) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("srcbuild").join("config.toml"));
        }
        paths
    }

    /// Configured executable for `kind`; wrappers always use their script name
    pub fn executable_for(&self, kind: ToolKind) -> &str {
        match kind {
            ToolKind::Maven => &self.executables.maven,
            ToolKind::Gradle => &self.executables.gradle,
            ToolKind::MavenWrapper | ToolKind::GradleWrapper => kind.default_executable(),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.build
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(Duration::MAX)
    }

    /// Request builder pre-filled with the configured defaults
    pub fn request_builder(
        &self,
        repository_id: impl Into<String>,
        project_root: impl Into<PathBuf>,
    ) -> BuildRequestBuilder {
        BuildRequest::builder(repository_id, project_root)
            .timeout(self.timeout())
            .verbosity(self.build.verbosity)
            .skip_tests(self.build.skip_tests)
            .add_default_build_arguments(self.build.add_default_build_arguments)
            .add_default_build_environment(self.build.add_default_build_environment)
            .forward_property_names(self.build.forward_properties.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.executable_for(ToolKind::Maven), "mvn");
        assert_eq!(config.executable_for(ToolKind::Gradle), "gradle");
        assert_eq!(config.timeout(), Duration::MAX);
    }

    #[test]
    fn test_partial_config() {
        let config = Config::from_toml(
            r#"
            [executables]
            maven = "/opt/maven/bin/mvn"

            [build]
            timeout_secs = 90
            verbosity = "debug"
            skip_tests = false
            forward_properties = ["release.version"]
            "#,
        )
        .unwrap();

        assert_eq!(config.executable_for(ToolKind::Maven), "/opt/maven/bin/mvn");
        assert_eq!(config.executable_for(ToolKind::Gradle), "gradle");
        assert_eq!(config.timeout(), Duration::from_secs(90));
        assert_eq!(config.build.verbosity, Verbosity::Debug);
        assert!(!config.build.skip_tests);
        assert!(config.build.add_default_build_arguments);
    }

    #[test]
    fn test_wrappers_ignore_configured_executables() {
        let config = Config::from_toml("[executables]\nmaven = \"/x/mvn\"").unwrap();
        assert_eq!(config.executable_for(ToolKind::MavenWrapper), "mvnw");
        assert_eq!(config.executable_for(ToolKind::GradleWrapper), "gradlew");
    }

    #[test]
    fn test_invalid_verbosity_rejected() {
        assert!(Config::from_toml("[build]\nverbosity = \"loud\"").is_err());
    }

    #[test]
    fn test_request_builder_applies_defaults() {
        let config = Config::from_toml(
            "[build]\ntimeout_secs = 5\nskip_tests = false\nforward_properties = [\"a\", \"b\"]",
        )
        .unwrap();

        let request = config.request_builder("repo", "/tmp").build();

        assert_eq!(request.timeout(), Duration::from_secs(5));
        assert!(!request.skip_tests());
        assert_eq!(request.forward_property_names().len(), 2);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let temp = tempfile::tempdir().unwrap();
        let err = Config::load(&temp.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_discover_explicit_path() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("custom.toml");
        fs::write(&path, "[executables]\ngradle = \"/opt/gradle/bin/gradle\"").unwrap();

        let config = Config::discover(Some(&path)).unwrap();

        assert_eq!(config.executables.gradle, "/opt/gradle/bin/gradle");
    }
}
