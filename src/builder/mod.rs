//! Build tool strategies and the executor that drives them
//!
//! A [`BuildTool`] supplies the tool-specific pieces of a build invocation
//! (default arguments and environment, verbosity and skip-tests flags, and
//! where the executable lives). The [`BuildExecutor`] merges those with a
//! [`BuildRequest`] into a [`CommandDescriptor`](crate::models::CommandDescriptor)
//! and runs it under the request's deadline.
//!
//! Strategies are selected by [`ToolKind`], either explicitly or by
//! [`ToolKind::detect`] looking at the files in a project root.

mod executor;
mod gradle;
mod maven;
mod merge;


pub use executor::BuildExecutor;
pub use gradle::Gradle;
pub use maven::Maven;
pub use merge::{
    forward_properties_arguments, merge_arguments, merge_environment,
    FORWARD_PROPERTIES_PROPERTY,
};

use anyhow::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::BuildError;
use crate::models::{BuildRequest, Verbosity};

/// Build tool family selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    /// `mvn` from the configured location or `PATH`
    Maven,
    /// `mvnw` in the project root
    MavenWrapper,
    /// `gradle` from the configured location or `PATH`
    Gradle,
    /// `gradlew` in the project root
    GradleWrapper,
}

impl ToolKind {
    /// Detect the build tool of a source tree.
    ///
    /// Wrappers win over plain build files, and Maven over Gradle.
    pub fn detect(project_root: &Path) -> Option<ToolKind> {
        if project_root.join(wrapper_script("mvnw")).is_file() {
            Some(ToolKind::MavenWrapper)
        } else if project_root.join("pom.xml").is_file() {
            Some(ToolKind::Maven)
        } else if project_root.join(wrapper_script("gradlew")).is_file() {
            Some(ToolKind::GradleWrapper)
        } else if project_root.join("build.gradle").is_file()
            || project_root.join("build.gradle.kts").is_file()
        {
            Some(ToolKind::Gradle)
        } else {
            None
        }
    }

    /// Executable used when nothing else is configured
    pub fn default_executable(&self) -> &'static str {
        match self {
            ToolKind::Maven => "mvn",
            ToolKind::MavenWrapper => "mvnw",
            ToolKind::Gradle => "gradle",
            ToolKind::GradleWrapper => "gradlew",
        }
    }

    pub fn is_wrapper(&self) -> bool {
        matches!(self, ToolKind::MavenWrapper | ToolKind::GradleWrapper)
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolKind::Maven => write!(f, "maven"),
            ToolKind::MavenWrapper => write!(f, "maven-wrapper"),
            ToolKind::Gradle => write!(f, "gradle"),
            ToolKind::GradleWrapper => write!(f, "gradle-wrapper"),
        }
    }
}

impl std::str::FromStr for ToolKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "maven" | "mvn" => Ok(ToolKind::Maven),
            "maven-wrapper" | "mvnw" => Ok(ToolKind::MavenWrapper),
            "gradle" => Ok(ToolKind::Gradle),
            "gradle-wrapper" | "gradlew" => Ok(ToolKind::GradleWrapper),
            _ => anyhow::bail!(
                "Unknown build tool: {s}. Expected 'maven', 'maven-wrapper', 'gradle' or 'gradle-wrapper'"
            ),
        }
    }
}

/// Tool-specific half of a build invocation.
///
/// Implementations are pure: given the same inputs they return the same
/// tokens, which keeps merged command lines deterministic.
pub trait BuildTool: Send + Sync + std::fmt::Debug {
    fn kind(&self) -> ToolKind;

    /// Arguments prepended when the request asks for defaults
    fn default_build_arguments(&self) -> Vec<String>;

    /// Environment applied underneath the request's own variables when the
    /// request asks for defaults
    fn default_build_environment(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    fn verbosity_arguments(&self, verbosity: Verbosity) -> Vec<String>;

    fn skip_tests_arguments(&self, skip_tests: bool) -> Vec<String>;

    /// Token that sets property `key` to `value` on the tool's command line
    fn property_argument(&self, key: &str, value: &str) -> String {
        format!("-D{key}={value}")
    }

    /// Path of the executable to run for `request`.
    ///
    /// `configured` is the executable from configuration. The default looks
    /// it up on `PATH`, or relative to the project root when it contains a
    /// path separator.
    fn resolve_executable(
        &self,
        request: &BuildRequest,
        configured: &str,
    ) -> Result<PathBuf, BuildError> {
        resolve_configured(request, configured)
    }
}

/// Create the strategy for a tool kind
pub fn create_tool(kind: ToolKind) -> Box<dyn BuildTool> {
    match kind {
        ToolKind::Maven => Box::new(Maven::new()),
        ToolKind::MavenWrapper => Box::new(Maven::wrapper()),
        ToolKind::Gradle => Box::new(Gradle::new()),
        ToolKind::GradleWrapper => Box::new(Gradle::wrapper()),
    }
}

fn resolve_configured(request: &BuildRequest, configured: &str) -> Result<PathBuf, BuildError> {
    let unresolvable = |reason: String| BuildError::ExecutableResolution {
        repository_id: request.repository_id().to_string(),
        executable: configured.to_string(),
        reason,
    };

    let candidate = Path::new(configured);
    if candidate.components().count() > 1 {
        let path = request.project_root().join(candidate);
        return if is_executable_file(&path) {
            Ok(path)
        } else {
            Err(unresolvable(format!(
                "{} is not an executable file",
                path.display()
            )))
        };
    }

    which::which(configured).map_err(|e| unresolvable(e.to_string()))
}

/// Locate a wrapper script (`mvnw`, `gradlew`) in the request's project root
fn resolve_wrapper(request: &BuildRequest, name: &str) -> Result<PathBuf, BuildError> {
    let path = request.project_root().join(wrapper_script(name));
    if is_executable_file(&path) {
        Ok(path)
    } else {
        Err(BuildError::ExecutableResolution {
            repository_id: request.repository_id().to_string(),
            executable: path.display().to_string(),
            reason: "wrapper script missing or not executable".to_string(),
        })
    }
}

fn wrapper_script(name: &str) -> String {
    if cfg!(windows) {
        format!("{name}.cmd")
    } else {
        name.to_string()
    }
}

fn is_executable_file(path: &Path) -> bool {
    let Ok(metadata) = path.metadata() else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

fn to_strings(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|s| s.to_string()).collect()
}
