use std::path::PathBuf;

use super::{resolve_configured, resolve_wrapper, to_strings, BuildTool, ToolKind};
use crate::error::BuildError;
use crate::models::{BuildRequest, Verbosity};

/// Gradle, either installed (`gradle`) or through the project's `gradlew`
#[derive(Debug, Clone, Copy, Default)]
pub struct Gradle {
    wrapper: bool,
}

impl Gradle {
    pub fn new() -> Self {
        Self { wrapper: false }
    }

    pub fn wrapper() -> Self {
        Self { wrapper: true }
    }
}

impl BuildTool for Gradle {
    fn kind(&self) -> ToolKind {
        if self.wrapper {
            ToolKind::GradleWrapper
        } else {
            ToolKind::Gradle
        }
    }

    fn default_build_arguments(&self) -> Vec<String> {
        to_strings(&["clean", "publishToMavenLocal"])
    }

    fn verbosity_arguments(&self, verbosity: Verbosity) -> Vec<String> {
        match verbosity {
            Verbosity::Trace | Verbosity::Debug => to_strings(&["--debug"]),
            Verbosity::Info => to_strings(&["--info"]),
            Verbosity::Warn => to_strings(&["--warn"]),
            Verbosity::Error => to_strings(&["--quiet"]),
        }
    }

    fn skip_tests_arguments(&self, skip_tests: bool) -> Vec<String> {
        if skip_tests {
            to_strings(&["-x", "test"])
        } else {
            Vec::new()
        }
    }

    fn resolve_executable(
        &self,
        request: &BuildRequest,
        configured: &str,
    ) -> Result<PathBuf, BuildError> {
        if self.wrapper {
            resolve_wrapper(request, "gradlew")
        } else {
            resolve_configured(request, configured)
        }
    }
}
