use std::path::PathBuf;

use super::{resolve_configured, resolve_wrapper, to_strings, BuildTool, ToolKind};
use crate::error::BuildError;
use crate::models::{BuildRequest, Verbosity};

/// Maven, either installed (`mvn`) or through the project's `mvnw`
#[derive(Debug, Clone, Copy, Default)]
pub struct Maven {
    wrapper: bool,
}

impl Maven {
    pub fn new() -> Self {
        Self { wrapper: false }
    }

    pub fn wrapper() -> Self {
        Self { wrapper: true }
    }
}

impl BuildTool for Maven {
    fn kind(&self) -> ToolKind {
        if self.wrapper {
            ToolKind::MavenWrapper
        } else {
            ToolKind::Maven
        }
    }

    fn default_build_arguments(&self) -> Vec<String> {
        to_strings(&["clean", "install"])
    }

    fn verbosity_arguments(&self, verbosity: Verbosity) -> Vec<String> {
        match verbosity {
            Verbosity::Trace | Verbosity::Debug => to_strings(&["--debug"]),
            Verbosity::Info => Vec::new(),
            Verbosity::Warn | Verbosity::Error => to_strings(&["--quiet"]),
        }
    }

    fn skip_tests_arguments(&self, skip_tests: bool) -> Vec<String> {
        if skip_tests {
            to_strings(&["-DskipTests"])
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
            resolve_wrapper(request, "mvnw")
        } else {
            resolve_configured(request, configured)
        }
    }
}
