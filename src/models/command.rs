use shell_escape::escape;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::request::OutputSink;

/// A fully resolved external build invocation.
///
/// Assembled once per execution attempt by the executor and handed to a
/// [`ProcessRunner`](crate::process::ProcessRunner). Never modified after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDescriptor {
    id: String,
    executable: PathBuf,
    arguments: Vec<String>,
    working_directory: PathBuf,
    environment: BTreeMap<String, String>,
    output: OutputSink,
    timeout: Duration,
}

impl CommandDescriptor {
    pub fn new(
        id: impl Into<String>,
        executable: impl Into<PathBuf>,
        arguments: Vec<String>,
        working_directory: impl Into<PathBuf>,
        environment: BTreeMap<String, String>,
        output: OutputSink,
        timeout: Duration,
    ) -> Self {
        Self {
            id: id.into(),
            executable: executable.into(),
            arguments,
            working_directory: working_directory.into(),
            environment,
            output,
            timeout,
        }
    }

    /// Identifier used in diagnostics, normally the repository id
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    /// Variables set on top of the inherited environment
    pub fn environment(&self) -> &BTreeMap<String, String> {
        &self.environment
    }

    pub fn output(&self) -> &OutputSink {
        &self.output
    }

    /// Enforced deadline; `Duration::MAX` means the process may run forever
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Shell-quoted command line, for logs and error messages
    pub fn summary(&self) -> String {
        let executable = self.executable.to_string_lossy();
        std::iter::once(escape(executable))
            .chain(self.arguments.iter().map(|a| escape(Cow::Borrowed(a.as_str()))))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl std::fmt::Display for CommandDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(args: &[&str]) -> CommandDescriptor {
        CommandDescriptor::new(
            "repo",
            "/usr/bin/mvn",
            args.iter().map(|s| s.to_string()).collect(),
            "/tmp",
            BTreeMap::new(),
            OutputSink::Inherit,
            Duration::from_secs(1),
        )
    }

    #[test]
    fn test_summary_plain_arguments() {
        let cmd = descriptor(&["clean", "install"]);
        assert_eq!(cmd.summary(), "/usr/bin/mvn clean install");
    }

    #[test]
    fn test_summary_quotes_arguments_with_spaces() {
        let cmd = descriptor(&["-Dmessage=hello world"]);
        assert_eq!(cmd.summary(), "/usr/bin/mvn '-Dmessage=hello world'");
    }

    #[test]
    fn test_display_matches_summary() {
        let cmd = descriptor(&["-B"]);
        assert_eq!(cmd.to_string(), cmd.summary());
    }
}
