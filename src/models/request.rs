use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Build tool output verbosity, ordered from most to least chatty.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl std::fmt::Display for Verbosity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verbosity::Trace => write!(f, "trace"),
            Verbosity::Debug => write!(f, "debug"),
            Verbosity::Info => write!(f, "info"),
            Verbosity::Warn => write!(f, "warn"),
            Verbosity::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for Verbosity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Verbosity::Trace),
            "debug" => Ok(Verbosity::Debug),
            "info" => Ok(Verbosity::Info),
            "warn" => Ok(Verbosity::Warn),
            "error" => Ok(Verbosity::Error),
            _ => anyhow::bail!(
                "Unknown verbosity: {s}. Expected one of trace, debug, info, warn, error"
            ),
        }
    }
}

/// Where the build tool's stdout and stderr go
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputSink {
    /// Share the calling process's stdout/stderr
    #[default]
    Inherit,
    /// Drop all output
    Discard,
    /// Collect output in memory and return it with the execution outcome
    Capture,
    /// Write both streams to a file, truncating it unless `append` is set
    File { path: PathBuf, append: bool },
}

impl std::str::FromStr for OutputSink {
    type Err = std::convert::Infallible;

    /// Parses `inherit`, `discard`, `capture`, `append:<path>` or a plain file path.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "inherit" => OutputSink::Inherit,
            "discard" => OutputSink::Discard,
            "capture" => OutputSink::Capture,
            other => match other.strip_prefix("append:") {
                Some(path) => OutputSink::File {
                    path: PathBuf::from(path),
                    append: true,
                },
                None => OutputSink::File {
                    path: PathBuf::from(other),
                    append: false,
                },
            },
        })
    }
}

/// One dependency build to perform.
///
/// Created once per build by the caller and only ever read by the executor.
/// Use [`BuildRequest::builder`] to construct one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    repository_id: String,
    project_root: PathBuf,
    timeout: Duration,
    verbosity: Verbosity,
    build_arguments: Vec<String>,
    build_environment: BTreeMap<String, String>,
    add_default_build_arguments: bool,
    add_default_build_environment: bool,
    skip_tests: bool,
    forward_property_names: BTreeSet<String>,
    forward_property_values: BTreeMap<String, String>,
    output: OutputSink,
}

impl BuildRequest {
    /// Start a request for `repository_id` checked out at `project_root`
    pub fn builder(
        repository_id: impl Into<String>,
        project_root: impl Into<PathBuf>,
    ) -> BuildRequestBuilder {
        BuildRequestBuilder {
            request: BuildRequest {
                repository_id: repository_id.into(),
                project_root: project_root.into(),
                timeout: Duration::MAX,
                verbosity: Verbosity::default(),
                build_arguments: Vec::new(),
                build_environment: BTreeMap::new(),
                add_default_build_arguments: true,
                add_default_build_environment: true,
                skip_tests: true,
                forward_property_names: BTreeSet::new(),
                forward_property_values: BTreeMap::new(),
                output: OutputSink::default(),
            },
        }
    }

    pub fn repository_id(&self) -> &str {
        &self.repository_id
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Requested wall-clock bound; `Duration::MAX` means unbounded
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn build_arguments(&self) -> &[String] {
        &self.build_arguments
    }

    pub fn build_environment(&self) -> &BTreeMap<String, String> {
        &self.build_environment
    }

    pub fn add_default_build_arguments(&self) -> bool {
        self.add_default_build_arguments
    }

    pub fn add_default_build_environment(&self) -> bool {
        self.add_default_build_environment
    }

    pub fn skip_tests(&self) -> bool {
        self.skip_tests
    }

    pub fn forward_property_names(&self) -> &BTreeSet<String> {
        &self.forward_property_names
    }

    pub fn forward_property_values(&self) -> &BTreeMap<String, String> {
        &self.forward_property_values
    }

    pub fn output(&self) -> &OutputSink {
        &self.output
    }
}

/// Builder for [`BuildRequest`].
///
/// Defaults: unbounded timeout, `warn` verbosity, default arguments and
/// environment enabled, tests skipped, output inherited.
#[derive(Debug, Clone)]
pub struct BuildRequestBuilder {
    request: BuildRequest,
}

impl BuildRequestBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.request.timeout = timeout;
        self
    }

    pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.request.verbosity = verbosity;
        self
    }

    pub fn build_argument(mut self, arg: impl Into<String>) -> Self {
        self.request.build_arguments.push(arg.into());
        self
    }

    pub fn build_arguments<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request
            .build_arguments
            .extend(args.into_iter().map(Into::into));
        self
    }

    pub fn build_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.request
            .build_environment
            .insert(key.into(), value.into());
        self
    }

    pub fn add_default_build_arguments(mut self, value: bool) -> Self {
        self.request.add_default_build_arguments = value;
        self
    }

    pub fn add_default_build_environment(mut self, value: bool) -> Self {
        self.request.add_default_build_environment = value;
        self
    }

    pub fn skip_tests(mut self, value: bool) -> Self {
        self.request.skip_tests = value;
        self
    }

    pub fn forward_property_name(mut self, name: impl Into<String>) -> Self {
        self.request.forward_property_names.insert(name.into());
        self
    }

    pub fn forward_property_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request
            .forward_property_names
            .extend(names.into_iter().map(Into::into));
        self
    }

    pub fn forward_property_value(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.request
            .forward_property_values
            .insert(key.into(), value.into());
        self
    }

    pub fn output(mut self, output: OutputSink) -> Self {
        self.request.output = output;
        self
    }

    pub fn build(self) -> BuildRequest {
        self.request
    }
}
