//! Build command - runs one dependency build under the project root's path lock

use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use std::time::Duration;

use crate::builder::{BuildExecutor, ToolKind};
use crate::config::Config;
use crate::fs::locking::PathLockRegistry;
use crate::models::{BuildRequest, OutputSink, Verbosity};

/// Command-line options for `srcbuild build`
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub project_root: PathBuf,
    pub repository_id: String,
    pub tool: Option<ToolKind>,
    pub config: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub verbosity: Option<Verbosity>,
    /// `None` keeps the configured default
    pub skip_tests: Option<bool>,
    pub no_default_args: bool,
    pub no_default_env: bool,
    pub environment: Vec<(String, String)>,
    /// Forwarded with their values and listed as forwarded names
    pub properties: Vec<(String, String)>,
    /// Listed as forwarded names without a value
    pub forward: Vec<String>,
    pub output: Option<OutputSink>,
    pub build_arguments: Vec<String>,
}

/// Execute the build command
pub fn execute(options: BuildOptions) -> Result<()> {
    let config = Config::discover(options.config.as_deref())?;
    let registry = PathLockRegistry::new();
    run(&options, &config, &registry)
}

/// Build with an explicit configuration and lock registry
pub fn run(options: &BuildOptions, config: &Config, registry: &PathLockRegistry) -> Result<()> {
    let kind = resolve_tool(options)?;
    let request = build_request(options, config);
    let executor = BuildExecutor::from_config(kind, config);
    let request_id = uuid::Uuid::new_v4().to_string();

    println!(
        "{} Building {} with {}",
        "→".cyan().bold(),
        request.repository_id().bold(),
        kind
    );

    let lock = registry
        .acquire(request.project_root(), &request_id)
        .with_context(|| format!("Failed to lock {}", request.project_root().display()))?;

    let result = executor.execute(&request);
    lock.close();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            print_captured(e.stdout(), e.stderr());
            return Err(e)
                .with_context(|| format!("Build of {} failed", request.repository_id()));
        }
    };
    print_captured(outcome.stdout.as_deref(), outcome.stderr.as_deref());

    println!(
        "{} {} built in {:.1}s",
        "✓".green().bold(),
        request.repository_id(),
        outcome.duration.as_secs_f64()
    );
    Ok(())
}

/// Replay output collected under `--output capture`
fn print_captured(stdout: Option<&str>, stderr: Option<&str>) {
    if let Some(stdout) = stdout.filter(|s| !s.is_empty()) {
        print!("{stdout}");
    }
    if let Some(stderr) = stderr.filter(|s| !s.is_empty()) {
        eprint!("{stderr}");
    }
}

/// Explicit `--tool`, or whatever the project root looks like
pub fn resolve_tool(options: &BuildOptions) -> Result<ToolKind> {
    if let Some(kind) = options.tool {
        return Ok(kind);
    }
    match ToolKind::detect(&options.project_root) {
        Some(kind) => Ok(kind),
        None => bail!(
            "Cannot detect build tool in {}. Pass --tool explicitly",
            options.project_root.display()
        ),
    }
}

/// Assemble the request: configured defaults, overridden by the command line
pub fn build_request(options: &BuildOptions, config: &Config) -> BuildRequest {
    let mut builder = config
        .request_builder(&options.repository_id, &options.project_root)
        .build_arguments(options.build_arguments.iter().cloned())
        .forward_property_names(options.forward.iter().cloned());

    if let Some(secs) = options.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    if let Some(verbosity) = options.verbosity {
        builder = builder.verbosity(verbosity);
    }
    if let Some(skip) = options.skip_tests {
        builder = builder.skip_tests(skip);
    }
    if options.no_default_args {
        builder = builder.add_default_build_arguments(false);
    }
    if options.no_default_env {
        builder = builder.add_default_build_environment(false);
    }
    if let Some(output) = &options.output {
        builder = builder.output(output.clone());
    }
    for (key, value) in &options.environment {
        builder = builder.build_env(key, value);
    }
    for (key, value) in &options.properties {
        builder = builder
            .forward_property_value(key, value)
            .forward_property_name(key);
    }

    builder.build()
}
