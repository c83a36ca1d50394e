use clap::{Parser, Subcommand};
use srcbuild::builder::ToolKind;
use srcbuild::models::{OutputSink, Verbosity};
use srcbuild::validation::{clap_key_validator, clap_repository_id_validator, parse_key_value};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "srcbuild")]
#[command(about = "Build dependencies from source with Maven or Gradle", long_about = None)]
#[command(version)]
#[command(subcommand_help_heading = "Commands")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a checked-out dependency while holding a lock on its source tree
    ///
    /// Concurrent invocations on the same tree, from this or any other
    /// process, wait for each other.
    Build {
        /// Root of the dependency's source tree
        project_root: PathBuf,

        /// Repository id used in logs and errors (e.g. org.example:lib)
        #[arg(long = "repo-id", value_parser = clap_repository_id_validator)]
        repository_id: String,

        /// Build tool: maven, maven-wrapper, gradle, gradle-wrapper (detected when omitted)
        #[arg(short, long)]
        tool: Option<ToolKind>,

        /// Configuration file (default: ./srcbuild.toml, then the user config dir)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Kill the build after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Build tool verbosity: trace, debug, info, warn, error
        #[arg(short, long)]
        verbosity: Option<Verbosity>,

        /// Skip tests (the default unless configured otherwise)
        #[arg(long, conflicts_with = "run_tests")]
        skip_tests: bool,

        /// Run tests
        #[arg(long)]
        run_tests: bool,

        /// Do not add the tool's default arguments (e.g. `clean install`)
        #[arg(long)]
        no_default_args: bool,

        /// Do not add the tool's default environment
        #[arg(long)]
        no_default_env: bool,

        /// Extra environment variable for the build (repeatable)
        #[arg(short = 'e', long = "env", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        environment: Vec<(String, String)>,

        /// Property passed to the build and forwarded to nested builds (repeatable)
        #[arg(short = 'D', long = "property", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        properties: Vec<(String, String)>,

        /// Name of a property to forward to nested builds (repeatable)
        #[arg(long, value_name = "NAME", value_parser = clap_key_validator)]
        forward: Vec<String>,

        /// Build output: inherit, discard, capture, a file path, or append:<path>
        #[arg(short, long)]
        output: Option<OutputSink>,

        /// Extra arguments passed to the build tool
        #[arg(last = true)]
        build_args: Vec<String>,
    },

    /// Print the build tool detected in a source tree
    Detect {
        /// Root of the source tree
        project_root: PathBuf,
    },
}
