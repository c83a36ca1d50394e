use anyhow::Result;
use srcbuild::commands::build::BuildOptions;
use srcbuild::commands::{build, detect};

use super::types::Commands;

pub fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Build {
            project_root,
            repository_id,
            tool,
            config,
            timeout_secs,
            verbosity,
            skip_tests,
            run_tests,
            no_default_args,
            no_default_env,
            environment,
            properties,
            forward,
            output,
            build_args,
        } => build::execute(BuildOptions {
            project_root,
            repository_id,
            tool,
            config,
            timeout_secs,
            verbosity,
            skip_tests: tests_flag(skip_tests, run_tests),
            no_default_args,
            no_default_env,
            environment,
            properties,
            forward,
            output,
            build_arguments: build_args,
        }),
        Commands::Detect { project_root } => detect::execute(&project_root),
    }
}

fn tests_flag(skip_tests: bool, run_tests: bool) -> Option<bool> {
    match (skip_tests, run_tests) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    }
}
