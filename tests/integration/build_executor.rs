//! Build executor tests against fake build tool scripts

use serial_test::serial;
use std::fs;
use std::time::{Duration, Instant};

use srcbuild::builder::{create_tool, BuildExecutor, ToolKind};
use srcbuild::config::Config;
use srcbuild::error::BuildError;
use srcbuild::models::{BuildRequest, OutputSink, Verbosity};
use srcbuild::process::is_process_alive;

use super::helpers::*;

#[test]
fn test_maven_wrapper_receives_merged_arguments() {
    let project = FakeProject::new();
    project.write("pom.xml", "<project/>");
    project.recording_tool("mvnw", 0);

    let kind = ToolKind::detect(project.root()).expect("Failed to detect tool");
    assert_eq!(kind, ToolKind::MavenWrapper);

    let executor = BuildExecutor::from_config(kind, &Config::default());
    let request = BuildRequest::builder("org.example:lib", project.root())
        .build_argument("-X")
        .verbosity(Verbosity::Info)
        .forward_property_value("a", "1")
        .forward_property_names(["a", "b"])
        .output(OutputSink::Discard)
        .build();

    executor.build(&request).expect("Build should succeed");

    assert_eq!(
        project.recorded_args(),
        vec![
            "clean",
            "install",
            "-X",
            "-DskipTests",
            "-Da=1",
            "-Dsrcbuild.forwardProperties=a,b"
        ]
    );
    assert_eq!(
        project.recorded_cwd(),
        fs::canonicalize(project.root()).unwrap()
    );
}

#[test]
fn test_gradle_wrapper_environment_and_tokens() {
    let project = FakeProject::new();
    project.write("build.gradle.kts", "");
    project.recording_tool("gradlew", 0);

    let executor = BuildExecutor::new(create_tool(ToolKind::GradleWrapper), "gradlew");
    let request = BuildRequest::builder("org.example:app", project.root())
        .verbosity(Verbosity::Error)
        .skip_tests(true)
        .build_env("SRCBUILD_TEST_VALUE", "from-request")
        .output(OutputSink::Discard)
        .build();

    executor.build(&request).expect("Build should succeed");

    assert_eq!(
        project.recorded_args(),
        vec![
            "clean",
            "publishToMavenLocal",
            "--quiet",
            "-x",
            "test",
            "-Dsrcbuild.forwardProperties="
        ]
    );
    assert_eq!(project.recorded_env(), "from-request");
}

#[test]
fn test_configured_relative_executable() {
    let project = FakeProject::new();
    project.recording_tool("tools/bin/mvn", 0);
    let config = Config::from_toml("[executables]\nmaven = \"tools/bin/mvn\"").unwrap();

    let executor = BuildExecutor::from_config(ToolKind::Maven, &config);
    let request = BuildRequest::builder("org.example:lib", project.root())
        .add_default_build_arguments(false)
        .build_argument("verify")
        .output(OutputSink::Discard)
        .build();

    executor.build(&request).expect("Build should succeed");

    assert_eq!(project.recorded_args()[0], "verify");
}

#[test]
fn test_nonzero_exit_is_build_failure() {
    let project = FakeProject::new();
    project.recording_tool("mvnw", 3);

    let executor = BuildExecutor::new(create_tool(ToolKind::MavenWrapper), "mvnw");
    let request = BuildRequest::builder("org.example:broken", project.root())
        .output(OutputSink::Discard)
        .build();

    let err = executor.build(&request).unwrap_err();

    assert_eq!(err.exit_code(), Some(3));
    assert_eq!(err.repository_id(), "org.example:broken");
    assert!(err.to_string().contains("mvnw"));
}

#[test]
fn test_missing_wrapper_fails_before_spawning() {
    let project = FakeProject::new();
    project.write("pom.xml", "<project/>");

    let executor = BuildExecutor::new(create_tool(ToolKind::MavenWrapper), "mvnw");
    let request = BuildRequest::builder("org.example:lib", project.root()).build();

    let err = executor.build(&request).unwrap_err();

    assert!(matches!(err, BuildError::ExecutableResolution { .. }));
}

#[test]
fn test_captured_output_returned_on_outcome() {
    let project = FakeProject::new();
    project.script("mvnw", "echo \"building $1\"\necho warning >&2");

    let executor = BuildExecutor::new(create_tool(ToolKind::MavenWrapper), "mvnw");
    let request = BuildRequest::builder("org.example:lib", project.root())
        .output(OutputSink::Capture)
        .build();

    let outcome = executor.execute(&request).expect("Build should succeed");

    assert!(outcome.succeeded());
    assert_eq!(outcome.stdout.as_deref(), Some("building clean\n"));
    assert_eq!(outcome.stderr.as_deref(), Some("warning\n"));
}

#[test]
fn test_captured_output_kept_on_failure() {
    let project = FakeProject::new();
    project.script(
        "mvnw",
        "echo '[ERROR] compilation failure in Foo.java'\necho 'BUILD FAILURE' >&2\nexit 1",
    );

    let executor = BuildExecutor::new(create_tool(ToolKind::MavenWrapper), "mvnw");
    let request = BuildRequest::builder("org.example:broken", project.root())
        .output(OutputSink::Capture)
        .build();

    let err = executor.execute(&request).unwrap_err();

    assert_eq!(err.exit_code(), Some(1));
    assert!(err
        .stdout()
        .is_some_and(|out| out.contains("[ERROR] compilation failure in Foo.java")));
    assert_eq!(err.stderr(), Some("BUILD FAILURE\n"));
}

#[test]
fn test_output_file_sink() {
    let project = FakeProject::new();
    project.script("mvnw", "echo out\necho err >&2");
    let log = project.root().join("build.log");

    let executor = BuildExecutor::new(create_tool(ToolKind::MavenWrapper), "mvnw");
    let request = BuildRequest::builder("org.example:lib", project.root())
        .output(OutputSink::File {
            path: log.clone(),
            append: false,
        })
        .build();

    executor.build(&request).expect("Build should succeed");

    let content = fs::read_to_string(&log).unwrap();
    assert!(content.contains("out"));
    assert!(content.contains("err"));
}

#[test]
#[serial]
fn test_timeout_terminates_build() {
    let project = FakeProject::new();
    let root = project.root().display().to_string();
    project.script("mvnw", &format!("echo $$ > '{root}/tool.pid'\nexec sleep 30"));

    let executor = BuildExecutor::new(create_tool(ToolKind::MavenWrapper), "mvnw");
    let request = BuildRequest::builder("org.example:slow", project.root())
        .timeout(Duration::from_millis(500))
        .output(OutputSink::Discard)
        .build();

    let start = Instant::now();
    let err = executor.build(&request).unwrap_err();

    assert!(err.is_timeout());
    assert!(start.elapsed() < Duration::from_secs(10));

    let pid: u32 = project.read("tool.pid").trim().parse().unwrap();
    assert!(!is_process_alive(pid), "build process {pid} still running");
}

#[test]
#[serial]
fn test_remaining_timeout_overrides_request_timeout() {
    let project = FakeProject::new();
    project.script("mvnw", "exec sleep 30");

    let mut executor = BuildExecutor::new(create_tool(ToolKind::MavenWrapper), "mvnw");
    executor.set_remaining_timeout(Duration::from_millis(500));
    let request = BuildRequest::builder("org.example:slow", project.root())
        .timeout(Duration::from_secs(60))
        .output(OutputSink::Discard)
        .build();

    let start = Instant::now();
    let err = executor.build(&request).unwrap_err();

    assert!(start.elapsed() < Duration::from_secs(10));
    match err {
        BuildError::TimedOut { timeout, .. } => assert_eq!(timeout, Duration::from_millis(500)),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
#[serial]
fn test_timed_out_build_keeps_partial_output() {
    let project = FakeProject::new();
    project.script("mvnw", "echo 'Downloading dependencies'\nexec sleep 30");

    let executor = BuildExecutor::new(create_tool(ToolKind::MavenWrapper), "mvnw");
    let request = BuildRequest::builder("org.example:slow", project.root())
        .timeout(Duration::from_millis(500))
        .output(OutputSink::Capture)
        .build();

    let err = executor.execute(&request).unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(err.stdout(), Some("Downloading dependencies\n"));
}
