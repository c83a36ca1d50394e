//! Path lock tests combined with real builds

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use srcbuild::builder::{create_tool, BuildExecutor, ToolKind};
use srcbuild::commands::build::{self, BuildOptions};
use srcbuild::config::{Config, ExecutablesConfig};
use srcbuild::fs::locking::{lock_file_path, PathLockRegistry};
use srcbuild::models::{BuildRequest, OutputSink};

use super::helpers::*;

#[test]
fn test_second_acquirer_waits_for_close() {
    let project = FakeProject::new();
    let root = project.root().to_path_buf();
    let registry = Arc::new(PathLockRegistry::new());
    let released = Arc::new(AtomicBool::new(false));
    let (locked_tx, locked_rx) = mpsc::channel();

    let holder = {
        let registry = Arc::clone(&registry);
        let released = Arc::clone(&released);
        let root = root.clone();
        thread::spawn(move || {
            let lock = registry.acquire(&root, "first").unwrap();
            locked_tx.send(()).unwrap();
            thread::sleep(Duration::from_millis(200));
            released.store(true, Ordering::SeqCst);
            lock.close();
        })
    };

    locked_rx.recv().unwrap();
    let lock = registry.acquire(&root, "second").unwrap();
    assert!(
        released.load(Ordering::SeqCst),
        "second acquire returned before the first claim was closed"
    );
    lock.close();
    holder.join().unwrap();
}

#[test]
fn test_lock_build_release_cycle() {
    let project = FakeProject::new();
    project.recording_tool("mvnw", 0);
    let registry = PathLockRegistry::new();
    let executor = BuildExecutor::new(create_tool(ToolKind::MavenWrapper), "mvnw");
    let request = BuildRequest::builder("org.example:lib", project.root())
        .output(OutputSink::Discard)
        .build();

    for attempt in 0..2 {
        let lock = registry
            .acquire(project.root(), &format!("attempt-{attempt}"))
            .unwrap();
        assert!(registry.is_locked(project.root()));
        executor.build(&request).expect("Build should succeed");
        lock.close();
        assert!(!registry.is_locked(project.root()));
    }

    let canonical = std::fs::canonicalize(project.root()).unwrap();
    assert!(lock_file_path(&canonical).exists());
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.release_failures(), 0);
}

#[test]
fn test_lock_released_when_build_fails() {
    let project = FakeProject::new();
    project.recording_tool("mvnw", 1);
    let registry = PathLockRegistry::new();
    let executor = BuildExecutor::new(create_tool(ToolKind::MavenWrapper), "mvnw");
    let request = BuildRequest::builder("org.example:lib", project.root())
        .output(OutputSink::Discard)
        .build();

    let lock = registry.acquire(project.root(), "failing").unwrap();
    let result = executor.build(&request);
    lock.close();

    assert!(result.is_err());
    assert!(!registry.is_locked(project.root()));
}

#[test]
fn test_build_command_waits_for_other_process_lock() {
    let project = FakeProject::new();
    let marker = project.root().join("released.marker");
    let tool = project.script(
        "tools/mvn",
        &format!("test -f '{}' || exit 9", marker.display()),
    );

    // A second registry stands in for another process: it only shares the
    // OS-level advisory lock with the one used by the build command.
    let (locked_tx, locked_rx) = mpsc::channel();
    let root = project.root().to_path_buf();
    let other_process = thread::spawn(move || {
        let registry = PathLockRegistry::new();
        let lock = registry.acquire(&root, "other").unwrap();
        locked_tx.send(()).unwrap();
        thread::sleep(Duration::from_millis(300));
        std::fs::write(&marker, "").unwrap();
        lock.close();
    });
    locked_rx.recv().unwrap();

    let config = Config {
        executables: ExecutablesConfig {
            maven: tool.display().to_string(),
            ..Default::default()
        },
        ..Default::default()
    };
    let options = BuildOptions {
        project_root: project.root().to_path_buf(),
        repository_id: "org.example:lib".to_string(),
        tool: Some(ToolKind::Maven),
        output: Some(OutputSink::Discard),
        ..Default::default()
    };

    build::run(&options, &config, &PathLockRegistry::new()).expect("Build should succeed");
    other_process.join().unwrap();
}
