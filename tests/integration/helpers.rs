//! Shared helpers: scratch project roots and fake build tool scripts

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// File the recording script writes its arguments to, one per line
pub const ARGS_FILE: &str = "invocation.args";
/// File the recording script writes its working directory to
pub const CWD_FILE: &str = "invocation.cwd";
/// File the recording script writes `$SRCBUILD_TEST_VALUE` to
pub const ENV_FILE: &str = "invocation.env";

/// A scratch source tree that is deleted when dropped
pub struct FakeProject {
    dir: TempDir,
}

impl FakeProject {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&path, content).expect("Failed to write file");
        path
    }

    /// Write an executable shell script at `relative` with the given body
    pub fn script(&self, relative: &str, body: &str) -> PathBuf {
        let path = self.write(relative, &format!("#!/bin/sh\n{body}\n"));
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("Failed to make script executable");
        path
    }

    /// Script that records its arguments, working directory and
    /// `$SRCBUILD_TEST_VALUE` into the project root, then exits with `exit_code`
    pub fn recording_tool(&self, relative: &str, exit_code: i32) -> PathBuf {
        let root = self.root().display().to_string();
        self.script(
            relative,
            &format!(
                "printf '%s\\n' \"$@\" > '{root}/{ARGS_FILE}'\n\
                 pwd -P > '{root}/{CWD_FILE}'\n\
                 printf '%s\\n' \"$SRCBUILD_TEST_VALUE\" > '{root}/{ENV_FILE}'\n\
                 exit {exit_code}"
            ),
        )
    }

    /// Arguments recorded by [`recording_tool`](Self::recording_tool)
    pub fn recorded_args(&self) -> Vec<String> {
        self.read(ARGS_FILE).lines().map(str::to_string).collect()
    }

    pub fn recorded_cwd(&self) -> PathBuf {
        PathBuf::from(self.read(CWD_FILE).trim_end())
    }

    pub fn recorded_env(&self) -> String {
        self.read(ENV_FILE).trim_end().to_string()
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.root().join(relative)).expect("Failed to read recorded file")
    }
}
