//! Detect command - reports which build tool a source tree uses

use anyhow::{bail, Result};
use std::path::Path;

use crate::builder::ToolKind;

/// Print the detected tool kind for `project_root`
pub fn execute(project_root: &Path) -> Result<()> {
    let kind = detect(project_root)?;
    println!("{kind}");
    Ok(())
}

pub fn detect(project_root: &Path) -> Result<ToolKind> {
    if !project_root.is_dir() {
        bail!("{} is not a directory", project_root.display());
    }
    match ToolKind::detect(project_root) {
        Some(kind) => Ok(kind),
        None => bail!("No Maven or Gradle build found in {}", project_root.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_detect_gradle_kotlin_dsl() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("build.gradle.kts"), "").unwrap();

        assert_eq!(detect(temp.path()).unwrap(), ToolKind::Gradle);
    }

    #[test]
    fn test_detect_empty_directory() {
        let temp = TempDir::new().unwrap();
        let err = detect(temp.path()).unwrap_err();
        assert!(err.to_string().contains("No Maven or Gradle build found"));
    }

    #[test]
    fn test_detect_missing_directory() {
        let temp = TempDir::new().unwrap();
        assert!(detect(&temp.path().join("missing")).is_err());
    }
}
