pub mod check;
pub mod compile;
pub mod complete;
pub mod init;
pub mod watch;

use anyhow::{Context, Result};
use colored::Colorize;
use std::env;
use std::path::{Path, PathBuf};

use crate::build_pipeline::BuildResult;
use crate::config::MANIFEST;
use crate::processor::Severity;

/// Represents the type of target we're working with
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// A javasx project directory (contains javasx.toml)
    Project(String), // manifest path
    /// A single .java file
    SingleFile(String), // file path
}

/// Detect whether the target is a project directory or a single file
pub fn detect_target(target: &str) -> Target {
    let path = Path::new(target);

    if target.ends_with(".java") {
        return Target::SingleFile(target.to_string());
    }

    if path.is_dir() {
        let manifest_path = path.join(MANIFEST);
        if manifest_path.exists() {
            return Target::Project(manifest_path.to_string_lossy().into_owned());
        }
        return Target::Project(MANIFEST.to_string());
    }

    Target::Project(target.to_string())
}

/// Working directory switched to a project root, restored on drop
pub struct ProjectDir {
    original_dir: PathBuf,
    project_dir: PathBuf,
    manifest_file: String,
}

impl ProjectDir {
    pub fn enter(manifest_path: &str) -> Result<Self> {
        let manifest_path = Path::new(manifest_path);
        let original_dir = env::current_dir()?;

        // A bare "javasx.toml" means the current directory
        let project_dir = if manifest_path == Path::new(MANIFEST) {
            original_dir.clone()
        } else {
            let dir = manifest_path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .to_path_buf();
            if dir.is_relative() {
                original_dir.join(dir)
            } else {
                dir
            }
        };

        if project_dir != original_dir {
            env::set_current_dir(&project_dir)
                .context(format!("Failed to change to directory: {}", project_dir.display()))?;
        }

        let manifest_file = manifest_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(MANIFEST)
            .to_string();

        Ok(ProjectDir {
            original_dir,
            project_dir,
            manifest_file,
        })
    }

    pub fn manifest_file(&self) -> &str {
        &self.manifest_file
    }

    /// `path` relative to where the command was started, when possible
    pub fn display_path(&self, path: &Path) -> PathBuf {
        let absolute = self.project_dir.join(path);
        match absolute.strip_prefix(&self.original_dir) {
            Ok(relative) => relative.to_path_buf(),
            Err(_) => absolute,
        }
    }
}

impl Drop for ProjectDir {
    fn drop(&mut self) {
        if self.project_dir != self.original_dir {
            let _ = env::set_current_dir(&self.original_dir);
        }
    }
}

/// Print build errors and diagnostics; returns the number of errors
pub fn report(result: &BuildResult) -> usize {
    for error in &result.errors {
        eprintln!(
            "{} {}: {}",
            "error:".red().bold(),
            error.file.display(),
            error.message
        );
    }
    for diagnostic in &result.diagnostics {
        let label = match diagnostic.severity {
            Severity::Error => "error:".red().bold(),
            Severity::Warning => "warning:".yellow().bold(),
        };
        eprintln!("{} {}", label, diagnostic);
    }
    result.error_count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_single_file() {
        assert_eq!(
            detect_target("src/Hello.java"),
            Target::SingleFile("src/Hello.java".to_string())
        );
    }

    #[test]
    fn test_detect_manifest_path() {
        assert_eq!(
            detect_target("demo/javasx.toml"),
            Target::Project("demo/javasx.toml".to_string())
        );
    }
}
