use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;
use crate::host::java::{JavaModel, JavaSyntaxError};

/// Discover all .java files below `dir`, sorted by path
pub fn discover_sources(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        anyhow::bail!(
            "Source directory '{}' not found. Are you in a javasx project root?",
            dir.display()
        );
    }

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file() && is_java_file(path))
        .collect();

    files.sort();
    log::debug!("discovered {} source file(s) in {}", files.len(), dir.display());
    Ok(files)
}

pub fn is_java_file(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some("java")
}

/// Parse every source into one model; files with syntax errors are left out
/// and returned alongside
pub fn load_model(config: &Config, files: &[PathBuf]) -> Result<(JavaModel, Vec<JavaSyntaxError>)> {
    let mut model = config.processor.new_model();
    let mut syntax_errors = Vec::new();

    for file in files {
        let source = fs::read_to_string(file)
            .context(format!("Failed to read {}", file.display()))?;
        if let Err(err) = model.add_source(file, &source) {
            log::debug!("skipping {}: {}", file.display(), err);
            syntax_errors.push(err);
        }
    }
    Ok((model, syntax_errors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_discover_sources_sorted() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(src.join("demo/ui")).unwrap();
        fs::write(src.join("demo/ui/B.java"), "class B {}").unwrap();
        fs::write(src.join("demo/A.java"), "class A {}").unwrap();
        fs::write(src.join("demo/notes.txt"), "ignored").unwrap();

        let files = discover_sources(&src).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0], src.join("demo/A.java"));
        assert_eq!(files[1], src.join("demo/ui/B.java"));
    }

    #[test]
    fn test_missing_source_dir() {
        let temp = TempDir::new().unwrap();
        let err = discover_sources(&temp.path().join("src")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_load_model_collects_syntax_errors() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("Good.java"), "abstract class Good {}").unwrap();
        fs::write(temp.path().join("Bad.java"), "class Bad {").unwrap();

        let files = discover_sources(temp.path()).unwrap();
        let (model, errors) = load_model(&Config::standalone("t"), &files).unwrap();
        assert_eq!(model.units(), 1);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, temp.path().join("Bad.java"));
    }
}
