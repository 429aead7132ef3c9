use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::host::{DirectoryFiler, Filer, MemoryFiler};
use crate::processor::{Diagnostic, GeneratedSource, Processor, Severity};
use crate::project::{discover_sources, load_model};

/// Represents the result of a build operation
#[derive(Debug)]
pub struct BuildResult {
    pub files_scanned: usize,
    pub output_dir: PathBuf,
    pub generated: Vec<GeneratedSource>,
    /// Generated files whose contents did not change since the last build
    pub unchanged: usize,
    pub diagnostics: Vec<Diagnostic>,
    pub errors: Vec<BuildError>,
}

impl BuildResult {
    pub fn error_count(&self) -> usize {
        self.errors.len()
            + self
                .diagnostics
                .iter()
                .filter(|d| d.severity == Severity::Error)
                .count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }
}

/// A source file that could not be processed at all
#[derive(Debug)]
pub struct BuildError {
    pub file: PathBuf,
    pub message: String,
}

/// Core build pipeline - used by compile and watch commands
///
/// # Arguments
/// * `config` - Parsed javasx.toml configuration
/// * `clean` - If true, remove and recreate output directory
///
/// # Returns
/// BuildResult with generated sources, diagnostics and any errors
pub fn execute_build(config: &Config, clean: bool) -> Result<BuildResult> {
    let output_dir = Path::new(&config.build.output_dir);

    // 1. Clean output directory if requested
    if clean && output_dir.exists() {
        fs::remove_dir_all(output_dir).context("Failed to clean output directory")?;
    }
    fs::create_dir_all(output_dir).context("Failed to create output directory")?;

    // 2. Process every source in one round
    let mut filer = DirectoryFiler::new(output_dir);
    let mut result = run_round(config, &mut filer)?;
    result.unchanged = filer.unchanged().len();

    Ok(result)
}

/// Validate the project without writing anything
pub fn check_project(config: &Config) -> Result<BuildResult> {
    let mut filer = MemoryFiler::new();
    run_round(config, &mut filer)
}

fn run_round(config: &Config, filer: &mut dyn Filer) -> Result<BuildResult> {
    let source_dir = Path::new(&config.build.source_dir);
    let files = discover_sources(source_dir).context("Failed to discover source files")?;

    let (model, syntax_errors) = load_model(config, &files)?;
    let errors = syntax_errors
        .into_iter()
        .map(|err| BuildError {
            file: err.path.clone(),
            message: format!("line {}: {}", err.line, err.message),
        })
        .collect();

    let processor = Processor::new(config.processor.processor_config());
    let round = processor.process(&model, filer);
    log::info!(
        "processed {} file(s): {} generated, {} diagnostic(s)",
        files.len(),
        round.generated().len(),
        round.diagnostics().len()
    );

    Ok(BuildResult {
        files_scanned: files.len(),
        output_dir: PathBuf::from(&config.build.output_dir),
        diagnostics: round.diagnostics().to_vec(),
        generated: round.into_generated(),
        unchanged: 0,
        errors,
    })
}

/// Run one round over a single Java file and keep the output in memory
pub fn compile_single_file(path: &Path, config: &Config) -> Result<BuildResult> {
    let files = vec![path.to_path_buf()];
    let (model, syntax_errors) = load_model(config, &files)?;
    if let Some(err) = syntax_errors.into_iter().next() {
        return Ok(BuildResult {
            files_scanned: 1,
            output_dir: PathBuf::new(),
            generated: Vec::new(),
            unchanged: 0,
            diagnostics: Vec::new(),
            errors: vec![BuildError {
                file: err.path.clone(),
                message: format!("line {}: {}", err.line, err.message),
            }],
        });
    }

    let mut filer = MemoryFiler::new();
    let round = Processor::new(config.processor.processor_config()).process(&model, &mut filer);
    Ok(BuildResult {
        files_scanned: 1,
        output_dir: PathBuf::new(),
        diagnostics: round.diagnostics().to_vec(),
        generated: round.into_generated(),
        unchanged: 0,
        errors: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const COMPONENT: &str = r#"package demo;

import net.java.html.react.React;
import net.java.html.react.Render;
import net.java.html.react.RegisterComponent;

@RegisterComponent(name = "Greeting")
abstract class GreetingCmp {
    @Render("<h1>Hello, {name}!</h1>")
    protected abstract React.Element greet(String name);
}
"#;

    #[test]
    fn test_compile_single_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("GreetingCmp.java");
        fs::write(&path, COMPONENT).unwrap();

        let result = compile_single_file(&path, &Config::standalone("t")).unwrap();
        assert!(!result.has_errors());
        assert_eq!(result.generated.len(), 1);
        assert_eq!(result.generated[0].name, "demo.Greeting");
        assert!(result.generated[0]
            .contents
            .contains("React.createText(\"Hello, \" + name + \"!\")"));
    }

    #[test]
    fn test_single_file_syntax_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("Broken.java");
        fs::write(&path, "class Broken {").unwrap();

        let result = compile_single_file(&path, &Config::standalone("t")).unwrap();
        assert_eq!(result.error_count(), 1);
        assert_eq!(result.errors[0].file, path);
    }
}
