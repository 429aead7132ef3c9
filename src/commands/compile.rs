use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use std::time::Instant;

use crate::build_pipeline;
use crate::commands::{detect_target, report, ProjectDir, Target};
use crate::config::{self, Config};

/// Compile a project or a single .java file
pub fn execute(target: &str, print: bool) -> Result<()> {
    match detect_target(target) {
        Target::Project(manifest_path) => execute_project(&manifest_path, print),
        Target::SingleFile(file_path) => execute_single_file(&file_path),
    }
}

/// Compile a project into its output directory
fn execute_project(manifest_path: &str, print: bool) -> Result<()> {
    let start = Instant::now();

    let project = ProjectDir::enter(manifest_path)?;
    let config = config::load_config(project.manifest_file())?;

    let result = build_pipeline::execute_build(&config, false)?;

    let errors = report(&result);
    if errors > 0 {
        anyhow::bail!("compilation failed with {} error(s)", errors);
    }

    if print {
        for source in &result.generated {
            println!("// {}\n{}", source.name, source.contents);
        }
    }

    let output_path = project.display_path(&result.output_dir);
    println!(
        "   {} {} component(s) from {} file(s) to {} in {:.2}s",
        "Compiled".green().bold(),
        result.generated.len(),
        result.files_scanned,
        output_path.display(),
        start.elapsed().as_secs_f64()
    );
    if result.unchanged > 0 {
        println!("   {} {} unchanged", "Skipped".dimmed(), result.unchanged);
    }

    Ok(())
}

/// Compile one file and print the generated sources to stdout
fn execute_single_file(file_path: &str) -> Result<()> {
    let path = Path::new(file_path);
    if !path.exists() {
        anyhow::bail!("File not found: {}", file_path);
    }

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("standalone");
    let result = build_pipeline::compile_single_file(path, &Config::standalone(name))?;

    let errors = report(&result);
    if errors > 0 {
        anyhow::bail!("compilation failed with {} error(s)", errors);
    }

    if result.generated.is_empty() {
        eprintln!("{} no components found in {}", "warning:".yellow().bold(), file_path);
    }
    for source in &result.generated {
        print!("{}", source.contents);
    }

    Ok(())
}
