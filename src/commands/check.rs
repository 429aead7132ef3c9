use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use std::time::Instant;

use crate::build_pipeline;
use crate::commands::{detect_target, report, ProjectDir, Target};
use crate::config::{self, Config};

/// Validate components without writing generated sources
pub fn execute(target: &str) -> Result<()> {
    let start = Instant::now();

    let result = match detect_target(target) {
        Target::Project(manifest_path) => {
            let project = ProjectDir::enter(&manifest_path)?;
            let config = config::load_config(project.manifest_file())?;
            build_pipeline::check_project(&config)?
        }
        Target::SingleFile(file_path) => {
            let path = Path::new(&file_path);
            if !path.exists() {
                anyhow::bail!("File not found: {}", file_path);
            }
            build_pipeline::compile_single_file(path, &Config::standalone("check"))?
        }
    };

    let errors = report(&result);
    if errors > 0 {
        anyhow::bail!("Check failed with {} error(s)", errors);
    }

    println!(
        "   {} {} file(s), {} component(s) in {:.2}s",
        "Checked".green().bold(),
        result.files_scanned,
        result.generated.len(),
        start.elapsed().as_secs_f64()
    );

    Ok(())
}
