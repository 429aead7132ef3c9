use anyhow::Result;
use colored::Colorize;
use notify::{Event, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;

use crate::build_pipeline;
use crate::commands::{detect_target, report, ProjectDir, Target};
use crate::config::{self, Config, MANIFEST};

pub fn execute(target: &str) -> Result<()> {
    match detect_target(target) {
        Target::Project(manifest_path) => execute_project(&manifest_path),
        Target::SingleFile(file_path) => execute_single_file(&file_path),
    }
}

/// Watch a single .java file, printing its generated sources on every change
fn execute_single_file(file_path: &str) -> Result<()> {
    let path = PathBuf::from(file_path);
    let config = Config::standalone("watch");

    let rebuild = || -> Result<()> {
        let result = build_pipeline::compile_single_file(&path, &config)?;
        let errors = report(&result);
        if errors > 0 {
            anyhow::bail!("Build failed with {} error(s)", errors);
        }
        for source in &result.generated {
            print!("{}", source.contents);
        }
        Ok(())
    };

    watch_loop(&[(path.clone(), RecursiveMode::NonRecursive)], rebuild)
}

/// Watch a project's sources and manifest
fn execute_project(manifest_path: &str) -> Result<()> {
    let project = ProjectDir::enter(manifest_path)?;
    let config = config::load_config(project.manifest_file())?;

    let rebuild = || -> Result<()> {
        let result = build_pipeline::execute_build(&config, false)?;
        let errors = report(&result);
        if errors > 0 {
            anyhow::bail!("Build failed with {} error(s)", errors);
        }
        Ok(())
    };

    let paths = [
        (PathBuf::from(&config.build.source_dir), RecursiveMode::Recursive),
        (PathBuf::from(project.manifest_file()), RecursiveMode::NonRecursive),
    ];
    watch_loop(&paths, rebuild)
}

fn watch_loop(paths: &[(PathBuf, RecursiveMode)], mut rebuild: impl FnMut() -> Result<()>) -> Result<()> {
    match rebuild() {
        Ok(_) => println!("{}", "   Watching for changes...".green().bold()),
        Err(e) => {
            eprintln!("{} initial build failed: {}", "error:".red().bold(), e);
            eprintln!("Watching anyway (will retry on file changes)...");
        }
    }

    let (tx, rx) = channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        if let Ok(event) = res {
            let _ = tx.send(event);
        }
    })?;
    for (path, mode) in paths {
        watcher.watch(path, *mode)?;
    }

    // Ends when the watcher is dropped or the process is interrupted
    for event in rx {
        if !should_rebuild(&event) {
            continue;
        }
        let changed_file = event
            .paths
            .first()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .unwrap_or("file");
        println!("\nChange detected in {}", changed_file);

        match rebuild() {
            Ok(_) => println!("   {}", "Finished".green().bold()),
            Err(e) => eprintln!("{} build failed: {}", "error:".red().bold(), e),
        }
    }
    Ok(())
}

fn should_rebuild(event: &Event) -> bool {
    use notify::EventKind::*;

    match event.kind {
        Modify(_) | Create(_) | Remove(_) => event.paths.iter().any(|p| is_watched(p)),
        _ => false,
    }
}

fn is_watched(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "java")
        || path.file_name().map_or(false, |name| name == MANIFEST)
}
