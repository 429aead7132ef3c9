use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::Path;

const MANIFEST_TEMPLATE: &str = include_str!("../../templates/javasx.toml");
const HELLO_TEMPLATE: &str = include_str!("../../templates/src/Hello.java");
const GITIGNORE_TEMPLATE: &str = include_str!("../../templates/.gitignore");

pub fn execute(project_name: &str) -> Result<()> {
    let project_path = Path::new(project_name);

    if project_path.exists() {
        anyhow::bail!("Directory '{}' already exists", project_name);
    }

    let package = to_package_name(project_name);
    let package_dir = project_path.join("src").join(package.replace('.', "/"));
    fs::create_dir_all(&package_dir).context("Failed to create project directories")?;

    let manifest_content = MANIFEST_TEMPLATE.replace("{{PROJECT_NAME}}", project_name);
    fs::write(project_path.join("javasx.toml"), manifest_content)
        .context("Failed to write javasx.toml")?;

    let hello = HELLO_TEMPLATE.replace("{{PACKAGE}}", &package);
    fs::write(package_dir.join("Hello.java"), hello).context("Failed to write Hello.java")?;

    fs::write(project_path.join(".gitignore"), GITIGNORE_TEMPLATE)
        .context("Failed to write .gitignore")?;

    println!(
        "     {} javasx project `{}`",
        "Created".green().bold(),
        project_name
    );

    Ok(())
}

/// `My App-2` becomes `my_app_2`; a leading digit gets an underscore
pub fn to_package_name(project_name: &str) -> String {
    let base = Path::new(project_name)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(project_name);
    let mut package: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if package.is_empty() || package.starts_with(|c: char| c.is_ascii_digit()) {
        package.insert(0, '_');
    }
    package
}
