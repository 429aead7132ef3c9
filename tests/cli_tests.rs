use serial_test::serial;
use std::fs;
use tempfile::TempDir;

use javasx::build_pipeline;
use javasx::commands::{check, compile, init};
use javasx::config;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
#[serial]
fn test_init_creates_project_structure() {
    init_logging();
    let temp_dir = TempDir::new().unwrap();
    let project_path = temp_dir.path().join("demo-app");

    std::env::set_current_dir(temp_dir.path()).unwrap();
    let result = init::execute("demo-app");
    assert!(result.is_ok(), "Init command should succeed");

    assert!(project_path.join("javasx.toml").exists(), "javasx.toml should exist");
    assert!(project_path.join(".gitignore").exists(), ".gitignore should exist");
    assert!(
        project_path.join("src/demo_app/Hello.java").exists(),
        "Hello.java should be created in the project package"
    );

    let manifest = fs::read_to_string(project_path.join("javasx.toml")).unwrap();
    assert!(manifest.contains("name = \"demo-app\""));

    let hello = fs::read_to_string(project_path.join("src/demo_app/Hello.java")).unwrap();
    assert!(hello.starts_with("package demo_app;"));
}

#[test]
#[serial]
fn test_init_fails_for_existing_directory() {
    let temp_dir = TempDir::new().unwrap();
    std::env::set_current_dir(temp_dir.path()).unwrap();
    fs::create_dir(temp_dir.path().join("taken")).unwrap();

    let result = init::execute("taken");
    assert!(result.is_err(), "Init should fail for existing directory");
    assert!(result.unwrap_err().to_string().contains("already exists"));
}

#[test]
#[serial]
fn test_compile_initialized_project() {
    init_logging();
    let temp_dir = TempDir::new().unwrap();
    std::env::set_current_dir(temp_dir.path()).unwrap();
    init::execute("greeter").unwrap();

    let project = temp_dir.path().join("greeter");
    compile::execute(project.to_str().unwrap(), false).unwrap();

    // the working directory is restored after compiling
    assert_eq!(
        std::env::current_dir().unwrap().canonicalize().unwrap(),
        temp_dir.path().canonicalize().unwrap()
    );

    let generated = project.join("build/generated/greeter/HelloImpl.java");
    assert!(generated.exists(), "generated component should be written");

    let contents = fs::read_to_string(&generated).unwrap();
    assert!(contents.contains("final class HelloImpl extends greeter.Hello {"));
    assert!(contents.contains("protected final React.Element greet(String name, java.lang.Runnable _callback1) {"));
    assert!(contents.contains("React.createText(\"Hello, \" + name + \"!\")"));
    assert!(contents.contains("React.props(\"onClick\", onClick)"));
}

#[test]
#[serial]
fn test_recompile_leaves_unchanged_output_alone() {
    let temp_dir = TempDir::new().unwrap();
    std::env::set_current_dir(temp_dir.path()).unwrap();
    init::execute("stable").unwrap();

    let project = temp_dir.path().join("stable");
    std::env::set_current_dir(&project).unwrap();
    let config = config::load_config("javasx.toml").unwrap();

    let first = build_pipeline::execute_build(&config, false).unwrap();
    assert_eq!(first.generated.len(), 1);
    assert_eq!(first.unchanged, 0);
    let before = fs::read_to_string("build/generated/stable/HelloImpl.java").unwrap();

    let second = build_pipeline::execute_build(&config, false).unwrap();
    assert_eq!(second.unchanged, 1);
    let after = fs::read_to_string("build/generated/stable/HelloImpl.java").unwrap();
    assert_eq!(before, after);

    std::env::set_current_dir(temp_dir.path()).unwrap();
}

#[test]
#[serial]
fn test_check_reports_invalid_component() {
    let temp_dir = TempDir::new().unwrap();
    std::env::set_current_dir(temp_dir.path()).unwrap();
    init::execute("broken").unwrap();

    let project = temp_dir.path().join("broken");
    fs::write(
        project.join("src/broken/Bad.java"),
        r#"package broken;

import net.java.html.react.React;
import net.java.html.react.Render;
import net.java.html.react.RegisterComponent;

@RegisterComponent(name = "BadImpl")
abstract class Bad {
    @Render("<div/>")
    public abstract React.Element render();
}
"#,
    )
    .unwrap();

    let result = check::execute(project.to_str().unwrap());
    assert!(result.is_err(), "check should fail on an invalid component");
    assert!(result.unwrap_err().to_string().contains("1 error(s)"));
    assert!(
        !project.join("build").exists(),
        "check must not write generated sources"
    );
}

#[test]
#[serial]
fn test_compile_single_file_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    std::env::set_current_dir(temp_dir.path()).unwrap();

    let file = temp_dir.path().join("Card.java");
    fs::write(
        &file,
        r#"import net.java.html.react.React;
import net.java.html.react.Render;
import net.java.html.react.RegisterComponent;

@RegisterComponent(name = "CardImpl")
abstract class Card {
    @Render("<section><h2>{title}</h2></section>")
    protected abstract React.Element card(String title);
}
"#,
    )
    .unwrap();

    compile::execute(file.to_str().unwrap(), false).unwrap();
    let entries: Vec<_> = fs::read_dir(temp_dir.path()).unwrap().flatten().collect();
    assert_eq!(entries.len(), 1, "single-file mode only prints the output");
}
