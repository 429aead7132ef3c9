use anyhow::Result;
use regex::Regex;
use serde::Deserialize;
use std::fs;

use crate::emit::Runtime;
use crate::host::java::{CallbackInterface, JavaModel};
use crate::processor::ProcessorConfig;

pub const MANIFEST: &str = "javasx.toml";

#[derive(Debug, Deserialize)]
pub struct Config {
    pub project: ProjectConfig,
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub processor: ProcessorSection,
}

#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct BuildConfig {
    #[serde(default = "default_source_dir")]
    pub source_dir: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_source_dir() -> String {
    "src".to_string()
}

fn default_output_dir() -> String {
    "build/generated".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProcessorSection {
    #[serde(default = "default_render_annotation")]
    pub render_annotation: String,
    #[serde(default = "default_component_annotation")]
    pub component_annotation: String,
    #[serde(default = "default_expected_error_annotation")]
    pub expected_error_annotation: String,
    #[serde(default = "default_element_type")]
    pub element_type: String,
    #[serde(default = "default_props_type")]
    pub props_type: String,
    #[serde(default = "default_runtime_class")]
    pub runtime_class: String,
    #[serde(default = "default_callback_class")]
    pub callback_class: String,
    /// Extra single-method interfaces whose source is not part of the project
    #[serde(default)]
    pub callbacks: Vec<CallbackConfig>,
}

impl Default for ProcessorSection {
    fn default() -> Self {
        Self {
            render_annotation: default_render_annotation(),
            component_annotation: default_component_annotation(),
            expected_error_annotation: default_expected_error_annotation(),
            element_type: default_element_type(),
            props_type: default_props_type(),
            runtime_class: default_runtime_class(),
            callback_class: default_callback_class(),
            callbacks: Vec::new(),
        }
    }
}

fn default_render_annotation() -> String {
    "net.java.html.react.Render".to_string()
}

fn default_component_annotation() -> String {
    "net.java.html.react.RegisterComponent".to_string()
}

fn default_expected_error_annotation() -> String {
    "net.java.html.react.test.ExpectedError".to_string()
}

fn default_element_type() -> String {
    "net.java.html.react.React.Element".to_string()
}

fn default_props_type() -> String {
    "net.java.html.react.React.Props".to_string()
}

fn default_runtime_class() -> String {
    "net.java.html.react.React".to_string()
}

fn default_callback_class() -> String {
    "net.java.html.react.React4J".to_string()
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CallbackConfig {
    pub interface: String,
    #[serde(default)]
    pub type_params: Vec<String>,
    pub method: String,
    #[serde(default)]
    pub parameters: Vec<String>,
}

impl ProcessorSection {
    pub fn processor_config(&self) -> ProcessorConfig {
        ProcessorConfig {
            render_annotation: self.render_annotation.clone(),
            component_annotation: self.component_annotation.clone(),
            expected_error_annotation: self.expected_error_annotation.clone(),
            runtime: Runtime {
                runtime_class: self.runtime_class.clone(),
                element_type: self.element_type.clone(),
                props_type: self.props_type.clone(),
                callback_class: self.callback_class.clone(),
            },
        }
    }

    /// An empty model that knows the configured framework types and callbacks
    pub fn new_model(&self) -> JavaModel {
        let mut model = JavaModel::new();
        for known in [
            &self.render_annotation,
            &self.component_annotation,
            &self.expected_error_annotation,
            &self.runtime_class,
            &self.callback_class,
        ] {
            model.add_known_type(known);
        }
        for callback in &self.callbacks {
            model.add_callback_interface(CallbackInterface {
                interface: callback.interface.clone(),
                type_params: callback.type_params.clone(),
                method: callback.method.clone(),
                parameters: callback.parameters.clone(),
            });
        }
        model
    }
}

impl Config {
    /// Configuration used for files compiled outside a project
    pub fn standalone(name: &str) -> Self {
        Config {
            project: ProjectConfig {
                name: name.to_string(),
            },
            build: BuildConfig::default(),
            processor: ProcessorSection::default(),
        }
    }
}

/// Load and parse javasx.toml configuration file
pub fn load_config(path: &str) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            anyhow::anyhow!("could not find `{}` in current directory", path)
        } else {
            anyhow::anyhow!("failed to read `{}`: {}", path, e)
        }
    })?;

    let config = parse_config(&content).map_err(|e| anyhow::anyhow!("failed to parse `{}`: {}", path, e))?;
    log::debug!("loaded {} for project `{}`", path, config.project.name);
    Ok(config)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.project.name.trim().is_empty() {
        anyhow::bail!("project.name must not be empty");
    }

    let processor = &config.processor;
    let names = [
        ("render_annotation", &processor.render_annotation),
        ("component_annotation", &processor.component_annotation),
        ("expected_error_annotation", &processor.expected_error_annotation),
        ("element_type", &processor.element_type),
        ("props_type", &processor.props_type),
        ("runtime_class", &processor.runtime_class),
        ("callback_class", &processor.callback_class),
    ];
    for (key, value) in names {
        validate_qualified_name(key, value)?;
    }
    for callback in &processor.callbacks {
        validate_qualified_name("callbacks.interface", &callback.interface)?;
        if !is_identifier(&callback.method) {
            anyhow::bail!(
                "Invalid callback method '{}' for '{}'",
                callback.method,
                callback.interface
            );
        }
    }
    Ok(())
}

/// Qualified Java names need at least a package and a simple name
fn validate_qualified_name(key: &str, value: &str) -> Result<()> {
    let pattern = Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*(\.[A-Za-z_$][A-Za-z0-9_$]*)+$")?;
    if !pattern.is_match(value) {
        anyhow::bail!(
            "Invalid value '{}' for processor.{}. Expected a qualified Java name (e.g. 'com.example.Type')",
            value,
            key
        );
    }
    Ok(())
}

fn is_identifier(value: &str) -> bool {
    crate::processor::is_java_identifier(value)
}
