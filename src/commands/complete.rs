use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::config::{self, Config, MANIFEST};
use crate::host::{DeclKind, DeclarationInspector};
use crate::processor::completions;

/// Print completions for markup typed into the render annotation of `member`
///
/// `member` is `Type.method`, where `Type` may be qualified or simple.
pub fn execute(file: &str, member: &str, text: &str) -> Result<()> {
    let config = if Path::new(MANIFEST).exists() {
        config::load_config(MANIFEST)?
    } else {
        Config::standalone("complete")
    };

    let path = Path::new(file);
    let source = fs::read_to_string(path).context(format!("Failed to read {}", file))?;
    let mut model = config.processor.new_model();
    model.add_source(path, &source)?;

    let (type_name, method_name) = member
        .rsplit_once('.')
        .ok_or_else(|| anyhow::anyhow!("Expected `Type.method`, got `{}`", member))?;

    let method = model
        .types_named(type_name)
        .into_iter()
        .flat_map(|owner| model.enclosed(owner))
        .find(|&decl| {
            model.kind(decl) == DeclKind::Method && model.simple_name(decl) == method_name
        })
        .ok_or_else(|| anyhow::anyhow!("No method `{}` in {}", member, file))?;

    let processor_config = config.processor.processor_config();
    for completion in completions(&model, &processor_config, method, text) {
        println!("{}\t{}", completion.value, completion.message);
    }
    Ok(())
}
