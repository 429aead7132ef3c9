//! javasx - compiles markup embedded in Java annotations into render methods
//!
//! Abstract `@Render` methods on `@RegisterComponent` classes carry an XML
//! snippet with `{expr}` interpolation. The processor validates the
//! declarations, parses the markup and writes one generated subclass per
//! component that builds the element tree through `React.createElement`.

pub mod build_pipeline;
pub mod commands;
pub mod config;
pub mod emit;
pub mod host;
pub mod markup;
pub mod processor;
pub mod project;
