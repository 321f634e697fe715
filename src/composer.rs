//! Composition of the document from controllers, parameter metadata, the
//! schema registry and a static overlay.

use crate::controller::ControllerDef;
use crate::metadata::ParamMetadata;
use crate::openapi_builder::{OpenApiBuilder, OpenApiDocument};
use crate::registry::{deep_merge, SchemaRegistry};
use anyhow::{bail, Context, Result};
use log::debug;
use serde_json::Value;

/// Builds the document and merges `overlay` on top of the generated defaults.
///
/// The overlay wins on every conflicting key; objects are merged recursively.
/// A `null` or empty overlay leaves the generated document as is.
///
/// # Errors
///
/// Returns an error if the overlay is not an object, or if merging it produces
/// something that is no longer a document (e.g. `info` replaced by a string).
pub fn compose(
    controllers: &[ControllerDef],
    metadata: &ParamMetadata,
    registry: &SchemaRegistry,
    overlay: &Value,
) -> Result<OpenApiDocument> {
    let mut builder = OpenApiBuilder::new();
    for controller in controllers {
        builder.add_controller(controller, metadata);
    }
    let document = builder.build(registry);

    let overlay = match overlay {
        Value::Null => return Ok(document),
        Value::Object(map) if map.is_empty() => return Ok(document),
        Value::Object(_) => overlay.clone(),
        other => bail!("static overlay must be a mapping, found {}", type_name(other)),
    };

    debug!("Applying static overlay");
    let mut value = serde_json::to_value(&document).context("Failed to convert document to JSON")?;
    deep_merge(&mut value, overlay);
    serde_json::from_value(value).context("Static overlay does not yield a valid document")
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}
