//! Parameter schema linking.
//!
//! Rewrites the type slot of every annotated parameter so the document
//! builder renders a reference to the registry schema instead of the type it
//! would infer from the Rust signature.

use crate::metadata::{ParamKey, ParamMetadata, SchemaAnnotation, TypeSlot};
use crate::registry::SchemaRegistry;
use log::{debug, warn};

/// Outcome of a linking pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LinkReport {
    /// Positions whose type slot now names a registry schema
    pub linked: Vec<(ParamKey, String)>,
    /// Annotated positions left untouched because no schema matched
    pub unresolved: Vec<ParamKey>,
}

/// Resolves an annotation to a schema id.
///
/// An annotation carrying its own id resolves to it directly; an anonymous
/// shape resolves to the registry entry with an equal body.
pub fn resolve<'a>(annotation: &'a SchemaAnnotation, registry: &'a SchemaRegistry) -> Option<&'a str> {
    if let Some(id) = annotation.declared_id() {
        if !registry.contains(id) {
            warn!("Schema '{}' is referenced but not registered", id);
        }
        return Some(id);
    }
    match annotation {
        SchemaAnnotation::Shape(shape) => registry.find_by_shape(shape),
        SchemaAnnotation::Id(_) => None,
    }
}

/// Links every annotated parameter position to its registry schema.
///
/// Positions without an annotation are never visited. Unresolved annotations
/// leave the slot as it was.
pub fn link(metadata: &mut ParamMetadata, registry: &SchemaRegistry) -> LinkReport {
    let mut report = LinkReport::default();

    let resolved: Vec<(ParamKey, Option<String>)> = metadata
        .annotations()
        .map(|(key, annotation)| (key.clone(), resolve(annotation, registry).map(str::to_string)))
        .collect();

    for (key, id) in resolved {
        match id {
            Some(id) => {
                debug!(
                    "Linking {} method {} parameter {} to schema '{}'",
                    key.controller, key.method, key.index, id
                );
                metadata.set_type_slot(key.clone(), TypeSlot::Named(id.clone()));
                report.linked.push((key, id));
            }
            None => {
                debug!(
                    "No schema matches {} method {} parameter {}",
                    key.controller, key.method, key.index
                );
                report.unresolved.push(key);
            }
        }
    }

    report
}
