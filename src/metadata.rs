//! Per-parameter metadata shared between the controller collector, the
//! parameter schema linker and the document builder.
//!
//! Two independent facts can be recorded for every `(controller, method,
//! index)` position, where the controller is identified by its handle rather
//! than its type name: the schema annotation written by the controller author,
//! and the type slot the document builder will render. The table is an
//! explicit value created per run and handed from stage to stage.

use crate::controller::TypeInfo;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Opaque handle of a collected controller: its position in the run's
/// controller list. Two controllers sharing a type name get distinct handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControllerId(pub usize);

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "controller #{}", self.0)
    }
}

/// Position of one parameter within a controller method.
///
/// `index` counts typed parameters only; a `self` receiver is not a parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamKey {
    pub controller: ControllerId,
    pub method: String,
    pub index: usize,
}

impl ParamKey {
    pub fn new(controller: ControllerId, method: impl Into<String>, index: usize) -> Self {
        Self {
            controller,
            method: method.into(),
            index,
        }
    }
}

/// Author-supplied reference from a parameter to a registry schema.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaAnnotation {
    /// Reference by schema id
    Id(String),
    /// Anonymous shape to be matched structurally against the registry
    Shape(Value),
}

impl SchemaAnnotation {
    /// The id carried by the annotation itself, if any.
    pub fn declared_id(&self) -> Option<&str> {
        match self {
            SchemaAnnotation::Id(id) => Some(id),
            SchemaAnnotation::Shape(shape) => shape.get("id").and_then(Value::as_str),
        }
    }
}

/// The value the document builder uses to render a parameter's schema.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeSlot {
    /// Type inferred from the parameter's Rust type
    Inferred(TypeInfo),
    /// Marker naming a registry schema; rendered as a `$ref`
    Named(String),
}

/// Side table of annotations and type slots keyed by parameter position.
#[derive(Debug, Clone, Default)]
pub struct ParamMetadata {
    annotations: BTreeMap<ParamKey, SchemaAnnotation>,
    type_slots: BTreeMap<ParamKey, TypeSlot>,
}

impl ParamMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn annotate(&mut self, key: ParamKey, annotation: SchemaAnnotation) {
        self.annotations.insert(key, annotation);
    }

    pub fn annotation(&self, key: &ParamKey) -> Option<&SchemaAnnotation> {
        self.annotations.get(key)
    }

    /// All recorded annotations in position order.
    pub fn annotations(&self) -> impl Iterator<Item = (&ParamKey, &SchemaAnnotation)> {
        self.annotations.iter()
    }

    /// Sets the type slot at `key`, returning the value it replaced.
    pub fn set_type_slot(&mut self, key: ParamKey, slot: TypeSlot) -> Option<TypeSlot> {
        self.type_slots.insert(key, slot)
    }

    pub fn type_slot(&self, key: &ParamKey) -> Option<&TypeSlot> {
        self.type_slots.get(key)
    }

    /// Folds another table into this one; entries from `other` win. Tables
    /// built for different controllers never share keys.
    pub fn extend(&mut self, other: ParamMetadata) {
        self.annotations.extend(other.annotations);
        self.type_slots.extend(other.type_slots);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_declared_id() {
        assert_eq!(SchemaAnnotation::Id("Pet".into()).declared_id(), Some("Pet"));
        assert_eq!(
            SchemaAnnotation::Shape(json!({"id": "Pet", "type": "object"})).declared_id(),
            Some("Pet")
        );
        assert_eq!(
            SchemaAnnotation::Shape(json!({"type": "object"})).declared_id(),
            None
        );
    }

    #[test]
    fn test_set_type_slot_returns_previous() {
        let mut metadata = ParamMetadata::new();
        let key = ParamKey::new(ControllerId(0), "create", 0);

        let first = metadata.set_type_slot(key.clone(), TypeSlot::Inferred(TypeInfo::new("u32")));
        let second = metadata.set_type_slot(key.clone(), TypeSlot::Named("Pet".into()));

        assert!(first.is_none());
        assert_eq!(second, Some(TypeSlot::Inferred(TypeInfo::new("u32"))));
        assert_eq!(metadata.type_slot(&key), Some(&TypeSlot::Named("Pet".into())));
    }

    #[test]
    fn test_annotations_are_ordered_by_position() {
        let mut metadata = ParamMetadata::new();
        metadata.annotate(ParamKey::new(ControllerId(1), "m", 0), SchemaAnnotation::Id("Y".into()));
        metadata.annotate(ParamKey::new(ControllerId(0), "m", 2), SchemaAnnotation::Id("X".into()));
        metadata.annotate(ParamKey::new(ControllerId(0), "m", 1), SchemaAnnotation::Id("W".into()));

        let order: Vec<(usize, usize)> = metadata
            .annotations()
            .map(|(k, _)| (k.controller.0, k.index))
            .collect();
        assert_eq!(order, vec![(0, 1), (0, 2), (1, 0)]);
    }
}
