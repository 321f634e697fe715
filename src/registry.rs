//! Schema registry assembled from schema fragment files.
//!
//! A fragment is a JSON or YAML file declaring one or more schema objects,
//! each carrying its own `id`. Fragments are folded over a base registry in
//! discovery order; an entry is always registered under its declared `id`,
//! never under the key it happened to be declared with.

use crate::error::{Error, Result};
use log::{debug, warn};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// File extensions recognised as schema fragments.
pub const FRAGMENT_EXTENSIONS: &[&str] = &["json", "yaml", "yml"];

/// Named schema objects keyed by their `id`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, Value>,
    /// Normalized body -> ids with that body, in registration order
    shapes: HashMap<String, Vec<String>>,
    /// Where each id was last declared, for collision reporting
    origins: HashMap<String, PathBuf>,
}

impl SchemaRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in base set every run starts from unless configured otherwise.
    pub fn builtin() -> Self {
        let base = json!({
            "Buffer": { "id": "Buffer", "type": "string", "format": "byte" },
            "CSV": { "id": "CSV", "type": "string", "format": "csv" },
            "ID": {
                "id": "ID",
                "type": "string",
                "format": "id",
                "minLength": 1,
                "maxLength": 20
            },
            "TransactionQuery": {
                "id": "TransactionQuery",
                "type": "object",
                "properties": {
                    "transaction": { "type": "object" },
                    "transactions": { "type": "array", "maxItems": 10 }
                }
            }
        });
        Self::from_value(base)
    }

    /// Builds a registry from an in-memory declaration, using the same
    /// normalization rules as fragment files.
    pub fn from_value(value: Value) -> Self {
        let mut registry = Self::new();
        for (id, schema) in normalize(value) {
            registry.merge_entry(id, schema, None);
        }
        registry
    }

    /// Builds a registry by overlaying every fragment file onto a clone of `base`.
    ///
    /// Files are merged strictly in the order given; on an id collision the
    /// later body is deep-merged over the earlier one.
    ///
    /// # Errors
    ///
    /// Returns an error if a fragment cannot be read or is not valid JSON/YAML.
    pub fn build(files: &[PathBuf], base: &SchemaRegistry) -> Result<SchemaRegistry> {
        let mut registry = base.clone();
        for file in files {
            let fragment = load_fragment(file)?;
            let entries = normalize(fragment);
            debug!("{} declares {} schema(s)", file.display(), entries.len());
            for (id, schema) in entries {
                registry.merge_entry(id, schema, Some(file));
            }
        }
        Ok(registry)
    }

    fn merge_entry(&mut self, id: String, schema: Value, origin: Option<&Path>) {
        let old_shape = match self.schemas.get_mut(&id) {
            Some(existing) => {
                match (self.origins.get(&id), origin) {
                    (Some(previous), Some(current)) => warn!(
                        "Schema '{}' from {} overrides the one from {}",
                        id,
                        current.display(),
                        previous.display()
                    ),
                    (_, Some(current)) => {
                        debug!("Schema '{}' from {} overrides base entry", id, current.display())
                    }
                    _ => debug!("Schema '{}' declared twice", id),
                }
                let old_shape = shape_key(existing);
                deep_merge(existing, schema);
                old_shape
            }
            None => {
                self.schemas.insert(id.clone(), schema);
                None
            }
        };

        if let Some(path) = origin {
            self.origins.insert(id.clone(), path.to_path_buf());
        }

        let new_shape = self.schemas.get(&id).and_then(shape_key);
        if old_shape == new_shape {
            return;
        }
        if let Some(old_shape) = old_shape {
            if let Some(ids) = self.shapes.get_mut(&old_shape) {
                ids.retain(|other| other != &id);
                if ids.is_empty() {
                    self.shapes.remove(&old_shape);
                }
            }
        }
        if let Some(shape) = new_shape {
            self.shapes.entry(shape).or_default().push(id);
        }
    }

    /// Looks up a schema by id.
    pub fn get(&self, id: &str) -> Option<&Value> {
        self.schemas.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.schemas.contains_key(id)
    }

    /// Finds the id of the entry whose body equals `shape`, ignoring `id` keys.
    ///
    /// When several entries share the shape, the earliest registered wins.
    pub fn find_by_shape(&self, shape: &Value) -> Option<&str> {
        let key = shape_key(shape)?;
        self.shapes.get(&key)?.first().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// The registry as a `components.schemas` block.
    pub fn to_components(&self) -> BTreeMap<String, Value> {
        self.schemas.clone()
    }
}

/// Recursively merges `overlay` into `target`.
///
/// Objects are merged key by key; any other value in `overlay` (arrays
/// included) replaces the value in `target`.
pub fn deep_merge(target: &mut Value, overlay: Value) {
    match (target, overlay) {
        (Value::Object(target), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match target.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, overlay) => *target = overlay,
    }
}

fn load_fragment(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        debug!("{} is empty", path.display());
        return Ok(Value::Null);
    }
    serde_yaml::from_str(&content).map_err(|e| Error::parse(path, e))
}

/// Flattens a fragment into `(id, schema)` pairs, preferring each object's
/// declared `id` over the key it was declared under.
fn normalize(fragment: Value) -> Vec<(String, Value)> {
    match fragment {
        Value::Object(map) if declared_id(&map).is_some() => named(Value::Object(map))
            .into_iter()
            .collect(),
        Value::Object(map) => map
            .into_iter()
            .filter_map(|(key, value)| {
                let entry = named(value);
                if entry.is_none() {
                    debug!("Skipping '{}': not a schema object with an id", key);
                }
                entry
            })
            .collect(),
        Value::Array(items) => items.into_iter().filter_map(named).collect(),
        Value::Null => Vec::new(),
        other => {
            debug!("Skipping fragment of unexpected shape: {}", other);
            Vec::new()
        }
    }
}

fn named(value: Value) -> Option<(String, Value)> {
    let id = match &value {
        Value::Object(map) => declared_id(map)?.to_string(),
        _ => return None,
    };
    Some((id, value))
}

fn declared_id(map: &Map<String, Value>) -> Option<&str> {
    map.get("id").and_then(Value::as_str)
}

/// Canonical text of a schema body with every string `id` removed.
///
/// `serde_json::Map` keeps keys sorted, so equal shapes serialize equally.
fn shape_key(value: &Value) -> Option<String> {
    if !value.is_object() {
        return None;
    }
    serde_json::to_string(&strip_ids(value)).ok()
}

fn strip_ids(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                // a property named `id` is part of the shape
                .filter(|(key, value)| !(key.as_str() == "id" && value.is_string()))
                .map(|(key, value)| (key.clone(), strip_ids(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(strip_ids).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_builtin_entries() {
        let registry = SchemaRegistry::builtin();
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.get("ID").unwrap()["maxLength"], 20);
        assert_eq!(registry.get("Buffer").unwrap()["format"], "byte");
    }

    #[test]
    fn test_disjoint_fragments_union_with_base() {
        let dir = TempDir::new().unwrap();
        let pet = write(&dir, "pet.json", r#"{"Pet": {"id": "Pet", "type": "object"}}"#);
        let order = write(&dir, "order.yaml", "Order:\n  id: Order\n  type: object\n");

        let base = SchemaRegistry::builtin();
        let registry = SchemaRegistry::build(&[pet, order], &base).unwrap();

        assert!(registry.contains("Pet"));
        assert!(registry.contains("Order"));
        assert!(registry.contains("Buffer"));
        assert_eq!(registry.len(), 6);
        // base untouched
        assert_eq!(base.len(), 4);
    }

    #[test]
    fn test_later_fragment_wins() {
        let dir = TempDir::new().unwrap();
        let first = write(
            &dir,
            "a.json",
            r#"{"Pet": {"id": "Pet", "type": "object", "description": "first"}}"#,
        );
        let second = write(
            &dir,
            "b.json",
            r#"{"Pet": {"id": "Pet", "type": "string", "description": "second"}}"#,
        );

        let registry = SchemaRegistry::build(&[first, second], &SchemaRegistry::new()).unwrap();

        let pet = registry.get("Pet").unwrap();
        assert_eq!(pet["type"], "string");
        assert_eq!(pet["description"], "second");
    }

    #[test]
    fn test_collision_is_deep_merged() {
        let dir = TempDir::new().unwrap();
        let first = write(
            &dir,
            "a.json",
            r#"{"Pet": {"id": "Pet", "properties": {"name": {"type": "string"}}}}"#,
        );
        let second = write(
            &dir,
            "b.json",
            r#"{"Pet": {"id": "Pet", "properties": {"age": {"type": "integer"}}}}"#,
        );

        let registry = SchemaRegistry::build(&[first, second], &SchemaRegistry::new()).unwrap();

        let properties = &registry.get("Pet").unwrap()["properties"];
        assert_eq!(properties["name"]["type"], "string");
        assert_eq!(properties["age"]["type"], "integer");
    }

    #[test]
    fn test_registered_under_declared_id() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "a.json", r#"{"petSchema": {"id": "Pet", "type": "object"}}"#);

        let registry = SchemaRegistry::build(&[file], &SchemaRegistry::new()).unwrap();

        assert!(registry.contains("Pet"));
        assert!(!registry.contains("petSchema"));
    }

    #[test]
    fn test_single_schema_and_sequence_fragments() {
        let dir = TempDir::new().unwrap();
        let single = write(&dir, "a.yaml", "id: Tag\ntype: string\n");
        let list = write(
            &dir,
            "b.json",
            r#"[{"id": "Owner", "type": "object"}, {"id": "Vet", "type": "object"}]"#,
        );

        let registry = SchemaRegistry::build(&[single, list], &SchemaRegistry::new()).unwrap();

        let ids: Vec<&str> = registry.ids().collect();
        assert_eq!(ids, vec!["Owner", "Tag", "Vet"]);
    }

    #[test]
    fn test_entries_without_id_are_skipped() {
        let dir = TempDir::new().unwrap();
        let file = write(
            &dir,
            "a.json",
            r#"{"version": 3, "helper": {"type": "object"}, "Pet": {"id": "Pet"}}"#,
        );

        let registry = SchemaRegistry::build(&[file], &SchemaRegistry::new()).unwrap();

        let ids: Vec<&str> = registry.ids().collect();
        assert_eq!(ids, vec!["Pet"]);
    }

    #[test]
    fn test_empty_fragment_is_ignored() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "empty.yaml", "\n");
        let registry = SchemaRegistry::build(&[file], &SchemaRegistry::builtin()).unwrap();
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_malformed_fragment_fails() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "bad.json", "{\"Pet\": [");
        let result = SchemaRegistry::build(&[file], &SchemaRegistry::new());
        assert!(matches!(result, Err(Error::ParseError { .. })));
    }

    #[test]
    fn test_missing_fragment_fails() {
        let dir = TempDir::new().unwrap();
        let result = SchemaRegistry::build(&[dir.path().join("nope.json")], &SchemaRegistry::new());
        assert!(matches!(result, Err(Error::IoError(_))));
    }

    #[test]
    fn test_find_by_shape_ignores_id() {
        let registry = SchemaRegistry::builtin();
        let shape = json!({"type": "string", "format": "csv"});
        assert_eq!(registry.find_by_shape(&shape), Some("CSV"));

        let unknown = json!({"type": "string", "format": "uuid"});
        assert_eq!(registry.find_by_shape(&unknown), None);
    }

    #[test]
    fn test_id_property_is_part_of_shape() {
        let registry = SchemaRegistry::from_value(json!({
            "Pet": {"id": "Pet", "type": "object", "properties": {"id": {"type": "integer"}}}
        }));

        let with_id = json!({"type": "object", "properties": {"id": {"type": "integer"}}});
        assert_eq!(registry.find_by_shape(&with_id), Some("Pet"));
        assert_eq!(registry.find_by_shape(&json!({"type": "object", "properties": {}})), None);
    }

    #[test]
    fn test_find_by_shape_follows_overrides() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "a.json", r#"{"CSV": {"id": "CSV", "format": "tsv"}}"#);

        let registry = SchemaRegistry::build(&[file], &SchemaRegistry::builtin()).unwrap();

        assert_eq!(registry.find_by_shape(&json!({"type": "string", "format": "csv"})), None);
        assert_eq!(
            registry.find_by_shape(&json!({"type": "string", "format": "tsv"})),
            Some("CSV")
        );
    }

    #[test]
    fn test_shared_shape_survives_override() {
        let dir = TempDir::new().unwrap();
        let b = write(&dir, "b.json", r#"{"id": "B", "type": "string", "format": "csv"}"#);
        let tsv = write(&dir, "tsv.json", r#"{"id": "CSV", "format": "tsv"}"#);

        let registry = SchemaRegistry::build(&[b, tsv], &SchemaRegistry::builtin()).unwrap();

        let csv = json!({"type": "string", "format": "csv"});
        assert_eq!(registry.find_by_shape(&csv), Some("B"));
        assert_eq!(
            registry.find_by_shape(&json!({"type": "string", "format": "tsv"})),
            Some("CSV")
        );
    }

    #[test]
    fn test_first_registered_shape_wins() {
        let dir = TempDir::new().unwrap();
        let b = write(&dir, "b.json", r#"{"id": "B", "type": "string", "format": "csv"}"#);

        let registry = SchemaRegistry::build(&[b], &SchemaRegistry::builtin()).unwrap();

        assert_eq!(registry.find_by_shape(&json!({"type": "string", "format": "csv"})), Some("CSV"));
    }

    #[test]
    fn test_deep_merge_replaces_arrays() {
        let mut target = json!({"a": {"b": 1, "c": [1, 2]}, "d": "keep"});
        deep_merge(&mut target, json!({"a": {"c": [3]}, "e": true}));
        assert_eq!(target, json!({"a": {"b": 1, "c": [3]}, "d": "keep", "e": true}));
    }
}
