use crate::controller::TypeInfo;
use crate::metadata::TypeSlot;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Schema generator - converts parameter type slots to OpenAPI schemas
///
/// Primitive Rust types map to their OpenAPI counterparts, `Vec<T>` becomes
/// an array and `Option<T>` unwraps to `T`. Every other type renders as the
/// generic `object` placeholder; only a linked slot yields a `$ref`.
pub struct SchemaGenerator;

/// OpenAPI Schema definition, as emitted for parameters and bodies
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// The type of the schema (string, integer, object, array, etc.)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    /// Items schema for array types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Reference to another schema
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Format for primitive types (e.g., "int32", "int64", "float", "double")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Any other keyword, e.g. added by a static overlay
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

impl Schema {
    pub fn of_type(schema_type: &str, format: Option<&str>) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            format: format.map(str::to_string),
            ..Self::default()
        }
    }

    pub fn array(items: Schema) -> Self {
        Self {
            schema_type: Some("array".to_string()),
            items: Some(Box::new(items)),
            ..Self::default()
        }
    }

    /// A `$ref` to a schema under `components.schemas`.
    pub fn reference(id: &str) -> Self {
        Self {
            reference: Some(format!("#/components/schemas/{}", id)),
            ..Self::default()
        }
    }

    /// The placeholder used for types with no better description.
    pub fn object() -> Self {
        Self::of_type("object", None)
    }
}

/// Primitive types supported
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimitiveType {
    String,
    I8,
    I16,
    I32,
    I64,
    I128,
    U8,
    U16,
    U32,
    U64,
    U128,
    F32,
    F64,
    Bool,
    Char,
}

impl PrimitiveType {
    pub fn from_name(name: &str) -> Option<Self> {
        let primitive = match name {
            "String" | "str" => PrimitiveType::String,
            "i8" => PrimitiveType::I8,
            "i16" => PrimitiveType::I16,
            "i32" | "isize" => PrimitiveType::I32,
            "i64" => PrimitiveType::I64,
            "i128" => PrimitiveType::I128,
            "u8" => PrimitiveType::U8,
            "u16" => PrimitiveType::U16,
            "u32" | "usize" => PrimitiveType::U32,
            "u64" => PrimitiveType::U64,
            "u128" => PrimitiveType::U128,
            "f32" => PrimitiveType::F32,
            "f64" => PrimitiveType::F64,
            "bool" => PrimitiveType::Bool,
            "char" => PrimitiveType::Char,
            _ => return None,
        };
        Some(primitive)
    }
}

impl SchemaGenerator {
    /// Generate the schema for a parameter's type slot
    pub fn generate_for_slot(slot: &TypeSlot) -> Schema {
        match slot {
            TypeSlot::Named(id) => Schema::reference(id),
            TypeSlot::Inferred(type_info) => Self::generate_schema(type_info),
        }
    }

    /// Generate a schema for a TypeInfo
    pub fn generate_schema(type_info: &TypeInfo) -> Schema {
        if type_info.is_option || type_info.is_vec {
            if let Some(inner) = type_info.generic_args.first() {
                let inner_schema = Self::generate_schema(inner);
                return if type_info.is_vec {
                    Schema::array(inner_schema)
                } else {
                    inner_schema
                };
            }
        }

        match PrimitiveType::from_name(&type_info.name) {
            Some(primitive) => Self::primitive_to_schema(&primitive),
            None => {
                debug!("No schema for type {}, using object placeholder", type_info.name);
                Schema::object()
            }
        }
    }

    /// Convert a primitive type to an OpenAPI schema
    fn primitive_to_schema(primitive: &PrimitiveType) -> Schema {
        let (schema_type, format) = match primitive {
            PrimitiveType::String | PrimitiveType::Char => ("string", None),
            PrimitiveType::I8 | PrimitiveType::I16 | PrimitiveType::I32 => {
                ("integer", Some("int32"))
            }
            PrimitiveType::I64 | PrimitiveType::I128 => ("integer", Some("int64")),
            PrimitiveType::U8 | PrimitiveType::U16 | PrimitiveType::U32 => {
                ("integer", Some("int32"))
            }
            PrimitiveType::U64 | PrimitiveType::U128 => ("integer", Some("int64")),
            PrimitiveType::F32 => ("number", Some("float")),
            PrimitiveType::F64 => ("number", Some("double")),
            PrimitiveType::Bool => ("boolean", None),
        };

        Schema::of_type(schema_type, format)
    }
}
