//! Controller collection from annotated Rust sources.
//!
//! A controller is an `impl` block marked `#[controller("/base")]`. Each
//! routed method inside it (`#[get]`, `#[post]`, ...) becomes one endpoint,
//! and each of its parameters gets a slot in the [`ParamMetadata`] side table.
//!
//! ```ignore
//! #[controller("/pets")]
//! impl PetController {
//!     #[get("/:id")]
//!     pub fn get_pet(&self, #[param] id: u32) -> Json<Pet> { .. }
//!
//!     #[post]
//!     #[operation_id("createPet")]
//!     pub fn create_pet(&self, #[body] #[schema("Pet")] pet: Value) -> Json<Pet> { .. }
//! }
//! ```

mod attributes;

use crate::error::Result;
use crate::metadata::{ControllerId, ParamKey, ParamMetadata, TypeSlot};
use crate::parser::{AstParser, ParsedFile};
use log::{debug, info, warn};
use std::path::PathBuf;
use syn::visit::Visit;

/// File extensions recognised as controller sources.
pub const CONTROLLER_EXTENSIONS: &[&str] = &["rs"];

/// One controller: a group of endpoints sharing a base path.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerDef {
    /// Handle keying this controller's parameters in [`ParamMetadata`]
    pub id: ControllerId,
    /// Name of the implementing type, e.g. `PetController`
    pub name: String,
    /// Base path prefixed to every route, possibly empty
    pub base_path: String,
    /// File the controller was declared in
    pub source: PathBuf,
    pub methods: Vec<MethodDef>,
}

/// A routed method of a controller.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDef {
    pub name: String,
    pub http_method: HttpMethod,
    /// Route relative to the controller base path
    pub route: String,
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub params: Vec<ParamDef>,
    /// Declared return type, `None` for `()`
    pub response_type: Option<TypeInfo>,
}

/// A typed parameter of a routed method.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDef {
    /// Position among the method's typed parameters
    pub index: usize,
    /// Name as documented (attribute argument or binding name)
    pub name: String,
    /// Where the value comes from; `None` for parameters that are not documented
    pub source: Option<ParamSource>,
    pub required: bool,
}

/// Request location a parameter is bound from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSource {
    Path,
    Query,
    Header,
    Body,
}

impl ParamSource {
    /// The OpenAPI `in` value, `None` for the request body.
    pub fn location(&self) -> Option<&'static str> {
        match self {
            ParamSource::Path => Some("path"),
            ParamSource::Query => Some("query"),
            ParamSource::Header => Some("header"),
            ParamSource::Body => None,
        }
    }
}

/// HTTP methods a route attribute can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
}

impl HttpMethod {
    pub fn parse(method: &str) -> Option<Self> {
        match method.to_ascii_lowercase().as_str() {
            "get" => Some(HttpMethod::Get),
            "post" => Some(HttpMethod::Post),
            "put" => Some(HttpMethod::Put),
            "delete" => Some(HttpMethod::Delete),
            "patch" => Some(HttpMethod::Patch),
            "options" => Some(HttpMethod::Options),
            "head" => Some(HttpMethod::Head),
            _ => None,
        }
    }

    /// Lowercase name, as used for path item keys and sample file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Delete => "delete",
            HttpMethod::Patch => "patch",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
        }
    }
}

/// Type information extracted from a Rust type for schema generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    /// The base type name (e.g., "String", "User", "i32")
    pub name: String,
    /// Generic type arguments (e.g., for `Vec<String>`, contains TypeInfo for String)
    pub generic_args: Vec<TypeInfo>,
    /// Whether this type is wrapped in `Option<T>`
    pub is_option: bool,
    /// Whether this type is a `Vec<T>`, slice or array
    pub is_vec: bool,
}

impl TypeInfo {
    /// Create a new TypeInfo for a simple type
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            generic_args: Vec::new(),
            is_option: false,
            is_vec: false,
        }
    }

    /// Create a TypeInfo for an `Option<T>` type
    pub fn option(inner: TypeInfo) -> Self {
        Self {
            name: inner.name.clone(),
            generic_args: vec![inner],
            is_option: true,
            is_vec: false,
        }
    }

    /// Create a TypeInfo for a `Vec<T>` type
    pub fn vec(inner: TypeInfo) -> Self {
        Self {
            name: inner.name.clone(),
            generic_args: vec![inner],
            is_option: false,
            is_vec: true,
        }
    }
}

/// Controllers found in a run, with the metadata recorded for their parameters.
#[derive(Debug, Default)]
pub struct ControllerSet {
    pub controllers: Vec<ControllerDef>,
    pub metadata: ParamMetadata,
}

/// Collects controller definitions from Rust source files.
pub struct ControllerCollector;

impl ControllerCollector {
    /// Parses every file and collects its controllers, preserving file order.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be read or is not valid Rust.
    pub fn collect(files: &[PathBuf]) -> Result<ControllerSet> {
        let parsed = files
            .iter()
            .map(|path| AstParser::parse_file(path))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::collect_parsed(&parsed))
    }

    /// Collects controllers from already parsed files.
    pub fn collect_parsed(parsed_files: &[ParsedFile]) -> ControllerSet {
        let mut set = ControllerSet::default();

        for parsed_file in parsed_files {
            let mut visitor = ControllerVisitor::new(parsed_file.path.clone(), set.controllers.len());
            visitor.visit_file(&parsed_file.syntax_tree);

            if visitor.controllers.is_empty() {
                debug!("{} declares no controller", parsed_file.path.display());
            }
            for controller in &visitor.controllers {
                debug!(
                    "Found controller {} with {} route(s) in {}",
                    controller.name,
                    controller.methods.len(),
                    parsed_file.path.display()
                );
            }

            set.controllers.extend(visitor.controllers);
            set.metadata.extend(visitor.metadata);
        }

        info!("Collected {} controller(s)", set.controllers.len());
        set
    }
}

/// Visitor collecting `#[controller]` impl blocks from one file.
struct ControllerVisitor {
    source: PathBuf,
    /// Handle of the first controller found in this file
    first_id: usize,
    controllers: Vec<ControllerDef>,
    metadata: ParamMetadata,
}

impl ControllerVisitor {
    fn new(source: PathBuf, first_id: usize) -> Self {
        Self {
            source,
            first_id,
            controllers: Vec::new(),
            metadata: ParamMetadata::new(),
        }
    }

    fn collect_method(
        &mut self,
        id: ControllerId,
        controller: &str,
        method: &syn::ImplItemFn,
    ) -> Option<MethodDef> {
        let (http_method, route) = method.attrs.iter().find_map(attributes::route)?;
        let method_name = method.sig.ident.to_string();

        let mut params = Vec::new();
        let typed_args = method.sig.inputs.iter().filter_map(|arg| match arg {
            syn::FnArg::Typed(pat_type) => Some(pat_type),
            syn::FnArg::Receiver(_) => None,
        });

        for (index, pat_type) in typed_args.enumerate() {
            let key = ParamKey::new(id, method_name.as_str(), index);
            let type_info = extract_type_info(&pat_type.ty);
            let binding = binding_name(&pat_type.pat).unwrap_or_else(|| format!("arg{}", index));
            let source = attributes::param_source(&pat_type.attrs);

            for attr in pat_type.attrs.iter().filter(|a| attributes::is_named(a, "schema")) {
                match attributes::schema_annotation(attr) {
                    Ok(annotation) => self.metadata.annotate(key.clone(), annotation),
                    Err(e) => warn!(
                        "Ignoring schema annotation on {}::{} parameter {} in {}: {}",
                        controller,
                        method_name,
                        index,
                        self.source.display(),
                        e
                    ),
                }
            }

            let (source, name) = match source {
                Some((source, name)) => (Some(source), name.unwrap_or(binding)),
                None => (None, binding),
            };
            let required = source == Some(ParamSource::Path) || !type_info.is_option;

            self.metadata.set_type_slot(key, TypeSlot::Inferred(type_info));
            params.push(ParamDef {
                index,
                name,
                source,
                required,
            });
        }

        let response_type = match &method.sig.output {
            syn::ReturnType::Default => None,
            syn::ReturnType::Type(_, ty) => {
                Some(extract_type_info(ty)).filter(|t| t.name != "()")
            }
        };

        Some(MethodDef {
            name: method_name,
            http_method,
            route,
            operation_id: attributes::string_attr(&method.attrs, "operation_id"),
            summary: attributes::string_attr(&method.attrs, "summary"),
            description: attributes::string_attr(&method.attrs, "description"),
            params,
            response_type,
        })
    }
}

impl<'ast> Visit<'ast> for ControllerVisitor {
    fn visit_item_impl(&mut self, item_impl: &'ast syn::ItemImpl) {
        let Some(base_path) = item_impl.attrs.iter().find_map(attributes::controller) else {
            return;
        };
        let Some(name) = self_type_name(&item_impl.self_ty) else {
            warn!("Skipping controller with unnamed type in {}", self.source.display());
            return;
        };

        let id = ControllerId(self.first_id + self.controllers.len());
        let mut methods = Vec::new();
        for item in &item_impl.items {
            if let syn::ImplItem::Fn(method) = item {
                if let Some(method_def) = self.collect_method(id, &name, method) {
                    methods.push(method_def);
                }
            }
        }

        self.controllers.push(ControllerDef {
            id,
            name,
            base_path,
            source: self.source.clone(),
            methods,
        });
    }
}

fn self_type_name(ty: &syn::Type) -> Option<String> {
    match ty {
        syn::Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string()),
        _ => None,
    }
}

fn binding_name(pat: &syn::Pat) -> Option<String> {
    match pat {
        syn::Pat::Ident(pat_ident) => Some(pat_ident.ident.to_string()),
        _ => None,
    }
}

/// Wrappers that only carry their first type argument to the schema.
const TRANSPARENT_WRAPPERS: &[&str] = &["Json", "Path", "Query", "Form", "Box", "Result"];

/// Extract TypeInfo from a syn::Type
pub(crate) fn extract_type_info(ty: &syn::Type) -> TypeInfo {
    match ty {
        syn::Type::Path(type_path) => {
            let Some(segment) = type_path.path.segments.last() else {
                return TypeInfo::new("unknown");
            };
            let type_name = segment.ident.to_string();
            let first_arg = match &segment.arguments {
                syn::PathArguments::AngleBracketed(args) => {
                    args.args.iter().find_map(|arg| match arg {
                        syn::GenericArgument::Type(inner) => Some(inner),
                        _ => None,
                    })
                }
                _ => None,
            };

            match (type_name.as_str(), first_arg) {
                ("Option", Some(inner)) => TypeInfo::option(extract_type_info(inner)),
                ("Vec", Some(inner)) => TypeInfo::vec(extract_type_info(inner)),
                (wrapper, Some(inner)) if TRANSPARENT_WRAPPERS.contains(&wrapper) => {
                    extract_type_info(inner)
                }
                _ => TypeInfo::new(type_name),
            }
        }
        syn::Type::Reference(reference) => extract_type_info(&reference.elem),
        syn::Type::Slice(slice) => TypeInfo::vec(extract_type_info(&slice.elem)),
        syn::Type::Array(array) => TypeInfo::vec(extract_type_info(&array.elem)),
        syn::Type::Paren(paren) => extract_type_info(&paren.elem),
        syn::Type::Tuple(tuple) if tuple.elems.is_empty() => TypeInfo::new("()"),
        _ => TypeInfo::new("unknown"),
    }
}
