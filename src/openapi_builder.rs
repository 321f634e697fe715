use crate::controller::{ControllerDef, HttpMethod, MethodDef, ParamSource};
use crate::metadata::{ParamKey, ParamMetadata};
use crate::registry::SchemaRegistry;
use crate::schema_generator::{Schema, SchemaGenerator};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// OpenAPI document builder
///
/// Turns collected controllers into path items. Parameter schemas come from
/// the type slots in [`ParamMetadata`], so slots rewritten by the linker show
/// up as references to registry schemas.
pub struct OpenApiBuilder {
    /// OpenAPI info section
    info: Info,
    /// Paths collection (URL path -> PathItem)
    paths: BTreeMap<String, PathItem>,
    /// `Controller::method` that produced each route, for collision reports
    route_owners: HashMap<(String, HttpMethod), String>,
    /// `Controller::method` that produced each operation id
    operation_owners: HashMap<String, String>,
}

/// OpenAPI Info object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    /// API title
    pub title: String,
    /// API version
    pub version: String,
    /// API description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

/// OpenAPI PathItem object - represents all operations for a single path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    /// GET operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    /// POST operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    /// PUT operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    /// DELETE operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    /// PATCH operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    /// OPTIONS operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    /// HEAD operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

/// OpenAPI Operation object - represents a single API operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Operation summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Operation description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Operation ID
    #[serde(rename = "operationId", skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Parameters (path, query, header)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<Parameter>>,
    /// Request body
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    /// Responses
    #[serde(default)]
    pub responses: BTreeMap<String, Response>,
    /// Servers serving this operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servers: Option<Vec<Server>>,
    /// Example requests, one per language
    #[serde(rename = "x-code-samples", skip_serializing_if = "Option::is_none")]
    pub code_samples: Option<Vec<CodeSample>>,
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

/// OpenAPI Parameter object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Parameter location (path, query, header)
    #[serde(rename = "in")]
    pub location: String,
    /// Whether the parameter is required
    pub required: bool,
    /// Parameter schema
    pub schema: Schema,
    /// Parameter description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

/// OpenAPI RequestBody object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    /// Request body description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the request body is required
    pub required: bool,
    /// Content types and their schemas
    pub content: BTreeMap<String, MediaType>,
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

/// OpenAPI MediaType object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    /// Schema for this media type
    pub schema: Schema,
    /// Examples, encoding and other keys set through the overlay
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

/// OpenAPI Response object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Response description
    pub description: String,
    /// Response content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<BTreeMap<String, MediaType>>,
    /// Headers, links and other keys set through the overlay
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

/// OpenAPI Server object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

/// A code sample attached to an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSample {
    pub lang: String,
    pub source: String,
}

/// OpenAPI Components object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    /// Schema definitions
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub schemas: BTreeMap<String, Value>,
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

/// Complete OpenAPI document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApiDocument {
    /// OpenAPI version
    pub openapi: String,
    /// API info
    pub info: Info,
    /// API paths
    #[serde(default)]
    pub paths: BTreeMap<String, PathItem>,
    /// Components (schemas, etc.)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
    /// Top-level keys the builder does not model (servers, tags, x-...)
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

impl PathItem {
    fn slot_mut(&mut self, method: HttpMethod) -> &mut Option<Operation> {
        match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Delete => &mut self.delete,
            HttpMethod::Patch => &mut self.patch,
            HttpMethod::Options => &mut self.options,
            HttpMethod::Head => &mut self.head,
        }
    }

    /// Operations present on this path, in a fixed method order
    pub fn operations(&self) -> impl Iterator<Item = (HttpMethod, &Operation)> {
        [
            (HttpMethod::Get, &self.get),
            (HttpMethod::Post, &self.post),
            (HttpMethod::Put, &self.put),
            (HttpMethod::Delete, &self.delete),
            (HttpMethod::Patch, &self.patch),
            (HttpMethod::Options, &self.options),
            (HttpMethod::Head, &self.head),
        ]
        .into_iter()
        .filter_map(|(method, op)| op.as_ref().map(|op| (method, op)))
    }

    pub fn operations_mut(&mut self) -> impl Iterator<Item = (HttpMethod, &mut Operation)> {
        [
            (HttpMethod::Get, &mut self.get),
            (HttpMethod::Post, &mut self.post),
            (HttpMethod::Put, &mut self.put),
            (HttpMethod::Delete, &mut self.delete),
            (HttpMethod::Patch, &mut self.patch),
            (HttpMethod::Options, &mut self.options),
            (HttpMethod::Head, &mut self.head),
        ]
        .into_iter()
        .filter_map(|(method, op)| op.as_mut().map(|op| (method, op)))
    }
}

impl OpenApiDocument {
    /// Every operation in the document, by path then method
    pub fn operations_mut(&mut self) -> impl Iterator<Item = (HttpMethod, &mut Operation)> {
        self.paths.values_mut().flat_map(|item| item.operations_mut())
    }

    pub fn operations(&self) -> impl Iterator<Item = (HttpMethod, &Operation)> {
        self.paths.values().flat_map(|item| item.operations())
    }
}

impl OpenApiBuilder {
    /// Create a new OpenApiBuilder with default info
    pub fn new() -> Self {
        debug!("Initializing OpenApiBuilder");
        Self {
            info: Info {
                title: "Generated API".to_string(),
                version: "1.0.0".to_string(),
                description: None,
                extensions: BTreeMap::new(),
            },
            paths: BTreeMap::new(),
            route_owners: HashMap::new(),
            operation_owners: HashMap::new(),
        }
    }

    /// Set custom info for the API
    pub fn with_info(mut self, title: String, version: String, description: Option<String>) -> Self {
        self.info = Info {
            title,
            version,
            description,
            extensions: BTreeMap::new(),
        };
        self
    }

    /// Add every routed method of a controller to the document
    pub fn add_controller(&mut self, controller: &ControllerDef, metadata: &ParamMetadata) {
        for method in &controller.methods {
            self.add_method(controller, method, metadata);
        }
    }

    fn add_method(&mut self, controller: &ControllerDef, method: &MethodDef, metadata: &ParamMetadata) {
        let route = Self::combine_paths(&controller.base_path, &method.route);
        let openapi_path = Self::convert_path_format(&route);
        debug!(
            "Adding route: {} {} ({}::{})",
            method.http_method.as_str().to_uppercase(),
            openapi_path,
            controller.name,
            method.name
        );

        let schema_for = |index: usize| {
            let key = ParamKey::new(controller.id, method.name.as_str(), index);
            metadata
                .type_slot(&key)
                .map(SchemaGenerator::generate_for_slot)
                .unwrap_or_else(Schema::object)
        };

        let parameters: Vec<Parameter> = method
            .params
            .iter()
            .filter_map(|p| {
                let location = p.source?.location()?;
                Some(Parameter {
                    name: p.name.clone(),
                    location: location.to_string(),
                    required: p.required,
                    schema: schema_for(p.index),
                    description: None,
                    extensions: BTreeMap::new(),
                })
            })
            .collect();

        let request_body = method
            .params
            .iter()
            .find(|p| p.source == Some(ParamSource::Body))
            .map(|p| RequestBody {
                description: None,
                required: p.required,
                content: json_content(schema_for(p.index)),
                extensions: BTreeMap::new(),
            });

        let response = Response {
            description: "Successful response".to_string(),
            content: method
                .response_type
                .as_ref()
                .map(|t| json_content(SchemaGenerator::generate_schema(t))),
            extensions: BTreeMap::new(),
        };

        let mut responses = BTreeMap::new();
        responses.insert("200".to_string(), response);

        let owner = format!("{}::{}", controller.name, method.name);
        let operation_id = method
            .operation_id
            .clone()
            .unwrap_or_else(|| format!("{}.{}", controller.name, method.name));
        if let Some(previous) = self.operation_owners.insert(operation_id.clone(), owner.clone()) {
            warn!(
                "Operation id '{}' is used by both {} and {}",
                operation_id, previous, owner
            );
        }

        let operation = Operation {
            tags: Some(vec![Self::tag_for(&controller.name)]),
            summary: Some(
                method
                    .summary
                    .clone()
                    .unwrap_or_else(|| Self::humanize(&method.name)),
            ),
            description: method.description.clone(),
            operation_id: Some(operation_id),
            parameters: if parameters.is_empty() {
                None
            } else {
                Some(parameters)
            },
            request_body,
            responses,
            ..Operation::default()
        };

        let route_key = (openapi_path.clone(), method.http_method);
        if let Some(previous) = self.route_owners.insert(route_key, owner.clone()) {
            warn!(
                "{} {} from {} replaces the one from {}",
                method.http_method.as_str().to_uppercase(),
                openapi_path,
                owner,
                previous
            );
        }

        let path_item = self.paths.entry(openapi_path).or_default();
        *path_item.slot_mut(method.http_method) = Some(operation);
    }

    /// Combine a controller base path and a route, handling slashes correctly
    fn combine_paths(base: &str, route: &str) -> String {
        let base = base.trim_end_matches('/');
        let route = route.trim_start_matches('/');
        let combined = match (base.is_empty(), route.is_empty()) {
            (true, true) => String::new(),
            (false, true) => base.to_string(),
            (true, false) => route.to_string(),
            (false, false) => format!("{}/{}", base, route),
        };
        if combined.starts_with('/') {
            combined
        } else {
            format!("/{}", combined)
        }
    }

    /// Convert path format from :param or {param} to OpenAPI {param} format
    fn convert_path_format(path: &str) -> String {
        path.split('/')
            .map(|part| match part.strip_prefix(':') {
                Some(name) => format!("{{{}}}", name),
                None => part.to_string(),
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Tag grouping a controller's operations: its name without a `Controller` suffix
    fn tag_for(controller: &str) -> String {
        match controller.strip_suffix("Controller") {
            Some(stem) if !stem.is_empty() => stem.to_string(),
            _ => controller.to_string(),
        }
    }

    /// `list_pet_owners` -> `List pet owners`
    fn humanize(method: &str) -> String {
        let words = method.split('_').filter(|w| !w.is_empty()).collect::<Vec<_>>().join(" ");
        let mut chars = words.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// Build the final OpenAPI document, with the registry as `components.schemas`
    pub fn build(self, registry: &SchemaRegistry) -> OpenApiDocument {
        debug!("Building final OpenAPI document");

        let components = if registry.is_empty() {
            None
        } else {
            Some(Components {
                schemas: registry.to_components(),
                extensions: BTreeMap::new(),
            })
        };

        OpenApiDocument {
            openapi: "3.0.0".to_string(),
            info: self.info,
            paths: self.paths,
            components,
            extensions: BTreeMap::new(),
        }
    }
}

impl Default for OpenApiBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn json_content(schema: Schema) -> BTreeMap<String, MediaType> {
    let mut content = BTreeMap::new();
    content.insert(
        "application/json".to_string(),
        MediaType {
            schema,
            extensions: BTreeMap::new(),
        },
    );
    content
}
