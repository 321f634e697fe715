use openapi_assembler::{
    cli::generate,
    config::Config,
    openapi_builder::OpenApiDocument,
    serializer::serialize_json,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;

/// Helper function to create a temporary test project
fn create_test_project(files: Vec<(&str, &str)>) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    for (path, content) in files {
        let file_path = temp_dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(&file_path, content).expect("Failed to write test file");
    }

    temp_dir
}

fn pet_project(extra: Vec<(&'static str, &'static str)>) -> TempDir {
    let mut files = vec![
        ("src/controllers/pets.rs", include_str!("fixtures/pets_controller.rs")),
        ("schemas/pet.json", include_str!("fixtures/pet.schema.json")),
        ("docs/.keep", ""),
    ];
    files.extend(extra);
    create_test_project(files)
}

fn run(project: &TempDir, config: &str) -> Value {
    let config = Config::parse(config).expect("Failed to parse config");
    let summary = generate(config, project.path()).expect("Generation failed");
    read_json(&summary.out)
}

fn read_json(path: &Path) -> Value {
    let content = std::fs::read_to_string(path).expect("Output not written");
    serde_json::from_str(&content).expect("Output is not JSON")
}

const PET_CONFIG: &str = "
controllers: src/controllers/**/*.rs
schemas: schemas/*.json
";

#[test]
fn test_pet_end_to_end() {
    let project = pet_project(vec![]);
    let doc = run(&project, PET_CONFIG);

    assert_eq!(doc["openapi"], "3.0.0");
    assert_eq!(
        doc["components"]["schemas"]["Pet"],
        json!({"id": "Pet", "type": "object", "properties": {"name": {"type": "string"}}})
    );
    // built-in base set stays alongside the fragment
    assert!(doc["components"]["schemas"]["Buffer"].is_object());

    let create = &doc["paths"]["/pets"]["post"];
    assert_eq!(create["operationId"], "createPet");
    assert_eq!(create["summary"], "Register a new pet");
    assert_eq!(
        create["requestBody"]["content"]["application/json"]["schema"],
        json!({"$ref": "#/components/schemas/Pet"})
    );

    // no samples or servers configured
    for operation in ["get", "post"] {
        let op = &doc["paths"]["/pets"][operation];
        assert!(op.get("servers").is_none(), "{} has servers", operation);
        assert!(op.get("x-code-samples").is_none(), "{} has samples", operation);
    }
}

#[test]
fn test_paths_and_parameters() {
    let project = pet_project(vec![]);
    let doc = run(&project, PET_CONFIG);

    let get_pet = &doc["paths"]["/pets/{id}"]["get"];
    assert_eq!(get_pet["tags"], json!(["Pet"]));
    assert_eq!(
        get_pet["parameters"],
        json!([{"name": "id", "in": "path", "required": true, "schema": {"type": "integer", "format": "int64"}}])
    );
    assert_eq!(
        get_pet["responses"]["200"]["content"]["application/json"]["schema"],
        json!({"type": "object"})
    );

    let list = &doc["paths"]["/pets"]["get"];
    assert_eq!(list["parameters"][0]["name"], "limit");
    assert_eq!(list["parameters"][0]["in"], "query");
    assert_eq!(list["parameters"][0]["required"], false);
}

#[test]
fn test_shape_annotation_links_to_builtin() {
    let project = pet_project(vec![]);
    let doc = run(&project, PET_CONFIG);

    let body = &doc["paths"]["/pets/{id}/tags"]["put"]["requestBody"];
    assert_eq!(
        body["content"]["application/json"]["schema"],
        json!({"$ref": "#/components/schemas/CSV"})
    );
}

#[test]
fn test_samples_servers_and_overlay() {
    let project = pet_project(vec![
        ("samples/shell/getPet.get.sh", include_str!("fixtures/samples/shell/getPet.get.sh")),
        ("samples/shell/listPets.get.sh", ""),
        ("samples/python/getPet.get.py", "client.get_pet(1)\n"),
    ]);

    let doc = run(
        &project,
        "
controllers: src/controllers/**/*.rs
schemas: schemas/*.json
static:
  info:
    title: Pet Store
  x-logo: logo.png
  servers:
    - url: https://pets.example.com
samples:
  dir: samples
  languages:
    shell: { extension: sh }
    python: { extension: py }
",
    );

    assert_eq!(doc["info"]["title"], "Pet Store");
    assert_eq!(doc["info"]["version"], "1.0.0");
    assert_eq!(doc["x-logo"], "logo.png");

    assert_eq!(
        doc["paths"]["/pets/{id}"]["get"]["x-code-samples"],
        json!([
            {"lang": "shell", "source": "curl https://pets.example.com/pets/1\n"},
            {"lang": "python", "source": "client.get_pet(1)\n"}
        ])
    );
    assert!(doc["paths"]["/pets"]["get"].get("x-code-samples").is_none());

    let expected_servers = json!([{"url": "https://pets.example.com"}]);
    let mut operations = 0;
    for item in doc["paths"].as_object().unwrap().values() {
        for op in item.as_object().unwrap().values() {
            assert_eq!(op["servers"], expected_servers);
            operations += 1;
        }
    }
    assert_eq!(operations, 4);
}

#[test]
fn test_later_fragment_wins() {
    let project = pet_project(vec![
        ("schemas/extra/pet.yaml", "id: Pet\ntype: object\nproperties:\n  name:\n    type: integer\n  age:\n    type: integer\n"),
    ]);

    let doc = run(
        &project,
        "
controllers: src/controllers/**/*.rs
schemas: schemas/*.json, schemas/extra/*.yaml
",
    );

    assert_eq!(
        doc["components"]["schemas"]["Pet"]["properties"],
        json!({"name": {"type": "integer"}, "age": {"type": "integer"}})
    );
}

#[test]
fn test_yaml_output() {
    let project = pet_project(vec![]);
    let config = Config::parse("controllers: src/controllers/*.rs\nout: docs/openapi.yaml\nformat: yaml\n").unwrap();

    let summary = generate(config, project.path()).unwrap();

    let content = std::fs::read_to_string(&summary.out).unwrap();
    let doc: Value = serde_yaml::from_str(&content).unwrap();
    assert_eq!(doc["paths"]["/pets/{id}"]["get"]["operationId"], "getPet");
    assert_eq!(summary.operations, 4);
    assert_eq!(summary.controllers, 1);
}

#[test]
fn test_output_roundtrip() {
    let project = pet_project(vec![]);
    let config = Config::parse(PET_CONFIG).unwrap();
    let summary = generate(config, project.path()).unwrap();

    let written = std::fs::read_to_string(&summary.out).unwrap();
    let doc: OpenApiDocument = serde_json::from_str(&written).unwrap();

    assert_eq!(serialize_json(&doc).unwrap(), written);
}

#[test]
fn test_missing_output_directory_is_fatal() {
    let project = pet_project(vec![]);
    let config = Config::parse("controllers: src/controllers/*.rs\nout: build/openapi.json\n").unwrap();

    let result = generate(config, project.path());

    assert!(result.is_err());
    assert!(!project.path().join("build").exists());
}

#[test]
fn test_existing_output_is_kept_on_failure() {
    let project = pet_project(vec![
        ("docs/openapi.json", "{\"previous\": true}"),
        ("src/controllers/broken.rs", "impl {"),
    ]);
    let config = Config::parse(PET_CONFIG).unwrap();

    assert!(generate(config, project.path()).is_err());
    assert_eq!(read_json(&project.path().join("docs/openapi.json")), json!({"previous": true}));
}

#[test]
fn test_invalid_pattern_is_fatal() {
    let project = pet_project(vec![]);
    let config = Config::parse("controllers: \"src/[controllers\"\n").unwrap();

    assert!(generate(config, project.path()).is_err());
}

#[test]
fn test_unmatched_patterns_yield_base_document() {
    let project = create_test_project(vec![("docs/.keep", "")]);
    let doc = run(&project, "controllers: src/**/*.rs\nschemas: schemas/*.json\n");

    assert_eq!(doc["paths"], json!({}));
    assert_eq!(
        doc["components"]["schemas"].as_object().unwrap().keys().collect::<Vec<_>>(),
        vec!["Buffer", "CSV", "ID", "TransactionQuery"]
    );
}

#[test]
fn test_brace_alternation_in_schema_pattern() {
    let project = pet_project(vec![(
        "schemas/owner.yaml",
        "id: Owner\ntype: object\nproperties:\n  email:\n    type: string\n",
    )]);

    let doc = run(
        &project,
        "
controllers: src/controllers/**/*.rs
schemas: \"schemas/*.{json,yaml}\"
",
    );

    assert!(doc["components"]["schemas"]["Pet"].is_object());
    assert!(doc["components"]["schemas"]["Owner"].is_object());
}

#[cfg(unix)]
#[test]
fn test_output_is_world_readable() {
    use std::os::unix::fs::PermissionsExt;

    let project = pet_project(vec![]);
    let config = Config::parse(PET_CONFIG).unwrap();
    let summary = generate(config, project.path()).unwrap();

    let mode = std::fs::metadata(&summary.out).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o644);
}
