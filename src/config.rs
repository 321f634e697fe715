//! Run configuration, loaded from a YAML or JSON file.
//!
//! ```yaml
//! controllers: src/controllers/**/*.rs
//! schemas: "schemas/*.yaml, schemas/*.json"
//! static:
//!   info: { title: Pet Store, version: 2.0.0 }
//!   servers:
//!     - url: https://pets.example.com
//! samples:
//!   dir: docs/samples
//!   languages:
//!     shell: { extension: sh }
//!     python: { extension: py }
//! out: docs/openapi.json
//! ```

use crate::error::{Error, Result};
use crate::openapi_builder::Server;
use crate::registry::SchemaRegistry;
use crate::serializer::OutputFormat;
use log::debug;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration file looked up when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "openapi-assembler.yaml";

const DEFAULT_OUT_PATH: &str = "docs/openapi.json";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Patterns locating controller sources
    #[serde(default)]
    pub controllers: Patterns,
    /// Patterns locating schema fragments
    #[serde(default)]
    pub schemas: Patterns,
    /// Replaces the built-in base registry when present
    #[serde(default)]
    pub base_schema: Option<Value>,
    /// Overlay merged over the generated document
    #[serde(default, rename = "static")]
    pub static_overlay: Value,
    #[serde(default)]
    pub samples: Option<SampleConfig>,
    #[serde(default = "default_out")]
    pub out: PathBuf,
    #[serde(default)]
    pub format: OutputFormat,
}

/// One or more glob patterns, written as a string (possibly comma-separated)
/// or a list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "OneOrMany")]
pub struct Patterns(pub Vec<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl From<OneOrMany> for Patterns {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::One(pattern) => Patterns(vec![pattern]),
            OneOrMany::Many(patterns) => Patterns(patterns),
        }
    }
}

impl Patterns {
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|p| p.trim().is_empty())
    }
}

/// Where code samples live and which languages to look for.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SampleConfig {
    pub dir: PathBuf,
    /// Languages in the order they were configured
    #[serde(deserialize_with = "ordered_languages")]
    pub languages: Vec<SampleLanguage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleLanguage {
    /// Language tag, also the sample sub-directory name
    pub tag: String,
    /// File extension without the leading dot
    pub extension: String,
}

#[derive(Deserialize)]
struct LanguageOptions {
    extension: String,
}

fn ordered_languages<'de, D>(deserializer: D) -> std::result::Result<Vec<SampleLanguage>, D::Error>
where
    D: Deserializer<'de>,
{
    struct LanguagesVisitor;

    impl<'de> Visitor<'de> for LanguagesVisitor {
        type Value = Vec<SampleLanguage>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a mapping of language tag to { extension }")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
            let mut languages = Vec::new();
            while let Some((tag, options)) = map.next_entry::<String, LanguageOptions>()? {
                languages.push(SampleLanguage {
                    tag,
                    extension: options.extension.trim_start_matches('.').to_string(),
                });
            }
            Ok(languages)
        }
    }

    deserializer.deserialize_map(LanguagesVisitor)
}

fn default_out() -> PathBuf {
    PathBuf::from(DEFAULT_OUT_PATH)
}

impl Config {
    /// Loads the configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid YAML/JSON,
    /// or declares a `static` overlay that is not a mapping.
    pub fn load(path: &Path) -> Result<Config> {
        debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path)?;
        Self::parse(&content).map_err(|e| match e {
            Error::SerializationError(message) => Error::parse(path, message),
            other => other,
        })
    }

    /// Parses configuration text.
    pub fn parse(content: &str) -> Result<Config> {
        let config: Config = serde_yaml::from_str(content)?;
        if !matches!(config.static_overlay, Value::Null | Value::Object(_)) {
            return Err(Error::InvalidArgument("'static' must be a mapping".to_string()));
        }
        if let Some(base) = &config.base_schema {
            if !base.is_object() {
                return Err(Error::InvalidArgument("'baseSchema' must be a mapping".to_string()));
            }
        }
        Ok(config)
    }

    /// Makes output and sample paths absolute against `root`.
    pub fn resolve_paths(mut self, root: &Path) -> Self {
        self.out = root.join(&self.out);
        if let Some(samples) = self.samples.as_mut() {
            samples.dir = root.join(&samples.dir);
        }
        self
    }

    /// The registry every fragment is merged onto.
    pub fn base_registry(&self) -> SchemaRegistry {
        match &self.base_schema {
            Some(base) => SchemaRegistry::from_value(base.clone()),
            None => SchemaRegistry::builtin(),
        }
    }

    /// Servers declared in the static overlay, to be copied onto every operation.
    ///
    /// # Errors
    ///
    /// Returns an error if `static.servers` is present but is not a list of servers.
    pub fn servers(&self) -> Result<Vec<Server>> {
        match self.static_overlay.get("servers") {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(servers) => serde_json::from_value(servers.clone()).map_err(|e| {
                Error::InvalidArgument(format!("'static.servers' is not a list of servers: {}", e))
            }),
        }
    }
}
