//! Configuration management
//!
//! The model tree is declarative: an [`Item`] pairs a connector (how to fetch
//! bytes) with a model (how to shape them) and the notifiers that receive the
//! result. Models are immutable after load.

use std::{collections::HashMap, path::Path, time::Duration};

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level used when RUST_LOG is not set
    pub log_level: Option<String>,
    /// Concurrency limits
    pub limits: LimitsConfig,
    /// Extraction items, run sequentially in declaration order
    pub items: Vec<Item>,
}

impl Config {
    /// Load configuration from a YAML file with `HARVEST_`-prefixed
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let config: Self = figment
            .merge(Env::prefixed("HARVEST_").split("__"))
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check item names are present and unique. Shape exclusivity is already
    /// guaranteed by the enum encoding.
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for item in &self.items {
            if item.name.is_empty() {
                return Err(Error::Config("item with empty name".to_string()));
            }
            if !seen.insert(item.name.as_str()) {
                return Err(Error::Config(format!("duplicate item name: {}", item.name)));
            }
        }
        Ok(())
    }
}

/// A single named extraction: source, shape and delivery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Unique item name; completed results are stored under it for
    /// `reference` connectors of later items
    pub name: String,
    /// How to obtain raw bytes
    pub connector: ConnectorConfig,
    /// How to shape them
    pub model: ModelConfig,
    /// Where the result goes
    #[serde(default)]
    pub notifiers: Vec<NotifierConfig>,
}

/// Concurrency limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Global cap on in-flight HTTP fetches. Falls back to the
    /// `FITTER_HTTP_WORKER` environment variable, then 1000.
    pub http_workers: Option<usize>,
    /// Per-host caps; hosts not listed are unbounded
    pub hosts: HashMap<String, usize>,
    /// Cap on concurrent headless-browser containers; unbounded when unset
    pub browser: Option<usize>,
    /// Maximum model recursion depth
    pub max_depth: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            http_workers: None,
            hosts: HashMap::new(),
            browser: None,
            max_depth: 16,
        }
    }
}

/// Model shape: an object (field map) or an array (root path + item template)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelConfig {
    /// Produce a JSON object
    Object(ObjectConfig),
    /// Produce a JSON array
    Array(ArrayConfig),
}

/// Object template
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectConfig {
    /// Scope-narrowing selector; empty means the current scope
    pub path: String,
    /// Named fields, emitted in declaration order
    pub fields: IndexMap<String, FieldConfig>,
    /// Singleton field: when set the object is emitted as a bare value
    /// (used for array items that are scalars rather than objects)
    pub field: Option<BaseField>,
}

/// Array template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrayConfig {
    /// Selector resolving to the item sequence; empty means the whole document
    #[serde(default)]
    pub root_path: String,
    /// Template applied once per element, with a zero-based index
    pub item: Box<ObjectConfig>,
}

/// A single position in an object
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldConfig {
    /// Scalar extraction: path + declared type
    Base(BaseField),
    /// Nested object
    Object(ObjectConfig),
    /// Nested array
    Array(ArrayConfig),
    /// Ordered alternatives; the first non-empty result wins
    FirstOf(Vec<FieldConfig>),
}

/// Scalar field: a path selector, a declared type, and an optional generated
/// override
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseField {
    /// Declared scalar type
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Dialect-specific selector
    pub path: String,
    /// Computed alternative; when present the path result only feeds the
    /// computation's parent value
    pub generated: Option<GeneratedConfig>,
}

/// Scalar types a field can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Always null
    Null,
    /// Boolean
    Bool,
    /// String (quote-escaped on output)
    #[default]
    String,
    /// String emitted verbatim
    RawString,
    /// 32-bit integer
    Int,
    /// 64-bit integer
    Int64,
    /// 32-bit float
    Float,
    /// 64-bit float
    Float64,
}

/// Computed alternatives to path extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratedConfig {
    /// Literal typed constant
    Static {
        /// Declared type of the literal
        #[serde(rename = "type")]
        field_type: FieldType,
        /// Literal text, coerced to the declared type
        value: String,
    },
    /// Template string with placeholders
    Formatted {
        /// Template; see the expression module for recognized placeholders
        template: String,
    },
    /// Recursive sub-extraction
    Model {
        /// Connector for the sub-extraction
        connector: Box<ConnectorConfig>,
        /// Model for the sub-extraction
        model: Box<ModelConfig>,
    },
    /// Expression over the current value
    Calculated {
        /// CEL expression; template-interpolated before compilation
        expression: String,
    },
    /// Delegate to a registered formatter plugin
    Plugin {
        /// Registered formatter name
        name: String,
        /// Opaque plugin configuration
        #[serde(default)]
        config: serde_json::Value,
    },
}

/// Response dialects; the response type selects the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    /// Dotted-path JSON dialect
    #[default]
    Json,
    /// CSS selector dialect
    Html,
    /// XPath 1.0 dialect
    Xpath,
}

/// Source of raw bytes plus parsing directives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// Target URL, template-interpolated with the parent value and index
    #[serde(default)]
    pub url: String,
    /// Parser selection
    #[serde(default)]
    pub response_type: ResponseType,
    /// Retries after the first failed call (0 = single call)
    #[serde(default)]
    pub attempts: u32,
    /// Registered parser plugin overriding the response-type dialect
    #[serde(default)]
    pub parser_plugin: Option<String>,
    /// Connector variant
    #[serde(flatten)]
    pub source: SourceConfig,
}

/// Connector variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceConfig {
    /// Configured literal bytes
    Static(StaticSource),
    /// HTTP request
    Server(ServerSource),
    /// Headless browser in a container
    Browser(BrowserSource),
    /// Local file read
    File(FileSource),
    /// Previously stored named result
    Reference(ReferenceSource),
    /// Generated integer sequence
    IntSequence(IntSequenceSource),
    /// Registered connector plugin
    Plugin(PluginSource),
}

/// Literal bytes, template-interpolated
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticSource {
    /// Literal text
    pub value: String,
    /// Embedded JSON alternative to `value`; wins when non-null
    pub raw: Option<serde_json::Value>,
}

/// HTTP request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSource {
    /// HTTP method
    pub method: String,
    /// Header map; values are template-interpolated
    pub headers: HashMap<String, String>,
    /// Per-request timeout override
    #[serde(with = "humantime_serde::option")]
    pub timeout: Option<Duration>,
}

impl Default for ServerSource {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            headers: HashMap::new(),
            timeout: None,
        }
    }
}

/// Headless-browser settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSource {
    /// Container image; defaults to headless Chrome
    pub image: Option<String>,
    /// Custom browser flags; when set they replace the default flag set
    /// entirely (including the URL handling)
    pub flags: Vec<String>,
    /// Container entrypoint override
    pub entry_point: Option<String>,
    /// Virtual time budget granted to the page, in milliseconds
    pub wait_ms: Option<u64>,
    /// Container run timeout
    #[serde(with = "humantime_serde::option")]
    pub timeout: Option<Duration>,
    /// Pull the image before running
    pub pull: bool,
    /// Pull timeout
    #[serde(with = "humantime_serde::option")]
    pub pull_timeout: Option<Duration>,
    /// Remove the container once it exits
    pub purge: bool,
}

impl Default for BrowserSource {
    fn default() -> Self {
        Self {
            image: None,
            flags: Vec::new(),
            entry_point: None,
            wait_ms: None,
            timeout: None,
            pull: false,
            pull_timeout: None,
            purge: false,
        }
    }
}

/// Local file settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    /// Path to read
    pub path: String,
}

/// Reference lookup settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceSource {
    /// Name of a previously completed item
    pub name: String,
}

/// Integer sequence settings: `[start, start+step, ...)` up to but excluding
/// `end`; empty when the step sign disagrees with the bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntSequenceSource {
    /// First value
    pub start: i64,
    /// Exclusive bound
    pub end: i64,
    /// Increment; may be negative
    #[serde(default = "default_step")]
    pub step: i64,
}

fn default_step() -> i64 {
    1
}

/// Connector plugin settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginSource {
    /// Registered connector name
    pub name: String,
    /// Opaque plugin configuration
    #[serde(default)]
    pub config: serde_json::Value,
}

/// Sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifierConfig {
    /// Print the result record to stdout
    Console(ConsoleNotifierConfig),
    /// Write the result to a file
    File(FileNotifierConfig),
    /// POST the result to an endpoint
    Http(HttpNotifierConfig),
}

/// Console sink
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleNotifierConfig {
    /// Print only the record JSON instead of a structured log line
    pub only_result: bool,
}

/// File sink; path and file name are template-interpolated with the result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileNotifierConfig {
    /// Destination directory
    pub path: String,
    /// Destination file name
    pub file_name: String,
    /// Content template; the record JSON is written when empty
    pub content: String,
    /// Append instead of truncating
    pub append: bool,
}

/// HTTP sink
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpNotifierConfig {
    /// Endpoint URL, template-interpolated
    pub url: String,
    /// HTTP method
    pub method: String,
    /// Header map; values are template-interpolated
    pub headers: HashMap<String, String>,
    /// Request timeout
    #[serde(with = "humantime_serde::option")]
    pub timeout: Option<Duration>,
}

impl Default for HttpNotifierConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            method: "POST".to_string(),
            headers: HashMap::new(),
            timeout: None,
        }
    }
}
