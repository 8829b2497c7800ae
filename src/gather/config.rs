//! YAML source configuration for the gather stage
//!
//! ```yaml
//! output: data/gathered.json
//! on_failure: abort
//! sources:
//!   support-jira:
//!     type: snapshot
//!     auth:
//!       token: ${JIRA_TOKEN}
//!     filters:
//!       path: fetched/jira.json
//! ```
//!
//! Each source carries free-form `auth` and `filters` maps; a connector
//! reads whichever keys it needs. `${VAR}` placeholders in auth values are
//! resolved from the environment before the connector is built.
//! `on_failure` is `abort` (default) or `skip_unavailable`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Environment variable {0} is not set")]
    MissingEnv(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration for a single data source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Connector type (e.g. "snapshot")
    #[serde(rename = "type")]
    pub source_type: String,
    #[serde(default)]
    pub auth: HashMap<String, String>,
    #[serde(default)]
    pub filters: HashMap<String, serde_json::Value>,
}

impl SourceConfig {
    pub fn new(source_type: impl Into<String>) -> Self {
        Self {
            source_type: source_type.into(),
            ..Default::default()
        }
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.filters.insert(key.into(), value);
        self
    }

    pub fn with_auth(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.auth.insert(key.into(), value.into());
        self
    }

    /// String-valued filter
    pub fn filter_str(&self, key: &str) -> Option<&str> {
        self.filters.get(key).and_then(|v| v.as_str())
    }

    /// Copy of this config with `${VAR}` placeholders in auth resolved
    pub fn resolve_env(&self) -> ConfigResult<Self> {
        self.resolve_with(|var| std::env::var(var).ok())
    }

    /// Like [`resolve_env`](Self::resolve_env) with a custom variable lookup
    pub fn resolve_with(&self, lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let mut auth = HashMap::with_capacity(self.auth.len());
        for (key, value) in &self.auth {
            auth.insert(key.clone(), resolve_placeholders(value, &lookup)?);
        }
        Ok(Self {
            auth,
            ..self.clone()
        })
    }
}

/// A configured source and its name
#[derive(Debug, Clone, PartialEq)]
pub struct NamedSource {
    pub name: String,
    pub config: SourceConfig,
}

#[derive(Debug, Deserialize)]
struct GatherConfigFile {
    #[serde(default = "default_output")]
    output: String,
    #[serde(default)]
    sources: serde_yaml::Mapping,
    #[serde(default)]
    on_failure: FailurePolicy,
}

fn default_output() -> String {
    "data/gathered.json".to_string()
}

/// What a run does when a connector cannot deliver.
///
/// Malformed records fail the run under either policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Any connector failure fails the run
    #[default]
    Abort,
    /// An unreachable source is logged and left out of the run
    SkipUnavailable,
}

/// Top-level gather configuration
#[derive(Debug, Clone, PartialEq)]
pub struct GatherConfig {
    pub output: PathBuf,
    /// Sources in file order
    pub sources: Vec<NamedSource>,
    pub on_failure: FailurePolicy,
    /// Directory relative paths resolve against
    pub base_dir: PathBuf,
}

impl GatherConfig {
    /// Parse a config document; relative paths resolve against `base_dir`
    pub fn from_yaml(yaml: &str, base_dir: impl Into<PathBuf>) -> ConfigResult<Self> {
        let file: GatherConfigFile = serde_yaml::from_str(yaml)?;

        let mut sources = Vec::with_capacity(file.sources.len());
        for (name, value) in file.sources {
            let name = name
                .as_str()
                .ok_or_else(|| ConfigError::Invalid("source names must be strings".to_string()))?
                .to_string();
            let config: SourceConfig = serde_yaml::from_value(value)?;
            sources.push(NamedSource { name, config });
        }

        Ok(Self {
            output: PathBuf::from(file.output),
            sources,
            on_failure: file.on_failure,
            base_dir: base_dir.into(),
        })
    }

    /// Load a config file; relative paths resolve against its directory
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::from_yaml(&yaml, base_dir)
    }

    /// Output file, resolved against the config directory when relative
    pub fn output_path(&self) -> PathBuf {
        self.resolve_path(&self.output)
    }

    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

fn placeholder_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{(\w+)\}").ok()).as_ref()
}

/// Replace every `${VAR}` in `value`; an unknown variable is an error
pub fn resolve_placeholders(value: &str, lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<String> {
    let Some(re) = placeholder_pattern() else {
        return Ok(value.to_string());
    };

    let mut resolved = String::with_capacity(value.len());
    let mut last = 0;
    for caps in re.captures_iter(value) {
        let (Some(whole), Some(var)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let replacement = lookup(var.as_str()).ok_or_else(|| ConfigError::MissingEnv(var.as_str().to_string()))?;
        resolved.push_str(&value[last..whole.start()]);
        resolved.push_str(&replacement);
        last = whole.end();
    }
    resolved.push_str(&value[last..]);
    Ok(resolved)
}
