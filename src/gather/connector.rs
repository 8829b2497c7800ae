//! Connector trait and registry
//!
//! A connector fetches raw records from one configured source. Connectors
//! are built from their [`SourceConfig`] by a factory registered under the
//! source's `type`.

use super::config::SourceConfig;
use super::GatherError;
use crate::record::{parse_records, RawRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// The contract every source connector implements.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Configured source name
    fn name(&self) -> &str;

    /// Connector type this instance was built from
    fn source_type(&self) -> &str;

    /// Fetch every record from the source
    async fn fetch_records(&self) -> Result<Vec<RawRecord>, GatherError>;
}

/// Builds a connector from its name, resolved config and the config directory
pub type ConnectorFactory = fn(&str, &SourceConfig, &Path) -> Result<Arc<dyn Connector>, GatherError>;

/// Maps source types to connector factories
#[derive(Clone)]
pub struct ConnectorRegistry {
    factories: HashMap<String, ConnectorFactory>,
}

impl Default for ConnectorRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl std::fmt::Debug for ConnectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectorRegistry")
            .field("types", &self.source_types())
            .finish()
    }
}

impl ConnectorRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// A registry with the connectors shipped in this crate
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(SnapshotConnector::SOURCE_TYPE, SnapshotConnector::build);
        registry
    }

    pub fn register(&mut self, source_type: impl Into<String>, factory: ConnectorFactory) {
        self.factories.insert(source_type.into(), factory);
    }

    pub fn supports(&self, source_type: &str) -> bool {
        self.factories.contains_key(source_type)
    }

    /// Registered types, sorted
    pub fn source_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// Build a connector; `None` when the type is not registered
    pub fn build(
        &self,
        name: &str,
        config: &SourceConfig,
        base_dir: &Path,
    ) -> Option<Result<Arc<dyn Connector>, GatherError>> {
        let factory = self.factories.get(&config.source_type)?;
        debug!(source = name, source_type = %config.source_type, "building connector");
        Some(factory(name, config, base_dir))
    }
}

/// Reads records previously exported to a JSON file.
///
/// Expects `filters.path`, relative to the config directory unless absolute.
/// The file holds a JSON array of raw records.
#[derive(Debug, Clone)]
pub struct SnapshotConnector {
    name: String,
    path: PathBuf,
}

impl SnapshotConnector {
    pub const SOURCE_TYPE: &'static str = "snapshot";

    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn build(name: &str, config: &SourceConfig, base_dir: &Path) -> Result<Arc<dyn Connector>, GatherError> {
        let path = config.filter_str("path").ok_or_else(|| GatherError::MissingFilter {
            source_name: name.to_string(),
            key: "path".to_string(),
        })?;
        let path = Path::new(path);
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        };
        Ok(Arc::new(Self::new(name, path)))
    }
}

#[async_trait]
impl Connector for SnapshotConnector {
    fn name(&self) -> &str {
        &self.name
    }

    fn source_type(&self) -> &str {
        Self::SOURCE_TYPE
    }

    async fn fetch_records(&self) -> Result<Vec<RawRecord>, GatherError> {
        let json = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| GatherError::Io {
                path: self.path.clone(),
                source,
            })?;
        let records = parse_records(&json)?;
        debug!(source = %self.name, count = records.len(), "read snapshot");
        Ok(records)
    }
}
