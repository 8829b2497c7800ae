//! Gather stage
//!
//! Loads the source configuration, runs every connector and consolidates
//! their records into issues.

mod config;
mod connector;
mod pipeline;

pub use config::{
    resolve_placeholders, ConfigError, ConfigResult, FailurePolicy, GatherConfig, NamedSource, SourceConfig,
};
pub use connector::{Connector, ConnectorFactory, ConnectorRegistry, SnapshotConnector};
pub use pipeline::{build_connectors, fetch_all, gather, gather_from, write_gathered, FetchOutcome};

use crate::record::RecordError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while gathering
#[derive(Debug, Error)]
pub enum GatherError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("record error: {0}")]
    Record(#[from] RecordError),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("source '{source_name}' is missing filter '{key}'")]
    MissingFilter { source_name: String, key: String },

    #[error("source '{source_name}' failed: {message}")]
    Fetch { source_name: String, message: String },

    #[error("connector task for '{0}' aborted")]
    TaskAborted(String),

    #[error("no connectors configured")]
    NoConnectors,
}

impl GatherError {
    /// Whether the error reports bad record data rather than an unreachable
    /// source. Such errors always fail the run.
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, Self::Record(_) | Self::Serialization(_))
    }
}
