//! Gather pipeline: fetch from every connector, then consolidate
//!
//! Connectors run concurrently, one tokio task each. Consolidation waits
//! for all of them. Malformed records always fail the run; an unreachable
//! source fails it too unless the config asks to skip it.

use super::config::{FailurePolicy, GatherConfig};
use super::connector::{Connector, ConnectorRegistry};
use super::GatherError;
use crate::consolidate::consolidate;
use crate::record::{GatherMetadata, GatheredData, RawRecord};
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Outcome of one connector's fetch
#[derive(Debug)]
pub struct FetchOutcome {
    pub source: String,
    pub result: Result<Vec<RawRecord>, GatherError>,
}

/// Build a connector for every configured source.
///
/// Sources of an unregistered type are skipped with a warning before their
/// auth is looked at. For a known type, a missing environment variable or an
/// invalid source config fails the whole build.
pub fn build_connectors(
    config: &GatherConfig,
    registry: &ConnectorRegistry,
) -> Result<Vec<Arc<dyn Connector>>, GatherError> {
    let mut connectors = Vec::with_capacity(config.sources.len());
    for source in &config.sources {
        if !registry.supports(&source.config.source_type) {
            warn!(
                source = %source.name,
                source_type = %source.config.source_type,
                "unknown source type, skipping"
            );
            continue;
        }
        let resolved = source.config.resolve_env()?;
        if let Some(connector) = registry.build(&source.name, &resolved, &config.base_dir) {
            connectors.push(connector?);
        }
    }
    Ok(connectors)
}

/// Fetch from every connector concurrently; outcomes keep connector order
pub async fn fetch_all(connectors: &[Arc<dyn Connector>]) -> Vec<FetchOutcome> {
    let mut tasks = JoinSet::new();
    for (index, connector) in connectors.iter().enumerate() {
        let connector = Arc::clone(connector);
        tasks.spawn(async move { (index, connector.fetch_records().await) });
    }

    let mut results: Vec<Option<Result<Vec<RawRecord>, GatherError>>> =
        connectors.iter().map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => results[index] = Some(result),
            Err(e) => warn!(error = %e, "connector task aborted"),
        }
    }

    connectors
        .iter()
        .zip(results)
        .map(|(connector, result)| FetchOutcome {
            source: connector.name().to_string(),
            result: result.unwrap_or_else(|| Err(GatherError::TaskAborted(connector.name().to_string()))),
        })
        .collect()
}

/// Fetch, consolidate and stamp metadata.
///
/// Fails with [`GatherError::NoConnectors`] when no configured source has a
/// known type. Connector failures are handled per the config's
/// [`FailurePolicy`].
pub async fn gather(config: &GatherConfig, registry: &ConnectorRegistry) -> Result<GatheredData, GatherError> {
    let connectors = build_connectors(config, registry)?;
    if connectors.is_empty() {
        return Err(GatherError::NoConnectors);
    }
    gather_from(&connectors, config.on_failure).await
}

/// Like [`gather`] for connectors that are already built.
///
/// A connector that returned malformed records fails the run whatever the
/// policy. Under [`FailurePolicy::SkipUnavailable`] any other failure drops
/// that source, which is then missing from `metadata.sources`.
pub async fn gather_from(
    connectors: &[Arc<dyn Connector>],
    on_failure: FailurePolicy,
) -> Result<GatheredData, GatherError> {
    if connectors.is_empty() {
        return Err(GatherError::NoConnectors);
    }

    let mut all_records = Vec::new();
    let mut sources = Vec::with_capacity(connectors.len());
    for outcome in fetch_all(connectors).await {
        match outcome.result {
            Ok(records) => {
                info!(source = %outcome.source, count = records.len(), "fetched records");
                all_records.extend(records);
                sources.push(outcome.source);
            }
            Err(e) if e.is_malformed_input() || on_failure == FailurePolicy::Abort => {
                error!(source = %outcome.source, error = %e, "connector failed, aborting");
                return Err(e);
            }
            Err(e) => warn!(source = %outcome.source, error = %e, "source unavailable, skipping"),
        }
    }

    let issues = consolidate(&all_records);

    Ok(GatheredData {
        issues,
        metadata: GatherMetadata::new(sources),
    })
}

/// Write gathered data as pretty JSON, creating parent directories
pub fn write_gathered(path: impl AsRef<Path>, data: &GatheredData) -> Result<(), GatherError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| GatherError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let json = serde_json::to_string_pretty(data)?;
    std::fs::write(path, json).map_err(|source| GatherError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), issues = data.issues.len(), "wrote gathered data");
    Ok(())
}
