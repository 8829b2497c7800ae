//! Analyze stage
//!
//! Classifies every consolidated issue, resolves the people involved into
//! a cross-source identity graph and builds the keyword co-occurrence graph.

use crate::classify::{Classification, Classifier, RulesError, CLASSIFIER_NAME};
use crate::keywords::{build_keyword_graph, KeywordGraph};
use crate::people::{resolve_identities, PeopleGraph};
use crate::record::{ConsolidatedIssue, GatheredData, IssueId, Person};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Errors that can occur while analyzing
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("rules error: {0}")]
    Rules(#[from] RulesError),
}

/// Result type for the analyze stage
pub type AnalyzeResult<T> = Result<T, AnalyzeError>;

/// Classification and participants of one consolidated issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueAnalysis {
    pub id: IssueId,
    pub classification: Classification,
    #[serde(default)]
    pub people: Vec<Person>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub analyzed_at: DateTime<Utc>,
    pub classifier: String,
}

impl Default for AnalysisMetadata {
    fn default() -> Self {
        Self {
            analyzed_at: Utc::now(),
            classifier: CLASSIFIER_NAME.to_string(),
        }
    }
}

/// Output of the analyze stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedData {
    pub issues: Vec<IssueAnalysis>,
    pub people_graph: PeopleGraph,
    pub keyword_graph: KeywordGraph,
    pub metadata: AnalysisMetadata,
}

impl AnalyzedData {
    pub fn issue(&self, id: &IssueId) -> Option<&IssueAnalysis> {
        self.issues.iter().find(|a| &a.id == id)
    }
}

/// Classify a single issue.
///
/// The source of the issue's earliest reference selects context rules.
/// Keywords extracted from the full text are merged into the classifier's
/// own, so corrected issues still carry keywords.
pub fn analyze_issue(issue: &ConsolidatedIssue, classifier: &Classifier) -> IssueAnalysis {
    let conversation_text = issue.conversation_text();
    let mut classification = classifier.classify(
        &issue.title,
        &conversation_text,
        Some(issue.id.as_str()),
        issue.primary_source(),
    );

    let full_text = format!("{}\n{}", issue.title, conversation_text);
    let keywords: BTreeSet<String> = classification
        .keywords
        .drain(..)
        .chain(classifier.keywords(&full_text))
        .collect();
    classification.keywords = keywords.into_iter().collect();

    IssueAnalysis {
        id: issue.id.clone(),
        classification,
        people: issue.people.clone(),
    }
}

/// Run the analyze stage over gathered data
pub fn analyze(data: &GatheredData, classifier: &Classifier) -> AnalyzedData {
    info!(issues = data.issues.len(), "analyzing issues");

    let issues: Vec<IssueAnalysis> = data
        .issues
        .iter()
        .map(|issue| analyze_issue(issue, classifier))
        .collect();

    let (people_graph, _) = resolve_identities(&data.issues);
    info!(
        people = people_graph.nodes.len(),
        relationships = people_graph.edges.len(),
        "resolved identities"
    );

    let per_issue_keywords: Vec<Vec<String>> = issues
        .iter()
        .map(|a| a.classification.keywords.clone())
        .collect();
    let keyword_graph = build_keyword_graph(&per_issue_keywords);
    info!(
        keywords = keyword_graph.nodes.len(),
        co_occurrences = keyword_graph.edges.len(),
        "built keyword graph"
    );

    AnalyzedData {
        issues,
        people_graph,
        keyword_graph,
        metadata: AnalysisMetadata::default(),
    }
}

/// Read gathered data; accepts the legacy `tickets` key for the issue list
pub fn read_gathered(path: impl AsRef<Path>) -> AnalyzeResult<GatheredData> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| AnalyzeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&json)?)
}

/// Read analyzed data written by [`write_analyzed`]
pub fn read_analyzed(path: impl AsRef<Path>) -> AnalyzeResult<AnalyzedData> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| AnalyzeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&json)?)
}

/// Write analyzed data as pretty JSON, creating parent directories
pub fn write_analyzed(path: impl AsRef<Path>, data: &AnalyzedData) -> AnalyzeResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| AnalyzeError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let json = serde_json::to_string_pretty(data)?;
    std::fs::write(path, json).map_err(|source| AnalyzeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "wrote analyzed data");
    Ok(())
}
