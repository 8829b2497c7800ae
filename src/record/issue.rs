//! Consolidated issue: one logical issue merged from one or more raw records

use super::model::{Message, Person, SourceReference};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace for generated identifiers, so equal inputs yield equal ids
pub(crate) const ID_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2d4e_8a3b_4c5d_9e0f_1a2b_3c4d_5e6f);

/// Unique identifier for a consolidated issue
///
/// Serializes as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueId(String);

impl IssueId {
    /// Derive an id from the identity keys of the merged records
    pub fn derive(name: &str) -> Self {
        Self(Uuid::new_v5(&ID_NAMESPACE, format!("issue:{}", name).as_bytes()).to_string())
    }

    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IssueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for IssueId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// An issue consolidated from one or more sources.
///
/// A single reference is the unmerged case and still valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedIssue {
    pub id: IssueId,
    /// One per merged raw record, earliest first
    pub references: Vec<SourceReference>,
    /// Taken from the earliest raw record
    pub title: String,
    /// Taken from the earliest raw record
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Deduplicated by `(source, source_id)`, first occurrence wins
    pub people: Vec<Person>,
    /// Every message of every merged record, ascending by timestamp
    pub conversation: Vec<Message>,
}

impl ConsolidatedIssue {
    /// Source system of the earliest reference
    pub fn primary_source(&self) -> Option<&str> {
        self.references.first().map(|r| r.source.as_str())
    }

    /// All message bodies joined by newlines
    pub fn conversation_text(&self) -> String {
        self.conversation
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Metadata about a gathering run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatherMetadata {
    pub gathered_at: DateTime<Utc>,
    pub sources: Vec<String>,
}

impl GatherMetadata {
    pub fn new(sources: Vec<String>) -> Self {
        Self {
            gathered_at: Utc::now(),
            sources,
        }
    }
}

/// Output of the gather stage, input of the analyze stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatheredData {
    /// Older files name this list `tickets`
    #[serde(alias = "tickets")]
    pub issues: Vec<ConsolidatedIssue>,
    pub metadata: GatherMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn issue_id_is_stable_for_same_name() {
        assert_eq!(IssueId::derive("jira:AUTH-1"), IssueId::derive("jira:AUTH-1"));
        assert_ne!(IssueId::derive("jira:AUTH-1"), IssueId::derive("jira:AUTH-2"));
    }

    #[test]
    fn issue_id_serializes_as_string() {
        let id = IssueId::from_string("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }

    #[test]
    fn gathered_data_reads_legacy_tickets_key() {
        let data: GatheredData = serde_json::from_value(json!({
            "tickets": [],
            "metadata": {"gathered_at": "2026-01-01T00:00:00Z", "sources": ["jira"]}
        }))
        .unwrap();
        assert!(data.issues.is_empty());
        assert_eq!(data.metadata.sources, vec!["jira".to_string()]);
    }

    #[test]
    fn gathered_data_writes_issues_key() {
        let data = GatheredData {
            issues: Vec::new(),
            metadata: GatherMetadata::new(vec![]),
        };
        let value = serde_json::to_value(&data).unwrap();
        assert!(value.get("issues").is_some());
        assert!(value.get("tickets").is_none());
    }
}
