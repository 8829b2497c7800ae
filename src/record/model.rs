//! Raw record model shared by every source connector

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised when a raw record does not satisfy the connector contract
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Malformed record at index {index}: {reason}")]
    Malformed { index: usize, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for record operations
pub type RecordResult<T> = Result<T, RecordError>;

/// Identifies one raw record inside one source system.
///
/// `(source, id)` is unique within a source but not across sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceReference {
    pub source: String,
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    /// Source-specific extras (e.g. channel and thread_ts for chat threads)
    #[serde(default)]
    pub meta: HashMap<String, serde_json::Value>,
}

impl SourceReference {
    pub fn new(source: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            id: id.into(),
            url: None,
            meta: HashMap::new(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }

    /// `source:id`, the key used for generated identifiers
    pub fn key(&self) -> String {
        format!("{}:{}", self.source, self.id)
    }
}

/// How a person took part in a ticket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Reporter,
    Assignee,
    Commenter,
    #[default]
    Participant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Reporter => "reporter",
            Role::Assignee => "assignee",
            Role::Commenter => "commenter",
            Role::Participant => "participant",
        };
        f.write_str(s)
    }
}

/// Raw identity key of a person: `(source, source_id)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PersonKey {
    pub source: String,
    pub source_id: String,
}

impl PersonKey {
    pub fn new(source: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            source_id: source_id.into(),
        }
    }
}

impl std::fmt::Display for PersonKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.source, self.source_id)
    }
}

/// A person involved in a ticket, as seen from one source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub source: String,
    pub source_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Role,
}

impl Person {
    pub fn new(source: impl Into<String>, source_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            source_id: source_id.into(),
            name: name.into(),
            email: None,
            role: Role::default(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn key(&self) -> PersonKey {
        PersonKey::new(&self.source, &self.source_id)
    }

    /// Email if present and non-empty
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref().filter(|e| !e.is_empty())
    }
}

/// A single message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub source: String,
    pub author: String,
    pub author_source_id: String,
    pub timestamp: DateTime<Utc>,
    pub content: String,
}

impl Message {
    pub fn new(
        source: impl Into<String>,
        author: impl Into<String>,
        author_source_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            author: author.into(),
            author_source_id: author_source_id.into(),
            timestamp,
            content: content.into(),
        }
    }
}

/// One fetch result from a single source, before any merging.
///
/// `raw_text` is the title plus every message body. It is only scanned for
/// cross-references and never displayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub reference: SourceReference,
    pub title: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub people: Vec<Person>,
    #[serde(default)]
    pub conversation: Vec<Message>,
    #[serde(default)]
    pub raw_text: String,
}

impl RawRecord {
    /// Create a record whose `updated_at` equals `created_at`
    pub fn new(reference: SourceReference, title: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        let title = title.into();
        Self {
            reference,
            raw_text: title.clone(),
            title,
            status: "open".to_string(),
            created_at,
            updated_at: created_at,
            people: Vec::new(),
            conversation: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = updated_at;
        self
    }

    pub fn with_person(mut self, person: Person) -> Self {
        self.people.push(person);
        self
    }

    /// Append a message and its body to `raw_text`
    pub fn with_message(mut self, message: Message) -> Self {
        self.raw_text.push('\n');
        self.raw_text.push_str(&message.content);
        self.conversation.push(message);
        self
    }

    pub fn with_raw_text(mut self, raw_text: impl Into<String>) -> Self {
        self.raw_text = raw_text.into();
        self
    }

    /// Check the fields the clustering stages index on.
    ///
    /// `index` is the record's position in its batch and is only used for
    /// the error message.
    pub fn validate(&self, index: usize) -> RecordResult<()> {
        let malformed = |reason: &str| RecordError::Malformed {
            index,
            reason: reason.to_string(),
        };

        if self.reference.source.trim().is_empty() {
            return Err(malformed("reference.source is empty"));
        }
        if self.reference.id.trim().is_empty() {
            return Err(malformed("reference.id is empty"));
        }
        for person in &self.people {
            if person.source.trim().is_empty() || person.source_id.trim().is_empty() {
                return Err(malformed(&format!(
                    "person '{}' has no source identity",
                    person.name
                )));
            }
        }
        Ok(())
    }
}

/// Parse and validate a JSON array of raw records.
///
/// Any record missing a required field fails the whole batch.
pub fn parse_records(json: &str) -> RecordResult<Vec<RawRecord>> {
    let records: Vec<RawRecord> = serde_json::from_str(json)?;
    for (index, record) in records.iter().enumerate() {
        record.validate(index)?;
    }
    Ok(records)
}
