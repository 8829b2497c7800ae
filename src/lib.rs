//! Triage: cross-source support issue consolidation and analysis
//!
//! Support work about one problem is scattered across trackers, chat and
//! helpdesk tools. This crate stitches those records back together and
//! derives structure from the result.
//!
//! # Core Concepts
//!
//! - **Consolidation**: raw records that reference each other's ids merge
//!   into one issue (transitively, via union-find)
//! - **Identity resolution**: people across sources collapse into person
//!   nodes by shared email or fuzzy name match between sources
//! - **Keyword graph**: component keywords that co-occur within issues
//! - **Classification**: rule-based triage category per issue
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use triage::{consolidate, RawRecord, SourceReference};
//!
//! let now = Utc::now();
//! let records = vec![
//!     RawRecord::new(SourceReference::new("jira", "AUTH-1"), "Login broken", now),
//!     RawRecord::new(SourceReference::new("slack", "C1:42"), "see AUTH-1", now),
//! ];
//! let issues = consolidate(&records);
//! assert_eq!(issues.len(), 1);
//! assert_eq!(issues[0].references.len(), 2);
//! ```

pub mod analyze;
pub mod classify;
pub mod consolidate;
pub mod gather;
pub mod keywords;
pub mod people;
mod record;
mod union_find;

pub use analyze::{analyze, AnalysisMetadata, AnalyzeError, AnalyzedData, IssueAnalysis};
pub use classify::{Classification, Classifier, ClassifierRules};
pub use consolidate::{consolidate, extract_references};
pub use gather::{gather, Connector, ConnectorRegistry, GatherConfig, GatherError};
pub use keywords::{build_keyword_graph, extract_keywords, KeywordEdge, KeywordGraph, KeywordNode};
pub use people::{resolve_identities, GraphEdge, Identity, PeopleGraph, PersonNode, PersonNodeId};
pub use record::{
    parse_records, ConsolidatedIssue, GatherMetadata, GatheredData, IssueId, Message, Person, PersonKey,
    RawRecord, RecordError, RecordResult, Role, SourceReference,
};
pub use union_find::UnionFind;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
