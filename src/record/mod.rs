//! Record model: what connectors produce and what consolidation emits

mod issue;
mod model;

pub use issue::{ConsolidatedIssue, GatherMetadata, GatheredData, IssueId};
pub use model::{
    parse_records, Message, Person, PersonKey, RawRecord, RecordError, RecordResult, Role,
    SourceReference,
};

pub(crate) use issue::ID_NAMESPACE;
