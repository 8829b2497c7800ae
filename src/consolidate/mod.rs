//! Consolidation of raw records into logical issues

mod engine;
mod references;

pub use engine::{cluster_records, consolidate, merge_records};
pub use references::extract_references;
