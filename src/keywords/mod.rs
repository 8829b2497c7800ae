//! Keyword extraction and the keyword co-occurrence graph

mod extract;
mod graph;

pub use extract::extract_keywords;
pub use graph::{build_keyword_graph, KeywordEdge, KeywordGraph, KeywordNode};
