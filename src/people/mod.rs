//! Identity resolution and the people graph

mod identity;
mod resolve;
mod similarity;

pub use identity::{GraphEdge, Identity, PeopleGraph, PersonNode, PersonNodeId};
pub use resolve::{resolve_identities, IdentityMap, PeopleSource};
pub use similarity::{name_similarity, names_match, NAME_MATCH_THRESHOLD};
