//! People graph types: resolved person nodes and person → issue edges

use crate::record::{IssueId, PersonKey, Role, ID_NAMESPACE};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a resolved person
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonNodeId(String);

impl PersonNodeId {
    /// Derive the id from the node's first identity key
    pub fn derive(first: &PersonKey) -> Self {
        Self(Uuid::new_v5(&ID_NAMESPACE, format!("person:{}", first).as_bytes()).to_string())
    }

    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PersonNodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One `(source, source_id)` appearance of a person
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub source: String,
    pub source_id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl Identity {
    pub fn key(&self) -> PersonKey {
        PersonKey::new(&self.source, &self.source_id)
    }
}

/// A real person as best we can tell, aggregating identities across sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonNode {
    pub id: PersonNodeId,
    pub label: String,
    /// Unique by `(source, source_id)`, first-seen order
    pub identities: Vec<Identity>,
}

impl PersonNode {
    pub fn has_identity(&self, key: &PersonKey) -> bool {
        self.identities.iter().any(|i| &i.key() == key)
    }

    /// Distinct source systems this person was seen in
    pub fn sources(&self) -> Vec<&str> {
        let mut sources: Vec<&str> = Vec::new();
        for identity in &self.identities {
            if !sources.contains(&identity.source.as_str()) {
                sources.push(&identity.source);
            }
        }
        sources
    }
}

/// Person → issue edge.
///
/// Serialized as `from`/`to` so it does not collide with the "source
/// system" field used everywhere else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    #[serde(rename = "from")]
    pub from: PersonNodeId,
    #[serde(rename = "to")]
    pub to: IssueId,
    pub role: Option<Role>,
    pub relation: Option<String>,
    pub confidence: Option<f64>,
}

impl GraphEdge {
    pub fn new(from: PersonNodeId, to: IssueId, role: Role) -> Self {
        Self {
            from,
            to,
            role: Some(role),
            relation: None,
            confidence: None,
        }
    }
}

/// Resolved people and the issues they took part in
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeopleGraph {
    pub nodes: Vec<PersonNode>,
    pub edges: Vec<GraphEdge>,
}

impl PeopleGraph {
    pub fn node(&self, id: &PersonNodeId) -> Option<&PersonNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// Node holding the given raw identity
    pub fn node_for(&self, key: &PersonKey) -> Option<&PersonNode> {
        self.nodes.iter().find(|n| n.has_identity(key))
    }

    /// Edges leaving a person node
    pub fn edges_from<'a>(&'a self, id: &'a PersonNodeId) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges.iter().filter(move |e| &e.from == id)
    }
}
