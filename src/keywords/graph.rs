//! Keyword co-occurrence graph
//!
//! Nodes count the issues mentioning a keyword; undirected edges count the
//! issues in which both keywords of a pair appear. Output order follows
//! first appearance in the input, so a fixed input order always produces
//! the same graph.
//!
//! Edges are listed per keyword in node order: each keyword emits its edges
//! to keywords that come after it, in the order those edges first appeared.
//! `from` is therefore always the keyword seen first.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A keyword and the number of issues that carry it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordNode {
    pub id: String,
    pub issue_count: usize,
}

/// Undirected co-occurrence between two keywords; `from` was seen before `to`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordEdge {
    pub from: String,
    pub to: String,
    pub co_occurrence: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordGraph {
    pub nodes: Vec<KeywordNode>,
    pub edges: Vec<KeywordEdge>,
}

impl KeywordGraph {
    pub fn node(&self, keyword: &str) -> Option<&KeywordNode> {
        self.nodes.iter().find(|n| n.id == keyword)
    }

    /// Co-occurrence count for a pair, in either order
    pub fn co_occurrence(&self, a: &str, b: &str) -> usize {
        self.edges
            .iter()
            .find(|e| (e.from == a && e.to == b) || (e.from == b && e.to == a))
            .map(|e| e.co_occurrence)
            .unwrap_or(0)
    }

    /// Number of distinct co-occurring partners of a keyword
    pub fn degree(&self, keyword: &str) -> usize {
        self.edges
            .iter()
            .filter(|e| e.from == keyword || e.to == keyword)
            .count()
    }
}

/// Build the co-occurrence graph from one keyword list per issue.
///
/// Repeated keywords within one issue count once. An issue with k distinct
/// keywords adds k*(k-1)/2 edge increments; with fewer than two it only
/// bumps node counts.
pub fn build_keyword_graph<S: AsRef<str>>(per_issue_keywords: &[Vec<S>]) -> KeywordGraph {
    let mut node_index: HashMap<String, usize> = HashMap::new();
    let mut nodes: Vec<KeywordNode> = Vec::new();
    // per node, partners in the order their edge first appeared
    let mut adjacency: Vec<Vec<usize>> = Vec::new();
    // keyed by (lower, higher) node index
    let mut counts: HashMap<(usize, usize), usize> = HashMap::new();

    for keywords in per_issue_keywords {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut ids: Vec<usize> = Vec::new();
        for keyword in keywords.iter().map(|k| k.as_ref()) {
            if !seen.insert(keyword) {
                continue;
            }
            let id = match node_index.get(keyword).copied() {
                Some(i) => {
                    nodes[i].issue_count += 1;
                    i
                }
                None => {
                    let i = nodes.len();
                    node_index.insert(keyword.to_string(), i);
                    nodes.push(KeywordNode {
                        id: keyword.to_string(),
                        issue_count: 1,
                    });
                    adjacency.push(Vec::new());
                    i
                }
            };
            ids.push(id);
        }

        for (i, &a) in ids.iter().enumerate() {
            for &b in &ids[i + 1..] {
                let count = counts.entry((a.min(b), a.max(b))).or_insert(0);
                if *count == 0 {
                    adjacency[a].push(b);
                    adjacency[b].push(a);
                }
                *count += 1;
            }
        }
    }

    let mut edges = Vec::with_capacity(counts.len());
    for (from, partners) in adjacency.iter().enumerate() {
        for &to in partners.iter().filter(|&&to| to > from) {
            edges.push(KeywordEdge {
                from: nodes[from].id.clone(),
                to: nodes[to].id.clone(),
                co_occurrence: counts.get(&(from, to)).copied().unwrap_or(0),
            });
        }
    }

    KeywordGraph { nodes, edges }
}
