//! Identity resolution: cluster raw people across sources into person nodes
//!
//! Two signals link raw identities:
//! - exact email match, case-insensitive, regardless of source
//! - fuzzy display-name match between *different* sources; two people of
//!   one source sharing a name is common and says nothing
//!
//! Name matching compares every pair of distinct lower-cased name groups,
//! which is quadratic in the number of distinct names. Inputs are bounded
//! by one pipeline run.

use super::identity::{GraphEdge, Identity, PeopleGraph, PersonNode, PersonNodeId};
use super::similarity::names_match;
use crate::record::{ConsolidatedIssue, IssueId, Person, PersonKey, RawRecord};
use crate::union_find::UnionFind;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Anything that carries people and can be the target of a person edge
pub trait PeopleSource {
    /// Id that person edges point to
    fn record_id(&self) -> IssueId;

    fn people(&self) -> &[Person];
}

impl PeopleSource for ConsolidatedIssue {
    fn record_id(&self) -> IssueId {
        self.id.clone()
    }

    fn people(&self) -> &[Person] {
        &self.people
    }
}

impl PeopleSource for RawRecord {
    fn record_id(&self) -> IssueId {
        IssueId::from_string(self.reference.key())
    }

    fn people(&self) -> &[Person] {
        &self.people
    }
}

/// Raw identity → resolved person node
pub type IdentityMap = HashMap<PersonKey, PersonNodeId>;

/// Resolve people across sources and build the person → record graph.
///
/// Total over any input. Node order, labels and edge roles follow input
/// order: the first identity with an email names the node, and the first
/// role seen for a `(person, record)` pair wins.
pub fn resolve_identities<R: PeopleSource>(records: &[R]) -> (PeopleGraph, IdentityMap) {
    let raw_people: Vec<&Person> = records.iter().flat_map(|r| r.people().iter()).collect();

    let mut uf: UnionFind<PersonKey> = UnionFind::new();
    for person in &raw_people {
        uf.insert(person.key());
    }

    link_by_email(&raw_people, &mut uf);
    link_by_name(&raw_people, &mut uf);

    let (nodes, key_to_node) = build_nodes(&raw_people, &mut uf);
    let edges = build_edges(records, &key_to_node);

    info!(
        people = nodes.len(),
        identities = key_to_node.len(),
        edges = edges.len(),
        "resolved identities"
    );

    (PeopleGraph { nodes, edges }, key_to_node)
}

/// Union every identity sharing a non-empty email
fn link_by_email(raw_people: &[&Person], uf: &mut UnionFind<PersonKey>) {
    let mut by_email: HashMap<String, PersonKey> = HashMap::new();
    for person in raw_people {
        let Some(email) = person.email() else {
            continue;
        };
        let key = person.key();
        match by_email.get(&email.to_lowercase()) {
            Some(first) => uf.union(&key, first),
            None => {
                by_email.insert(email.to_lowercase(), key);
            }
        }
    }
}

/// Union identities from different sources whose names are similar enough
fn link_by_name(raw_people: &[&Person], uf: &mut UnionFind<PersonKey>) {
    let mut group_index: HashMap<String, usize> = HashMap::new();
    let mut name_groups: Vec<Vec<(PersonKey, &str)>> = Vec::new();

    for person in raw_people {
        if person.name.is_empty() {
            continue;
        }
        let slot = *group_index
            .entry(person.name.to_lowercase())
            .or_insert_with(|| {
                name_groups.push(Vec::new());
                name_groups.len() - 1
            });
        let key = person.key();
        if !name_groups[slot].iter().any(|(k, _)| k == &key) {
            name_groups[slot].push((key, person.name.as_str()));
        }
    }

    for (i, group_a) in name_groups.iter().enumerate() {
        for group_b in &name_groups[i + 1..] {
            for (key_a, name_a) in group_a {
                for (key_b, name_b) in group_b {
                    if key_a.source == key_b.source {
                        continue;
                    }
                    if names_match(name_a, name_b) {
                        debug!(a = %key_a, b = %key_b, "linking identities by name");
                        uf.union(key_a, key_b);
                    }
                }
            }
        }
    }
}

fn build_nodes(raw_people: &[&Person], uf: &mut UnionFind<PersonKey>) -> (Vec<PersonNode>, IdentityMap) {
    let groups = uf.groups();

    let mut group_of: HashMap<PersonKey, usize> = HashMap::new();
    for (g, keys) in groups.iter().enumerate() {
        for key in keys {
            group_of.insert(key.clone(), g);
        }
    }

    // Every occurrence, in input order, bucketed by group
    let mut members: Vec<Vec<&Person>> = vec![Vec::new(); groups.len()];
    for person in raw_people {
        if let Some(&g) = group_of.get(&person.key()) {
            members[g].push(person);
        }
    }

    let mut nodes = Vec::with_capacity(groups.len());
    let mut key_to_node = IdentityMap::new();

    for (keys, occurrences) in groups.iter().zip(&members) {
        let Some(first_key) = keys.first() else {
            continue;
        };
        let id = PersonNodeId::derive(first_key);

        let mut seen: HashSet<PersonKey> = HashSet::new();
        let mut identities = Vec::new();
        for person in occurrences {
            let key = person.key();
            if seen.insert(key.clone()) {
                identities.push(Identity {
                    source: person.source.clone(),
                    source_id: person.source_id.clone(),
                    email: person.email.clone(),
                    display_name: Some(person.name.clone()).filter(|n| !n.is_empty()),
                });
            }
            key_to_node.insert(key, id.clone());
        }

        nodes.push(PersonNode {
            id,
            label: pick_label(occurrences),
            identities,
        });
    }

    (nodes, key_to_node)
}

/// First occurrence with an email names the node, else the first occurrence
fn pick_label(occurrences: &[&Person]) -> String {
    occurrences
        .iter()
        .find(|p| p.email().is_some())
        .or_else(|| occurrences.first())
        .map(|p| p.name.clone())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "Unknown".to_string())
}

fn build_edges<R: PeopleSource>(records: &[R], key_to_node: &IdentityMap) -> Vec<GraphEdge> {
    let mut seen: HashSet<(PersonNodeId, IssueId)> = HashSet::new();
    let mut edges = Vec::new();

    for record in records {
        let record_id = record.record_id();
        for person in record.people() {
            let Some(node_id) = key_to_node.get(&person.key()) else {
                continue;
            };
            if seen.insert((node_id.clone(), record_id.clone())) {
                edges.push(GraphEdge::new(node_id.clone(), record_id.clone(), person.role));
            }
        }
    }

    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Role, SourceReference};
    use chrono::{TimeZone, Utc};

    struct Ticket {
        id: &'static str,
        people: Vec<Person>,
    }

    impl PeopleSource for Ticket {
        fn record_id(&self) -> IssueId {
            IssueId::from(self.id)
        }

        fn people(&self) -> &[Person] {
            &self.people
        }
    }

    fn ticket(id: &'static str, people: Vec<Person>) -> Ticket {
        Ticket { id, people }
    }

    #[test]
    fn test_single_person() {
        let tickets = vec![ticket(
            "ticket-1",
            vec![Person::new("github", "123", "Alice").with_email("alice@example.com")],
        )];
        let (graph, mapping) = resolve_identities(&tickets);
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes[0].label, "Alice");
        assert_eq!(graph.nodes[0].identities.len(), 1);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].role, Some(Role::Participant));
        assert_eq!(mapping[&PersonKey::new("github", "123")], graph.nodes[0].id);
    }

    #[test]
    fn test_same_email_merges_and_prefers_first_with_email() {
        let tickets = vec![
            ticket("ticket-1", vec![Person::new("github", "123", "Alice").with_email("alice@example.com")]),
            ticket("ticket-2", vec![Person::new("jira", "alice", "Alice Smith").with_email("alice@example.com")]),
        ];
        let (graph, _) = resolve_identities(&tickets);
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes[0].identities.len(), 2);
        assert_eq!(graph.nodes[0].label, "Alice");
        assert_eq!(graph.edges.len(), 2);
    }

    #[test]
    fn test_email_case_insensitive() {
        let tickets = vec![
            ticket("t1", vec![Person::new("github", "123", "Alice").with_email("Alice@Example.COM")]),
            ticket("t2", vec![Person::new("jira", "alice", "Alice").with_email("alice@example.com")]),
        ];
        let (graph, _) = resolve_identities(&tickets);
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes[0].identities.len(), 2);
    }

    #[test]
    fn test_same_email_same_source_merges() {
        let tickets = vec![ticket(
            "t1",
            vec![
                Person::new("jira", "a1", "A. One").with_email("a@x.io"),
                Person::new("jira", "a2", "Someone Else").with_email("a@x.io"),
            ],
        )];
        let (graph, _) = resolve_identities(&tickets);
        assert_eq!(graph.nodes.len(), 1);
        // Both identities collapse into one person, so only one edge
        assert_eq!(graph.edges.len(), 1);
    }

    #[test]
    fn test_fuzzy_name_across_sources() {
        let tickets = vec![
            ticket("t1", vec![Person::new("github", "123", "Alice M Johnson")]),
            ticket("t2", vec![Person::new("slack", "U456", "Alice Johnson")]),
        ];
        let (graph, _) = resolve_identities(&tickets);
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes[0].identities.len(), 2);
        assert_eq!(graph.nodes[0].label, "Alice M Johnson");
    }

    #[test]
    fn test_fuzzy_name_same_source_never_merges() {
        let tickets = vec![
            ticket("t1", vec![Person::new("github", "123", "Alice M Johnson")]),
            ticket("t2", vec![Person::new("github", "456", "Alice Johnson")]),
        ];
        let (graph, _) = resolve_identities(&tickets);
        assert_eq!(graph.nodes.len(), 2);
    }

    #[test]
    fn test_same_name_same_source_stays_separate() {
        let tickets = vec![
            ticket("t1", vec![Person::new("github", "123", "Alice")]),
            ticket("t2", vec![Person::new("github", "456", "Alice")]),
        ];
        let (graph, _) = resolve_identities(&tickets);
        assert_eq!(graph.nodes.len(), 2);
    }

    #[test]
    fn test_different_people_stay_separate() {
        let tickets = vec![
            ticket("t1", vec![Person::new("github", "123", "Alice").with_email("alice@example.com")]),
            ticket("t2", vec![Person::new("slack", "456", "Bob").with_email("bob@example.com")]),
        ];
        let (graph, _) = resolve_identities(&tickets);
        assert_eq!(graph.nodes.len(), 2);
        let labels: HashSet<_> = graph.nodes.iter().map(|n| n.label.as_str()).collect();
        assert_eq!(labels, HashSet::from(["Alice", "Bob"]));
    }

    #[test]
    fn test_roles_preserved_and_first_role_wins() {
        let tickets = vec![ticket(
            "t1",
            vec![
                Person::new("jira", "u1", "Alice").with_email("a@x.io").with_role(Role::Reporter),
                Person::new("slack", "U1", "Alice").with_email("A@X.IO").with_role(Role::Commenter),
            ],
        )];
        let (graph, _) = resolve_identities(&tickets);
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].role, Some(Role::Reporter));
    }

    #[test]
    fn test_repeated_identity_is_one_identity() {
        let alice = Person::new("jira", "u1", "Alice");
        let tickets = vec![
            ticket("t1", vec![alice.clone()]),
            ticket("t2", vec![alice.clone().with_role(Role::Assignee)]),
        ];
        let (graph, mapping) = resolve_identities(&tickets);
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes[0].identities.len(), 1);
        assert_eq!(graph.edges.len(), 2);
        assert_eq!(mapping.len(), 1);
    }

    #[test]
    fn test_label_falls_back_to_unknown() {
        let tickets = vec![ticket("t1", vec![Person::new("slack", "U9", "")])];
        let (graph, _) = resolve_identities(&tickets);
        assert_eq!(graph.nodes[0].label, "Unknown");
        assert_eq!(graph.nodes[0].identities[0].display_name, None);
    }

    #[test]
    fn test_empty_input() {
        let tickets: Vec<Ticket> = Vec::new();
        let (graph, mapping) = resolve_identities(&tickets);
        assert!(graph.nodes.is_empty());
        assert!(graph.edges.is_empty());
        assert!(mapping.is_empty());
    }

    #[test]
    fn test_every_identity_in_exactly_one_node() {
        let tickets = vec![
            ticket("t1", vec![Person::new("jira", "u1", "Carol Danvers"), Person::new("jira", "u2", "Dan")]),
            ticket("t2", vec![Person::new("slack", "U1", "Carol Danvers"), Person::new("github", "7", "Carol Danver")]),
        ];
        let (graph, mapping) = resolve_identities(&tickets);
        for key in mapping.keys() {
            let holders = graph.nodes.iter().filter(|n| n.has_identity(key)).count();
            assert_eq!(holders, 1, "{} held by {} nodes", key, holders);
        }
        let total: usize = graph.nodes.iter().map(|n| n.identities.len()).sum();
        assert_eq!(total, 4);
    }

    #[test]
    fn test_deterministic_for_fixed_order() {
        let tickets = vec![
            ticket("t1", vec![Person::new("jira", "u1", "Alice M Johnson"), Person::new("jira", "u2", "Bob")]),
            ticket("t2", vec![Person::new("slack", "U1", "Alice Johnson").with_email("alice@x.io")]),
        ];
        let (first, first_map) = resolve_identities(&tickets);
        let (second, second_map) = resolve_identities(&tickets);
        assert_eq!(first, second);
        assert_eq!(first_map, second_map);
    }

    #[test]
    fn test_raw_records_use_reference_key() {
        let when = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let records = vec![RawRecord::new(SourceReference::new("jira", "AUTH-1"), "t", when)
            .with_person(Person::new("jira", "u1", "Alice"))];
        let (graph, _) = resolve_identities(&records);
        assert_eq!(graph.edges[0].to.as_str(), "jira:AUTH-1");
    }
}
