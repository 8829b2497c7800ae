//! Consolidation: cluster raw records by cross-reference and merge each cluster
//!
//! Records are linked when one record's text mentions another record's own
//! `reference.id`. Ids are source-local, so an id shared by records of two
//! sources links them too. Two records that both mention a third id that
//! belongs to no fetched record are *not* linked through it.
//!
//! People appearing in several records are not a link signal here; email
//! overlap only matters for identity resolution.

use super::references::extract_references;
use crate::record::{ConsolidatedIssue, IssueId, PersonKey, RawRecord};
use crate::union_find::UnionFind;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Group raw records that reference each other into consolidated issues.
///
/// Total over any input: every record lands in exactly one issue, and an
/// unreferenced record survives as a singleton. Issues are ordered by the
/// input position of their first record.
pub fn consolidate(raw_records: &[RawRecord]) -> Vec<ConsolidatedIssue> {
    let groups = cluster_records(raw_records);

    let merged_count = groups.iter().filter(|g| g.len() > 1).count();
    info!(
        groups = groups.len(),
        merged = merged_count,
        standalone = groups.len() - merged_count,
        raw = raw_records.len(),
        "consolidated raw records"
    );

    let mut issued: HashSet<IssueId> = HashSet::new();
    groups
        .into_iter()
        .enumerate()
        .filter_map(|(ordinal, indices)| {
            let members: Vec<&RawRecord> = indices.iter().map(|&i| &raw_records[i]).collect();
            let mut issue = merge_records(&members)?;
            // Duplicate fetches of one record can produce two identical groups
            if !issued.insert(issue.id.clone()) {
                issue.id = IssueId::derive(&format!("{}#{}", issue.id, ordinal));
                issued.insert(issue.id.clone());
            }
            Some(issue)
        })
        .collect()
}

/// Cluster record indices by mutual reference.
///
/// Returns groups ordered by first member, members in input order.
pub fn cluster_records(raw_records: &[RawRecord]) -> Vec<Vec<usize>> {
    let mut by_reference_id: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, record) in raw_records.iter().enumerate() {
        by_reference_id
            .entry(record.reference.id.as_str())
            .or_default()
            .push(i);
    }

    let mut uf = UnionFind::from_keys(0..raw_records.len());

    for (i, record) in raw_records.iter().enumerate() {
        let mentioned = extract_references(&record.raw_text);
        if !mentioned.is_empty() {
            debug!(record = %record.reference.key(), references = ?mentioned, "found references");
        }
        for ref_id in &mentioned {
            let Some(targets) = by_reference_id.get(ref_id.as_str()) else {
                continue;
            };
            for &j in targets {
                if i != j {
                    debug!(
                        from = %record.reference.key(),
                        to = %raw_records[j].reference.key(),
                        via = %ref_id,
                        "linking records"
                    );
                    uf.union(&i, &j);
                }
            }
        }
    }

    uf.groups()
}

/// Merge one cluster into a consolidated issue.
///
/// Members are sorted by `created_at` (stable); the earliest supplies title,
/// status and creation time. People are deduplicated by `(source, source_id)`
/// keeping the first occurrence, and messages are sorted by timestamp.
/// Returns `None` for an empty cluster.
pub fn merge_records(records: &[&RawRecord]) -> Option<ConsolidatedIssue> {
    let mut sorted: Vec<&RawRecord> = records.to_vec();
    sorted.sort_by_key(|r| r.created_at);
    let primary = *sorted.first()?;

    let references: Vec<_> = sorted.iter().map(|r| r.reference.clone()).collect();

    let mut seen_people: HashSet<PersonKey> = HashSet::new();
    let mut people = Vec::new();
    for record in &sorted {
        for person in &record.people {
            if seen_people.insert(person.key()) {
                people.push(person.clone());
            }
        }
    }

    let mut conversation: Vec<_> = sorted
        .iter()
        .flat_map(|r| r.conversation.iter().cloned())
        .collect();
    conversation.sort_by_key(|m| m.timestamp);

    let id_name = references
        .iter()
        .map(|r| r.key())
        .collect::<Vec<_>>()
        .join("|");

    Some(ConsolidatedIssue {
        id: IssueId::derive(&id_name),
        title: primary.title.clone(),
        status: primary.status.clone(),
        created_at: primary.created_at,
        updated_at: sorted
            .iter()
            .map(|r| r.updated_at)
            .max()
            .unwrap_or(primary.updated_at),
        references,
        people,
        conversation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Message, Person, SourceReference};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, day, hour, 0, 0).unwrap()
    }

    fn record(source: &str, id: &str, raw_text: &str) -> RawRecord {
        RawRecord::new(SourceReference::new(source, id), format!("Ticket {}", id), at(1, 0))
            .with_updated_at(at(2, 0))
            .with_raw_text(raw_text)
    }

    #[test]
    fn test_single_record_unchanged() {
        let issues = consolidate(&[record("jira", "AUTH-100", "")]);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].title, "Ticket AUTH-100");
        assert_eq!(issues[0].references.len(), 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(consolidate(&[]).is_empty());
    }

    #[test]
    fn test_cross_referenced_records_merge() {
        let jira = record("jira", "AUTH-100", "Auth is broken");
        let slack = record("slack", "1700000000.1", "Users can't log in, see AUTH-100");
        let issues = consolidate(&[jira, slack]);
        assert_eq!(issues.len(), 1);
        let sources: Vec<_> = issues[0].references.iter().map(|r| r.source.as_str()).collect();
        assert!(sources.contains(&"jira"));
        assert!(sources.contains(&"slack"));
    }

    #[test]
    fn test_unrelated_records_stay_separate() {
        let issues = consolidate(&[
            record("jira", "AUTH-100", "Auth bug"),
            record("github", "4242", "Unrelated CSS issue"),
        ]);
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.references.len() == 1));
    }

    #[test]
    fn test_transitive_merge_any_order() {
        let a = record("jira", "AUTH-1", "dup of PLAT-2");
        let b = record("jira", "PLAT-2", "caused by OPS-3");
        let c = record("jira", "OPS-3", "nothing here");

        for order in [
            vec![a.clone(), b.clone(), c.clone()],
            vec![c.clone(), b.clone(), a.clone()],
            vec![b.clone(), c.clone(), a.clone()],
        ] {
            let issues = consolidate(&order);
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].references.len(), 3);
        }
    }

    #[test]
    fn test_shared_unknown_reference_does_not_link() {
        let issues = consolidate(&[
            record("jira", "AUTH-1", "see OPS-999"),
            record("slack", "t1", "also OPS-999"),
        ]);
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn test_hash_reference_links_numeric_id() {
        let issues = consolidate(&[
            record("github", "12345", "crash on save"),
            record("slack", "t1", "tracked in #12345"),
        ]);
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn test_shared_email_does_not_link() {
        let alice = Person::new("jira", "u1", "Alice").with_email("alice@example.com");
        let alice_gh = Person::new("github", "9", "Alice").with_email("alice@example.com");
        let issues = consolidate(&[
            record("jira", "AUTH-1", "").with_person(alice),
            record("github", "5555", "").with_person(alice_gh),
        ]);
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn test_earliest_record_is_primary() {
        let late = RawRecord::new(SourceReference::new("slack", "t1"), "Slack thread", at(5, 0))
            .with_status("resolved")
            .with_updated_at(at(9, 0))
            .with_raw_text("see AUTH-1");
        let early = RawRecord::new(SourceReference::new("jira", "AUTH-1"), "Login fails", at(1, 0))
            .with_updated_at(at(3, 0));

        let issues = consolidate(&[late, early]);
        assert_eq!(issues.len(), 1);
        let issue = &issues[0];
        assert_eq!(issue.title, "Login fails");
        assert_eq!(issue.status, "open");
        assert_eq!(issue.created_at, at(1, 0));
        assert_eq!(issue.updated_at, at(9, 0));
        assert_eq!(issue.references[0].source, "jira");
    }

    #[test]
    fn test_conversation_merged_chronologically() {
        let a = record("jira", "AUTH-1", "").with_message(Message::new(
            "jira", "Alice", "u1", at(1, 10), "ten o'clock",
        ));
        let b = record("slack", "t1", "re AUTH-1").with_message(Message::new(
            "slack", "Bob", "U2", at(1, 9), "nine o'clock",
        ));
        let issues = consolidate(&[a, b]);
        assert_eq!(issues.len(), 1);
        let contents: Vec<_> = issues[0].conversation.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["nine o'clock", "ten o'clock"]);
    }

    #[test]
    fn test_people_deduplicated_across_merge() {
        let alice = Person::new("jira", "u1", "Alice");
        let a = record("jira", "AUTH-1", "").with_person(alice.clone());
        let b = record("slack", "t1", "AUTH-1")
            .with_person(alice)
            .with_person(Person::new("slack", "U2", "Bob"));
        let issues = consolidate(&[a, b]);
        assert_eq!(issues.len(), 1);
        let jira_u1 = issues[0]
            .people
            .iter()
            .filter(|p| p.source == "jira" && p.source_id == "u1")
            .count();
        assert_eq!(jira_u1, 1);
        assert_eq!(issues[0].people.len(), 2);
    }

    #[test]
    fn test_ids_are_unique_and_repeatable() {
        let input = vec![
            record("jira", "AUTH-1", ""),
            record("github", "1234", ""),
            record("slack", "t1", "AUTH-1"),
        ];
        let first = consolidate(&input);
        let second = consolidate(&input);
        assert_eq!(first, second);
        let ids: HashSet<_> = first.iter().map(|i| i.id.clone()).collect();
        assert_eq!(ids.len(), first.len());
    }

    #[test]
    fn test_duplicate_fetch_gets_distinct_ids() {
        let input = vec![record("jira", "AUTH-1", ""), record("jira", "AUTH-1", "")];
        let issues = consolidate(&input);
        assert_eq!(issues.len(), 2);
        assert_ne!(issues[0].id, issues[1].id);
    }

    #[test]
    fn test_cluster_records_groups_in_input_order() {
        let input = vec![
            record("jira", "AB-1", ""),
            record("jira", "BC-2", ""),
            record("slack", "t", "AB-1"),
        ];
        assert_eq!(cluster_records(&input), vec![vec![0, 2], vec![1]]);
    }
}
