//! Shared fixtures for triage integration tests
//!
//! Builders for raw records and people, plus helpers that lay out a
//! snapshot-based source configuration in a temp directory.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use std::path::{Path, PathBuf};
use triage::{Message, Person, RawRecord, Role, SourceReference};

/// 2026-03-02 at the given hour and minute, UTC
pub fn ts(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, hour, minute, 0)
        .single()
        .expect("valid fixture timestamp")
}

/// A record whose raw text is exactly `text`
pub fn record(source: &str, id: &str, text: &str) -> RawRecord {
    RawRecord::new(SourceReference::new(source, id), text, ts(9, 0))
}

pub fn person(source: &str, source_id: &str, name: &str) -> Person {
    Person::new(source, source_id, name)
}

pub fn message(source: &str, author: &Person, at: DateTime<Utc>, content: &str) -> Message {
    Message::new(source, author.name.clone(), author.source_id.clone(), at, content)
}

/// A week of support traffic across three systems.
///
/// - jira AUTH-1234 is the tracked bug; slack thread C1:100 and the
///   earlier zendesk ticket 20001 both point at it
/// - jira PLAT-77 stands alone
/// - slack thread C2:500 mentions PLAT-9999, which was never fetched
pub fn support_week() -> Vec<RawRecord> {
    let alice_jira = person("jira", "u-alice", "Alice M Johnson")
        .with_email("Alice@Example.COM")
        .with_role(Role::Reporter);
    let bob_jira = person("jira", "u-bob", "Bob Stone").with_role(Role::Assignee);
    let alice_slack = person("slack", "U01", "Alice Johnson");
    let carol_zendesk = person("zendesk", "z-9", "Carol Diaz").with_email("carol@customer.io");
    let alice_zendesk = person("zendesk", "z-1", "A. Johnson")
        .with_email("alice@example.com")
        .with_role(Role::Assignee);
    let dan_slack = person("slack", "U02", "Dan Wu");

    vec![
        RawRecord::new(
            SourceReference::new("jira", "AUTH-1234").with_url("https://jira.example.com/browse/AUTH-1234"),
            "Login fails with 502 from auth-gateway",
            ts(9, 0),
        )
        .with_updated_at(ts(15, 0))
        .with_person(alice_jira.clone())
        .with_person(bob_jira.clone())
        .with_message(message("jira", &alice_jira, ts(9, 5), "auth-gateway returns 502 for SSO users"))
        .with_message(message("jira", &bob_jira, ts(11, 30), "Rolled back session-cache config")),
        RawRecord::new(SourceReference::new("slack", "C1:100"), "login outage?", ts(10, 0))
            .with_person(alice_slack.clone())
            .with_message(message("slack", &alice_slack, ts(10, 0), "Tracking in AUTH-1234, auth-gateway is down")),
        RawRecord::new(SourceReference::new("zendesk", "20001"), "Cannot sign in", ts(8, 0))
            .with_person(carol_zendesk.clone())
            .with_person(alice_zendesk.clone())
            .with_message(message("zendesk", &carol_zendesk, ts(8, 0), "None of our users can sign in"))
            .with_message(message("zendesk", &alice_zendesk, ts(12, 0), "Engineering is on it, see AUTH-1234")),
        RawRecord::new(SourceReference::new("jira", "PLAT-77"), "Add export option to billing-api", ts(13, 0))
            .with_person(bob_jira.clone())
            .with_message(message("jira", &bob_jira, ts(13, 0), "It would be nice to export invoices from billing-api")),
        RawRecord::new(SourceReference::new("slack", "C2:500"), "PLAT-9999 again", ts(14, 0))
            .with_person(dan_slack.clone())
            .with_message(message("slack", &dan_slack, ts(14, 0), "Anyone seen PLAT-9999 before?")),
    ]
}

/// Write records as a snapshot file and return its path
pub fn write_snapshot(dir: &Path, file: &str, records: &[RawRecord]) -> PathBuf {
    let path = dir.join(file);
    let json = serde_json::to_string_pretty(records).expect("serialize snapshot");
    std::fs::write(&path, json).expect("write snapshot");
    path
}

/// Split records by source into snapshot files and write a config using them
pub fn write_snapshot_config(dir: &Path, records: &[RawRecord]) -> PathBuf {
    let mut sources: Vec<String> = Vec::new();
    for record in records {
        if !sources.contains(&record.reference.source) {
            sources.push(record.reference.source.clone());
        }
    }

    let mut yaml = String::from("output: data/gathered.json\nsources:\n");
    for source in &sources {
        let of_source: Vec<RawRecord> = records
            .iter()
            .filter(|r| &r.reference.source == source)
            .cloned()
            .collect();
        let file = format!("{}.json", source);
        write_snapshot(dir, &file, &of_source);
        yaml.push_str(&format!(
            "  support-{source}:\n    type: snapshot\n    filters:\n      path: {file}\n"
        ));
    }

    let config = dir.join("sources.yaml");
    std::fs::write(&config, yaml).expect("write config");
    config
}
