//! Component keyword extraction from issue text
//!
//! Matches infrastructure-style names (`auth-service`, `billing-api`,
//! `user-db`, ...) and any caller-supplied known keyword.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

const COMPONENT_SUFFIXES: &[&str] = &["service", "api", "gateway", "worker", "queue", "db", "cache"];

/// Generic phrases that look like components but never are
const STOP_KEYWORDS: &[&str] = &[
    "the-service",
    "a-service",
    "this-service",
    "our-service",
    "my-service",
    "your-service",
    "customer-service",
];

fn component_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        let pattern = format!(r"(?i)\b(\w+-(?:{}))\b", COMPONENT_SUFFIXES.join("|"));
        Regex::new(&pattern).ok()
    })
    .as_ref()
}

/// Extract component keywords, lower-cased, sorted and deduplicated
pub fn extract_keywords<S: AsRef<str>>(text: &str, known_keywords: &[S]) -> Vec<String> {
    let mut keywords: BTreeSet<String> = BTreeSet::new();

    if let Some(re) = component_pattern() {
        for caps in re.captures_iter(text) {
            if let Some(m) = caps.get(1) {
                let name = m.as_str().to_lowercase();
                if !STOP_KEYWORDS.contains(&name.as_str()) {
                    keywords.insert(name);
                }
            }
        }
    }

    let text_lower = text.to_lowercase();
    for known in known_keywords {
        let known = known.as_ref().to_lowercase();
        if !known.is_empty() && text_lower.contains(&known) {
            keywords.insert(known);
        }
    }

    keywords.into_iter().collect()
}
