//! Cross-reference extraction from free text
//!
//! Two patterns count as an issue reference:
//! - project-key style `AUTH-1234` (whole word)
//! - numeric hash style `#12345`, four or more digits only; `#12` and
//!   `#123` produce too many false positives
//!
//! Extracted ids are returned verbatim. No case folding is applied. Word
//! boundaries are Unicode-aware, so a key glued to a letter like `é` does not
//! count.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;
use tracing::error;

const REFERENCE_PATTERNS: &[&str] = &[r"\b([A-Z][A-Z0-9]+-[0-9]+)\b", r"#([0-9]{4,})\b"];

fn reference_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        REFERENCE_PATTERNS
            .iter()
            .filter_map(|p| match Regex::new(p) {
                Ok(re) => Some(re),
                Err(e) => {
                    error!(pattern = *p, error = %e, "invalid reference pattern");
                    None
                }
            })
            .collect()
    })
}

/// Extract every issue id mentioned in `text`
pub fn extract_references(text: &str) -> BTreeSet<String> {
    let mut refs = BTreeSet::new();
    for pattern in reference_patterns() {
        for caps in pattern.captures_iter(text) {
            if let Some(m) = caps.get(1) {
                refs.insert(m.as_str().to_string());
            }
        }
    }
    refs
}
