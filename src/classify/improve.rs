//! Classification review and learning from manual corrections
//!
//! [`quality_report`] summarizes a classified run: issues per category,
//! low-confidence classifications and the keywords seen per category.
//! A [`Correction`] records the right category for one issue together with
//! words learned from its text; [`apply_corrections`] folds corrections into
//! a custom rules overlay so the next run classifies them directly and
//! scores similar issues higher.

use super::rules::{CategoryRule, RulesOverlay, RulesResult};
use crate::analyze::IssueAnalysis;
use crate::record::{ConsolidatedIssue, IssueId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info};

/// Classifications below this confidence are flagged for review
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.5;

/// Weight given to a category rule created from corrections
pub const LEARNED_WEIGHT: f64 = 1.5;

/// Most keywords learned from one issue, and added per category per apply
pub const MAX_LEARNED_KEYWORDS: usize = 5;

const SUGGESTIONS_PER_CATEGORY: usize = 5;
const SUMMARY_PREVIEW_CHARS: usize = 60;
/// Most frequent words considered before stop words are dropped
const LEARN_CANDIDATES: usize = 20;
const LEARN_MIN_COUNT: usize = 2;

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "that", "this", "with", "from", "have", "are", "was", "been", "will", "can", "has",
    "but", "not", "you", "all", "were", "when", "there", "what", "which", "their", "said", "each", "she",
    "how", "may", "other", "than", "then", "now", "only", "could", "our", "also",
];

/// A classification worth a second look
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LowConfidence {
    pub id: IssueId,
    #[serde(rename = "type")]
    pub category: String,
    pub confidence: f64,
    /// Leading characters of the classification summary
    pub summary: String,
}

/// Summary of one classified run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub issue_count: usize,
    /// Category → issues classified as it
    pub by_type: BTreeMap<String, Vec<IssueId>>,
    /// In issue order
    pub low_confidence: Vec<LowConfidence>,
    /// Category → keyword → number of issues
    pub keyword_by_type: BTreeMap<String, BTreeMap<String, usize>>,
    /// Category → its most frequent keywords, most frequent first
    pub suggestions: BTreeMap<String, Vec<String>>,
}

/// Review classifications; those under `confidence_threshold` are flagged
pub fn quality_report(issues: &[IssueAnalysis], confidence_threshold: f64) -> QualityReport {
    let mut report = QualityReport {
        issue_count: issues.len(),
        ..Default::default()
    };
    // keyword counts in first-seen order, so equal counts keep that order
    let mut ranked: BTreeMap<&str, Vec<(&str, usize)>> = BTreeMap::new();

    for issue in issues {
        let classification = &issue.classification;
        let category = classification.category.as_str();
        report
            .by_type
            .entry(category.to_string())
            .or_default()
            .push(issue.id.clone());

        if classification.confidence < confidence_threshold {
            report.low_confidence.push(LowConfidence {
                id: issue.id.clone(),
                category: category.to_string(),
                confidence: classification.confidence,
                summary: classification.summary.chars().take(SUMMARY_PREVIEW_CHARS).collect(),
            });
        }

        let counts = ranked.entry(category).or_default();
        for keyword in &classification.keywords {
            match counts.iter().position(|(k, _)| *k == keyword.as_str()) {
                Some(i) => counts[i].1 += 1,
                None => counts.push((keyword.as_str(), 1)),
            }
        }
    }

    for (category, mut counts) in ranked {
        if counts.is_empty() {
            continue;
        }
        report.keyword_by_type.insert(
            category.to_string(),
            counts.iter().map(|(k, n)| (k.to_string(), *n)).collect(),
        );
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        report.suggestions.insert(
            category.to_string(),
            counts
                .iter()
                .take(SUGGESTIONS_PER_CATEGORY)
                .map(|(k, _)| k.to_string())
                .collect(),
        );
    }

    debug!(
        issues = report.issue_count,
        low_confidence = report.low_confidence.len(),
        "reviewed classifications"
    );
    report
}

/// Words that recur in an issue's title and conversation.
///
/// Words are runs of at least three ASCII letters in the lower-cased text.
/// Of the most frequent words, stop words and words seen once are dropped.
pub fn learn_keywords(issue: &ConsolidatedIssue) -> Vec<String> {
    let text = format!("{}\n{}", issue.title, issue.conversation_text()).to_lowercase();

    let mut counts: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for word in text
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| w.len() >= 3 && w.bytes().all(|b| b.is_ascii_lowercase()))
    {
        match index.get(word).copied() {
            Some(i) => counts[i].1 += 1,
            None => {
                index.insert(word, counts.len());
                counts.push((word, 1));
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    counts
        .into_iter()
        .take(LEARN_CANDIDATES)
        .filter(|(word, count)| *count >= LEARN_MIN_COUNT && !STOP_WORDS.contains(word))
        .take(MAX_LEARNED_KEYWORDS)
        .map(|(word, _)| word.to_string())
        .collect()
}

/// The right category for an issue and the words learned from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub issue_id: IssueId,
    #[serde(rename = "correct_type")]
    pub category: String,
    #[serde(default)]
    pub learned_keywords: Vec<String>,
}

impl Correction {
    /// Correct `issue` to `category`, learning keywords from its text
    pub fn learn(issue: &ConsolidatedIssue, category: impl Into<String>) -> Self {
        Self {
            issue_id: issue.id.clone(),
            category: category.into(),
            learned_keywords: learn_keywords(issue),
        }
    }
}

/// Fold corrections into an overlay.
///
/// Learned keywords land in the overrides, or in `context`'s rules when
/// given. A category rule created here gets [`LEARNED_WEIGHT`]; an existing
/// rule keeps its weight. At most [`MAX_LEARNED_KEYWORDS`] new keywords are
/// added per category. Every correction is also recorded by issue id.
pub fn merge_corrections(overlay: &mut RulesOverlay, corrections: &[Correction], context: Option<&str>) {
    let mut learned: Vec<(&str, Vec<&str>)> = Vec::new();
    for correction in corrections {
        let keywords = correction.learned_keywords.iter().map(String::as_str);
        match learned.iter().position(|(c, _)| *c == correction.category) {
            Some(i) => learned[i].1.extend(keywords),
            None => learned.push((correction.category.as_str(), keywords.collect())),
        }
    }

    let rules = match context {
        Some(context) => overlay.contexts.entry(context.to_string()).or_default(),
        None => &mut overlay.overrides,
    };
    for (category, keywords) in learned {
        let rule = rules.entry(category.to_string()).or_insert_with(|| CategoryRule {
            keywords: Vec::new(),
            weight: Some(LEARNED_WEIGHT),
        });
        let mut added = 0;
        for keyword in keywords {
            if added == MAX_LEARNED_KEYWORDS {
                break;
            }
            if !rule.keywords.iter().any(|k| k == keyword) {
                rule.keywords.push(keyword.to_string());
                added += 1;
            }
        }
    }

    for correction in corrections {
        overlay
            .corrections
            .insert(correction.issue_id.to_string(), correction.category.clone());
    }
}

/// Merge corrections into the overlay file at `overlay_path`, creating it
/// when missing
pub fn apply_corrections(
    corrections: &[Correction],
    overlay_path: impl AsRef<Path>,
    context: Option<&str>,
) -> RulesResult<()> {
    let overlay_path = overlay_path.as_ref();
    let mut overlay = RulesOverlay::load_or_default(overlay_path)?;
    merge_corrections(&mut overlay, corrections, context);
    overlay.save(overlay_path)?;
    info!(
        path = %overlay_path.display(),
        corrections = corrections.len(),
        context = context.unwrap_or("global"),
        "applied corrections"
    );
    Ok(())
}
