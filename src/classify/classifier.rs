//! Weighted-keyword triage classifier
//!
//! Scores each category by summing the weight of every rule keyword found
//! in the issue text, then applies a few surface heuristics (modal verbs,
//! questions, negation). This is a best-effort heuristic, not a model.

use super::rules::{CategoryRule, ClassifierRules};
use crate::keywords::extract_keywords;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Categories in tie-break order
pub const CATEGORIES: &[&str] = &["outage", "defect", "enhancement", "inquiry", "routing_issue", "action"];

/// Identifier recorded in analysis metadata
pub const CLASSIFIER_NAME: &str = "rule_based_v1";

const MODALS: &[&str] = &[
    "would", "could", "should", "might", "may", "can", "cannot", "will", "must", "shall",
];
const NEGATIONS: &[&str] = &["not", "no", "never", "cannot", "nothing"];

/// Classification result for one issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    #[serde(rename = "type")]
    pub category: String,
    /// 0.0..=1.0
    pub confidence: f64,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub summary: String,
}

/// Surface features of the text that boost particular categories
#[derive(Debug, Clone, Default, PartialEq)]
struct TextFeatures {
    has_modal: bool,
    has_negation: bool,
    has_question: bool,
    tokens: HashSet<String>,
}

impl TextFeatures {
    fn extract(text: &str) -> Self {
        let tokens: HashSet<String> = text
            .split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '_'))
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase())
            .collect();

        let has_negation = tokens
            .iter()
            .any(|t| NEGATIONS.contains(&t.as_str()) || t.ends_with("n't"));
        let has_modal = tokens.iter().any(|t| {
            let stem: &str = match t.strip_suffix("n't") {
                Some("ca") => "can",
                Some("wo") => "will",
                Some(s) => s,
                None => t.as_str(),
            };
            MODALS.contains(&stem)
        });

        Self {
            has_modal,
            has_negation,
            has_question: text.contains('?'),
            tokens,
        }
    }
}

/// Rule-based classifier; rules are injected, never read from global state
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: ClassifierRules,
    known_keywords: Vec<String>,
}

impl Classifier {
    pub fn new(rules: ClassifierRules) -> Self {
        Self {
            rules,
            known_keywords: Vec::new(),
        }
    }

    /// Extra keyword names to look for besides component-style names
    pub fn with_known_keywords(mut self, keywords: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.known_keywords.extend(keywords.into_iter().map(Into::into));
        self
    }

    pub fn rules(&self) -> &ClassifierRules {
        &self.rules
    }

    /// Classify one issue.
    ///
    /// `issue_id` is checked against manual corrections; `context` selects
    /// context-specific rules (usually the issue's source system).
    pub fn classify(
        &self,
        title: &str,
        conversation_text: &str,
        issue_id: Option<&str>,
        context: Option<&str>,
    ) -> Classification {
        let full_text = format!("{}\n{}", title, conversation_text);
        let summary: String = title.chars().take(self.rules.config.summary_chars).collect();

        // Corrections carry no keywords; callers merge extracted ones in
        if let Some(corrected) = issue_id.and_then(|id| self.rules.corrections.get(id)) {
            return Classification {
                category: corrected.clone(),
                confidence: self.rules.config.correction_confidence,
                keywords: Vec::new(),
                summary,
            };
        }

        let keywords = self.keywords(&full_text);

        let scores = self.score(&full_text, context);
        let total: f64 = scores.iter().map(|(_, s)| s).sum();

        let best = scores
            .iter()
            .fold(None::<&(&str, f64)>, |best, entry| match best {
                Some(b) if b.1 >= entry.1 => Some(b),
                _ => Some(entry),
            });

        match best {
            Some(&(category, score)) if score > 0.0 && total > 0.0 => Classification {
                category: category.to_string(),
                confidence: round2((score / total).min(0.99)),
                keywords,
                summary,
            },
            _ => Classification {
                category: "inquiry".to_string(),
                confidence: self.rules.config.fallback_confidence,
                keywords,
                summary,
            },
        }
    }

    /// Per-category scores in [`CATEGORIES`] order
    fn score(&self, text: &str, context: Option<&str>) -> Vec<(&'static str, f64)> {
        let features = TextFeatures::extract(text);
        let text_lower = text.to_lowercase();

        let mut scores: Vec<(&'static str, f64)> = CATEGORIES
            .iter()
            .map(|&category| {
                let score = self
                    .merged_rule(category, context)
                    .map(|(keywords, weight)| {
                        keywords
                            .iter()
                            .filter(|kw| keyword_matches(kw, &text_lower, &features))
                            .count() as f64
                            * weight
                    })
                    .unwrap_or(0.0);
                (category, score)
            })
            .collect();

        let max = scores.iter().map(|(_, s)| *s).fold(0.0, f64::max);
        let routing = score_of(&scores, "routing_issue");

        if features.has_modal && max < 2.0 {
            add_score(&mut scores, "enhancement", 1.5);
        }
        if features.has_question {
            add_score(&mut scores, "inquiry", 2.0);
        }
        if features.has_negation && routing < 1.0 {
            add_score(&mut scores, "defect", 1.0);
        }

        scores
    }

    /// Base rule, then context rule (keywords appended, larger weight kept),
    /// then global override (keywords appended, weight replaced when set)
    fn merged_rule(&self, category: &str, context: Option<&str>) -> Option<(Vec<String>, f64)> {
        let base = self.rules.categories.get(category)?;
        let mut keywords = base.keywords.clone();
        let mut weight = base.weight_or_default();

        let context_rule: Option<&CategoryRule> = context
            .and_then(|c| self.rules.contexts.get(c))
            .and_then(|rules| rules.get(category));
        if let Some(rule) = context_rule {
            keywords.extend(rule.keywords.iter().cloned());
            weight = weight.max(rule.weight_or_default());
        }

        if let Some(rule) = self.rules.overrides.get(category) {
            keywords.extend(rule.keywords.iter().cloned());
            if let Some(w) = rule.weight {
                weight = w;
            }
        }

        Some((keywords, weight))
    }

    /// Component and known keywords of `text` with keyword overrides applied
    pub fn keywords(&self, text: &str) -> Vec<String> {
        let overrides = &self.rules.keyword_overrides;
        let mut keywords: BTreeSet<String> = extract_keywords(text, &self.known_keywords).into_iter().collect();
        keywords.extend(overrides.always_include.iter().cloned());
        for excluded in &overrides.always_exclude {
            keywords.remove(excluded);
        }
        keywords.into_iter().collect()
    }
}

fn keyword_matches(keyword: &str, text_lower: &str, features: &TextFeatures) -> bool {
    let keyword = keyword.to_lowercase();
    if keyword.contains(' ') {
        text_lower.contains(&keyword)
    } else {
        features.tokens.contains(&keyword)
    }
}

fn score_of(scores: &[(&str, f64)], category: &str) -> f64 {
    scores
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, s)| *s)
        .unwrap_or(0.0)
}

fn add_score(scores: &mut [(&'static str, f64)], category: &str, amount: f64) {
    if let Some(entry) = scores.iter_mut().find(|(c, _)| *c == category) {
        entry.1 += amount;
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
