//! Triage classification: rule sets, the weighted-keyword classifier and
//! learning from manual corrections

mod classifier;
mod improve;
mod rules;

pub use classifier::{Classification, Classifier, CATEGORIES, CLASSIFIER_NAME};
pub use improve::{
    apply_corrections, learn_keywords, merge_corrections, quality_report, Correction, LowConfidence, QualityReport,
    DEFAULT_CONFIDENCE_THRESHOLD, LEARNED_WEIGHT, MAX_LEARNED_KEYWORDS,
};
pub use rules::{
    CategoryRule, ClassifierRules, KeywordOverrides, RulesConfig, RulesConfigPatch, RulesError, RulesOverlay, RulesResult,
};
