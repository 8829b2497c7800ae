//! Classifier rule sets loaded from YAML
//!
//! A base file maps category names to `{keywords, weight}` plus a `config`
//! section. A sibling `<stem>.custom.yaml` overlay can add per-context
//! rules, global overrides, keyword include/exclude lists and manual
//! corrections keyed by issue id.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const BUILTIN_RULES: &str = include_str!("default_rules.yaml");

/// Errors that can occur while loading rule files
#[derive(Debug, Error)]
pub enum RulesError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid rules YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for rule loading
pub type RulesResult<T> = Result<T, RulesError>;

/// Keywords and weight for one category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Base rules default to 1.0; overlays only change the weight when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl CategoryRule {
    pub fn weight_or_default(&self) -> f64 {
        self.weight.unwrap_or(1.0)
    }
}

/// Tunables of the classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Title prefix length used as summary
    pub summary_chars: usize,
    /// Confidence reported when no rule fires
    pub fallback_confidence: f64,
    /// Confidence reported for manually corrected issues
    pub correction_confidence: f64,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            summary_chars: 200,
            fallback_confidence: 0.3,
            correction_confidence: 0.99,
        }
    }
}

/// Partial config from an overlay; only present fields replace the base
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RulesConfigPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_chars: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correction_confidence: Option<f64>,
}

/// Keywords forced into or out of every classification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordOverrides {
    #[serde(default)]
    pub always_include: Vec<String>,
    #[serde(default)]
    pub always_exclude: Vec<String>,
}

impl KeywordOverrides {
    pub fn is_empty(&self) -> bool {
        self.always_include.is_empty() && self.always_exclude.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct BaseRulesFile {
    #[serde(default)]
    config: RulesConfig,
    #[serde(flatten)]
    categories: HashMap<String, CategoryRule>,
}

/// The `<stem>.custom.yaml` document, as read and written
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RulesOverlay {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub contexts: BTreeMap<String, BTreeMap<String, CategoryRule>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<String, CategoryRule>,
    #[serde(default, skip_serializing_if = "KeywordOverrides::is_empty")]
    pub keyword_overrides: KeywordOverrides,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub corrections: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<RulesConfigPatch>,
}

impl RulesOverlay {
    /// Parse an overlay document; an empty document is an empty overlay
    pub fn from_yaml(yaml: &str) -> RulesResult<Self> {
        let overlay: Option<Self> = serde_yaml::from_str(yaml)?;
        Ok(overlay.unwrap_or_default())
    }

    /// Read an overlay file, or start an empty one when it does not exist
    pub fn load_or_default(path: impl AsRef<Path>) -> RulesResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::from_yaml(&read(path)?)
    }

    /// Write the overlay as YAML, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> RulesResult<()> {
        let path = path.as_ref();
        let io_error = |source| RulesError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        std::fs::write(path, serde_yaml::to_string(self)?).map_err(io_error)?;
        debug!(path = %path.display(), "wrote custom rules overlay");
        Ok(())
    }
}

/// The complete rule set handed to the classifier
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifierRules {
    pub categories: HashMap<String, CategoryRule>,
    pub config: RulesConfig,
    /// Context name (e.g. a source system) → extra category rules
    pub contexts: HashMap<String, HashMap<String, CategoryRule>>,
    /// Applied after contexts; a set weight replaces the base weight
    pub overrides: HashMap<String, CategoryRule>,
    pub keyword_overrides: KeywordOverrides,
    /// Issue id → category, bypassing scoring
    pub corrections: HashMap<String, String>,
}

impl ClassifierRules {
    /// The rule set compiled into the crate
    pub fn builtin() -> RulesResult<Self> {
        Self::from_yaml(BUILTIN_RULES)
    }

    /// Parse a base rules document
    pub fn from_yaml(yaml: &str) -> RulesResult<Self> {
        let base: BaseRulesFile = serde_yaml::from_str(yaml)?;
        Ok(Self {
            categories: base.categories,
            config: base.config,
            ..Default::default()
        })
    }

    /// Load a base rules file and its `<stem>.custom.yaml` overlay if present
    pub fn load(path: impl AsRef<Path>) -> RulesResult<Self> {
        let path = path.as_ref();
        let mut rules = Self::from_yaml(&read(path)?)?;

        let custom_path = Self::overlay_path(path);
        if custom_path.exists() {
            debug!(path = %custom_path.display(), "loading custom rules overlay");
            rules.apply_overlay_yaml(&read(&custom_path)?)?;
        }

        Ok(rules)
    }

    /// `rules/classify.yaml` → `rules/classify.custom.yaml`
    pub fn overlay_path(path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "classify_rules".to_string());
        path.with_file_name(format!("{}.custom.yaml", stem))
    }

    /// Merge an overlay document into this rule set
    pub fn apply_overlay_yaml(&mut self, yaml: &str) -> RulesResult<()> {
        self.apply_overlay(RulesOverlay::from_yaml(yaml)?);
        Ok(())
    }

    /// Replace the overlay sections and patch the config
    pub fn apply_overlay(&mut self, overlay: RulesOverlay) {
        self.contexts = overlay
            .contexts
            .into_iter()
            .map(|(context, rules)| (context, rules.into_iter().collect()))
            .collect();
        self.overrides = overlay.overrides.into_iter().collect();
        self.keyword_overrides = overlay.keyword_overrides;
        self.corrections = overlay.corrections.into_iter().collect();

        if let Some(patch) = overlay.config {
            if let Some(v) = patch.summary_chars {
                self.config.summary_chars = v;
            }
            if let Some(v) = patch.fallback_confidence {
                self.config.fallback_confidence = v;
            }
            if let Some(v) = patch.correction_confidence {
                self.config.correction_confidence = v;
            }
        }
    }

    pub fn with_correction(mut self, issue_id: impl Into<String>, category: impl Into<String>) -> Self {
        self.corrections.insert(issue_id.into(), category.into());
        self
    }
}

fn read(path: &Path) -> RulesResult<String> {
    std::fs::read_to_string(path).map_err(|source| RulesError::Io {
        path: path.to_path_buf(),
        source,
    })
}
