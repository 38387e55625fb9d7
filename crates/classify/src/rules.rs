use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Confidence reported when a keyword matched.
pub const MATCHED_CONFIDENCE: f64 = 0.85;
/// Confidence reported for the fallback category.
pub const DEFAULT_CONFIDENCE: f64 = 0.65;
/// Category returned when no rule matches.
pub const DEFAULT_CATEGORY: &str = "Other";

const DEFAULT_RULES: &[(&str, &[&str])] = &[
    (
        "Groceries",
        &["whole foods", "trader joe", "safeway", "kroger", "walmart", "grocery"],
    ),
    (
        "Dining",
        &["restaurant", "cafe", "coffee", "starbucks", "mcdonald", "pizza", "chipotle"],
    ),
    (
        "Transportation",
        &["uber", "lyft", "gas", "parking", "metro", "transit"],
    ),
    (
        "Entertainment",
        &["netflix", "spotify", "hulu", "movie", "theater", "concert"],
    ),
    (
        "Utilities",
        &["electric", "water", "internet", "phone", "verizon", "at&t"],
    ),
    (
        "Shopping",
        &["amazon", "target", "best buy", "mall", "clothing"],
    ),
    (
        "Healthcare",
        &["pharmacy", "doctor", "medical", "hospital", "cvs", "walgreens"],
    ),
    (
        "Income",
        &["salary", "paycheck", "deposit", "transfer in", "direct dep"],
    ),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub category: String,
    pub keywords: Vec<String>,
}

impl CategoryRule {
    pub fn new(category: &str, keywords: &[&str]) -> Self {
        CategoryRule {
            category: category.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// `normalized` must already be lowercased.
    fn matches(&self, normalized: &str) -> bool {
        self.keywords.iter().any(|kw| normalized.contains(kw.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: String,
    /// Fixed heuristic score, not a calibrated probability.
    pub confidence: f64,
}

impl ClassificationResult {
    pub fn is_default(&self) -> bool {
        self.category == DEFAULT_CATEGORY && self.confidence == DEFAULT_CONFIDENCE
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("Category label must not be empty")]
    EmptyCategory,
    #[error("Duplicate category: '{0}'")]
    DuplicateCategory(String),
    #[error("Category '{0}' has an empty keyword")]
    EmptyKeyword(String),
}

/// Ordered keyword table. The first rule whose keywords match wins, so
/// position in the table is the only tie-break.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTable {
    rules: Vec<CategoryRule>,
}

impl Default for RuleTable {
    fn default() -> Self {
        let rules = DEFAULT_RULES
            .iter()
            .map(|(category, keywords)| CategoryRule::new(category, keywords))
            .collect();
        Self { rules }
    }
}

impl RuleTable {
    /// Keywords are lowercased; labels must be unique and keywords non-empty
    /// (an empty keyword would match every description).
    pub fn new(rules: Vec<CategoryRule>) -> Result<Self, TableError> {
        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(rules.len());

        for rule in rules {
            if rule.category.trim().is_empty() {
                return Err(TableError::EmptyCategory);
            }
            if !seen.insert(rule.category.clone()) {
                return Err(TableError::DuplicateCategory(rule.category));
            }
            if rule.keywords.iter().any(|kw| kw.is_empty()) {
                return Err(TableError::EmptyKeyword(rule.category));
            }
            normalized.push(CategoryRule {
                keywords: rule.keywords.iter().map(|kw| kw.to_lowercase()).collect(),
                category: rule.category,
            });
        }

        Ok(Self { rules: normalized })
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn find_matching_rule(&self, description: &str) -> Option<&CategoryRule> {
        let text = description.to_lowercase();
        self.rules.iter().find(|rule| rule.matches(&text))
    }

    pub fn classify(&self, description: &str) -> ClassificationResult {
        match self.find_matching_rule(description) {
            Some(rule) => ClassificationResult {
                category: rule.category.clone(),
                confidence: MATCHED_CONFIDENCE,
            },
            None => ClassificationResult {
                category: DEFAULT_CATEGORY.to_string(),
                confidence: DEFAULT_CONFIDENCE,
            },
        }
    }
}

/// Cheap, cloneable handle on an immutable rule table snapshot.
#[derive(Debug, Clone, Default)]
pub struct Categorizer {
    table: Arc<RuleTable>,
}

impl Categorizer {
    pub fn new(table: RuleTable) -> Self {
        Self { table: Arc::new(table) }
    }

    pub fn from_snapshot(table: Arc<RuleTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    pub fn classify(&self, description: &str) -> ClassificationResult {
        self.table.classify(description)
    }

    /// One result per description, in input order.
    pub fn classify_all<'a, I>(&self, descriptions: I) -> Vec<ClassificationResult>
    where
        I: IntoIterator<Item = &'a str>,
    {
        descriptions.into_iter().map(|d| self.classify(d)).collect()
    }
}
