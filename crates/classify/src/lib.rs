pub mod anomaly;
pub mod assess;
pub mod persist;
pub mod rules;
pub mod store;

pub use anomaly::{
    assess, assess_with, AnomalyAssessment, AnomalyPolicy, PolicyError, DEFAULT_ANOMALY_THRESHOLD,
};
pub use assess::{TransactionAssessment, TransactionClassifier};
pub use persist::{RulesError, RULES_SCHEMA_VERSION};
pub use rules::{
    Categorizer, CategoryRule, ClassificationResult, RuleTable, TableError, DEFAULT_CATEGORY,
    DEFAULT_CONFIDENCE, MATCHED_CONFIDENCE,
};
pub use store::RuleStore;
