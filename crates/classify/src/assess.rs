use std::sync::Arc;

use cashlens_core::TransactionRecord;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::anomaly::AnomalyPolicy;
use crate::rules::RuleTable;
use crate::store::RuleStore;

/// Category and anomaly flags for one transaction, as attached before it
/// is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionAssessment {
    pub category: String,
    pub confidence: f64,
    pub is_anomaly: bool,
    pub anomaly_score: f64,
}

/// Pairs the shared rule store with an anomaly policy.
#[derive(Debug, Clone)]
pub struct TransactionClassifier {
    rules: Arc<RuleStore>,
    policy: AnomalyPolicy,
}

impl TransactionClassifier {
    pub fn new(rules: Arc<RuleStore>, policy: AnomalyPolicy) -> Self {
        Self { rules, policy }
    }

    pub fn rules(&self) -> &RuleStore {
        &self.rules
    }

    pub fn policy(&self) -> AnomalyPolicy {
        self.policy
    }

    pub fn evaluate(&self, description: &str, amount: Decimal) -> TransactionAssessment {
        self.evaluate_with(&self.rules.snapshot(), description, amount)
    }

    /// One assessment per record, in order, against a single rule snapshot.
    /// Records without a description classify as the default category.
    pub fn assess_all(&self, records: &[TransactionRecord]) -> Vec<TransactionAssessment> {
        let table = self.rules.snapshot();
        records
            .iter()
            .map(|record| {
                let description = record.description.as_deref().unwrap_or_default();
                self.evaluate_with(&table, description, record.amount)
            })
            .collect()
    }

    fn evaluate_with(&self, table: &RuleTable, description: &str, amount: Decimal) -> TransactionAssessment {
        let classification = table.classify(description);
        let anomaly = self.policy.assess(amount);
        TransactionAssessment {
            category: classification.category,
            confidence: classification.confidence,
            is_anomaly: anomaly.is_anomaly,
            anomaly_score: anomaly.anomaly_score,
        }
    }
}
