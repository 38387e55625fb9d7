use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Outflows larger than this magnitude are flagged.
pub const DEFAULT_ANOMALY_THRESHOLD: Decimal = Decimal::from_parts(150, 0, 0, false, 0);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyAssessment {
    pub is_anomaly: bool,
    /// `|amount| / threshold` for flagged outflows, otherwise 0.
    pub anomaly_score: f64,
}

impl AnomalyAssessment {
    fn normal() -> Self {
        Self {
            is_anomaly: false,
            anomaly_score: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("Anomaly threshold must be positive, got {0}")]
    NonPositiveThreshold(Decimal),
}

/// Fixed-threshold rule over a single amount. Inflows are never anomalous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnomalyPolicy {
    threshold: Decimal,
}

impl Default for AnomalyPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_ANOMALY_THRESHOLD,
        }
    }
}

impl AnomalyPolicy {
    pub fn new(threshold: Decimal) -> Result<Self, PolicyError> {
        if threshold <= Decimal::ZERO {
            return Err(PolicyError::NonPositiveThreshold(threshold));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> Decimal {
        self.threshold
    }

    pub fn assess(&self, amount: Decimal) -> AnomalyAssessment {
        let magnitude = amount.abs();
        if amount >= Decimal::ZERO || magnitude <= self.threshold {
            return AnomalyAssessment::normal();
        }
        AnomalyAssessment {
            is_anomaly: true,
            anomaly_score: magnitude
                .checked_div(self.threshold)
                .and_then(|ratio| ratio.to_f64())
                .unwrap_or(f64::MAX),
        }
    }
}

/// Assess `amount` against the default threshold.
pub fn assess(amount: Decimal) -> AnomalyAssessment {
    AnomalyPolicy::default().assess(amount)
}

/// Assess `amount` against a caller-chosen threshold.
pub fn assess_with(amount: Decimal, threshold: Decimal) -> Result<AnomalyAssessment, PolicyError> {
    Ok(AnomalyPolicy::new(threshold)?.assess(amount))
}
