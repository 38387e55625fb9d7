use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of money movement, derived from the sign of an amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    Inflow,
    Outflow,
    Zero,
}

impl Flow {
    pub fn of(amount: Decimal) -> Self {
        if amount > Decimal::ZERO {
            Flow::Inflow
        } else if amount < Decimal::ZERO {
            Flow::Outflow
        } else {
            Flow::Zero
        }
    }
}

/// A historical transaction as seen by the analytics.
///
/// Positive amounts are inflows, negative amounts outflows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub date: NaiveDate,
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TransactionRecord {
    pub fn new(date: NaiveDate, amount: Decimal) -> Self {
        TransactionRecord {
            date,
            amount,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn flow(&self) -> Flow {
        Flow::of(self.amount)
    }
}
