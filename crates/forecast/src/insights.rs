use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Savings rates above this percentage are reported as healthy.
const HEALTHY_SAVINGS_RATE: Decimal = Decimal::from_parts(20, 0, 0, false, 0);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorizedAmount {
    pub category: String,
    pub amount: Decimal,
}

impl CategorizedAmount {
    pub fn new(category: impl Into<String>, amount: Decimal) -> Self {
        Self {
            category: category.into(),
            amount,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Savings,
    Spending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Success => write!(f, "success"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

/// Savings rate (when there is income) and top spending category (when
/// there are outflows), in that order. An insight whose totals overflow
/// `Decimal` is left out.
pub fn insights(transactions: &[CategorizedAmount]) -> Vec<Insight> {
    let mut out = Vec::new();
    if let Some(insight) = savings_rate(transactions) {
        out.push(insight);
    }
    if let Some(insight) = top_spending_category(transactions) {
        out.push(insight);
    }
    out
}

fn checked_total<I: Iterator<Item = Decimal>>(mut amounts: I) -> Option<Decimal> {
    amounts.try_fold(Decimal::ZERO, |acc, a| acc.checked_add(a))
}

fn savings_rate(transactions: &[CategorizedAmount]) -> Option<Insight> {
    let positive = transactions.iter().filter(|t| t.amount > Decimal::ZERO);
    let negative = transactions.iter().filter(|t| t.amount < Decimal::ZERO);
    if positive.clone().next().is_none() {
        return None;
    }

    let rate = checked_total(positive.map(|t| t.amount)).and_then(|income| {
        let expenses = checked_total(negative.map(|t| t.amount.abs()))?;
        income
            .checked_sub(expenses)?
            .checked_div(income)?
            .checked_mul(Decimal::ONE_HUNDRED)
    });
    let Some(rate) = rate else {
        tracing::warn!("Savings rate overflowed, skipping insight");
        return None;
    };
    Some(Insight {
        kind: InsightKind::Savings,
        title: "Savings Rate".to_string(),
        description: format!("You're saving {:.1}% of your income", rate.round_dp(1)),
        severity: if rate > HEALTHY_SAVINGS_RATE {
            Severity::Success
        } else {
            Severity::Warning
        },
    })
}

fn top_spending_category(transactions: &[CategorizedAmount]) -> Option<Insight> {
    // Insertion-ordered so equal totals resolve to the first category seen.
    let mut totals: Vec<(&str, Decimal)> = Vec::new();
    for t in transactions.iter().filter(|t| t.amount < Decimal::ZERO) {
        match totals.iter().position(|(c, _)| *c == t.category) {
            Some(i) => match totals[i].1.checked_add(t.amount.abs()) {
                Some(sum) => totals[i].1 = sum,
                None => {
                    tracing::warn!(category = %t.category, "Category total overflowed, skipping insight");
                    return None;
                }
            },
            None => totals.push((t.category.as_str(), t.amount.abs())),
        }
    }

    let (category, total) = totals
        .into_iter()
        .reduce(|best, next| if next.1 > best.1 { next } else { best })?;

    Some(Insight {
        kind: InsightKind::Spending,
        title: "Top Spending Category".to_string(),
        description: format!("You spent {:.2} on {category}", total.round_dp(2)),
        severity: Severity::Info,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amt(category: &str, cents: i64) -> CategorizedAmount {
        CategorizedAmount::new(category, Decimal::new(cents, 2))
    }

    #[test]
    fn empty_input_has_no_insights() {
        assert!(insights(&[]).is_empty());
    }

    #[test]
    fn healthy_savings_rate_is_success() {
        let out = insights(&[amt("Income", 450_000), amt("Groceries", -8_532)]);
        assert_eq!(out[0].kind, InsightKind::Savings);
        assert_eq!(out[0].severity, Severity::Success);
        assert_eq!(out[0].description, "You're saving 98.1% of your income");
    }

    #[test]
    fn low_savings_rate_is_warning() {
        let out = insights(&[amt("Income", 100_000), amt("Shopping", -90_000)]);
        assert_eq!(out[0].severity, Severity::Warning);
        assert_eq!(out[0].description, "You're saving 10.0% of your income");
    }

    #[test]
    fn exactly_twenty_percent_is_warning() {
        let out = insights(&[amt("Income", 100_000), amt("Dining", -80_000)]);
        assert_eq!(out[0].severity, Severity::Warning);
    }

    #[test]
    fn negative_savings_rate_is_reported() {
        let out = insights(&[amt("Income", 10_000), amt("Dining", -15_000)]);
        assert_eq!(out[0].description, "You're saving -50.0% of your income");
        assert_eq!(out[0].severity, Severity::Warning);
    }

    #[test]
    fn no_income_skips_savings_rate() {
        let out = insights(&[amt("Dining", -1_000)]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, InsightKind::Spending);
    }

    #[test]
    fn top_category_sums_outflows_per_category() {
        let out = insights(&[
            amt("Income", 450_000),
            amt("Dining", -675),
            amt("Shopping", -12_745),
            amt("Dining", -4_560),
            amt("Shopping", -6_789),
            amt("Groceries", -8_532),
        ]);
        let spending = &out[1];
        assert_eq!(spending.title, "Top Spending Category");
        assert_eq!(spending.description, "You spent 195.34 on Shopping");
        assert_eq!(spending.severity, Severity::Info);
    }

    #[test]
    fn tie_goes_to_first_category_seen() {
        let out = insights(&[amt("Dining", -500), amt("Travel", -500)]);
        assert_eq!(out[0].description, "You spent 5.00 on Dining");
    }

    #[test]
    fn overflowing_totals_are_left_out() {
        let huge = |category: &str, sign: bool| {
            CategorizedAmount::new(category, if sign { Decimal::MAX } else { Decimal::MIN })
        };
        let out = insights(&[huge("Income", true), huge("Income", true), amt("Dining", -500)]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, InsightKind::Spending);

        let out = insights(&[amt("Income", 100), huge("Travel", false), huge("Travel", false)]);
        assert!(out.is_empty());
    }

    #[test]
    fn serializes_kind_as_type() {
        let out = insights(&[amt("Dining", -500)]);
        let json = serde_json::to_value(&out[0]).unwrap();
        assert_eq!(json["type"], "spending");
        assert_eq!(json["severity"], "info");
    }
}
