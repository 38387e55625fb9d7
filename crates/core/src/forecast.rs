use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::money::Money;

/// One day of a cash-balance projection.
///
/// `upper` and `lower` are a fixed multiplicative envelope around
/// `predicted`, not a statistical interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted: Money,
    pub upper: Money,
    pub lower: Money,
}
