use cashlens_core::{DateRange, Flow, ForecastPoint, Money, TransactionRecord};
use chrono::{Days, Local, NaiveDate};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::noise::{GaussianNoise, NoiseSource, DEFAULT_NOISE_STD_DEV};

/// History totals are divided by this many days to get daily rates,
/// regardless of how long the history actually spans.
pub const RATE_WINDOW_DAYS: u32 = 30;

const UPPER_FACTOR: Decimal = Decimal::from_parts(115, 0, 0, false, 2);
const LOWER_FACTOR: Decimal = Decimal::from_parts(85, 0, 0, false, 2);

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Projected balance overflowed on day {day}")]
    Overflow { day: usize },
    #[error("History totals overflowed")]
    HistoryOverflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyRates {
    pub income: Decimal,
    pub expense: Decimal,
}

impl DailyRates {
    pub fn from_history(history: &[TransactionRecord]) -> Result<Self, ForecastError> {
        let (income, expense) = history.iter().try_fold(
            (Decimal::ZERO, Decimal::ZERO),
            |(inflow, outflow), tx| match tx.flow() {
                Flow::Inflow => inflow.checked_add(tx.amount).map(|i| (i, outflow)),
                Flow::Outflow => outflow.checked_add(tx.amount.abs()).map(|o| (inflow, o)),
                Flow::Zero => Some((inflow, outflow)),
            },
        )
        .ok_or(ForecastError::HistoryOverflow)?;
        let window = Decimal::from(RATE_WINDOW_DAYS);
        Ok(DailyRates {
            income: income / window,
            expense: expense / window,
        })
    }

    pub fn net(&self) -> Decimal {
        self.income - self.expense
    }
}

/// Linear trend from historical income/expense rates, plus per-day noise,
/// with a fixed ±15% band around each point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CashFlowProjector {
    noise_std_dev: f64,
}

impl Default for CashFlowProjector {
    fn default() -> Self {
        Self {
            noise_std_dev: DEFAULT_NOISE_STD_DEV,
        }
    }
}

impl CashFlowProjector {
    pub fn new(noise_std_dev: f64) -> Result<Self, ForecastError> {
        if !noise_std_dev.is_finite() || noise_std_dev < 0.0 {
            return Err(ForecastError::InvalidArgument(format!(
                "noise standard deviation must be finite and non-negative, got {noise_std_dev}"
            )));
        }
        Ok(Self { noise_std_dev })
    }

    pub fn noise_std_dev(&self) -> f64 {
        self.noise_std_dev
    }

    /// Projects from today with unseeded Gaussian noise.
    pub fn project(
        &self,
        history: &[TransactionRecord],
        starting_balance: Decimal,
        horizon_days: i64,
    ) -> Result<Vec<ForecastPoint>, ForecastError> {
        let mut noise = GaussianNoise::from_entropy(self.noise_std_dev)?;
        self.project_with(history, starting_balance, horizon_days, &mut noise)
    }

    /// Projects from today with a caller-supplied noise source.
    pub fn project_with<N: NoiseSource + ?Sized>(
        &self,
        history: &[TransactionRecord],
        starting_balance: Decimal,
        horizon_days: i64,
        noise: &mut N,
    ) -> Result<Vec<ForecastPoint>, ForecastError> {
        let today = Local::now().date_naive();
        self.project_from(today, history, starting_balance, horizon_days, noise)
    }

    /// Day `i` of the result is dated `origin + i`. The running balance is
    /// rounded only when a point is emitted.
    pub fn project_from<N: NoiseSource + ?Sized>(
        &self,
        origin: NaiveDate,
        history: &[TransactionRecord],
        starting_balance: Decimal,
        horizon_days: i64,
        noise: &mut N,
    ) -> Result<Vec<ForecastPoint>, ForecastError> {
        let horizon = usize::try_from(horizon_days).map_err(|_| {
            ForecastError::InvalidArgument(format!("horizon_days must be >= 0, got {horizon_days}"))
        })?;

        if horizon > 0 {
            origin
                .checked_add_days(Days::new(horizon as u64 - 1))
                .ok_or_else(|| {
                    ForecastError::InvalidArgument(format!("horizon of {horizon} days runs past the calendar"))
                })?;
        }

        let rates = DailyRates::from_history(history)?;
        let daily_net = rates.net();
        if let Some(span) = DateRange::covering(history.iter().map(|tx| tx.date)) {
            tracing::debug!(
                history = %span,
                span_days = span.len_days(),
                window_days = RATE_WINDOW_DAYS,
                "History span used for daily rates"
            );
        }
        tracing::debug!(
            records = history.len(),
            daily_income = %rates.income,
            daily_expense = %rates.expense,
            daily_net = %daily_net,
            horizon,
            "Projecting cash flow"
        );

        let mut balance = starting_balance;
        let mut points = Vec::with_capacity(horizon);
        for day in 0..horizon {
            let date = origin + Days::new(day as u64);

            let sample = noise.sample();
            let jitter = Decimal::from_f64(sample).ok_or_else(|| {
                ForecastError::InvalidArgument(format!("noise sample {sample} is not representable"))
            })?;

            balance = balance
                .checked_add(daily_net)
                .and_then(|b| b.checked_add(jitter))
                .ok_or(ForecastError::Overflow { day })?;
            let upper = balance
                .checked_mul(UPPER_FACTOR)
                .ok_or(ForecastError::Overflow { day })?;
            let lower = balance
                .checked_mul(LOWER_FACTOR)
                .ok_or(ForecastError::Overflow { day })?;

            points.push(ForecastPoint {
                date,
                predicted: Money::from_decimal(balance),
                upper: Money::from_decimal(upper),
                lower: Money::from_decimal(lower),
            });
        }

        Ok(points)
    }
}
