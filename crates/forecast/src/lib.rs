pub mod insights;
pub mod noise;
pub mod projector;

pub use insights::{insights, CategorizedAmount, Insight, InsightKind, Severity};
pub use noise::{ConstantNoise, GaussianNoise, NoiseSource, ZeroNoise, DEFAULT_NOISE_STD_DEV};
pub use projector::{CashFlowProjector, DailyRates, ForecastError, RATE_WINDOW_DAYS};
