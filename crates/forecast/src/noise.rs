use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::projector::ForecastError;

/// Standard deviation of the default per-day balance noise.
pub const DEFAULT_NOISE_STD_DEV: f64 = 10.0;

/// Per-day random perturbation added to a projected balance.
pub trait NoiseSource {
    fn sample(&mut self) -> f64;
}

impl<N: NoiseSource + ?Sized> NoiseSource for &mut N {
    fn sample(&mut self) -> f64 {
        (**self).sample()
    }
}

/// No noise; projections become a straight line.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroNoise;

impl NoiseSource for ZeroNoise {
    fn sample(&mut self) -> f64 {
        0.0
    }
}

/// The same value every day.
#[derive(Debug, Clone, Copy)]
pub struct ConstantNoise(pub f64);

impl NoiseSource for ConstantNoise {
    fn sample(&mut self) -> f64 {
        self.0
    }
}

/// Independent draws from Normal(0, std_dev).
#[derive(Debug, Clone)]
pub struct GaussianNoise<R = StdRng> {
    rng: R,
    normal: Normal<f64>,
}

impl GaussianNoise<StdRng> {
    /// Reproducible noise: the same seed yields the same sequence.
    pub fn seeded(seed: u64, std_dev: f64) -> Result<Self, ForecastError> {
        Self::with_rng(StdRng::seed_from_u64(seed), std_dev)
    }

    pub fn from_entropy(std_dev: f64) -> Result<Self, ForecastError> {
        Self::with_rng(StdRng::from_entropy(), std_dev)
    }
}

impl<R: Rng> GaussianNoise<R> {
    pub fn with_rng(rng: R, std_dev: f64) -> Result<Self, ForecastError> {
        if !std_dev.is_finite() {
            return Err(ForecastError::InvalidArgument(format!(
                "noise standard deviation must be finite, got {std_dev}"
            )));
        }
        let normal = Normal::new(0.0, std_dev).map_err(|e| {
            ForecastError::InvalidArgument(format!("invalid noise standard deviation {std_dev}: {e}"))
        })?;
        Ok(Self { rng, normal })
    }

    pub fn std_dev(&self) -> f64 {
        self.normal.std_dev()
    }
}

impl<R: Rng> NoiseSource for GaussianNoise<R> {
    fn sample(&mut self) -> f64 {
        self.normal.sample(&mut self.rng)
    }
}
