// Rating synthesis for hotels imported from the places provider

use parking_lot::Mutex;
use rand::{rngs::StdRng, Rng, SeedableRng};

pub const MIN_SYNTHETIC_RATING: f64 = 4.0;
pub const MAX_SYNTHETIC_RATING: f64 = 5.0;

// Source of ratings for imported hotels. Values are rounded by the caller.
pub trait RatingSampler: Send + Sync {
    fn sample(&self) -> f64;
}

impl<F> RatingSampler for F
where
    F: Fn() -> f64 + Send + Sync,
{
    fn sample(&self) -> f64 {
        self()
    }
}

// Uniform draw from [4.0, 5.0)
#[derive(Debug, Default, Clone, Copy)]
pub struct UniformRatingSampler;

impl RatingSampler for UniformRatingSampler {
    fn sample(&self) -> f64 {
        MIN_SYNTHETIC_RATING + rand::random::<f64>() * (MAX_SYNTHETIC_RATING - MIN_SYNTHETIC_RATING)
    }
}

// Reproducible sequence of ratings, for tests and benchmarks
pub struct SeededRatingSampler {
    rng: Mutex<StdRng>,
}

impl SeededRatingSampler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RatingSampler for SeededRatingSampler {
    fn sample(&self) -> f64 {
        self.rng
            .lock()
            .gen_range(MIN_SYNTHETIC_RATING..=MAX_SYNTHETIC_RATING)
    }
}

// Round to one decimal place
pub fn round_rating(rating: f64) -> f64 {
    (rating * 10.0).round() / 10.0
}
