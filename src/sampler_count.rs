/*!
 * Get block intervals by counting hash attempts, the way real mining does.
 * Every attempt succeeds with probability `1 / average`, which gives the geometric distribution.
 * This is intentionally slow: one random draw per attempt. See `sampler_exp` for the fast version.
 */

use anyhow::Result;
use rand::Rng;

use crate::{Interval, Sampler};

/// Counting interval sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometricCountSampler {
    average: u64,
}

impl GeometricCountSampler {
    /// Create sampler for mean interval `average`.
    /// `average == 1` is allowed (every attempt succeeds), `average == 0` is not.
    pub fn new(average: u64) -> Result<Self> {
        ensure!(average > 0, "average interval must be greater than zero");
        Ok(GeometricCountSampler { average })
    }
}

impl Sampler for GeometricCountSampler {
    /// Number of attempts up to and including the first success, so always >= 1.
    /// Unbounded in the worst case.
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Interval {
        let mut counter = 1;
        while rng.gen_range(0..self.average) > 0 {
            counter += 1;
        }
        counter
    }

    fn average(&self) -> f64 {
        self.average as f64
    }
}
