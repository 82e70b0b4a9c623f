/*!
 * Draw block intervals directly from the exponential distribution.
 * Inverse-CDF method: `-ln(1 - U) * average`, `U` uniform in [0, 1).
 */

use anyhow::Result;
use rand::Rng;

use crate::{Interval, Sampler};

/// Exponential interval sampler with a given mean.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialSampler {
    average: f64,
}

impl ExponentialSampler {
    /// Create sampler for mean interval `average`.
    /// Fails if `average` is not a positive finite number.
    pub fn new(average: f64) -> Result<Self> {
        ensure!(
            average.is_finite() && average > 0.0,
            "average interval must be a positive number, got {}",
            average
        );
        Ok(ExponentialSampler { average })
    }

    /// Unrounded draw.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        // Standard f64 is in [0, 1), so the log argument is in (0, 1].
        let u: f64 = rng.gen();
        -(1.0 - u).ln() * self.average
    }
}

impl Sampler for ExponentialSampler {
    /// Draw rounded to the nearest integer; may be 0 for short intervals.
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Interval {
        self.draw(rng).round() as Interval
    }

    fn average(&self) -> f64 {
        self.average
    }
}
