//! Block interval simulators for proof-of-work mining modelled as a Poisson process.
//!
//! ```text
//! Usage:
//!    blockint N AVE [--seed S] [--compact]
//!    blockint-count N AVE [--seed S] [--compact]
//!    minesim [-f network] [-i interval] [-r repetitions] [-t] [-s seed]
//! where:
//!    N          - number of block intervals to simulate
//!    AVE        - average block interval (time units are arbitrary, seconds work well)
//! ```
//!
//! `blockint` draws intervals straight from the exponential distribution,
//! `blockint-count` gets the same distribution by counting hash attempts (slow on purpose),
//! `minesim` simulates a whole network of miners, see [`minesim`].

#[macro_use] extern crate anyhow;

use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub mod cli;
pub mod minesim;
pub mod output;
pub mod sampler_count;
pub mod sampler_exp;

pub use sampler_count::GeometricCountSampler;
pub use sampler_exp::ExponentialSampler;

/// Type that represents one simulated block interval.
pub type Interval = u64;

/// Functions required to simulate block intervals.
pub trait Sampler {
    /// Draws one block interval using `rng` as the only source of randomness.
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Interval;

    /// Mean interval the sampler was created for.
    fn average(&self) -> f64;
}

/// Lazily draws `n` intervals from `sampler`, in order.
pub fn samples<'a, S: Sampler, R: Rng + ?Sized>(
    sampler: &'a S,
    n: usize,
    rng: &'a mut R,
) -> impl Iterator<Item = Interval> + 'a {
    debug!("simulating {} intervals, average {}", n, sampler.average());
    (0..n).map(move |_| sampler.sample(&mut *rng))
}

/// Draws `n` intervals from `sampler`, in order.
pub fn simulate<S: Sampler, R: Rng + ?Sized>(sampler: &S, n: usize, rng: &mut R) -> Vec<Interval> {
    samples(sampler, n, rng).collect()
}

/// Creates the generator used by the command line tools.
/// Given seed makes runs reproducible, otherwise the generator is seeded from OS entropy.
pub fn rng_from_seed(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => {
            info!("using seed {}", seed);
            ChaCha8Rng::seed_from_u64(seed)
        }
        None => ChaCha8Rng::from_entropy(),
    }
}
