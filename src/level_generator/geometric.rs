//! Geometric level generator.

use rand::{Rng, SeedableRng, rngs::SmallRng};
use thiserror::Error;

use crate::level_generator::{LevelGenerator, MAX_LEVEL};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
/// Errors that can occur when creating a [`Geometric`] level generator.
#[expect(
    clippy::module_name_repetitions,
    reason = "Using 'Error' would be too generic and may cause confusion."
)]
#[non_exhaustive]
pub enum GeometricError {
    /// The maximum number of levels must be non-zero.
    #[error("max must be non-zero.")]
    ZeroMax,
    /// The maximum number of levels must not exceed [`MAX_LEVEL`].
    #[error("max must be at most 32.")]
    MaxTooLarge,
    /// The probability `p` must be in the range `(0, 1)`.
    #[error("p must be in (0, 1).")]
    InvalidProbability,
    /// Failed to initialize the random number generator.
    #[error("Failed to initialize the random number generator.")]
    RngInitFailed,
}

/// A level generator using a geometric distribution.
///
/// A new node starts at level 0 and keeps climbing one level for as long as a
/// biased coin (heads with probability `p`) comes up heads. The climb stops
/// at `total - 1`, so all the probability mass beyond the cap lands on the
/// top level.
///
/// With the default `p = 0.5` this is the classic fair-coin skiplist draw.
#[derive(Debug, Clone)]
pub struct Geometric {
    /// The total number of levels that are assumed to exist.
    total: usize,
    /// The probability that a node is present in the next level.
    p: f64,
    /// The random number generator.
    rng: SmallRng,
}

impl Geometric {
    /// Create a new geometric level generator with `total` number of levels,
    /// and `p` as the probability that a given node is present in the next
    /// level. The generator is seeded from the operating system.
    ///
    /// # Errors
    ///
    /// `p` must lie strictly between 0 and 1, and `total` must lie in
    /// `[1, MAX_LEVEL]`.
    #[inline]
    pub fn new(total: usize, p: f64) -> Result<Self, GeometricError> {
        Self::validate(total, p)?;
        Ok(Geometric {
            total,
            p,
            rng: SmallRng::try_from_os_rng().map_err(|_err| GeometricError::RngInitFailed)?,
        })
    }

    /// Create a geometric level generator whose draws are fully determined by
    /// `seed`.
    ///
    /// # Errors
    ///
    /// Same as [`Geometric::new`].
    #[inline]
    pub fn with_seed(total: usize, p: f64, seed: u64) -> Result<Self, GeometricError> {
        Self::validate(total, p)?;
        Ok(Geometric {
            total,
            p,
            rng: SmallRng::seed_from_u64(seed),
        })
    }

    /// Fair-coin generator seeded from the thread-local generator, which
    /// cannot fail. `total` is clamped into `[1, MAX_LEVEL]`.
    pub(crate) fn fair(total: usize) -> Self {
        Geometric {
            total: total.clamp(1, MAX_LEVEL),
            p: 0.5,
            rng: SmallRng::from_rng(&mut rand::rng()),
        }
    }

    /// Fair-coin generator whose draws are fully determined by `seed`.
    pub(crate) fn fair_seeded(total: usize, seed: u64) -> Self {
        Geometric {
            total: total.clamp(1, MAX_LEVEL),
            p: 0.5,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    fn validate(total: usize, p: f64) -> Result<(), GeometricError> {
        if total == 0 {
            return Err(GeometricError::ZeroMax);
        }
        if total > MAX_LEVEL {
            return Err(GeometricError::MaxTooLarge);
        }
        if !(0.0 < p && p < 1.0) {
            return Err(GeometricError::InvalidProbability);
        }
        Ok(())
    }
}

impl LevelGenerator for Geometric {
    #[inline]
    fn total(&self) -> usize {
        self.total
    }

    #[inline]
    fn level(&mut self) -> usize {
        let mut level = 0;
        while level + 1 < self.total && self.rng.random_bool(self.p) {
            level += 1;
        }
        level
    }
}
