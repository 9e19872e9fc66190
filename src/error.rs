//! Errors reported by the sorted set.

use thiserror::Error;

use crate::level_generator::GeometricError;

/// Errors that can occur when building or writing to a
/// [`SortedSet`](crate::SortedSet).
///
/// Absent members, absent scores and empty ranges are not errors; they are
/// reported through `Option` and empty results.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Scores must be comparable, so NaN can never be stored.
    #[error("score must not be NaN.")]
    NanScore,
    /// The level generator could not be configured.
    #[error(transparent)]
    Generator(#[from] GeometricError),
}
