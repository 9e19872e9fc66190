//! A rank-aware sorted set.
//!
//! A [`SortedSet`] holds unique members, each with a floating-point score, in
//! ascending score order. Members sharing a score keep the order in which they
//! were added. Lookups by score, by score range, by member and by rank (the
//! 1-based position in that order, negative ranks counting from the end) all
//! run in `O(log(n))` on average, plus the size of the answer.
//!
//! Under the hood the members live in a skiplist keyed by score whose links
//! record how many ranks they jump, which is what makes rank lookups cheap:
//!
//! ```text
//! <head> -5------------------------------------------> [5] -1-> <end>
//! <head> -1-> [1] -2-----------> [3] -2--------------> [5] -1-> <end>
//! <head> -1-> [1] -1-> [2] -1-> [3,3'] -2-> [4] -1-> [5] -1-> <end>
//! ```
//!
//! A hash map from member to score sits alongside it, so a member can be
//! found without knowing its score.
//!
//! ```
//! use zset::{AddStatus, SortedSet};
//!
//! let mut set = SortedSet::new();
//! set.add(1.0, "a")?;
//! set.add(2.0, "b")?;
//! assert_eq!(set.add(1.0, "c")?, AddStatus::Added);
//!
//! assert_eq!(set.search_by_score(1.0), vec!["a", "c"]);
//! assert_eq!(set.rank(2), Some((1.0, "c")));
//! assert_eq!(set.rank_range(-2, -1), vec![(1.0, "c"), (2.0, "b")]);
//! assert_eq!(set.remove_by_score(1.0), vec!["a", "c"]);
//! assert_eq!(set.len(), 1);
//! # Ok::<(), zset::Error>(())
//! ```
//!
//! The set is not synchronized; share it between threads behind a lock.
//! Hosts written in other languages can drive it through the [`ffi`] module.

mod arena;
mod error;
pub mod ffi;
pub mod level_generator;
mod ordered_skiplist;
mod skipnode;
mod sorted_set;

pub use error::Error;
pub use level_generator::{Geometric, GeometricError, LevelGenerator, MAX_LEVEL};
pub use skipnode::Iter;
pub use sorted_set::{AddStatus, SortedSet};
