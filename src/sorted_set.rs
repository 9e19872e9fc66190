//! A sorted set: unique members ordered by score, addressable by rank.

use std::{cmp::Ordering, fmt, hash::Hash, iter};

use rustc_hash::FxHashMap;

use crate::{
    error::Error,
    level_generator::{Geometric, LevelGenerator, MAX_LEVEL},
    ordered_skiplist::OrderedSkipList,
    skipnode::Iter,
};

/// Outcome of [`SortedSet::add`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AddStatus {
    /// The member was new and now holds the requested score.
    Added,
    /// The member was already present; it kept this score.
    Exists(f64),
}

// ////////////////////////////////////////////////////////////////////////////
// SortedSet
// ////////////////////////////////////////////////////////////////////////////

/// A set of unique members, each holding a score.
///
/// Members are kept in ascending score order, members sharing a score in the
/// order they were added. Every member can be found by score, by rank (its
/// 1-based position in that order) or by identity.
///
/// Two indexes back the set: a skiplist over scores which owns the members
/// and knows their ranks, and a hash map from member to score. Every write
/// goes through both, so the two always agree.
///
/// Members are small identifiers (`Copy`); any payload they refer to lives
/// outside the set.
pub struct SortedSet<M, G = Geometric> {
    index: OrderedSkipList<M, G>,
    scores: FxHashMap<M, f64>,
}

// ///////////////////////////////////////////////
// Inherent methods
// ///////////////////////////////////////////////

impl<M> SortedSet<M>
where
    M: Copy + Eq + Hash,
{
    /// Create a new sorted set with the default number of 32 levels.
    ///
    /// # Examples
    ///
    /// ```
    /// use zset::SortedSet;
    ///
    /// let mut set: SortedSet<u32> = SortedSet::new();
    /// ```
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_level_generator(Geometric::fair(MAX_LEVEL))
    }

    /// Constructs a new, empty sorted set with the optimal number of levels
    /// for the intended capacity.  Specifically, it uses
    /// `floor(log2(capacity))` number of levels, ensuring that only *a few*
    /// nodes occupy the highest level.
    ///
    /// # Examples
    ///
    /// ```
    /// use zset::SortedSet;
    ///
    /// let mut set = SortedSet::with_capacity(100);
    /// set.extend((0..100_u32).map(|i| (f64::from(i), i)));
    /// assert_eq!(set.len(), 100);
    /// ```
    #[inline]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let levels = capacity
            .checked_ilog2()
            .and_then(|levels| usize::try_from(levels).ok())
            .unwrap_or(1);
        let mut scores = FxHashMap::default();
        scores.reserve(capacity);
        SortedSet {
            index: OrderedSkipList::new(Geometric::fair(levels), capacity),
            scores,
        }
    }

    /// Create a sorted set whose node heights are fully determined by `seed`.
    ///
    /// Two sets built with the same seed and fed the same writes have the
    /// same internal layout.
    #[inline]
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::with_level_generator(Geometric::fair_seeded(MAX_LEVEL, seed))
    }

    /// Create a sorted set over `total` levels where a node reaches each next
    /// level with probability `p`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Generator`] if `total` is outside `[1, 32]` or `p`
    /// is outside `(0, 1)`.
    #[inline]
    pub fn with_geometric(total: usize, p: f64) -> Result<Self, Error> {
        Ok(Self::with_level_generator(Geometric::new(total, p)?))
    }
}

impl<M, G> SortedSet<M, G>
where
    M: Copy + Eq + Hash,
    G: LevelGenerator,
{
    /// Create a sorted set drawing node heights from `level_generator`.
    #[inline]
    pub fn with_level_generator(level_generator: G) -> Self {
        SortedSet {
            index: OrderedSkipList::new(level_generator, 0),
            scores: FxHashMap::default(),
        }
    }

    /// Clears the set, removing all members.
    #[inline]
    pub fn clear(&mut self) {
        self.index.clear();
        self.scores.clear();
    }

    /// Adds `member` with `score`.
    ///
    /// A member already in the set stays where it is; the call reports the
    /// score it holds. Use [`update`](Self::update) to move it.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::NanScore`] if `score` is NaN. The set is left
    /// untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use zset::{AddStatus, SortedSet};
    ///
    /// let mut set = SortedSet::new();
    /// assert_eq!(set.add(1.0, "a"), Ok(AddStatus::Added));
    /// assert_eq!(set.add(2.0, "a"), Ok(AddStatus::Exists(1.0)));
    /// assert_eq!(set.len(), 1);
    /// ```
    pub fn add(&mut self, score: f64, member: M) -> Result<AddStatus, Error> {
        if score.is_nan() {
            return Err(Error::NanScore);
        }
        Ok(self.add_ordered(score, member))
    }

    /// [`add`](Self::add) for a score already known not to be NaN.
    fn add_ordered(&mut self, score: f64, member: M) -> AddStatus {
        if let Some(&existing) = self.scores.get(&member) {
            return AddStatus::Exists(existing);
        }
        self.index.insert(score, member);
        self.scores.insert(member, score);
        AddStatus::Added
    }

    /// Moves an existing `member` to `score`, behind any members already
    /// holding that score.
    ///
    /// Returns the score the member held before, or `None` if it is not in
    /// the set, in which case nothing is added. Setting a member to the
    /// score it already holds leaves it in place.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::NanScore`] if `score` is NaN.
    pub fn update(&mut self, score: f64, member: M) -> Result<Option<f64>, Error> {
        if score.is_nan() {
            return Err(Error::NanScore);
        }
        let Some(&old) = self.scores.get(&member) else {
            return Ok(None);
        };
        self.reposition(member, old, score);
        Ok(Some(old))
    }

    /// Adds `increment` to the score of `member`, adding the member with
    /// score `increment` if it is not in the set yet.
    ///
    /// Returns the new score.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::NanScore`] if `increment` or the resulting score
    /// is NaN (for instance infinity plus negative infinity). The set is left
    /// untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use zset::SortedSet;
    ///
    /// let mut set = SortedSet::new();
    /// assert_eq!(set.incr_by(2.5, 'x'), Ok(2.5));
    /// assert_eq!(set.incr_by(-1.0, 'x'), Ok(1.5));
    /// assert_eq!(set.get_score('x'), Some(1.5));
    /// ```
    pub fn incr_by(&mut self, increment: f64, member: M) -> Result<f64, Error> {
        if increment.is_nan() {
            return Err(Error::NanScore);
        }
        match self.scores.get(&member) {
            Some(&old) => {
                let score = old + increment;
                if score.is_nan() {
                    return Err(Error::NanScore);
                }
                self.reposition(member, old, score);
                Ok(score)
            }
            None => {
                self.index.insert(increment, member);
                self.scores.insert(member, increment);
                Ok(increment)
            }
        }
    }

    fn reposition(&mut self, member: M, old: f64, score: f64) {
        if old == score {
            return;
        }
        let removed = self.index.remove_member(old, member);
        debug_assert!(removed, "Member missing from the score index");
        self.index.insert(score, member);
        self.scores.insert(member, score);
    }

    /// Removes every member holding exactly `score`.
    ///
    /// Returns the removed members in the order they were added; empty if no
    /// member holds `score`.
    pub fn remove_by_score(&mut self, score: f64) -> Vec<M> {
        let members = self.index.remove_score(score);
        for member in &members {
            self.scores.remove(member);
        }
        members
    }

    /// Removes `member`, returning the score it held.
    pub fn remove_by_member(&mut self, member: M) -> Option<f64> {
        let score = self.scores.remove(&member)?;
        let removed = self.index.remove_member(score, member);
        debug_assert!(removed, "Member missing from the score index");
        Some(score)
    }
}

impl<M, G> SortedSet<M, G>
where
    M: Copy + Eq + Hash,
{
    /// Returns the number of members in the set.
    #[inline]
    pub fn len(&self) -> usize {
        debug_assert_eq!(self.index.len(), self.scores.len());
        self.scores.len()
    }

    /// Returns `true` if the set contains no members.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Returns `true` if `member` is in the set.
    #[inline]
    pub fn contains(&self, member: M) -> bool {
        self.scores.contains_key(&member)
    }

    /// The score held by `member`.
    #[inline]
    pub fn get_score(&self, member: M) -> Option<f64> {
        self.scores.get(&member).copied()
    }

    /// Every member holding exactly `score`, in the order they were added.
    pub fn search_by_score(&self, score: f64) -> Vec<M> {
        if self.is_empty() {
            return Vec::new();
        }
        self.index.search(score)
    }

    /// Every member sharing the score of `member`, `member` included, in the
    /// order they were added. Empty if `member` is not in the set.
    pub fn search_value(&self, member: M) -> Vec<M> {
        self.get_score(member)
            .map_or_else(Vec::new, |score| self.index.search(score))
    }

    /// Every `(score, member)` with a score in the half-open range between
    /// `lo` and `hi`.
    ///
    /// With `lo <= hi` the entries satisfy `lo <= score < hi` and come in
    /// ascending order. With `lo > hi` the entries satisfy `hi <= score < lo`
    /// and come in descending order, exactly the ascending result reversed.
    ///
    /// # Examples
    ///
    /// ```
    /// use zset::SortedSet;
    ///
    /// let set: SortedSet<char> = [(1.0, 'a'), (2.0, 'b'), (3.0, 'c')].into_iter().collect();
    /// assert_eq!(set.search_range_by_score(1.0, 3.0), vec![(1.0, 'a'), (2.0, 'b')]);
    /// assert_eq!(set.search_range_by_score(3.0, 1.0), vec![(2.0, 'b'), (1.0, 'a')]);
    /// ```
    pub fn search_range_by_score(&self, lo: f64, hi: f64) -> Vec<(f64, M)> {
        if lo > hi {
            self.index.search_range_rev(hi, lo)
        } else {
            self.index.search_range(lo, hi)
        }
    }

    /// Number of members with a score in the half-open range between `lo`
    /// and `hi`, with the bounds swapped if `lo > hi`.
    pub fn count(&self, lo: f64, hi: f64) -> usize {
        let (lo, hi) = if lo > hi { (hi, lo) } else { (lo, hi) };
        if lo.partial_cmp(&hi) != Some(Ordering::Less) {
            return 0;
        }
        self.index.count_below(hi) - self.index.count_below(lo)
    }

    /// The member at `rank` and its score.
    ///
    /// Ranks are 1-based; negative ranks count back from the end so that
    /// `-1` is the last member. Ranks past either end give `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use zset::SortedSet;
    ///
    /// let set: SortedSet<&str> = [(1.0, "a"), (2.0, "b"), (1.0, "c")].into_iter().collect();
    /// assert_eq!(set.rank(1), Some((1.0, "a")));
    /// assert_eq!(set.rank(2), Some((1.0, "c")));
    /// assert_eq!(set.rank(-1), Some((2.0, "b")));
    /// assert_eq!(set.rank(4), None);
    /// ```
    pub fn rank(&self, rank: i64) -> Option<(f64, M)> {
        if self.is_empty() {
            return None;
        }
        self.index.get_rank(rank)
    }

    /// Every `(score, member)` from rank `lo` through rank `hi`, inclusive,
    /// in ascending order.
    ///
    /// Both ranks follow the rules of [`rank`](Self::rank), after which the
    /// range is clipped to the set. An empty range gives an empty result.
    pub fn rank_range(&self, lo: i64, hi: i64) -> Vec<(f64, M)> {
        if self.is_empty() {
            return Vec::new();
        }
        self.index.rank_range(lo, hi)
    }

    /// Iterates over every `(score, member)` in rank order.
    #[inline]
    pub fn iter(&self) -> Iter<'_, M> {
        self.index.iter()
    }
}

// ///////////////////////////////////////////////
// Trait implementation
// ///////////////////////////////////////////////

impl<M> Default for SortedSet<M>
where
    M: Copy + Eq + Hash,
{
    #[inline]
    fn default() -> SortedSet<M> {
        SortedSet::new()
    }
}

/// Adds every pair in turn. Pairs with a NaN score and members already in the
/// set are skipped.
impl<M, G> Extend<(f64, M)> for SortedSet<M, G>
where
    M: Copy + Eq + Hash,
    G: LevelGenerator,
{
    #[inline]
    fn extend<I: iter::IntoIterator<Item = (f64, M)>>(&mut self, iterable: I) {
        for (score, member) in iterable {
            if score.is_nan() {
                continue;
            }
            self.add_ordered(score, member);
        }
    }
}

impl<M> iter::FromIterator<(f64, M)> for SortedSet<M>
where
    M: Copy + Eq + Hash,
{
    #[inline]
    fn from_iter<I>(iter: I) -> SortedSet<M>
    where
        I: iter::IntoIterator<Item = (f64, M)>,
    {
        let mut set = SortedSet::new();
        set.extend(iter);
        set
    }
}

impl<'a, M, G> iter::IntoIterator for &'a SortedSet<M, G>
where
    M: Copy + Eq + Hash,
{
    type Item = (f64, M);
    type IntoIter = Iter<'a, M>;

    fn into_iter(self) -> Iter<'a, M> {
        self.iter()
    }
}

/// Prints the number of members followed by the levels of the score index.
impl<M, G> fmt::Debug for SortedSet<M, G>
where
    M: Copy + Eq + Hash + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "SortedSet(len = {})", self.len())?;
        write!(f, "{:?}", self.index)
    }
}

impl<M, G> fmt::Display for SortedSet<M, G>
where
    M: Copy + Eq + Hash + fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[")?;

        for (i, (score, member)) in self.iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            write!(f, "({score}, {member})")?;
        }
        write!(f, "]")
    }
}

// ////////////////////////////////////////////////////////////////////////////
// Tests
// ////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;
    use rustc_hash::FxHashMap;

    use super::{AddStatus, SortedSet};
    use crate::{error::Error, level_generator::GeometricError};

    fn abc() -> SortedSet<&'static str> {
        let mut set = SortedSet::with_seed(7);
        for (score, member) in [(1.0, "a"), (2.0, "b"), (1.0, "c")] {
            assert_eq!(set.add(score, member), Ok(AddStatus::Added));
        }
        set.index.check();
        set
    }

    fn five() -> SortedSet<char> {
        [(5.0, 'e'), (1.0, 'a'), (3.0, 'c'), (2.0, 'b'), (4.0, 'd')]
            .into_iter()
            .collect()
    }

    #[test]
    fn new() {
        let set: SortedSet<u32> = SortedSet::new();
        set.index.check();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        assert_eq!(set.rank(1), None);
        assert!(set.rank_range(1, -1).is_empty());
        assert!(set.search_by_score(0.0).is_empty());
        assert_eq!(set.to_string(), "[]");

        let set: SortedSet<u32> = SortedSet::default();
        assert!(set.is_empty());
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(2)]
    #[case(1_000)]
    fn with_capacity(#[case] capacity: usize) {
        let mut set = SortedSet::with_capacity(capacity);
        set.extend((0..100_u32).map(|i| (f64::from(i % 10), i)));
        set.index.check();
        assert_eq!(set.len(), 100);
    }

    #[test]
    fn with_geometric() {
        assert!(SortedSet::<u32>::with_geometric(16, 0.25).is_ok());
        assert_eq!(
            SortedSet::<u32>::with_geometric(0, 0.5).err(),
            Some(Error::Generator(GeometricError::ZeroMax))
        );
        assert_eq!(
            SortedSet::<u32>::with_geometric(8, 1.5).err(),
            Some(Error::Generator(GeometricError::InvalidProbability))
        );
    }

    #[test]
    fn duplicate_score_scenario() {
        let mut set = abc();
        assert_eq!(set.len(), 3);
        assert_eq!(set.search_by_score(1.0), vec!["a", "c"]);
        assert_eq!(set.rank(1), Some((1.0, "a")));
        assert_eq!(set.rank(2), Some((1.0, "c")));
        assert_eq!(set.rank(3), Some((2.0, "b")));

        assert_eq!(set.remove_by_score(1.0), vec!["a", "c"]);
        set.index.check();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get_score("a"), None);
        assert_eq!(set.get_score("c"), None);
        assert_eq!(set.get_score("b"), Some(2.0));
    }

    #[test]
    fn last_two_by_negative_rank() {
        let set = five();
        assert_eq!(set.rank_range(-2, -1), vec![(4.0, 'd'), (5.0, 'e')]);
        assert_eq!(set.rank_range(-100, 100).len(), 5);
        assert!(set.rank_range(4, 2).is_empty());
    }

    #[test]
    fn add_is_idempotent() {
        let mut set = abc();
        assert_eq!(set.add(9.0, "a"), Ok(AddStatus::Exists(1.0)));
        assert_eq!(set.add(1.0, "a"), Ok(AddStatus::Exists(1.0)));
        set.index.check();
        assert_eq!(set.len(), 3);
        assert_eq!(set.rank(1), Some((1.0, "a")));
    }

    #[test]
    fn nan_scores_are_rejected() {
        let mut set = abc();
        assert_eq!(set.add(f64::NAN, "z"), Err(Error::NanScore));
        assert_eq!(set.update(f64::NAN, "a"), Err(Error::NanScore));
        assert_eq!(set.incr_by(f64::NAN, "a"), Err(Error::NanScore));

        assert_eq!(set.add(f64::INFINITY, "inf"), Ok(AddStatus::Added));
        assert_eq!(set.incr_by(f64::NEG_INFINITY, "inf"), Err(Error::NanScore));
        assert_eq!(set.get_score("inf"), Some(f64::INFINITY));

        set.index.check();
        assert_eq!(set.len(), 4);
        assert!(!set.contains("z"));
        assert!(set.search_by_score(f64::NAN).is_empty());
        assert_eq!(set.count(f64::NAN, 10.0), 0);
    }

    #[test]
    fn remove_by_member_round_trip() {
        let mut set = abc();
        assert_eq!(set.remove_by_member("a"), Some(1.0));
        set.index.check();
        assert_eq!(set.get_score("a"), None);
        assert_eq!(set.remove_by_member("a"), None);
        assert_eq!(set.search_by_score(1.0), vec!["c"]);
        assert_eq!(set.rank(1), Some((1.0, "c")));
        assert_eq!(set.len(), 2);

        assert_eq!(set.remove_by_member("nobody"), None);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn search_value_lists_score_mates() {
        let set = abc();
        assert_eq!(set.search_value("c"), vec!["a", "c"]);
        assert_eq!(set.search_value("b"), vec!["b"]);
        assert!(set.search_value("zzz").is_empty());
    }

    #[test]
    fn update_moves_members() -> Result<()> {
        let mut set = abc();
        assert_eq!(set.update(3.0, "a")?, Some(1.0));
        set.index.check();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![
            (1.0, "c"),
            (2.0, "b"),
            (3.0, "a")
        ]);

        // Moving onto a shared score queues behind the members already there.
        assert_eq!(set.update(2.0, "c")?, Some(1.0));
        set.index.check();
        assert_eq!(set.search_by_score(2.0), vec!["b", "c"]);

        // Same score: nothing moves.
        assert_eq!(set.update(2.0, "b")?, Some(2.0));
        assert_eq!(set.search_by_score(2.0), vec!["b", "c"]);

        assert_eq!(set.update(5.0, "nobody")?, None);
        assert!(!set.contains("nobody"));
        assert_eq!(set.len(), 3);
        Ok(())
    }

    #[test]
    fn incr_by_inserts_then_moves() -> Result<()> {
        let mut set = SortedSet::with_seed(3);
        assert_eq!(set.incr_by(1.0, 'x')?, 1.0);
        assert_eq!(set.incr_by(1.0, 'y')?, 1.0);
        assert_eq!(set.incr_by(0.5, 'x')?, 1.5);
        set.index.check();
        assert_eq!(set.rank(-1), Some((1.5, 'x')));
        assert_eq!(set.incr_by(-1.0, 'x')?, 0.5);
        assert_eq!(set.rank(1), Some((0.5, 'x')));
        assert_eq!(set.len(), 2);
        Ok(())
    }

    #[rstest]
    #[case(1.0, 3.0, 2)]
    #[case(3.0, 1.0, 2)]
    #[case(0.0, 100.0, 5)]
    #[case(2.5, 2.5, 0)]
    #[case(2.0, 2.5, 1)]
    #[case(6.0, 7.0, 0)]
    #[case(f64::NEG_INFINITY, f64::INFINITY, 5)]
    fn count(#[case] lo: f64, #[case] hi: f64, #[case] expected: usize) {
        assert_eq!(five().count(lo, hi), expected);
    }

    #[test]
    fn extend_skips_nan_and_known_members() {
        let mut set = abc();
        set.extend([(f64::NAN, "n"), (7.0, "a"), (0.5, "d"), (f64::NAN, "d")]);
        set.index.check();
        assert_eq!(set.len(), 4);
        assert!(!set.contains("n"));
        assert_eq!(set.get_score("a"), Some(1.0));
        assert_eq!(set.get_score("d"), Some(0.5));
        assert_eq!(set.rank(1), Some((0.5, "d")));
    }

    #[rstest]
    #[case(f64::NAN, 1.0)]
    #[case(1.0, f64::NAN)]
    #[case(f64::NAN, f64::NAN)]
    fn nan_bounds_find_nothing(#[case] lo: f64, #[case] hi: f64) {
        let set = five();
        assert_eq!(set.count(lo, hi), 0);
        assert!(set.search_range_by_score(lo, hi).is_empty());
    }

    #[test]
    fn emptying_the_set_lowers_the_level() {
        let mut set = SortedSet::with_seed(21);
        set.extend((0..256_u32).map(|i| (f64::from(i % 64), i)));
        set.index.check();
        assert!(set.index.level() > 1);

        // Members one at a time, then whole scores.
        for member in (0..256_u32).filter(|m| m % 3 == 0) {
            assert!(set.remove_by_member(member).is_some());
            set.index.check();
        }
        for score in 0..64_u32 {
            set.remove_by_score(f64::from(score));
            set.index.check();
        }
        assert!(set.is_empty());
        assert_eq!(set.index.level(), 1);

        assert_eq!(set.add(3.0, 9), Ok(AddStatus::Added));
        set.index.check();
        assert_eq!(set.rank(-1), Some((3.0, 9)));
    }

    #[test]
    fn reversed_range_is_descending() {
        let set = five();
        assert_eq!(set.search_range_by_score(2.0, 4.0), vec![(2.0, 'b'), (3.0, 'c')]);
        assert_eq!(set.search_range_by_score(4.0, 2.0), vec![(3.0, 'c'), (2.0, 'b')]);
        assert!(set.search_range_by_score(3.0, 3.0).is_empty());
    }

    #[test]
    fn clear() {
        let mut set = abc();
        set.clear();
        set.index.check();
        assert!(set.is_empty());
        assert_eq!(set.get_score("a"), None);
        assert_eq!(set.add(4.0, "a"), Ok(AddStatus::Added));
        assert_eq!(set.rank(1), Some((4.0, "a")));
    }

    #[test]
    fn display() {
        insta::assert_snapshot!(abc().to_string(), @"[(1, a), (1, c), (2, b)]");
        insta::assert_snapshot!(five().to_string(), @"[(1, a), (2, b), (3, c), (4, d), (5, e)]");
    }

    #[test]
    fn into_iter_by_reference() {
        let set = abc();
        let mut members = Vec::new();
        for (_, member) in &set {
            members.push(member);
        }
        assert_eq!(members, vec!["a", "c", "b"]);
        assert_eq!(set.iter().len(), 3);
    }

    #[test]
    fn seeded_sets_share_their_layout() {
        let build = || {
            let mut set = SortedSet::with_seed(99);
            set.extend((0..64_u32).map(|i| (f64::from(i / 3), i)));
            format!("{set:?}")
        };
        assert_eq!(build(), build());
    }

    // ///////////////////////////////////////////////
    // Model-based properties
    // ///////////////////////////////////////////////

    #[derive(Debug, Clone)]
    enum Op {
        Add(f64, u32),
        RemoveMember(u32),
        RemoveScore(f64),
        Update(f64, u32),
        IncrBy(f64, u32),
    }

    /// Members mapped to their score and the tick at which they took it.
    #[derive(Default)]
    struct Model {
        entries: FxHashMap<u32, (f64, u64)>,
        tick: u64,
    }

    impl Model {
        fn place(&mut self, member: u32, score: f64) {
            self.tick += 1;
            self.entries.insert(member, (score, self.tick));
        }

        fn sorted(&self) -> Vec<(f64, u32)> {
            let mut entries: Vec<_> = self
                .entries
                .iter()
                .map(|(&member, &(score, tick))| (score, tick, member))
                .collect();
            entries.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            entries
                .into_iter()
                .map(|(score, _, member)| (score, member))
                .collect()
        }
    }

    fn score() -> impl Strategy<Value = f64> {
        (-10..10_i32).prop_map(|s| f64::from(s) * 0.5)
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => (score(), 0..40_u32).prop_map(|(s, m)| Op::Add(s, m)),
            2 => (0..40_u32).prop_map(Op::RemoveMember),
            1 => score().prop_map(Op::RemoveScore),
            1 => (score(), 0..40_u32).prop_map(|(s, m)| Op::Update(s, m)),
            1 => (score(), 0..40_u32).prop_map(|(s, m)| Op::IncrBy(s, m)),
        ]
    }

    proptest! {
        #[test]
        fn matches_model(
            seed in any::<u64>(),
            ops in prop::collection::vec(op(), 0..300),
            lo in score(),
            hi in score(),
            lo_rank in -50..50_i64,
            hi_rank in -50..50_i64,
        ) {
            let mut set = SortedSet::with_seed(seed);
            let mut model = Model::default();

            for op in ops {
                match op {
                    Op::Add(score, member) => {
                        let expected = match model.entries.get(&member) {
                            Some(&(old, _)) => AddStatus::Exists(old),
                            None => {
                                model.place(member, score);
                                AddStatus::Added
                            }
                        };
                        prop_assert_eq!(set.add(score, member), Ok(expected));
                    }
                    Op::RemoveMember(member) => {
                        let expected = model.entries.remove(&member).map(|(old, _)| old);
                        prop_assert_eq!(set.remove_by_member(member), expected);
                    }
                    Op::RemoveScore(score) => {
                        let expected: Vec<u32> = model
                            .sorted()
                            .into_iter()
                            .filter(|&(s, _)| s == score)
                            .map(|(_, m)| m)
                            .collect();
                        model.entries.retain(|_, &mut (s, _)| s != score);
                        prop_assert_eq!(set.remove_by_score(score), expected);
                    }
                    Op::Update(score, member) => {
                        let expected = model.entries.get(&member).map(|&(old, _)| old);
                        if let Some(old) = expected {
                            if old != score {
                                model.place(member, score);
                            }
                        }
                        prop_assert_eq!(set.update(score, member), Ok(expected));
                    }
                    Op::IncrBy(increment, member) => {
                        let expected = match model.entries.get(&member) {
                            Some(&(old, _)) => {
                                if increment != 0.0 {
                                    model.place(member, old + increment);
                                }
                                old + increment
                            }
                            None => {
                                model.place(member, increment);
                                increment
                            }
                        };
                        prop_assert_eq!(set.incr_by(increment, member), Ok(expected));
                    }
                }
                prop_assert_eq!(set.len(), model.entries.len());
            }
            set.index.check();

            let sorted = model.sorted();
            prop_assert_eq!(set.iter().collect::<Vec<_>>(), sorted.clone());
            for (&member, &(score, _)) in &model.entries {
                prop_assert_eq!(set.get_score(member), Some(score));
            }

            let len = i64::try_from(sorted.len()).expect("small model");
            for (rank, &entry) in (1_i64..).zip(&sorted) {
                prop_assert_eq!(set.rank(rank), Some(entry));
                prop_assert_eq!(set.rank(rank - len - 1), Some(entry));
            }
            prop_assert_eq!(set.rank(0), None);
            prop_assert_eq!(set.rank(len + 1), None);

            let resolve = |rank: i64| if rank < 0 { len + rank + 1 } else { rank };
            let (first, last) = (resolve(lo_rank).max(1), resolve(hi_rank).min(len));
            let expected: Vec<_> = (1_i64..)
                .zip(&sorted)
                .filter(|(rank, _)| (first..=last).contains(rank))
                .map(|(_, &entry)| entry)
                .collect();
            prop_assert_eq!(set.rank_range(lo_rank, hi_rank), expected);

            let (low, high) = if lo > hi { (hi, lo) } else { (lo, hi) };
            let mut within: Vec<_> = sorted
                .iter()
                .copied()
                .filter(|&(s, _)| low <= s && s < high)
                .collect();
            prop_assert_eq!(set.count(lo, hi), within.len());
            if lo > hi {
                within.reverse();
            }
            prop_assert_eq!(set.search_range_by_score(lo, hi), within);
        }
    }
}
