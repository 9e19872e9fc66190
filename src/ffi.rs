//! C interface for hosts that embed the sorted set.
//!
//! The host holds an opaque handle created by [`zset_create`] and released by
//! [`zset_destroy`]. Members cross the boundary as `u32` identifiers; the
//! host keeps whatever content they stand for.
//!
//! Nothing here reports errors through a status code. Instead two reserved
//! scores travel in place of a real one:
//!
//! - [`ZSET_NOT_FOUND`] when there is no score to report,
//! - [`ZSET_SUCCESS`] when a write succeeded without a score to report.
//!
//! A stored score equal to either sentinel cannot be told apart from the
//! status. Rank lookups report a missing member as [`ZSET_NO_MEMBER`].
//!
//! Lists are handed out as owned arrays together with their length. Each one
//! must be given back exactly once through [`zset_free_members`] or
//! [`zset_free_entries`]; an empty list is a null pointer.

use std::ptr;

use crate::sorted_set::{AddStatus, SortedSet};

/// Score returned when the requested member or score does not exist.
pub const ZSET_NOT_FOUND: f64 = f64::MIN_POSITIVE;

/// Score returned when a write succeeded and has no score to report.
pub const ZSET_SUCCESS: f64 = f64::MAX;

/// Member returned when a rank lies outside the set.
pub const ZSET_NO_MEMBER: u32 = u32::MAX;

/// Opaque sorted set handle.
pub type ZSet = SortedSet<u32>;

/// A `(score, member)` pair as laid out for C.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZEntry {
    /// Score of the member.
    pub score: f64,
    /// The member identifier.
    pub member: u32,
}

impl From<(f64, u32)> for ZEntry {
    #[inline]
    fn from((score, member): (f64, u32)) -> Self {
        ZEntry { score, member }
    }
}

/// Moves `items` onto the heap for the host, storing their number in `len`.
///
/// # Safety
///
/// `len` must be null or valid for a write.
unsafe fn hand_out<T>(items: Vec<T>, len: *mut usize) -> *mut T {
    if !len.is_null() {
        // SAFETY: the caller guarantees `len` is writable.
        unsafe { len.write(items.len()) };
    }
    if items.is_empty() {
        return ptr::null_mut();
    }
    Box::into_raw(items.into_boxed_slice()).cast::<T>()
}

/// Takes back an array produced by [`hand_out`].
///
/// # Safety
///
/// `items` must be null or come from [`hand_out`] with this very `len`, and
/// must not have been taken back before.
unsafe fn take_back<T>(items: *mut T, len: usize) {
    if items.is_null() {
        return;
    }
    // SAFETY: the array was allocated as a boxed slice of `len` elements.
    drop(unsafe { Box::from_raw(ptr::slice_from_raw_parts_mut(items, len)) });
}

// ////////////////////////////////////////////////////////////////////////////
// Lifecycle
// ////////////////////////////////////////////////////////////////////////////

/// Creates an empty sorted set.
#[unsafe(no_mangle)]
pub extern "C" fn zset_create() -> *mut ZSet {
    Box::into_raw(Box::new(ZSet::new()))
}

/// Releases a sorted set. A null handle is ignored.
///
/// # Safety
///
/// `set` must be null or a handle from [`zset_create`] that has not been
/// destroyed yet. The handle must not be used afterwards.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zset_destroy(set: *mut ZSet) {
    if !set.is_null() {
        // SAFETY: the handle was boxed by `zset_create`.
        drop(unsafe { Box::from_raw(set) });
    }
}

/// Number of members in the set.
///
/// # Safety
///
/// `set` must be null or a live handle. A null handle holds nothing.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zset_len(set: *const ZSet) -> usize {
    // SAFETY: the caller guarantees the handle is live.
    unsafe { set.as_ref() }.map_or(0, ZSet::len)
}

// ////////////////////////////////////////////////////////////////////////////
// Writes
// ////////////////////////////////////////////////////////////////////////////

/// Adds `member` with `score`.
///
/// Returns [`ZSET_SUCCESS`] when the member was added and the score it already
/// holds when it was present. A NaN score is refused with
/// [`ZSET_NOT_FOUND`].
///
/// # Safety
///
/// `set` must be null or a live handle, not in use elsewhere.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zset_add(set: *mut ZSet, score: f64, member: u32) -> f64 {
    // SAFETY: the caller guarantees exclusive access to a live handle.
    let Some(set) = (unsafe { set.as_mut() }) else {
        return ZSET_NOT_FOUND;
    };
    match set.add(score, member) {
        Ok(AddStatus::Added) => ZSET_SUCCESS,
        Ok(AddStatus::Exists(existing)) => existing,
        Err(_) => ZSET_NOT_FOUND,
    }
}

/// Moves an existing `member` to `score`.
///
/// Returns the score the member held before, or [`ZSET_NOT_FOUND`] if it is
/// absent or `score` is NaN.
///
/// # Safety
///
/// `set` must be null or a live handle, not in use elsewhere.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zset_update(set: *mut ZSet, score: f64, member: u32) -> f64 {
    // SAFETY: the caller guarantees exclusive access to a live handle.
    let Some(set) = (unsafe { set.as_mut() }) else {
        return ZSET_NOT_FOUND;
    };
    set.update(score, member)
        .ok()
        .flatten()
        .unwrap_or(ZSET_NOT_FOUND)
}

/// Adds `increment` to the score of `member`, adding the member if needed.
///
/// Returns the new score, or [`ZSET_NOT_FOUND`] if it would be NaN.
///
/// # Safety
///
/// `set` must be null or a live handle, not in use elsewhere.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zset_incr_by(set: *mut ZSet, increment: f64, member: u32) -> f64 {
    // SAFETY: the caller guarantees exclusive access to a live handle.
    let Some(set) = (unsafe { set.as_mut() }) else {
        return ZSET_NOT_FOUND;
    };
    set.incr_by(increment, member).unwrap_or(ZSET_NOT_FOUND)
}

/// Removes every member holding exactly `score`.
///
/// Returns the removed members, their number stored in `len`.
///
/// # Safety
///
/// `set` must be null or a live handle, not in use elsewhere, and `len`
/// must be null or valid for a write.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zset_remove_by_score(
    set: *mut ZSet,
    score: f64,
    len: *mut usize,
) -> *mut u32 {
    // SAFETY: the caller guarantees exclusive access to a live handle.
    let members = unsafe { set.as_mut() }.map_or_else(Vec::new, |set| set.remove_by_score(score));
    // SAFETY: the caller guarantees `len` is writable.
    unsafe { hand_out(members, len) }
}

/// Removes `member`, returning the score it held or [`ZSET_NOT_FOUND`].
///
/// # Safety
///
/// `set` must be null or a live handle, not in use elsewhere.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zset_remove_by_member(set: *mut ZSet, member: u32) -> f64 {
    // SAFETY: the caller guarantees exclusive access to a live handle.
    unsafe { set.as_mut() }
        .and_then(|set| set.remove_by_member(member))
        .unwrap_or(ZSET_NOT_FOUND)
}

// ////////////////////////////////////////////////////////////////////////////
// Reads
// ////////////////////////////////////////////////////////////////////////////

/// The score of `member`, or [`ZSET_NOT_FOUND`].
///
/// # Safety
///
/// `set` must be null or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zset_get_score(set: *const ZSet, member: u32) -> f64 {
    // SAFETY: the caller guarantees the handle is live.
    unsafe { set.as_ref() }
        .and_then(|set| set.get_score(member))
        .unwrap_or(ZSET_NOT_FOUND)
}

/// Whether `member` is in the set.
///
/// # Safety
///
/// `set` must be null or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zset_contains(set: *const ZSet, member: u32) -> bool {
    // SAFETY: the caller guarantees the handle is live.
    unsafe { set.as_ref() }.is_some_and(|set| set.contains(member))
}

/// Every member holding exactly `score`, their number stored in `len`.
///
/// # Safety
///
/// `set` must be null or a live handle, and `len` must be null or valid for
/// a write.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zset_search_by_score(
    set: *const ZSet,
    score: f64,
    len: *mut usize,
) -> *mut u32 {
    // SAFETY: the caller guarantees the handle is live.
    let members = unsafe { set.as_ref() }.map_or_else(Vec::new, |set| set.search_by_score(score));
    // SAFETY: the caller guarantees `len` is writable.
    unsafe { hand_out(members, len) }
}

/// Entries with `lo <= score < hi` in ascending order, or with
/// `hi <= score < lo` in descending order when `lo > hi`.
///
/// # Safety
///
/// `set` must be null or a live handle, and `len` must be null or valid for
/// a write.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zset_search_range_by_score(
    set: *const ZSet,
    lo: f64,
    hi: f64,
    len: *mut usize,
) -> *mut ZEntry {
    // SAFETY: the caller guarantees the handle is live.
    let entries = unsafe { set.as_ref() }.map_or_else(Vec::new, |set| {
        set.search_range_by_score(lo, hi)
            .into_iter()
            .map(ZEntry::from)
            .collect()
    });
    // SAFETY: the caller guarantees `len` is writable.
    unsafe { hand_out(entries, len) }
}

/// Number of members with a score between `lo` (inclusive) and `hi`
/// (exclusive), the bounds swapped if `lo > hi`.
///
/// # Safety
///
/// `set` must be null or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zset_count(set: *const ZSet, lo: f64, hi: f64) -> usize {
    // SAFETY: the caller guarantees the handle is live.
    unsafe { set.as_ref() }.map_or(0, |set| set.count(lo, hi))
}

/// The member at 1-based `rank` (negative counts from the end), or
/// [`ZSET_NO_MEMBER`].
///
/// # Safety
///
/// `set` must be null or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zset_rank(set: *const ZSet, rank: i64) -> u32 {
    // SAFETY: the caller guarantees the handle is live.
    unsafe { set.as_ref() }
        .and_then(|set| set.rank(rank))
        .map_or(ZSET_NO_MEMBER, |(_, member)| member)
}

/// Entries from rank `lo` through rank `hi`, clipped to the set, their
/// number stored in `len`.
///
/// # Safety
///
/// `set` must be null or a live handle, and `len` must be null or valid for
/// a write.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zset_rank_range(
    set: *const ZSet,
    lo: i64,
    hi: i64,
    len: *mut usize,
) -> *mut ZEntry {
    // SAFETY: the caller guarantees the handle is live.
    let entries = unsafe { set.as_ref() }.map_or_else(Vec::new, |set| {
        set.rank_range(lo, hi).into_iter().map(ZEntry::from).collect()
    });
    // SAFETY: the caller guarantees `len` is writable.
    unsafe { hand_out(entries, len) }
}

// ////////////////////////////////////////////////////////////////////////////
// Releasing lists
// ////////////////////////////////////////////////////////////////////////////

/// Releases a member list. A null pointer is ignored.
///
/// # Safety
///
/// `members` and `len` must be exactly as handed out by one of the calls
/// returning members, and the list must not have been released before.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zset_free_members(members: *mut u32, len: usize) {
    // SAFETY: forwarded from the caller.
    unsafe { take_back(members, len) }
}

/// Releases an entry list. A null pointer is ignored.
///
/// # Safety
///
/// `entries` and `len` must be exactly as handed out by one of the calls
/// returning entries, and the list must not have been released before.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zset_free_entries(entries: *mut ZEntry, len: usize) {
    // SAFETY: forwarded from the caller.
    unsafe { take_back(entries, len) }
}

// ////////////////////////////////////////////////////////////////////////////
// Tests
// ////////////////////////////////////////////////////////////////////////////
