//! The score index: an always-ordered skiplist whose links carry rank spans.
//!
//! Conceptually the index resembles something like:
//!
//! ```text
//! <head> -5------------------------------------------> [5] -1-> <end>
//! <head> -1-> [1] -2-----------> [3] -2--------------> [5] -1-> <end>
//! <head> -1-> [1] -1-> [2] -1-> [3,3'] -2-> [4] -1-> [5] -1-> <end>
//! ```
//!
//! where each node `[x]` holds every member with score `x` and each link
//! records how many ranks it jumps. Members sharing a score (`3'` above) hang
//! off their node in a chain, so a node is as wide as it has members and a
//! duplicate never costs a tower of links.
//!
//! The head sits at rank 0 and the first member at rank 1. A link without a
//! forward node jumps to the end position, one past the last rank.

use std::{cmp::Ordering, fmt};

use crate::{
    arena::Arena,
    level_generator::{LevelGenerator, MAX_LEVEL},
    skipnode::{HEAD, Iter, Link, NodeId, Occupants, Sibling, SiblingId, SkipNode},
};

/// The last node before some score on every level, with the rank of each.
struct Path {
    update: [NodeId; MAX_LEVEL],
    rank: [usize; MAX_LEVEL],
}

// ////////////////////////////////////////////////////////////////////////////
// OrderedSkipList
// ////////////////////////////////////////////////////////////////////////////

/// Skiplist of score nodes owning their duplicate chains.
///
/// The list never checks whether a member is already present; the sorted set
/// wrapping it keeps every member unique.
pub(crate) struct OrderedSkipList<M, G> {
    nodes: Arena<SkipNode<M>>,
    chain: Arena<Sibling<M>>,
    tail: Option<NodeId>,
    // Number of levels in use, never below 1.
    level: usize,
    // Number of members, duplicates included.
    len: usize,
    level_generator: G,
}

// ///////////////////////////////////////////////
// Inherent methods
// ///////////////////////////////////////////////

impl<M, G> OrderedSkipList<M, G> {
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    fn node(&self, id: NodeId) -> &SkipNode<M> {
        &self.nodes[id.0]
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> &mut SkipNode<M> {
        &mut self.nodes[id.0]
    }

    /// Creates an iterator over the entries of the skiplist.
    pub fn iter(&self) -> Iter<'_, M> {
        Iter {
            nodes: &self.nodes,
            chain: &self.chain,
            cursor: self.node(HEAD).links[0].forward.map(|first| (first, None)),
            size: self.len,
        }
    }

    /// Walks down from the highest level in use, stopping on each level at
    /// the last node whose score is below `score`.
    fn path(&self, score: f64) -> Path {
        let mut path = Path {
            update: [HEAD; MAX_LEVEL],
            rank: [0; MAX_LEVEL],
        };
        let mut node = HEAD;
        let mut traversed = 0;
        for level in (0..self.level).rev() {
            loop {
                let link = self.node(node).links[level];
                match link.forward {
                    Some(next) if self.node(next).score < score => {
                        traversed += link.span;
                        node = next;
                    }
                    _ => break,
                }
            }
            path.update[level] = node;
            path.rank[level] = traversed;
        }
        path
    }

    /// The node holding exactly `score`, given the path leading to it.
    fn found(&self, path: &Path, score: f64) -> Option<NodeId> {
        self.node(path.update[0]).links[0]
            .forward
            .filter(|&id| self.node(id).score == score)
    }

    /// Number of members whose score is below `score`.
    pub fn count_below(&self, score: f64) -> usize {
        let path = self.path(score);
        path.rank[0] + self.node(path.update[0]).links[0].span - 1
    }
}

impl<M: Copy, G> OrderedSkipList<M, G> {
    /// Finds the node holding `rank` and the offset of that rank within the
    /// node's members. `rank` must lie in `[1, len]`.
    fn locate(&self, rank: usize) -> (NodeId, usize) {
        if rank == self.len {
            if let Some(tail) = self.tail {
                return (tail, self.node(tail).width() - 1);
            }
        }
        let mut node = HEAD;
        let mut traversed = 0;
        for level in (0..self.level).rev() {
            loop {
                let link = self.node(node).links[level];
                match link.forward {
                    Some(next) if traversed + link.span <= rank => {
                        traversed += link.span;
                        node = next;
                    }
                    _ => break,
                }
            }
        }
        (node, rank - traversed)
    }

    /// Resolves a 1-based rank, negative ranks counting back from the end.
    fn normalize(&self, rank: i64) -> i64 {
        if rank < 0 {
            i64::try_from(self.len).map_or(i64::MIN, |len| len + rank + 1)
        } else {
            rank
        }
    }

    /// The member at `rank` and its score.
    ///
    /// Ranks are 1-based; `-1` is the last member. Ranks outside the list
    /// return `None`.
    pub fn get_rank(&self, rank: i64) -> Option<(f64, M)> {
        let rank = usize::try_from(self.normalize(rank))
            .ok()
            .filter(|rank| (1..=self.len).contains(rank))?;
        let (id, offset) = self.locate(rank);
        let node = self.node(id);
        let member = node.occupants().nth(offset, &self.chain)?;
        Some((node.score, member))
    }

    /// Every entry from rank `lo` through rank `hi`, both inclusive.
    ///
    /// Both bounds follow the rules of [`get_rank`](Self::get_rank), after
    /// which `lo` is clamped to the first rank and `hi` to the last.
    pub fn rank_range(&self, lo: i64, hi: i64) -> Vec<(f64, M)> {
        let lo = usize::try_from(self.normalize(lo)).unwrap_or(0).max(1);
        let hi = match usize::try_from(self.normalize(hi)) {
            Ok(hi) => hi.min(self.len),
            Err(_) => return Vec::new(),
        };
        if lo > hi {
            return Vec::new();
        }
        self.iter_from(lo).take(hi - lo + 1).collect()
    }

    /// Iterator starting at `rank`, which must lie in `[1, len]`.
    fn iter_from(&self, rank: usize) -> Iter<'_, M> {
        let (id, offset) = self.locate(rank);
        let mut sibling: Option<SiblingId> = None;
        for _ in 0..offset {
            sibling = match sibling {
                None => self.node(id).occupants().first_sibling(),
                Some(at) => self.chain[at.0].next,
            };
        }
        Iter {
            nodes: &self.nodes,
            chain: &self.chain,
            cursor: Some((id, sibling)),
            size: self.len - rank + 1,
        }
    }

    /// Every member holding exactly `score`, in insertion order.
    pub fn search(&self, score: f64) -> Vec<M> {
        let path = self.path(score);
        self.found(&path, score).map_or_else(Vec::new, |id| {
            self.node(id).occupants().members(&self.chain)
        })
    }

    /// Every entry with `lo <= score < hi`, in ascending order.
    pub fn search_range(&self, lo: f64, hi: f64) -> Vec<(f64, M)> {
        if lo.partial_cmp(&hi) != Some(Ordering::Less) {
            return Vec::new();
        }
        let path = self.path(lo);
        let start = self.node(path.update[0]).links[0];
        let below = path.rank[0] + start.span - 1;
        Iter {
            nodes: &self.nodes,
            chain: &self.chain,
            cursor: start.forward.map(|first| (first, None)),
            size: self.len - below,
        }
        .take_while(|&(score, _)| score < hi)
        .collect()
    }

    /// Every entry with `lo <= score < hi`, in descending order.
    ///
    /// This is exactly [`search_range`](Self::search_range) reversed, walked
    /// through the backward links from the last node below `hi`.
    pub fn search_range_rev(&self, lo: f64, hi: f64) -> Vec<(f64, M)> {
        let mut entries = Vec::new();
        if lo.partial_cmp(&hi) != Some(Ordering::Less) {
            return entries;
        }
        let mut cursor = self.path(hi).update[0];
        while cursor != HEAD {
            let node = self.node(cursor);
            if node.score < lo {
                break;
            }
            let members = node.occupants().members(&self.chain);
            entries.extend(members.into_iter().rev().map(|member| (node.score, member)));
            cursor = node
                .prev
                .unwrap_or_else(|| panic!("Node at score {} lost its backward link", node.score));
        }
        entries
    }
}

impl<M: Copy + PartialEq, G: LevelGenerator> OrderedSkipList<M, G> {
    /// Create an empty skiplist drawing node heights from `level_generator`,
    /// with room for `capacity` distinct scores.
    pub fn new(level_generator: G, capacity: usize) -> Self {
        let total = level_generator.total().clamp(1, MAX_LEVEL);
        let mut nodes = Arena::with_capacity(capacity + 1);
        let head = nodes.insert(SkipNode::head(total));
        debug_assert_eq!(head, HEAD.0);
        let mut list = OrderedSkipList {
            nodes,
            chain: Arena::with_capacity(0),
            tail: None,
            level: 1,
            len: 0,
            level_generator,
        };
        list.node_mut(HEAD).links[0].span = 1;
        list
    }

    /// Clears the skiplist, removing all members.
    pub fn clear(&mut self) {
        let total = self.node(HEAD).height();
        self.nodes.clear();
        self.chain.clear();
        self.nodes.insert(SkipNode::head(total));
        self.node_mut(HEAD).links[0].span = 1;
        self.tail = None;
        self.level = 1;
        self.len = 0;
    }

    /// Inserts `member` with `score`.
    ///
    /// A score already present gains `member` at the end of its duplicate
    /// chain; a new score gets a node of randomly drawn height.
    pub fn insert(&mut self, score: f64, member: M) {
        let mut path = self.path(score);
        let prev = path.update[0];

        if let Some(id) = self.found(&path, score) {
            let node = &mut self.nodes[id.0];
            let mut occupants = node.occupants();
            occupants.push(member, &mut self.chain);
            node.occupants = Some(occupants);
            let height = node.height();
            for link in &mut node.links {
                link.span += 1;
            }
            // Links passing over the node jump one rank further.
            for level in height..self.level {
                self.node_mut(path.update[level]).links[level].span += 1;
            }
            self.len += 1;
            return;
        }

        let total = self.node(HEAD).height();
        let height = (self.level_generator.level() + 1).min(total);
        let rank = path.rank[0] + self.node(prev).links[0].span;

        if height > self.level {
            for level in self.level..height {
                path.update[level] = HEAD;
                path.rank[level] = 0;
                self.node_mut(HEAD).links[level] = Link {
                    forward: None,
                    span: self.len + 1,
                };
            }
            self.level = height;
        }

        let id = NodeId(self.nodes.insert(SkipNode::new(score, member, height)));
        for level in 0..height {
            let before = path.update[level];
            let old = self.node(before).links[level];
            self.node_mut(id).links[level] = Link {
                forward: old.forward,
                span: path.rank[level] + old.span + 1 - rank,
            };
            self.node_mut(before).links[level] = Link {
                forward: Some(id),
                span: rank - path.rank[level],
            };
        }
        for level in height..self.level {
            self.node_mut(path.update[level]).links[level].span += 1;
        }

        self.node_mut(id).prev = Some(prev);
        match self.node(id).links[0].forward {
            Some(next) => self.node_mut(next).prev = Some(id),
            None => self.tail = Some(id),
        }
        self.len += 1;
    }

    /// Removes the node holding `score` together with its whole chain.
    ///
    /// Returns the removed members in insertion order, empty if the score is
    /// absent.
    pub fn remove_score(&mut self, score: f64) -> Vec<M> {
        let path = self.path(score);
        match self.found(&path, score) {
            Some(id) => self.unlink_node(&path, id).drain(&mut self.chain),
            None => Vec::new(),
        }
    }

    /// Removes the single `member` filed under `score`.
    ///
    /// Returns `false` if no such member exists, in which case nothing
    /// changes.
    pub fn remove_member(&mut self, score: f64, member: M) -> bool {
        let path = self.path(score);
        let Some(id) = self.found(&path, score) else {
            return false;
        };

        let mut occupants = self.node(id).occupants();
        if occupants.head() == member {
            match occupants.promote(&mut self.chain) {
                Some(promoted) => {
                    self.node_mut(id).occupants = Some(promoted);
                    self.narrow(&path, id);
                }
                None => {
                    self.unlink_node(&path, id);
                }
            }
            true
        } else if occupants.unlink(member, &mut self.chain) {
            self.node_mut(id).occupants = Some(occupants);
            self.narrow(&path, id);
            true
        } else {
            false
        }
    }

    /// Accounts for a node losing one member while staying in place.
    fn narrow(&mut self, path: &Path, id: NodeId) {
        let node = self.node_mut(id);
        let height = node.height();
        for link in &mut node.links {
            link.span -= 1;
        }
        for level in height..self.level {
            self.node_mut(path.update[level]).links[level].span -= 1;
        }
        self.len -= 1;
    }

    /// Detaches a node from every level and frees its slot, handing back its
    /// members for the caller to release.
    fn unlink_node(&mut self, path: &Path, id: NodeId) -> Occupants<M> {
        let node = self.nodes.take(id.0);
        let width = node.width();

        for level in 0..self.level {
            let link = &mut self.node_mut(path.update[level]).links[level];
            if link.forward == Some(id) {
                link.span = link.span + node.links[level].span - width;
                link.forward = node.links[level].forward;
            } else {
                link.span -= width;
            }
        }

        match node.links[0].forward {
            Some(next) => self.node_mut(next).prev = node.prev,
            None => self.tail = node.prev.filter(|&prev| prev != HEAD),
        }

        while self.level > 1 && self.node(HEAD).links[self.level - 1].forward.is_none() {
            let top = self.level - 1;
            self.node_mut(HEAD).links[top] = Link::default();
            self.level = top;
        }

        self.len -= width;
        node.occupants()
    }
}

// ///////////////////////////////////////////////
// Internal methods
// ///////////////////////////////////////////////

#[cfg(test)]
impl<M: Copy, G> OrderedSkipList<M, G> {
    /// Number of levels in use.
    pub fn level(&self) -> usize {
        self.level
    }

    /// Checks the integrity of the skiplist.
    pub fn check(&self) {
        use rustc_hash::FxHashMap;

        let head = self.node(HEAD);
        assert!(head.is_head(), "The first slot must hold the head");
        assert!((1..=head.height()).contains(&self.level));
        for level in self.level..head.height() {
            assert_eq!(head.links[level].forward, None, "Unused level {level} is linked");
        }
        if self.level > 1 {
            assert!(
                head.links[self.level - 1].forward.is_some(),
                "Top level {} is empty",
                self.level - 1
            );
        }

        // Level 0 visits every node; it fixes the rank of each.
        let mut ranks = FxHashMap::default();
        ranks.insert(HEAD, 0);
        let mut node = HEAD;
        let mut units = 0;
        let mut siblings = 0;
        while let Some(next) = self.node(node).links[0].forward {
            let current = self.node(next);
            assert_eq!(current.prev, Some(node), "Backward link at rank {}", units + 1);
            assert!(!current.is_head());
            assert!((1..=head.height()).contains(&current.height()));
            if node != HEAD {
                assert!(self.node(node).score < current.score, "Scores out of order");
            }
            ranks.insert(next, units + 1);
            units += current.width();
            siblings += current.width() - 1;
            node = next;
        }
        assert_eq!(units, self.len);
        assert_eq!(self.tail, (node != HEAD).then_some(node));
        assert_eq!(self.nodes.len(), ranks.len());
        assert_eq!(self.chain.len(), siblings);

        for level in 0..self.level {
            let mut node = HEAD;
            let mut visited = 0;
            loop {
                let link = self.node(node).links[level];
                let from = ranks[&node];
                match link.forward {
                    Some(next) => {
                        assert!(self.node(next).height() > level);
                        assert!(ranks[&next] > from, "Level {level} goes backwards");
                        assert_eq!(
                            link.span,
                            ranks[&next] - from,
                            "Span of the level {level} link leaving rank {from}"
                        );
                        visited += 1;
                        node = next;
                    }
                    None => {
                        assert_eq!(
                            link.span,
                            self.len + 1 - from,
                            "Span of the last level {level} link leaving rank {from}"
                        );
                        break;
                    }
                }
            }
            let expected = ranks
                .keys()
                .filter(|&&id| id != HEAD && self.node(id).height() > level)
                .count();
            assert_eq!(visited, expected, "Level {level} skips a node");
        }
    }
}

// ///////////////////////////////////////////////
// Trait implementation
// ///////////////////////////////////////////////

/// Prints the internal structure of the skiplist, highest level first.
impl<M, G> fmt::Debug for OrderedSkipList<M, G>
where
    M: Copy + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for level in (0..self.level).rev() {
            write!(f, "L{level}: <head>")?;
            let mut node = HEAD;
            loop {
                let link = self.node(node).links[level];
                write!(f, " -{}->", link.span)?;
                match link.forward {
                    Some(next) => {
                        let current = self.node(next);
                        write!(
                            f,
                            " [{} {:?}]",
                            current.score,
                            current.occupants().members(&self.chain)
                        )?;
                        node = next;
                    }
                    None => {
                        write!(f, " <end>")?;
                        break;
                    }
                }
            }
            if level > 0 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

// ////////////////////////////////////////////////////////////////////////////
// Tests
// ////////////////////////////////////////////////////////////////////////////
