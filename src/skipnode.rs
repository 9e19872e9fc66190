//! Score nodes, their duplicate chains, and the in-order iterator over both.

use crate::arena::Arena;

// ////////////////////////////////////////////////////////////////////////////
// Handles
// ////////////////////////////////////////////////////////////////////////////

/// Handle of a [`SkipNode`] inside the node arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(pub usize);

/// The head node always occupies the first slot of the node arena.
pub(crate) const HEAD: NodeId = NodeId(0);

/// Handle of a [`Sibling`] inside the chain arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct SiblingId(pub usize);

/// One level of a node: where it leads and how many ranks it jumps.
///
/// A link with no forward node spans to the end of the list, i.e. the rank
/// just past the last member.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Link {
    pub forward: Option<NodeId>,
    pub span: usize,
}

// ////////////////////////////////////////////////////////////////////////////
// Duplicate chain
// ////////////////////////////////////////////////////////////////////////////

/// A member sharing the score of the node owning its chain.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Sibling<M> {
    pub member: M,
    pub next: Option<SiblingId>,
}

/// The members held by a score node.
///
/// Most scores are unique, so the common case carries no chain at all. The
/// chain keeps its tail handle so that appending a duplicate never walks it.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Occupants<M> {
    /// A single member holds this score.
    Sole(M),
    /// The first member to arrive plus `siblings` later arrivals, in insertion
    /// order.
    Chained {
        head: M,
        first: SiblingId,
        last: SiblingId,
        siblings: usize,
    },
}

impl<M: Copy> Occupants<M> {
    /// The member stored in the node itself.
    pub fn head(&self) -> M {
        match *self {
            Occupants::Sole(head) | Occupants::Chained { head, .. } => head,
        }
    }

    pub fn first_sibling(&self) -> Option<SiblingId> {
        match *self {
            Occupants::Sole(_) => None,
            Occupants::Chained { first, .. } => Some(first),
        }
    }

    /// Number of ranks occupied by the node.
    pub fn width(&self) -> usize {
        match *self {
            Occupants::Sole(_) => 1,
            Occupants::Chained { siblings, .. } => siblings + 1,
        }
    }

    /// Appends a duplicate to the end of the chain.
    pub fn push(&mut self, member: M, chain: &mut Arena<Sibling<M>>) {
        let id = SiblingId(chain.insert(Sibling { member, next: None }));
        *self = match *self {
            Occupants::Sole(head) => Occupants::Chained {
                head,
                first: id,
                last: id,
                siblings: 1,
            },
            Occupants::Chained {
                head,
                first,
                last,
                siblings,
            } => {
                chain[last.0].next = Some(id);
                Occupants::Chained {
                    head,
                    first,
                    last: id,
                    siblings: siblings + 1,
                }
            }
        };
    }

    /// The member at `offset` ranks past the head, if the node is that wide.
    pub fn nth(&self, offset: usize, chain: &Arena<Sibling<M>>) -> Option<M> {
        if offset == 0 {
            return Some(self.head());
        }
        let mut cursor = self.first_sibling();
        for _ in 1..offset {
            cursor = chain[cursor?.0].next;
        }
        cursor.map(|id| chain[id.0].member)
    }

    /// All members in insertion order.
    pub fn members(&self, chain: &Arena<Sibling<M>>) -> Vec<M> {
        let mut members = Vec::with_capacity(self.width());
        members.push(self.head());
        let mut cursor = self.first_sibling();
        while let Some(id) = cursor {
            let sibling = chain[id.0];
            members.push(sibling.member);
            cursor = sibling.next;
        }
        members
    }

    /// Drops the head member and promotes the first sibling in its place.
    ///
    /// Returns `None` if the head was the only member.
    pub fn promote(self, chain: &mut Arena<Sibling<M>>) -> Option<Self> {
        match self {
            Occupants::Sole(_) => None,
            Occupants::Chained {
                first,
                last,
                siblings,
                ..
            } => {
                let Sibling { member, next } = chain.take(first.0);
                Some(match next {
                    None => Occupants::Sole(member),
                    Some(next) => Occupants::Chained {
                        head: member,
                        first: next,
                        last,
                        siblings: siblings - 1,
                    },
                })
            }
        }
    }

    /// Releases the chain, returning every member in insertion order.
    pub fn drain(self, chain: &mut Arena<Sibling<M>>) -> Vec<M> {
        let mut members = Vec::with_capacity(self.width());
        members.push(self.head());
        let mut cursor = self.first_sibling();
        while let Some(id) = cursor {
            let sibling = chain.take(id.0);
            members.push(sibling.member);
            cursor = sibling.next;
        }
        members
    }
}

impl<M: Copy + PartialEq> Occupants<M> {
    /// Splices `member` out of the chain. The head member is never considered;
    /// use [`Occupants::promote`] for it.
    ///
    /// Returns `false` if no sibling matched.
    pub fn unlink(&mut self, member: M, chain: &mut Arena<Sibling<M>>) -> bool {
        let Occupants::Chained {
            head,
            first,
            last,
            siblings,
        } = *self
        else {
            return false;
        };

        let mut prev: Option<SiblingId> = None;
        let mut cursor = Some(first);
        while let Some(id) = cursor {
            let Sibling {
                member: current,
                next,
            } = chain[id.0];
            if current != member {
                prev = Some(id);
                cursor = next;
                continue;
            }

            chain.take(id.0);
            *self = match (prev, next) {
                (None, None) => Occupants::Sole(head),
                (None, Some(next)) => Occupants::Chained {
                    head,
                    first: next,
                    last,
                    siblings: siblings - 1,
                },
                (Some(prev), next) => {
                    chain[prev.0].next = next;
                    Occupants::Chained {
                        head,
                        first,
                        last: if next.is_none() { prev } else { last },
                        siblings: siblings - 1,
                    }
                }
            };
            return true;
        }
        false
    }
}

// ////////////////////////////////////////////////////////////////////////////
// SkipNode
// ////////////////////////////////////////////////////////////////////////////

/// An entry of the score index holding every member with one distinct score.
///
/// The node has a height which is drawn once when the node is created. A node
/// of height `h` has `h` links, one per level, and link `i` records both the
/// next node reaching level `i` and the rank distance to it.
///
/// Lastly, each node keeps its level-0 predecessor so the list can be walked
/// backwards. The head's predecessor is `None`; the first node's is the head.
#[derive(Clone, Debug)]
pub(crate) struct SkipNode<M> {
    pub score: f64,
    // Occupants should never be None, with the sole exception being the head
    // node.
    pub occupants: Option<Occupants<M>>,
    pub links: Vec<Link>,
    pub prev: Option<NodeId>,
}

impl<M> SkipNode<M> {
    /// Create a new head node reaching every level.
    pub fn head(total_levels: usize) -> Self {
        SkipNode {
            score: f64::NEG_INFINITY,
            occupants: None,
            links: vec![Link::default(); total_levels],
            prev: None,
        }
    }

    /// Create a node of the given height for a freshly inserted score.
    pub fn new(score: f64, member: M, height: usize) -> Self {
        SkipNode {
            score,
            occupants: Some(Occupants::Sole(member)),
            links: vec![Link::default(); height],
            prev: None,
        }
    }

    pub fn height(&self) -> usize {
        self.links.len()
    }

    #[cfg(test)]
    pub fn is_head(&self) -> bool {
        self.occupants.is_none()
    }
}

impl<M: Copy> SkipNode<M> {
    /// Members of a score node.
    ///
    /// # Panics
    ///
    /// Panics when called on the head node.
    pub fn occupants(&self) -> Occupants<M> {
        self.occupants
            .unwrap_or_else(|| panic!("The head node holds no members"))
    }

    /// Ranks occupied by the node, zero for the head.
    pub fn width(&self) -> usize {
        self.occupants.as_ref().map_or(0, Occupants::width)
    }
}

// /////////////////////////////////
// Iterators
// /////////////////////////////////

/// Iterator over `(score, member)` pairs in rank order.
///
/// Members sharing a score come out in the order they were inserted.
#[derive(Clone, Debug)]
pub struct Iter<'a, M> {
    pub(crate) nodes: &'a Arena<SkipNode<M>>,
    pub(crate) chain: &'a Arena<Sibling<M>>,
    // `None` in the second position stands for the node's head member.
    pub(crate) cursor: Option<(NodeId, Option<SiblingId>)>,
    pub(crate) size: usize,
}

impl<M: Copy> Iterator for Iter<'_, M> {
    type Item = (f64, M);

    fn next(&mut self) -> Option<Self::Item> {
        if self.size == 0 {
            return None;
        }
        let (id, at) = self.cursor?;
        let node = &self.nodes[id.0];
        let (member, after) = match at {
            None => {
                let occupants = node.occupants();
                (occupants.head(), occupants.first_sibling())
            }
            Some(sibling) => {
                let sibling = self.chain[sibling.0];
                (sibling.member, sibling.next)
            }
        };
        self.cursor = match after {
            Some(sibling) => Some((id, Some(sibling))),
            None => node.links[0].forward.map(|next| (next, None)),
        };
        self.size -= 1;
        Some((node.score, member))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.size, Some(self.size))
    }
}

impl<M: Copy> ExactSizeIterator for Iter<'_, M> {}
