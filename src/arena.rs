//! A slot store addressed by integer handles.
//!
//! Nodes and duplicate-chain entries live in arenas instead of behind raw
//! pointers, so every link in the skiplist is a plain index. Removed slots are
//! recycled before the backing vector grows.

use std::ops;

#[derive(Debug, Clone)]
pub(crate) struct Arena<T> {
    slots: Vec<Option<T>>,
    vacant: Vec<usize>,
}

impl<T> Arena<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Arena {
            slots: Vec::with_capacity(capacity),
            vacant: Vec::new(),
        }
    }

    /// Stores `value`, reusing a vacant slot when one exists.
    pub fn insert(&mut self, value: T) -> usize {
        if let Some(index) = self.vacant.pop() {
            self.slots[index] = Some(value);
            index
        } else {
            self.slots.push(Some(value));
            self.slots.len() - 1
        }
    }

    /// Takes the value out of the slot, leaving it vacant.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        let value = self.slots.get_mut(index)?.take()?;
        self.vacant.push(index);
        Some(value)
    }

    /// Takes the value out of an occupied slot.
    ///
    /// # Panics
    ///
    /// Panics if the slot is vacant; the caller holds a dangling handle.
    pub fn take(&mut self, index: usize) -> T {
        self.remove(index)
            .unwrap_or_else(|| panic!("Dangling arena handle {index}"))
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index)?.as_ref()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index)?.as_mut()
    }

    /// Number of occupied slots.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.slots.len() - self.vacant.len()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.vacant.clear();
    }
}

impl<T> ops::Index<usize> for Arena<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        self.get(index)
            .unwrap_or_else(|| panic!("Dangling arena handle {index}"))
    }
}

impl<T> ops::IndexMut<usize> for Arena<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        self.get_mut(index)
            .unwrap_or_else(|| panic!("Dangling arena handle {index}"))
    }
}
