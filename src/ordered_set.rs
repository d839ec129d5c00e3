//! Insertion-ordered collection with unique membership.
//!
//! Backbone of the scene graph: paint order, hit-test order, and
//! select-next/previous order all come from iteration order here.

#[cfg(test)]
#[path = "ordered_set_test.rs"]
mod ordered_set_test;

use std::collections::HashSet;
use std::hash::Hash;

#[derive(Debug, Clone)]
pub struct OrderedSet<T> {
    order: Vec<T>,
    members: HashSet<T>,
}

impl<T> Default for OrderedSet<T> {
    fn default() -> Self {
        Self { order: Vec::new(), members: HashSet::new() }
    }
}

impl<T: Eq + Hash + Clone> OrderedSet<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value`. Returns `false` and leaves the order untouched when the
    /// value is already present.
    pub fn add(&mut self, value: T) -> bool {
        if !self.members.insert(value.clone()) {
            return false;
        }
        self.order.push(value);
        true
    }

    /// Remove `value`, returning whether it was present.
    ///
    /// # Panics
    ///
    /// Panics if `value` is a member but missing from the order vector.
    pub fn delete(&mut self, value: &T) -> bool {
        if !self.members.remove(value) {
            return false;
        }
        let index = self.order.iter().position(|v| v == value);
        assert!(index.is_some(), "Invariant violation: element in set but not in order");
        if let Some(index) = index {
            self.order.remove(index);
        }
        true
    }

    #[must_use]
    pub fn has(&self, value: &T) -> bool {
        self.members.contains(value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.order.get(index)
    }

    #[must_use]
    pub fn index_of(&self, value: &T) -> Option<usize> {
        if !self.has(value) {
            return None;
        }
        self.order.iter().position(|v| v == value)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.order.iter()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }

    /// Move a member to `pos`, clamped to the end. Returns whether `value`
    /// was a member.
    pub fn move_to_index(&mut self, pos: usize, value: &T) -> bool {
        let Some(index) = self.index_of(value) else {
            return false;
        };
        let item = self.order.remove(index);
        let pos = pos.min(self.order.len());
        self.order.insert(pos, item);
        true
    }

    /// The member after `value`, wrapping to the first. With `None` (or a
    /// non-member) this is the first member.
    #[must_use]
    pub fn next_after(&self, value: Option<&T>) -> Option<&T> {
        match value.and_then(|v| self.index_of(v)) {
            Some(index) => self.order.get((index + 1) % self.order.len()),
            None => self.order.first(),
        }
    }

    /// The member before `value`, wrapping to the last.
    #[must_use]
    pub fn previous_before(&self, value: Option<&T>) -> Option<&T> {
        match value.and_then(|v| self.index_of(v)) {
            Some(0) | None => self.order.last(),
            Some(index) => self.order.get(index - 1),
        }
    }
}

impl<'a, T> IntoIterator for &'a OrderedSet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.order.iter()
    }
}

impl<T: Eq + Hash + Clone> FromIterator<T> for OrderedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        for value in iter {
            set.add(value);
        }
        set
    }
}
