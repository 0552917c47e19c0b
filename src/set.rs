//! An ordered set implemented with an AVL tree stored in a dense arena.

use std::fmt;

use crate::compare::{Comparator, Natural};
use crate::error::AvlResult;
use crate::map::{AvlTreeMap, Keys};

/// An ordered set implemented with an AVL tree stored in a dense arena.
///
/// Equal values are not merged: inserting a value twice stores it twice, and
/// each [`remove`](Self::remove) takes out one copy.
///
/// ```
/// use arena_avl::AvlTreeSet;
/// let mut set = AvlTreeSet::new();
/// set.insert(0);
/// set.insert(1);
/// set.insert(2);
/// assert_eq!(set.get(&1), Some(&1));
/// assert!(set.remove(&1));
/// assert!(!set.contains(&1));
/// ```
#[derive(Clone)]
pub struct AvlTreeSet<T, C = Natural> {
    map: AvlTreeMap<T, (), C>,
}

/// An iterator over the values of a set, in ascending order.
pub struct Iter<'a, T, C = Natural> {
    keys: Keys<'a, T, (), C>,
}

impl<T: Ord> AvlTreeSet<T> {
    /// Creates an empty set ordered by the value's `Ord` implementation.
    pub fn new() -> Self {
        Self {
            map: AvlTreeMap::new(),
        }
    }

    /// Creates an empty set with room for at least `capacity` values.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: AvlTreeMap::with_capacity(capacity),
        }
    }

    /// Like [`with_capacity`](Self::with_capacity), but reports allocation failure.
    pub fn try_with_capacity(capacity: usize) -> AvlResult<Self> {
        Ok(Self {
            map: AvlTreeMap::try_with_capacity(capacity)?,
        })
    }
}

impl<T, C> AvlTreeSet<T, C> {
    /// Creates an empty set ordered by `cmp`.
    pub fn with_comparator(cmp: C) -> Self {
        Self {
            map: AvlTreeMap::with_comparator(cmp),
        }
    }

    /// Creates an empty set ordered by `cmp` with room for at least `capacity` values.
    pub fn with_capacity_and_comparator(capacity: usize, cmp: C) -> Self {
        Self {
            map: AvlTreeMap::with_capacity_and_comparator(capacity, cmp),
        }
    }

    /// Returns true if the set contains no elements.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns the number of elements in the set.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns the number of arena slots, live or empty.
    pub fn capacity(&self) -> usize {
        self.map.capacity()
    }

    /// Returns the height of the tree, 0 for an empty set.
    pub fn height(&self) -> usize {
        self.map.height()
    }

    /// Removes all elements. The arena keeps its capacity.
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Gets an iterator over the values of the set in ascending order.
    pub fn iter(&self) -> Iter<'_, T, C> {
        Iter {
            keys: self.map.keys(),
        }
    }

    #[cfg(test)]
    pub(crate) fn root_value(&self) -> Option<&T> {
        self.map.root_key_value().map(|(value, _)| value)
    }
}

impl<T, C: Comparator<T>> AvlTreeSet<T, C> {
    /// Returns a reference to the value in the set that is equal to the given value.
    pub fn get(&self, value: &T) -> Option<&T> {
        self.map.get_key_value(value).map(|(value, _)| value)
    }

    /// Returns true if the set contains a value.
    pub fn contains(&self, value: &T) -> bool {
        self.map.contains_key(value)
    }

    /// Inserts a value into the set.
    pub fn insert(&mut self, value: T) {
        self.map.insert(value, ());
    }

    /// Inserts a value into the set, reporting failure to grow the arena.
    pub fn try_insert(&mut self, value: T) -> AvlResult<()> {
        self.map.try_insert(value, ())
    }

    /// Removes a value from the set.
    /// Returns whether the value was previously in the set.
    pub fn remove(&mut self, value: &T) -> bool {
        self.map.remove(value).is_some()
    }

    /// Removes a value from the set.
    /// Returns the value if it was previously in the set.
    pub fn take(&mut self, value: &T) -> Option<T> {
        self.map.remove_entry(value).map(|(value, _)| value)
    }

    /// Asserts that the internal tree structure is consistent.
    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self) {
        self.map.check_consistency()
    }
}

impl<T: Ord> Default for AvlTreeSet<T> {
    /// Creates an empty set.
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord> FromIterator<T> for AvlTreeSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<T, C: Comparator<T>> Extend<T> for AvlTreeSet<T, C> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<T: fmt::Debug, C> fmt::Debug for AvlTreeSet<T, C> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_set().entries(self.iter()).finish()
    }
}

impl<'a, T, C> IntoIterator for &'a AvlTreeSet<T, C> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, C>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, C> Iterator for Iter<'a, T, C> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.keys.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.keys.size_hint()
    }
}

impl<T, C> ExactSizeIterator for Iter<'_, T, C> {}
