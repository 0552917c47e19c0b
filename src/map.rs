//! An ordered map implemented with an AVL tree stored in a dense arena.
//!
//! Nodes live in a single `Vec` and refer to each other by index. Live nodes always
//! occupy the prefix `0..len()` of the arena: whenever a deletion frees a slot, the
//! node in the last live slot is moved into the hole and every link pointing at it
//! is repaired.

use std::cmp::{self, Ordering};
use std::fmt;
use std::mem;

use crate::compare::{Comparator, Natural};
use crate::error::{AvlError, AvlResult};

/// Minimum number of slots allocated for a new tree.
pub const MIN_CAPACITY: usize = 32;

/// An ordered map implemented with an AVL tree stored in a dense arena.
///
/// Equal keys are not merged: inserting a key that is already present stores a
/// second entry next to the first one.
///
/// ```
/// use arena_avl::AvlTreeMap;
/// let mut map = AvlTreeMap::new();
/// map.insert(0, "zero");
/// map.insert(1, "one");
/// map.insert(2, "two");
/// assert_eq!(map.get(&1), Some(&"one"));
/// assert_eq!(map.remove(&1), Some("one"));
/// assert!(map.get(&1).is_none());
/// ```
#[derive(Clone)]
pub struct AvlTreeMap<K, V, C = Natural> {
    nodes: Vec<Option<Node<K, V>>>,
    root: Link,
    num_nodes: usize,
    cmp: C,
}

/// An iterator over the entries of a map, in ascending key order.
pub struct Iter<'a, K, V, C = Natural> {
    map: &'a AvlTreeMap<K, V, C>,
    next: Link,
    remaining: usize,
}

/// An iterator over the keys of a map, in ascending order.
pub struct Keys<'a, K, V, C = Natural> {
    iter: Iter<'a, K, V, C>,
}

/// An iterator over the values of a map, in ascending key order.
pub struct Values<'a, K, V, C = Natural> {
    iter: Iter<'a, K, V, C>,
}

/// Arena index of a node, `None` for a missing child or parent.
type Link = Option<usize>;

#[derive(Clone)]
struct Node<K, V> {
    key: K,
    value: V,
    parent: Link,
    left: Link,
    right: Link,
    height: usize,
}

/// Payload detached from the tree by a deletion, along with the arena slot it left empty.
struct Unlinked<K, V> {
    key: K,
    value: V,
    slot: usize,
}

#[cfg(any(test, feature = "consistency_check"))]
#[allow(clippy::enum_variant_names)]
enum Direction {
    FromParent,
    FromLeft,
    FromRight,
}

impl<K: Ord, V> AvlTreeMap<K, V> {
    /// Creates an empty map ordered by the key's `Ord` implementation.
    pub fn new() -> Self {
        Self::with_comparator(Natural)
    }

    /// Creates an empty map with room for at least `capacity` entries.
    /// Capacities below [`MIN_CAPACITY`] are raised to it.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_comparator(capacity, Natural)
    }

    /// Like [`with_capacity`](Self::with_capacity), but reports allocation failure.
    pub fn try_with_capacity(capacity: usize) -> AvlResult<Self> {
        Self::try_with_capacity_and_comparator(capacity, Natural)
    }
}

impl<K, V, C> AvlTreeMap<K, V, C> {
    /// Creates an empty map ordered by `cmp`.
    pub fn with_comparator(cmp: C) -> Self {
        Self::with_capacity_and_comparator(MIN_CAPACITY, cmp)
    }

    /// Creates an empty map ordered by `cmp` with room for at least `capacity` entries.
    pub fn with_capacity_and_comparator(capacity: usize, cmp: C) -> Self {
        let capacity = cmp::max(capacity, MIN_CAPACITY);
        Self {
            nodes: std::iter::repeat_with(|| None).take(capacity).collect(),
            root: None,
            num_nodes: 0,
            cmp,
        }
    }

    /// Like [`with_capacity_and_comparator`](Self::with_capacity_and_comparator),
    /// but reports allocation failure.
    pub fn try_with_capacity_and_comparator(capacity: usize, cmp: C) -> AvlResult<Self> {
        let capacity = cmp::max(capacity, MIN_CAPACITY);
        let mut nodes = Vec::new();
        nodes.try_reserve_exact(capacity)?;
        nodes.resize_with(capacity, || None);
        Ok(Self {
            nodes,
            root: None,
            num_nodes: 0,
            cmp,
        })
    }

    /// Returns true if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the number of elements in the map.
    pub fn len(&self) -> usize {
        self.num_nodes
    }

    /// Returns the number of arena slots, live or empty.
    /// The arena grows on demand and never shrinks.
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the height of the tree, 0 for an empty map.
    pub fn height(&self) -> usize {
        self.link_height(self.root)
    }

    /// Removes all elements. The arena keeps its capacity.
    pub fn clear(&mut self) {
        tracing::trace!(len = self.num_nodes, "clearing tree");
        self.destroy(self.root);
        debug_assert!(self.nodes.iter().all(Option::is_none));
        self.root = None;
        self.num_nodes = 0;
    }

    /// Gets an iterator over the entries of the map in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V, C> {
        Iter {
            map: self,
            next: self.root.map(|root| self.leftmost(root)),
            remaining: self.num_nodes,
        }
    }

    /// Gets an iterator over the keys of the map in ascending order.
    pub fn keys(&self) -> Keys<'_, K, V, C> {
        Keys { iter: self.iter() }
    }

    /// Gets an iterator over the values of the map in ascending key order.
    pub fn values(&self) -> Values<'_, K, V, C> {
        Values { iter: self.iter() }
    }

    #[cfg(test)]
    pub(crate) fn root_key_value(&self) -> Option<(&K, &V)> {
        self.root.map(|root| {
            let node = self.node(root);
            (&node.key, &node.value)
        })
    }

    #[track_caller]
    fn node(&self, index: usize) -> &Node<K, V> {
        match self.nodes.get(index) {
            Some(Some(node)) if index < self.num_nodes => node,
            _ => invalid_slot(index, self.num_nodes),
        }
    }

    #[track_caller]
    fn node_mut(&mut self, index: usize) -> &mut Node<K, V> {
        let len = self.num_nodes;
        if index >= len {
            invalid_slot(index, len);
        }
        match self.nodes.get_mut(index) {
            Some(Some(node)) => node,
            _ => invalid_slot(index, len),
        }
    }

    #[track_caller]
    fn take_slot(&mut self, index: usize) -> Node<K, V> {
        let len = self.num_nodes;
        if index >= len {
            invalid_slot(index, len);
        }
        match self.nodes[index].take() {
            Some(node) => node,
            None => invalid_slot(index, len),
        }
    }

    fn children(&self, index: usize) -> (Link, Link) {
        let node = self.node(index);
        (node.left, node.right)
    }

    fn link_height(&self, link: Link) -> usize {
        match link {
            None => 0,
            Some(index) => self.node(index).height,
        }
    }

    fn adjust_height(&mut self, index: usize) {
        let (left, right) = self.children(index);
        let height = 1 + cmp::max(self.link_height(left), self.link_height(right));
        self.node_mut(index).height = height;
    }

    fn set_parent(&mut self, link: Link, parent: Link) {
        if let Some(index) = link {
            self.node_mut(index).parent = parent;
        }
    }

    /// Points whichever link referred to `old` (a child slot of `parent`, or the
    /// root) at `new` instead.
    fn replace_child(&mut self, parent: Link, old: usize, new: usize) {
        match parent {
            None => self.root = Some(new),
            Some(parent) => {
                let parent = self.node_mut(parent);
                if parent.left == Some(old) {
                    parent.left = Some(new);
                } else {
                    debug_assert_eq!(parent.right, Some(old));
                    parent.right = Some(new);
                }
            }
        }
    }

    fn leftmost(&self, mut index: usize) -> usize {
        while let Some(left) = self.node(index).left {
            index = left;
        }
        index
    }

    fn successor(&self, index: usize) -> Link {
        if let Some(right) = self.node(index).right {
            return Some(self.leftmost(right));
        }
        let mut current = index;
        while let Some(parent) = self.node(current).parent {
            if self.node(parent).left == Some(current) {
                return Some(parent);
            }
            current = parent;
        }
        None
    }

    /// Makes sure slot `len()` exists, growing the arena to `2 * capacity + 1`
    /// (repeatedly, if needed).
    fn reserve_slot(&mut self) -> AvlResult<()> {
        let required = self
            .num_nodes
            .checked_add(1)
            .ok_or(AvlError::CapacityOverflow)?;
        let mut capacity = self.nodes.len();
        if capacity >= required {
            return Ok(());
        }
        while capacity < required {
            capacity = capacity
                .checked_mul(2)
                .and_then(|capacity| capacity.checked_add(1))
                .ok_or(AvlError::CapacityOverflow)?;
        }
        self.nodes.try_reserve_exact(capacity - self.nodes.len())?;
        tracing::trace!(from = self.nodes.len(), to = capacity, "growing node arena");
        self.nodes.resize_with(capacity, || None);
        Ok(())
    }

    fn allocate(&mut self, parent: Link, key: K, value: V) -> usize {
        let index = self.num_nodes;
        debug_assert!(index < self.nodes.len());
        debug_assert!(self.nodes[index].is_none());
        self.nodes[index] = Some(Node {
            key,
            value,
            parent,
            left: None,
            right: None,
            height: 1,
        });
        self.num_nodes += 1;
        index
    }

    fn destroy(&mut self, link: Link) {
        if let Some(index) = link {
            let (left, right) = self.children(index);
            self.destroy(left);
            self.destroy(right);
            self.nodes[index] = None;
        }
    }

    /// Splices `index` out of the tree. It must have at most one child, which
    /// takes its place. The child's content is moved into slot `index`, so links
    /// into that slot stay valid and the child's former slot is the one freed.
    fn splice(&mut self, index: usize, child: Link) -> (Link, Unlinked<K, V>) {
        let Some(child) = child else {
            let node = self.take_slot(index);
            return (
                None,
                Unlinked {
                    key: node.key,
                    value: node.value,
                    slot: index,
                },
            );
        };

        let parent = self.node(index).parent;
        self.node_mut(child).parent = parent;
        self.nodes.swap(index, child);

        let (left, right) = self.children(index);
        self.set_parent(left, Some(index));
        self.set_parent(right, Some(index));

        let node = self.take_slot(child);
        (
            Some(index),
            Unlinked {
                key: node.key,
                value: node.value,
                slot: child,
            },
        )
    }

    /// Moves the last live node into the freed slot so live nodes stay contiguous.
    fn compact(&mut self, freed: usize) {
        debug_assert!(self.num_nodes >= 1);
        debug_assert!(self.nodes[freed].is_none());
        let last = self.num_nodes - 1;
        if freed < last {
            self.nodes.swap(freed, last);
            let node = self.node(freed);
            let (parent, left, right) = (node.parent, node.left, node.right);
            self.replace_child(parent, last, freed);
            self.set_parent(left, Some(freed));
            self.set_parent(right, Some(freed));
        }
        debug_assert!(self.nodes[last].is_none());
        self.num_nodes = last;
    }

    fn rotate_left(&mut self, index: usize) -> usize {
        let Some(right) = self.node(index).right else {
            return index;
        };
        let right_left = self.node(right).left;
        let parent = self.node(index).parent;

        self.node_mut(index).right = right_left;
        self.set_parent(right_left, Some(index));

        self.node_mut(right).parent = parent;
        self.replace_child(parent, index, right);

        self.node_mut(right).left = Some(index);
        self.node_mut(index).parent = Some(right);

        self.adjust_height(index);
        self.adjust_height(right);
        right
    }

    fn rotate_right(&mut self, index: usize) -> usize {
        let Some(left) = self.node(index).left else {
            return index;
        };
        let left_right = self.node(left).right;
        let parent = self.node(index).parent;

        self.node_mut(index).left = left_right;
        self.set_parent(left_right, Some(index));

        self.node_mut(left).parent = parent;
        self.replace_child(parent, index, left);

        self.node_mut(left).right = Some(index);
        self.node_mut(index).parent = Some(left);

        self.adjust_height(index);
        self.adjust_height(left);
        left
    }

    /// Restores AVL condition (balance) at given node if necessary and adjusts height.
    /// Initial balance must not exceed +2 or -2, which always holds after a single update.
    /// When the heavy child is itself balanced, a single rotation is used.
    /// Returns the index now at the top of this subtree.
    fn rebalance_node(&mut self, index: usize) -> usize {
        let (left, right) = self.children(index);
        let left_height = self.link_height(left);
        let right_height = self.link_height(right);
        debug_assert!(left_height <= right_height + 2);
        debug_assert!(right_height <= left_height + 2);
        if left_height > right_height + 1 {
            // Rebalance right
            if let Some(left) = left {
                let (left_left, left_right) = self.children(left);
                if self.link_height(left_right) > self.link_height(left_left) {
                    self.rotate_left(left);
                }
            }
            self.rotate_right(index)
        } else if right_height > left_height + 1 {
            // Rebalance left
            if let Some(right) = right {
                let (right_left, right_right) = self.children(right);
                if self.link_height(right_left) > self.link_height(right_right) {
                    self.rotate_right(right);
                }
            }
            self.rotate_left(index)
        } else {
            self.adjust_height(index);
            index
        }
    }

    #[cfg(any(test, feature = "consistency_check"))]
    fn traverse<Pre, In>(&self, mut preorder: Pre, mut inorder: In)
    where
        Pre: FnMut(usize),
        In: FnMut(usize),
    {
        if let Some(mut index) = self.root {
            let mut dir = Direction::FromParent;
            loop {
                match dir {
                    Direction::FromParent => {
                        preorder(index);
                        if let Some(left) = self.node(index).left {
                            index = left;
                        } else {
                            dir = Direction::FromLeft;
                        }
                    }
                    Direction::FromLeft => {
                        inorder(index);
                        if let Some(right) = self.node(index).right {
                            index = right;
                            dir = Direction::FromParent;
                        } else {
                            dir = Direction::FromRight;
                        }
                    }
                    Direction::FromRight => match self.node(index).parent {
                        Some(parent) => {
                            if self.node(parent).left == Some(index) {
                                dir = Direction::FromLeft;
                            } else {
                                dir = Direction::FromRight;
                            }
                            index = parent;
                        }
                        None => break,
                    },
                }
            }
        }
    }
}

impl<K, V, C: Comparator<K>> AvlTreeMap<K, V, C> {
    /// Returns a reference to the value corresponding to the key.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.find(key).map(|index| &self.node(index).value)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let index = self.find(key)?;
        Some(&mut self.node_mut(index).value)
    }

    /// Returns references to the key-value pair corresponding to the key.
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        self.find(key).map(|index| {
            let node = self.node(index);
            (&node.key, &node.value)
        })
    }

    /// Returns true if the map contains a value for the specified key.
    pub fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Inserts a key-value pair into the map.
    ///
    /// A key equal to one already present is stored as an additional entry;
    /// existing entries are never overwritten.
    ///
    /// # Panics
    ///
    /// Panics if the arena cannot grow. See [`try_insert`](Self::try_insert).
    pub fn insert(&mut self, key: K, value: V) {
        if let Err(err) = self.reserve_slot() {
            panic!("{}", err);
        }
        self.insert_reserved(key, value);
    }

    /// Inserts a key-value pair into the map, reporting failure to grow the arena.
    /// On error the map is left unchanged.
    pub fn try_insert(&mut self, key: K, value: V) -> AvlResult<()> {
        self.reserve_slot()?;
        self.insert_reserved(key, value);
        Ok(())
    }

    /// Removes a key from the map.
    /// Returns the value at the key if the key was previously in the map.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes a key from the map.
    /// Returns the stored key and value if the key was previously in the map.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let (root, unlinked) = self.remove_at(self.root, key)?;
        self.root = root;
        self.compact(unlinked.slot);
        Some((unlinked.key, unlinked.value))
    }

    /// Asserts that the internal tree structure is consistent.
    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self) {
        // Check arena density
        for (index, slot) in self.nodes.iter().enumerate() {
            assert_eq!(
                slot.is_some(),
                index < self.num_nodes,
                "slot {} breaks arena density (len {})",
                index,
                self.num_nodes
            );
        }

        // Check root link
        match self.root {
            None => assert_eq!(self.num_nodes, 0),
            Some(root) => assert!(self.node(root).parent.is_none()),
        }

        // Check tree nodes
        let mut num_nodes = 0;
        let mut previous: Option<usize> = None;
        self.traverse(
            |index| {
                let node = self.node(index);
                let mut left_height = 0;
                let mut right_height = 0;

                // Check link for left child node
                if let Some(left) = node.left {
                    let left_node = self.node(left);
                    assert_eq!(left_node.parent, Some(index));
                    assert_ne!(self.cmp.compare(&left_node.key, &node.key), Ordering::Greater);
                    left_height = left_node.height;
                }

                // Check link for right child node
                if let Some(right) = node.right {
                    let right_node = self.node(right);
                    assert_eq!(right_node.parent, Some(index));
                    assert_ne!(self.cmp.compare(&right_node.key, &node.key), Ordering::Less);
                    right_height = right_node.height;
                }

                // Check height
                assert_eq!(node.height, 1 + cmp::max(left_height, right_height));

                // Check AVL condition (nearly balance)
                assert!(left_height <= right_height + 1);
                assert!(right_height <= left_height + 1);

                num_nodes += 1;
            },
            |index| {
                // Check key order across subtrees
                if let Some(previous) = previous {
                    let ordering = self.cmp.compare(&self.node(previous).key, &self.node(index).key);
                    assert_ne!(ordering, Ordering::Greater);
                }
                previous = Some(index);
            },
        );

        // Check number of nodes
        assert_eq!(num_nodes, self.num_nodes);
    }

    fn find(&self, key: &K) -> Link {
        let mut current = self.root;
        while let Some(index) = current {
            let node = self.node(index);
            current = match self.cmp.compare(key, &node.key) {
                Ordering::Equal => break,
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
            };
        }
        current
    }

    fn insert_reserved(&mut self, key: K, value: V) {
        let root = self.insert_at(self.root, None, key, value);
        self.root = Some(root);
    }

    /// Inserts below `link` and returns the index now at the top of that subtree.
    /// Equal keys descend to the right.
    fn insert_at(&mut self, link: Link, parent: Link, key: K, value: V) -> usize {
        let Some(index) = link else {
            return self.allocate(parent, key, value);
        };
        let (left, right) = self.children(index);
        if self.cmp.compare(&key, &self.node(index).key) == Ordering::Less {
            let left = self.insert_at(left, Some(index), key, value);
            self.node_mut(index).left = Some(left);
        } else {
            let right = self.insert_at(right, Some(index), key, value);
            self.node_mut(index).right = Some(right);
        }
        self.rebalance_node(index)
    }

    /// Removes the first node equal to `key` found below `link`.
    /// Returns the new top of that subtree and the detached payload.
    fn remove_at(&mut self, link: Link, key: &K) -> Option<(Link, Unlinked<K, V>)> {
        let index = link?;
        let (left, right) = self.children(index);
        match self.cmp.compare(key, &self.node(index).key) {
            Ordering::Less => {
                let (left, unlinked) = self.remove_at(left, key)?;
                self.node_mut(index).left = left;
                Some((Some(self.rebalance_node(index)), unlinked))
            }
            Ordering::Greater => {
                let (right, unlinked) = self.remove_at(right, key)?;
                self.node_mut(index).right = right;
                Some((Some(self.rebalance_node(index)), unlinked))
            }
            Ordering::Equal => Some(self.unlink(index)),
        }
    }

    fn unlink(&mut self, index: usize) -> (Link, Unlinked<K, V>) {
        match self.children(index) {
            (Some(_), Some(right)) => {
                // Node keeps its slot and takes over the successor's payload,
                // the successor's own node is removed instead.
                let (right, successor) = self.remove_min(right);
                let node = self.node_mut(index);
                node.right = right;
                let key = mem::replace(&mut node.key, successor.key);
                let value = mem::replace(&mut node.value, successor.value);
                let top = self.rebalance_node(index);
                (
                    Some(top),
                    Unlinked {
                        key,
                        value,
                        slot: successor.slot,
                    },
                )
            }
            (child, None) | (None, child) => self.splice(index, child),
        }
    }

    /// Removes the leftmost node below `index`.
    fn remove_min(&mut self, index: usize) -> (Link, Unlinked<K, V>) {
        match self.children(index) {
            (Some(left), _) => {
                let (left, unlinked) = self.remove_min(left);
                self.node_mut(index).left = left;
                (Some(self.rebalance_node(index)), unlinked)
            }
            (None, right) => self.splice(index, right),
        }
    }
}

#[cold]
#[track_caller]
fn invalid_slot(index: usize, len: usize) -> ! {
    panic!("arena slot {} is not a live node (len {})", index, len)
}

impl<K: Ord, V> Default for AvlTreeMap<K, V> {
    /// Creates an empty map.
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for AvlTreeMap<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for AvlTreeMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K, V, C: Comparator<K>> Extend<(K, V)> for AvlTreeMap<K, V, C> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<'a, K, V, C> IntoIterator for &'a AvlTreeMap<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, C>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// Auto derived clone would require K: Clone, V: Clone and C: Clone
impl<'a, K, V, C> Clone for Iter<'a, K, V, C> {
    fn clone(&self) -> Self {
        Self {
            map: self.map,
            next: self.next,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V, C> Iterator for Iter<'a, K, V, C> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next?;
        let map = self.map;
        self.next = map.successor(index);
        self.remaining -= 1;
        let node = map.node(index);
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, C> ExactSizeIterator for Iter<'_, K, V, C> {}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for Iter<'_, K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, K, V, C> Iterator for Keys<'a, K, V, C> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<K, V, C> ExactSizeIterator for Keys<'_, K, V, C> {}

impl<'a, K, V, C> Iterator for Values<'a, K, V, C> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<K, V, C> ExactSizeIterator for Values<'_, K, V, C> {}
