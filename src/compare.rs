//! Orderings used to arrange keys in a tree.

use std::cmp::Ordering;

/// A total order over values of type `T`.
///
/// Implemented by [`Natural`] for every `T: Ord` and by any closure
/// `Fn(&T, &T) -> Ordering`.
///
/// ```
/// use arena_avl::AvlTreeMap;
/// let mut map = AvlTreeMap::with_comparator(|a: &i32, b: &i32| b.cmp(a));
/// map.insert(1, "one");
/// map.insert(2, "two");
/// assert_eq!(map.keys().copied().collect::<Vec<_>>(), [2, 1]);
/// ```
pub trait Comparator<T: ?Sized> {
    /// Compares `a` against `b`.
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

/// The ordering given by the key type's own `Ord` implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Natural;

impl<T: Ord + ?Sized> Comparator<T> for Natural {
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

impl<T: ?Sized, F> Comparator<T> for F
where
    F: Fn(&T, &T) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self(a, b)
    }
}
