//! A map and a set implemented with an AVL tree stored in a dense arena.
//!
//! Instead of allocating every node on its own, all nodes of a tree live in one
//! `Vec` and link to their parent and children by index. Live nodes always occupy
//! the front of that array without holes; deleting a node moves the last live
//! node into the freed slot. The arena grows on demand and never shrinks.
//!
//! Keys are ordered either by their `Ord` implementation ([`AvlTreeMap::new`]) or
//! by any closure `Fn(&K, &K) -> Ordering` ([`AvlTreeMap::with_comparator`]).
//! Equal keys are kept side by side rather than merged.
//!
//! ```
//! use arena_avl::{AvlTreeMap, AvlTreeSet};
//!
//! let mut map = AvlTreeMap::new();
//! map.insert("b", 2);
//! map.insert("a", 1);
//! assert_eq!(map.get(&"b"), Some(&2));
//!
//! let mut set = AvlTreeSet::new();
//! set.extend([3, 1, 2]);
//! assert_eq!(set.iter().copied().collect::<Vec<_>>(), [1, 2, 3]);
//! ```
//!
//! ## features
//!
//! | Feature             | Default | Explanation                                          |
//! |:--------------------|:--------|:-----------------------------------------------------|
//! | `consistency_check` | `false` | Enables `check_consistency`, which asserts all invariants |

pub mod compare;
pub mod error;
pub mod map;
pub mod set;

pub use compare::{Comparator, Natural};
pub use error::{AvlError, AvlResult};
pub use map::AvlTreeMap;
pub use set::AvlTreeSet;

#[cfg(test)]
mod proptests;
