//! Ordered sets of intrusively linked values, backed by a balanced tree

use core::iter::FusedIterator;

use crate::{
    functor::{Compare, Identity, KeyOf, Natural},
    hook::{Hook, TreeHook},
    tree::{self, Avl, Balance, BsTree, InsertCommit, Lookup, RedBlack, Scapegoat, Splay, Treap},
    Error,
};

//-----------------------------------------------------------------------------------------------//

/// A set of unique keys over values in a borrowed slab
///
/// The set links values through their [`TreeHook`] and never moves or drops them. It holds the
/// slab for its lifetime so lookups can hand back references to the values themselves.
pub struct Set<'s, V, A, K = Identity, C = Natural> {
    slab: &'s [V],
    tree: BsTree<V, A, K, C>,
}

/// A red-black [`Set`]
pub type RbSet<'s, V, K = Identity, C = Natural> = Set<'s, V, RedBlack, K, C>;
/// An AVL [`Set`]
pub type AvlSet<'s, V, K = Identity, C = Natural> = Set<'s, V, Avl, K, C>;
/// A scapegoat [`Set`]
pub type SgSet<'s, V, K = Identity, C = Natural> = Set<'s, V, Scapegoat, K, C>;
/// A splay [`Set`]
pub type SplaySet<'s, V, K = Identity, C = Natural> = Set<'s, V, Splay, K, C>;
/// A treap [`Set`] with priority order `P`
pub type TreapSet<'s, V, P, K = Identity, C = Natural> = Set<'s, V, Treap<P>, K, C>;

impl<'s, V, A, K, C> Set<'s, V, A, K, C>
where
    A: Balance<V>,
    K: KeyOf<V>,
    C: Compare<K::Key>,
{
    /// Constructor
    pub fn new(slab: &'s [V], hook: Hook<V, TreeHook>, balance: A, key_of: K, compare: C) -> Self {
        Set {
            slab,
            tree: BsTree::new(hook, balance, key_of, compare),
        }
    }

    /// Get the number of values in the `Set`
    #[inline]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Check if there are any values in the `Set`
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// The slab the `Set` links into
    #[inline]
    pub fn slab(&self) -> &'s [V] {
        self.slab
    }

    /// The underlying tree
    #[inline]
    pub fn tree(&self) -> &BsTree<V, A, K, C> {
        &self.tree
    }

    /// Link the value in slot `x`, unless one with an equal key is present
    ///
    /// Returns whether it was linked.
    pub fn insert(&mut self, x: usize) -> Result<bool, Error> {
        Ok(self.tree.insert_unique(self.slab, x)?.1)
    }

    /// Look for a key before building the value that would carry it
    pub fn insert_check(&self, key: &K::Key) -> Lookup {
        self.tree.insert_unique_check(self.slab, key)
    }

    /// Link the value in slot `x` at a position found by [`Set::insert_check`]
    pub fn insert_commit(&mut self, x: usize, commit: InsertCommit) -> Result<(), Error> {
        self.tree.insert_unique_commit(self.slab, x, commit).map(|_| ())
    }

    /// Link a sequence of slots, skipping keys already present
    pub fn extend<I>(&mut self, slots: I) -> Result<usize, Error>
    where
        I: IntoIterator<Item = usize>,
    {
        self.tree.extend_unique(self.slab, slots)
    }

    /// Get a value by key
    ///
    /// If the key is not in the set then `None` is returned.
    pub fn get(&self, key: &K::Key) -> Option<&'s V> {
        self.find(key).map(|x| &self.slab[x])
    }

    /// Get the slot of a value by key
    pub fn find(&self, key: &K::Key) -> Option<usize> {
        self.tree.find(self.slab, key)
    }

    /// Check if a key is in the set
    pub fn contains(&self, key: &K::Key) -> bool {
        self.tree.contains(self.slab, key)
    }

    /// Get the first value whose key is not less than `key`
    pub fn lower_bound(&self, key: &K::Key) -> Option<&'s V> {
        self.tree.lower_bound(self.slab, key).map(|x| &self.slab[x])
    }

    /// Get the first value whose key is greater than `key`
    pub fn upper_bound(&self, key: &K::Key) -> Option<&'s V> {
        self.tree.upper_bound(self.slab, key).map(|x| &self.slab[x])
    }

    /// Unlink a value by key, returning its slot
    ///
    /// If the key does not exist, then this function has no effect.
    pub fn remove(&mut self, key: &K::Key) -> Option<usize> {
        let x = self.tree.find(self.slab, key)?;
        self.tree.erase(self.slab, x).ok()?;
        Some(x)
    }

    /// Unlink the value in slot `x`
    pub fn erase(&mut self, x: usize) -> Result<(), Error> {
        self.tree.erase(self.slab, x).map(|_| ())
    }

    /// Get the first value in the set
    pub fn first(&self) -> Option<&'s V> {
        self.tree.first().map(|x| &self.slab[x])
    }

    /// Get the last value in the set
    pub fn last(&self) -> Option<&'s V> {
        self.tree.last().map(|x| &self.slab[x])
    }

    /// Unlink and return the first value in the set
    pub fn pop_first(&mut self) -> Option<&'s V> {
        let x = self.tree.first()?;
        self.tree.erase(self.slab, x).ok()?;
        Some(&self.slab[x])
    }

    /// Unlink and return the last value in the set
    pub fn pop_last(&mut self) -> Option<&'s V> {
        let x = self.tree.last()?;
        self.tree.erase(self.slab, x).ok()?;
        Some(&self.slab[x])
    }

    /// Move the values of another set over the same slab whose keys are absent here
    pub fn merge(&mut self, other: &mut Self) -> usize {
        self.tree.merge_unique(self.slab, &mut other.tree)
    }

    /// Unlink every value
    pub fn clear(&mut self) {
        self.tree.clear(self.slab);
    }

    /// Unlink every value, handing each slot to a disposer
    pub fn clear_and_dispose<D>(&mut self, disposer: D)
    where
        D: FnMut(usize),
    {
        self.tree.clear_and_dispose(self.slab, disposer);
    }

    /// Check the structure of the set, including that keys are strictly increasing
    pub fn check(&self) -> Result<(), Error> {
        self.tree.check_order(self.slab, true)
    }

    /// Get an iterator over the values, in order
    pub fn iter(&self) -> SetIterator<'s, V> {
        SetIterator {
            slab: self.slab,
            slots: self.tree.iter(self.slab),
        }
    }
}

impl<'s, V, A, K, C> IntoIterator for &Set<'s, V, A, K, C>
where
    A: Balance<V>,
    K: KeyOf<V>,
    C: Compare<K::Key>,
{
    type Item = &'s V;
    type IntoIter = SetIterator<'s, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

//-----------------------------------------------------------------------------------------------//

/// A set of values that may share keys, backed by a balanced tree
///
/// Values with equal keys are kept in the order they were inserted.
pub struct MultiSet<'s, V, A, K = Identity, C = Natural> {
    slab: &'s [V],
    tree: BsTree<V, A, K, C>,
}

/// A red-black [`MultiSet`]
pub type RbMultiSet<'s, V, K = Identity, C = Natural> = MultiSet<'s, V, RedBlack, K, C>;
/// An AVL [`MultiSet`]
pub type AvlMultiSet<'s, V, K = Identity, C = Natural> = MultiSet<'s, V, Avl, K, C>;
/// A scapegoat [`MultiSet`]
pub type SgMultiSet<'s, V, K = Identity, C = Natural> = MultiSet<'s, V, Scapegoat, K, C>;
/// A splay [`MultiSet`]
pub type SplayMultiSet<'s, V, K = Identity, C = Natural> = MultiSet<'s, V, Splay, K, C>;
/// A treap [`MultiSet`] with priority order `P`
pub type TreapMultiSet<'s, V, P, K = Identity, C = Natural> = MultiSet<'s, V, Treap<P>, K, C>;

impl<'s, V, A, K, C> MultiSet<'s, V, A, K, C>
where
    A: Balance<V>,
    K: KeyOf<V>,
    C: Compare<K::Key>,
{
    /// Constructor
    pub fn new(slab: &'s [V], hook: Hook<V, TreeHook>, balance: A, key_of: K, compare: C) -> Self {
        MultiSet {
            slab,
            tree: BsTree::new(hook, balance, key_of, compare),
        }
    }

    /// Get the number of values in the `MultiSet`
    #[inline]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Check if there are any values in the `MultiSet`
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// The underlying tree
    #[inline]
    pub fn tree(&self) -> &BsTree<V, A, K, C> {
        &self.tree
    }

    /// Link the value in slot `x` after any values with an equal key
    pub fn insert(&mut self, x: usize) -> Result<(), Error> {
        self.tree.insert_equal(self.slab, x).map(|_| ())
    }

    /// Link a sequence of slots
    pub fn extend<I>(&mut self, slots: I) -> Result<usize, Error>
    where
        I: IntoIterator<Item = usize>,
    {
        self.tree.extend_equal(self.slab, slots)
    }

    /// Get the first value with an equal key
    pub fn get(&self, key: &K::Key) -> Option<&'s V> {
        self.tree.find(self.slab, key).map(|x| &self.slab[x])
    }

    /// Check if a key is in the set
    pub fn contains(&self, key: &K::Key) -> bool {
        self.tree.contains(self.slab, key)
    }

    /// Count the values with an equal key
    pub fn count(&self, key: &K::Key) -> usize {
        self.tree.count(self.slab, key)
    }

    /// Iterate over the values with an equal key, in insertion order
    pub fn equal_range(&self, key: &K::Key) -> SetIterator<'s, V> {
        SetIterator {
            slab: self.slab,
            slots: self.tree.equal_range(self.slab, key),
        }
    }

    /// Unlink every value with an equal key, returning how many were unlinked
    pub fn remove(&mut self, key: &K::Key) -> usize {
        self.tree.remove(self.slab, key)
    }

    /// Unlink the value in slot `x`
    pub fn erase(&mut self, x: usize) -> Result<(), Error> {
        self.tree.erase(self.slab, x).map(|_| ())
    }

    /// Get the first value
    pub fn first(&self) -> Option<&'s V> {
        self.tree.first().map(|x| &self.slab[x])
    }

    /// Get the last value
    pub fn last(&self) -> Option<&'s V> {
        self.tree.last().map(|x| &self.slab[x])
    }

    /// Move every value of another multiset over the same slab into this one
    pub fn merge(&mut self, other: &mut Self) -> usize {
        self.tree.merge_equal(self.slab, &mut other.tree)
    }

    /// Unlink every value
    pub fn clear(&mut self) {
        self.tree.clear(self.slab);
    }

    /// Check the structure of the multiset
    pub fn check(&self) -> Result<(), Error> {
        self.tree.check(self.slab)
    }

    /// Get an iterator over the values, in order
    pub fn iter(&self) -> SetIterator<'s, V> {
        SetIterator {
            slab: self.slab,
            slots: self.tree.iter(self.slab),
        }
    }
}

impl<'s, V, A, K, C> IntoIterator for &MultiSet<'s, V, A, K, C>
where
    A: Balance<V>,
    K: KeyOf<V>,
    C: Compare<K::Key>,
{
    type Item = &'s V;
    type IntoIter = SetIterator<'s, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

//-----------------------------------------------------------------------------------------------//

macro_rules! strategy_surface {
    ($set:ident) => {
        impl<'s, V, K, C> $set<'s, V, Splay, K, C>
        where
            K: KeyOf<V>,
            C: Compare<K::Key>,
        {
            /// Move the value in slot `x` to the root
            pub fn splay_up(&self, x: usize) -> Result<(), Error> {
                self.tree.splay_up(self.slab, x)
            }

            /// Splay towards a key, returning the value now at the root
            pub fn splay_down(&self, key: &K::Key) -> Option<&'s V> {
                self.tree.splay_down(self.slab, key).map(|x| &self.slab[x])
            }

            /// Rebuild into a perfectly balanced shape
            pub fn rebalance(&mut self) {
                self.tree.rebalance(self.slab);
            }
        }

        impl<'s, V, K, C> $set<'s, V, Scapegoat, K, C>
        where
            K: KeyOf<V>,
            C: Compare<K::Key>,
        {
            /// The scapegoat balance factor
            pub fn balance_factor(&self) -> f32 {
                self.tree.balance_factor()
            }

            /// Change the scapegoat balance factor, rebuilding if it tightens
            pub fn set_balance_factor(&mut self, alpha: f32) -> Result<(), Error> {
                self.tree.set_balance_factor(self.slab, alpha)
            }

            /// Rebuild into a perfectly balanced shape
            pub fn rebalance(&mut self) {
                self.tree.rebalance(self.slab);
            }
        }

        impl<'s, V, P, K, C> $set<'s, V, Treap<P>, K, C>
        where
            P: Compare<V>,
            K: KeyOf<V>,
            C: Compare<K::Key>,
        {
            /// The value with the highest priority
            pub fn top(&self) -> Option<&'s V> {
                self.tree.top().map(|x| &self.slab[x])
            }
        }
    };
}

strategy_surface!(Set);
strategy_surface!(MultiSet);

//-----------------------------------------------------------------------------------------------//

/// An iterator over the values of a [`Set`] or [`MultiSet`]
pub struct SetIterator<'s, V> {
    slab: &'s [V],
    slots: tree::Iter<'s, V>,
}

impl<'s, V> Iterator for SetIterator<'s, V> {
    type Item = &'s V;

    fn next(&mut self) -> Option<Self::Item> {
        self.slots.next().map(|x| &self.slab[x])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.slots.size_hint()
    }
}

impl<V> DoubleEndedIterator for SetIterator<'_, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.slots.next_back().map(|x| &self.slab[x])
    }
}

impl<V> ExactSizeIterator for SetIterator<'_, V> {}

impl<V> FusedIterator for SetIterator<'_, V> {}

//-----------------------------------------------------------------------------------------------//

#[cfg(test)]
mod fixture {
    use crate::hook::{Hook, TreeHook};
    use compact_str::CompactString;

    pub struct Word {
        pub text: CompactString,
        pub order: TreeHook,
        pub extra: TreeHook,
    }

    impl AsRef<TreeHook> for Word {
        fn as_ref(&self) -> &TreeHook {
            &self.order
        }
    }

    pub fn words(texts: &[&str]) -> alloc::vec::Vec<Word> {
        texts
            .iter()
            .map(|&text| Word {
                text: CompactString::from(text),
                order: TreeHook::new(),
                extra: TreeHook::new(),
            })
            .collect()
    }

    pub fn text(word: &Word) -> &str {
        &word.text
    }

    pub fn extra() -> Hook<Word, TreeHook> {
        Hook::new(|w: &Word| &w.extra)
    }
}

#[test]
// Getting, setting and popping strings
fn test_set_0() {
    use self::fixture::*;
    use alloc::vec::Vec;

    let slab = words(&["One", "Two", "Three", "Four", "Five", "Two"]);
    let key_of: fn(&Word) -> &str = text;
    let mut set: RbSet<'_, Word, _> = Set::new(&slab, Hook::base(), RedBlack, key_of, Natural);

    debug_assert_eq!(set.extend(0..slab.len()), Ok(5));
    debug_assert_eq!(set.len(), 5);
    debug_assert!(!slab[5].order.is_linked());
    debug_assert_eq!(set.find("Two"), Some(1));
    debug_assert_eq!(set.get("Seven").map(text), None);
    debug_assert_eq!(set.check(), Ok(()));

    let v: Vec<&str> = set.iter().map(text).collect();
    debug_assert_eq!(v, ["Five", "Four", "One", "Three", "Two"]);
    let v: Vec<&str> = set.iter().rev().map(text).collect();
    debug_assert_eq!(v, ["Two", "Three", "One", "Four", "Five"]);

    debug_assert_eq!(set.pop_first().map(text), Some("Five"));
    debug_assert_eq!(set.pop_last().map(text), Some("Two"));
    debug_assert_eq!(set.remove("One"), Some(0));
    debug_assert_eq!(set.remove("One"), None);
    debug_assert_eq!(set.lower_bound("G").map(text), Some("Three"));
    debug_assert_eq!(set.len(), 2);

    // The freed slot can be linked again
    debug_assert_eq!(set.insert(0), Ok(true));
    debug_assert_eq!(set.insert(5), Ok(true));
    debug_assert_eq!(set.check(), Ok(()));
}

#[test]
// One value linked into two sets through two hooks
fn test_set_1() {
    use self::fixture::*;
    use alloc::vec::Vec;

    let slab = words(&["delta", "alpha", "charlie", "bravo"]);
    let key_of: fn(&Word) -> &str = text;
    let by_length = |a: &str, b: &str| a.len().cmp(&b.len()).then(a.cmp(b));

    let mut sorted = Set::new(&slab, Hook::base(), Avl, key_of, Natural);
    let mut by_len = Set::new(&slab, extra(), Splay, key_of, by_length);
    sorted.extend(0..4).unwrap();
    by_len.extend(0..4).unwrap();

    let a: Vec<&str> = sorted.iter().map(text).collect();
    let b: Vec<&str> = by_len.iter().map(text).collect();
    debug_assert_eq!(a, ["alpha", "bravo", "charlie", "delta"]);
    debug_assert_eq!(b, ["alpha", "bravo", "delta", "charlie"]);

    sorted.erase(2).unwrap();
    debug_assert!(!slab[2].order.is_linked());
    debug_assert!(slab[2].extra.is_linked());

    debug_assert_eq!(by_len.splay_down("bravo").map(text), Some("bravo"));
    debug_assert_eq!(by_len.check(), Ok(()));
    debug_assert_eq!(sorted.check(), Ok(()));
}

#[test]
// A stress test with setting and getting
fn test_set_2() {
    use crate::tree::bst::fixture::*;
    use alloc::vec::Vec;
    use rand::prelude::*;

    const COUNT: usize = 100000;

    let mut rng = SmallRng::seed_from_u64(1234567890);
    let keys: Vec<u32> = (0..COUNT).map(|_| rng.random_range(0..u32::MAX)).collect();
    let slab = slab(&keys);

    let mut set = SgSet::new(&slab, hook(), Scapegoat::new(), ByKey, Natural);
    let inserted = set.extend(0..COUNT).unwrap();
    debug_assert_eq!(set.len(), inserted);

    let mut rng = SmallRng::seed_from_u64(1234567890);
    for _ in 0..COUNT {
        let key = rng.random_range(0..u32::MAX);
        debug_assert_eq!(set.get(&key).map(|leaf| leaf.key), Some(key));
    }
    debug_assert_eq!(set.check(), Ok(()));

    while set.pop_first().is_some() {}
    debug_assert!(set.is_empty());
}

#[test]
// Duplicates in a multiset keep their insertion order
fn test_set_3() {
    use crate::tree::bst::fixture::*;
    use alloc::vec::Vec;

    let slab = slab(&[3, 1, 3, 2, 3, 1]);
    let smaller_first = |a: &Leaf, b: &Leaf| b.key.cmp(&a.key);
    let mut set = TreapMultiSet::new(&slab, hook(), Treap::new(smaller_first), ByKey, Natural);
    set.extend(0..slab.len()).unwrap();

    debug_assert_eq!(set.count(&3), 3);
    debug_assert_eq!(set.count(&4), 0);
    debug_assert_eq!(set.equal_range(&3).len(), 3);
    let threes: Vec<usize> = set.tree().equal_range(&slab, &3).collect();
    debug_assert_eq!(threes, [0, 2, 4]);

    // Smaller keys have the higher priority
    debug_assert_eq!(set.top().map(|leaf| leaf.key), Some(1));
    debug_assert_eq!(set.remove(&1), 2);
    debug_assert_eq!(set.top().map(|leaf| leaf.key), Some(2));
    debug_assert_eq!(set.len(), 4);
    debug_assert_eq!(set.check(), Ok(()));
}
