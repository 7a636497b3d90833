//! Intrusive binary search trees with pluggable balancing
//!
//! [`BsTree`] is the generic container. It manages the linkage of values that live in a slab
//! owned by the caller, much as a splay tree of integer leaves manages indices into an external
//! vector without storing the vector. The balancing discipline is a [`Balance`] value:
//! [`RedBlack`], [`Avl`], [`Scapegoat`], [`Splay`] or [`Treap`].

use core::{cell::Cell, cmp::Ordering, fmt, iter::FusedIterator};

use tracing::trace;

use crate::{
    functor::{Compare, Identity, KeyOf, Natural},
    hook::{Hook, TreeHook},
    CloneError, Error,
};

pub mod avltree;
pub mod bst;
pub mod rbtree;
pub mod sgtree;
pub mod splaytree;
pub mod treap;

pub use avltree::Avl;
pub use bst::{Header, Location, Nodes};
pub use rbtree::RedBlack;
pub use sgtree::Scapegoat;
pub use splaytree::Splay;
pub use treap::Treap;

//-----------------------------------------------------------------------------------------------//

/// A rebalancing discipline for a binary search tree
///
/// The container calls `init` before linking a leaf and `after_insert` once it is linked.
/// `erase` both unlinks a leaf and repairs the tree. Strategies keep any state they need (the
/// scapegoat's size bound, the treap's priority order) in `self`.
pub trait Balance<V> {
    /// Lookups restructure the tree
    const SELF_ADJUSTING: bool = false;

    /// Prepare the metadata of a leaf about to be linked
    fn init(&self, t: Nodes<'_, V>, x: usize) {
        t.set_meta(x, 0);
    }

    /// Restore balance after `x` has been linked as a leaf; `size` includes `x`
    fn after_insert(&mut self, t: Nodes<'_, V>, header: &mut Header, x: usize, size: usize);

    /// Unlink `z` and restore balance; `size` no longer includes `z`
    fn erase(&mut self, t: Nodes<'_, V>, header: &mut Header, z: usize, size: usize);

    /// A lookup landed on `x`
    fn on_access(&self, _t: Nodes<'_, V>, _header: &mut Header, _x: usize) {}

    /// Check the strategy's own invariant
    fn check(&self, _t: Nodes<'_, V>, _header: &Header, _size: usize) -> Result<(), Error> {
        Ok(())
    }

    /// The tree was emptied
    fn reset(&mut self) {}
}

//-----------------------------------------------------------------------------------------------//

/// The result of the first phase of a two-phase unique insert
#[derive(Debug, PartialEq, Eq)]
pub enum Lookup {
    /// A value with an equal key is already in the tree
    Occupied(usize),
    /// The key is absent; committing the token links a value where it belongs
    Vacant(InsertCommit),
}

/// The position found by `insert_unique_check`
///
/// It is only valid while the tree is unmodified, which `insert_unique_commit` checks.
#[derive(Debug, PartialEq, Eq)]
pub struct InsertCommit {
    location: Location,
    generation: u64,
}

//-----------------------------------------------------------------------------------------------//

/// An intrusive binary search tree over values stored in a caller-owned slab
///
/// Values are named by their slot index. Every operation borrows the slab; the same slab must
/// be used for the life of the tree. The tree never allocates.
pub struct BsTree<V, A, K = Identity, C = Natural> {
    hook: Hook<V, TreeHook>,
    header: Cell<Header>,
    size: usize,
    generation: Cell<u64>,
    balance: A,
    key_of: K,
    compare: C,
}

impl<V, A, K, C> BsTree<V, A, K, C>
where
    A: Balance<V>,
    K: KeyOf<V>,
    C: Compare<K::Key>,
{
    /// Constructor
    pub fn new(hook: Hook<V, TreeHook>, balance: A, key_of: K, compare: C) -> BsTree<V, A, K, C> {
        BsTree {
            hook,
            header: Cell::new(Header::new()),
            size: 0,
            generation: Cell::new(0),
            balance,
            key_of,
            compare,
        }
    }

    /// Get the number of values in the tree
    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Check if the tree is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// The hook this tree links values through
    #[inline]
    pub fn hook(&self) -> Hook<V, TreeHook> {
        self.hook
    }

    /// The balancing strategy
    #[inline]
    pub fn balance(&self) -> &A {
        &self.balance
    }

    /// The key extractor
    #[inline]
    pub fn key_of(&self) -> &K {
        &self.key_of
    }

    /// The comparator
    #[inline]
    pub fn compare(&self) -> &C {
        &self.compare
    }

    /// The slot at the root, if any
    #[inline]
    pub fn root(&self) -> Option<usize> {
        slot(self.header.get().root)
    }

    /// The slot holding the first value in order
    #[inline]
    pub fn first(&self) -> Option<usize> {
        slot(self.header.get().leftmost)
    }

    /// The slot holding the last value in order
    #[inline]
    pub fn last(&self) -> Option<usize> {
        slot(self.header.get().rightmost)
    }

    /// The slot after `x` in order
    pub fn next(&self, slab: &[V], x: usize) -> Option<usize> {
        slot(bst::next(self.nodes(slab), x))
    }

    /// The slot before `x` in order
    pub fn prev(&self, slab: &[V], x: usize) -> Option<usize> {
        slot(bst::prev(self.nodes(slab), x))
    }

    /// Iterate over the slots in order
    pub fn iter<'a>(&self, slab: &'a [V]) -> Iter<'a, V> {
        let header = self.header.get();
        Iter {
            nodes: self.nodes(slab),
            front: header.leftmost,
            back: header.rightmost,
            count: self.size,
        }
    }

    /// Number of edges on the longest path from the root; zero when empty
    pub fn height(&self, slab: &[V]) -> usize {
        bst::height(self.nodes(slab), self.header.get().root).max(0) as usize
    }

    //-------------------------------------------------------------------------------------------//

    /// Link a value unless one with an equal key is present
    ///
    /// Returns the slot of the value with that key and whether `x` was linked.
    pub fn insert_unique(&mut self, slab: &[V], x: usize) -> Result<(usize, bool), Error> {
        let t = self.nodes(slab);
        ensure_unlinked(t, x)?;

        let root = self.header.get().root;
        let location = bst::locate_unique(t, root, t.key(&self.key_of, x), &self.key_of, &self.compare);
        if let Location::Found(y) = location {
            self.access(t, y);
            return Ok((y, false));
        }

        self.link(t, x, location);
        Ok((x, true))
    }

    /// Link a value after any values with an equal key
    pub fn insert_equal(&mut self, slab: &[V], x: usize) -> Result<usize, Error> {
        let t = self.nodes(slab);
        ensure_unlinked(t, x)?;

        let root = self.header.get().root;
        let location = bst::locate_equal(t, root, t.key(&self.key_of, x), &self.key_of, &self.compare);
        self.link(t, x, location);
        Ok(x)
    }

    /// Search for a key ahead of a unique insert, without constructing a value
    ///
    /// The returned commit token is valid until the tree is next modified.
    pub fn insert_unique_check(&self, slab: &[V], key: &K::Key) -> Lookup {
        let t = self.nodes(slab);
        let root = self.header.get().root;
        match bst::locate_unique(t, root, key, &self.key_of, &self.compare) {
            Location::Found(y) => Lookup::Occupied(y),
            location => Lookup::Vacant(InsertCommit {
                location,
                generation: self.generation.get(),
            }),
        }
    }

    /// Link a value at the position found by `insert_unique_check`
    ///
    /// The value must have the key that was checked.
    pub fn insert_unique_commit(&mut self, slab: &[V], x: usize, commit: InsertCommit) -> Result<usize, Error> {
        if commit.generation != self.generation.get() {
            return Err(Error::StaleCommit);
        }

        let t = self.nodes(slab);
        ensure_unlinked(t, x)?;

        self.link(t, x, commit.location);
        Ok(x)
    }

    /// Link a sequence of values, skipping those whose key is already present
    ///
    /// Stops at the first value that is already linked; values linked before it stay linked.
    /// Returns how many values were linked.
    pub fn extend_unique<I>(&mut self, slab: &[V], slots: I) -> Result<usize, Error>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut count = 0;
        for x in slots {
            if self.insert_unique(slab, x)?.1 {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Link a sequence of values, keeping duplicates
    ///
    /// Stops at the first value that is already linked; values linked before it stay linked.
    pub fn extend_equal<I>(&mut self, slab: &[V], slots: I) -> Result<usize, Error>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut count = 0;
        for x in slots {
            self.insert_equal(slab, x)?;
            count += 1;
        }
        Ok(count)
    }

    //-------------------------------------------------------------------------------------------//

    /// Unlink a value, returning the slot that followed it
    ///
    /// Fails with `NotLinked` unless `x` is linked into this tree. A value linked into a different
    /// tree through the same hook is refused, at the cost of a walk up to the root.
    pub fn erase(&mut self, slab: &[V], x: usize) -> Result<Option<usize>, Error> {
        let t = self.nodes(slab);
        self.ensure_member(t, x)?;

        let next = bst::next(t, x);
        self.unlink(t, x);
        Ok(slot(next))
    }

    /// Unlink a value and hand its slot to a disposer
    pub fn erase_and_dispose<D>(&mut self, slab: &[V], x: usize, disposer: D) -> Result<Option<usize>, Error>
    where
        D: FnOnce(usize),
    {
        let next = self.erase(slab, x)?;
        disposer(x);
        Ok(next)
    }

    /// Unlink every value with an equal key, returning how many were unlinked
    pub fn remove(&mut self, slab: &[V], key: &K::Key) -> usize {
        self.remove_and_dispose(slab, key, |_| {})
    }

    /// Unlink every value with an equal key and hand each slot to a disposer
    pub fn remove_and_dispose<D>(&mut self, slab: &[V], key: &K::Key, mut disposer: D) -> usize
    where
        D: FnMut(usize),
    {
        let t = self.nodes(slab);
        let root = self.header.get().root;

        let mut x = bst::lower_bound(t, root, key, &self.key_of, &self.compare);
        let mut count = 0;
        while !x != 0 && self.compare.compare(key, t.key(&self.key_of, x)) == Ordering::Equal {
            let next = bst::next(t, x);
            self.unlink(t, x);
            disposer(x);
            count += 1;
            x = next;
        }
        count
    }

    /// Unlink every value
    pub fn clear(&mut self, slab: &[V]) {
        self.clear_and_dispose(slab, |_| {});
    }

    /// Unlink every value and hand each slot, in order, to a disposer
    pub fn clear_and_dispose<D>(&mut self, slab: &[V], mut disposer: D)
    where
        D: FnMut(usize),
    {
        let t = self.nodes(slab);

        // Unwind the tree into a vine as it is consumed, so no parent links are needed
        let mut x = self.header.get().root;
        while !x != 0 {
            let l = t.left(x);
            if !l != 0 {
                t.set_left(x, t.right(l));
                t.set_right(l, x);
                x = l;
            } else {
                let r = t.right(x);
                t.hook(x).reset();
                disposer(x);
                x = r;
            }
        }

        self.header.set(Header::new());
        self.size = 0;
        self.bump();
        self.balance.reset();
    }

    //-------------------------------------------------------------------------------------------//

    /// Get the slot of a value with an equal key
    ///
    /// With duplicates this is the first of them. A splay tree moves it to the root.
    pub fn find(&self, slab: &[V], key: &K::Key) -> Option<usize> {
        let t = self.nodes(slab);
        let x = bst::find(t, self.header.get().root, key, &self.key_of, &self.compare);
        self.access(t, x);
        slot(x)
    }

    /// Check if a value with an equal key is present
    pub fn contains(&self, slab: &[V], key: &K::Key) -> bool {
        let t = self.nodes(slab);
        !bst::find(t, self.header.get().root, key, &self.key_of, &self.compare) != 0
    }

    /// Count the values with an equal key
    pub fn count(&self, slab: &[V], key: &K::Key) -> usize {
        self.equal_range(slab, key).len()
    }

    /// Get the first slot whose key is not less than `key`
    pub fn lower_bound(&self, slab: &[V], key: &K::Key) -> Option<usize> {
        let t = self.nodes(slab);
        let x = bst::lower_bound(t, self.header.get().root, key, &self.key_of, &self.compare);
        self.access(t, x);
        slot(x)
    }

    /// Get the first slot whose key is greater than `key`
    pub fn upper_bound(&self, slab: &[V], key: &K::Key) -> Option<usize> {
        let t = self.nodes(slab);
        let x = bst::upper_bound(t, self.header.get().root, key, &self.key_of, &self.compare);
        self.access(t, x);
        slot(x)
    }

    /// Iterate over the slots whose key is equal to `key`
    pub fn equal_range<'a>(&self, slab: &'a [V], key: &K::Key) -> Iter<'a, V> {
        let t = self.nodes(slab);
        let root = self.header.get().root;

        let front = bst::lower_bound(t, root, key, &self.key_of, &self.compare);
        let mut back = !0;
        let mut count = 0;

        let mut x = front;
        while !x != 0 && self.compare.compare(key, t.key(&self.key_of, x)) == Ordering::Equal {
            back = x;
            count += 1;
            x = bst::next(t, x);
        }

        Iter {
            nodes: t,
            front,
            back,
            count,
        }
    }

    //-------------------------------------------------------------------------------------------//

    /// Make this tree a copy of `source`, cloning each of its values
    ///
    /// The clone of the value in source slot `i` is written to slot `i` of `slab`, and the copy
    /// has exactly the shape of the source. Existing values of this tree are unlinked and
    /// disposed first. If the cloner fails, every slot cloned so far is disposed, this tree is
    /// left empty and the error is returned.
    pub fn clone_from<E, F, D>(
        &mut self,
        slab: &mut [V],
        source: &Self,
        source_slab: &[V],
        mut cloner: F,
        mut disposer: D,
    ) -> Result<(), CloneError<E>>
    where
        A: Clone,
        F: FnMut(&V) -> Result<V, E>,
        D: FnMut(usize),
    {
        self.clear_and_dispose(slab, &mut disposer);

        let required = source.iter(source_slab).max().map_or(0, |x| x + 1);
        if slab.len() < required {
            return Err(Error::SlabTooSmall {
                required,
                actual: slab.len(),
            }
            .into());
        }

        for x in source.iter(source_slab) {
            match cloner(&source_slab[x]) {
                Ok(value) => slab[x] = value,
                Err(error) => {
                    trace!(slot = x, "cloner failed, disposing partial copy");
                    for y in source.iter(source_slab).take_while(|&y| y != x) {
                        self.hook.of(&slab[y]).reset();
                        disposer(y);
                    }
                    return Err(CloneError::Cloner(error));
                }
            }
        }

        for x in source.iter(source_slab) {
            self.hook
                .of(&slab[x])
                .copy_from(source.hook.of(&source_slab[x]));
        }

        self.header.set(source.header.get());
        self.size = source.size;
        self.balance = source.balance.clone();
        self.bump();
        Ok(())
    }

    /// Move every value of `source` whose key is absent here into this tree
    ///
    /// Both trees must link through the same hook of the same slab. Returns how many moved.
    pub fn merge_unique(&mut self, slab: &[V], source: &mut Self) -> usize {
        let t = self.nodes(slab);
        let mut count = 0;

        let mut x = source.header.get().leftmost;
        while !x != 0 {
            let next = bst::next(t, x);

            let root = self.header.get().root;
            let location = bst::locate_unique(t, root, t.key(&self.key_of, x), &self.key_of, &self.compare);
            if !matches!(location, Location::Found(_)) {
                source.unlink(t, x);
                self.link(t, x, location);
                count += 1;
            }

            x = next;
        }
        count
    }

    /// Move every value of `source` into this tree
    pub fn merge_equal(&mut self, slab: &[V], source: &mut Self) -> usize {
        let t = self.nodes(slab);
        let mut count = 0;

        let mut x = source.header.get().leftmost;
        while !x != 0 {
            let next = bst::next(t, x);
            source.unlink(t, x);

            let root = self.header.get().root;
            let location = bst::locate_equal(t, root, t.key(&self.key_of, x), &self.key_of, &self.compare);
            self.link(t, x, location);

            count += 1;
            x = next;
        }
        count
    }

    /// Exchange the contents of two trees
    pub fn swap(&mut self, other: &mut Self) {
        core::mem::swap(self, other);
    }

    /// Check every structural invariant: linkage, order, counters and balance
    pub fn check(&self, slab: &[V]) -> Result<(), Error> {
        self.check_order(slab, false)
    }

    pub(crate) fn check_order(&self, slab: &[V], unique: bool) -> Result<(), Error> {
        let t = self.nodes(slab);
        let header = self.header.get();

        let count = bst::check(t, &header, &self.key_of, &self.compare, unique)?;
        if count != self.size {
            return Err(Error::Corrupt("size counter does not match the tree"));
        }

        self.balance.check(t, &header, self.size)
    }

    //-------------------------------------------------------------------------------------------//

    #[inline]
    pub(crate) fn nodes<'s>(&self, slab: &'s [V]) -> Nodes<'s, V> {
        Nodes::new(slab, self.hook)
    }

    pub(crate) fn balance_mut(&mut self) -> &mut A {
        &mut self.balance
    }

    pub(crate) fn header(&self) -> Header {
        self.header.get()
    }

    pub(crate) fn set_header(&self, header: Header) {
        self.header.set(header);
        self.bump();
    }

    // Any structural change invalidates outstanding commit tokens
    #[inline]
    fn bump(&self) {
        self.generation.set(self.generation.get().wrapping_add(1));
    }

    // Notify a self-adjusting strategy that a lookup landed on `x`
    fn access(&self, t: Nodes<'_, V>, x: usize) {
        if A::SELF_ADJUSTING && !x != 0 {
            let mut header = self.header.get();
            self.balance.on_access(t, &mut header, x);
            self.set_header(header);
        }
    }

    fn link(&mut self, t: Nodes<'_, V>, x: usize, location: Location) {
        let mut header = self.header.get();
        self.balance.init(t, x);
        bst::link(t, &mut header, x, location);
        self.size += 1;
        self.balance.after_insert(t, &mut header, x, self.size);
        self.set_header(header);
    }

    fn unlink(&mut self, t: Nodes<'_, V>, x: usize) {
        let mut header = self.header.get();
        self.size -= 1;
        self.balance.erase(t, &mut header, x, self.size);
        t.hook(x).reset();
        self.set_header(header);
    }

    // A value linked through the same hook into another tree reaches a different root
    pub(crate) fn ensure_member(&self, t: Nodes<'_, V>, x: usize) -> Result<(), Error> {
        if t.hook(x).is_linked() && bst::root_of(t, x) == self.header.get().root {
            Ok(())
        } else {
            Err(Error::NotLinked(x))
        }
    }
}

impl<V, A, K, C> fmt::Debug for BsTree<V, A, K, C>
where
    A: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BsTree")
            .field("size", &self.size)
            .field("header", &self.header.get())
            .field("balance", &self.balance)
            .finish()
    }
}

// Map the `!0` null index to `None`
#[inline]
pub(crate) fn slot(x: usize) -> Option<usize> {
    if !x == 0 {
        None
    } else {
        Some(x)
    }
}

fn ensure_unlinked<V>(t: Nodes<'_, V>, x: usize) -> Result<(), Error> {
    if t.hook(x).is_linked() {
        Err(Error::AlreadyLinked(x))
    } else {
        Ok(())
    }
}

//-----------------------------------------------------------------------------------------------//

/// Iterator over the slots of a tree, in order
pub struct Iter<'a, V> {
    nodes: Nodes<'a, V>,
    front: usize,
    back: usize,
    count: usize,
}

impl<V> Iterator for Iter<'_, V> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.count == 0 {
            return None;
        }

        let x = self.front;
        self.front = bst::next(self.nodes, x);
        self.count -= 1;

        Some(x)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.count, Some(self.count))
    }
}

impl<V> DoubleEndedIterator for Iter<'_, V> {
    fn next_back(&mut self) -> Option<usize> {
        if self.count == 0 {
            return None;
        }

        let x = self.back;
        self.back = bst::prev(self.nodes, x);
        self.count -= 1;

        Some(x)
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

impl<V> FusedIterator for Iter<'_, V> {}

//-----------------------------------------------------------------------------------------------//

#[test]
// Two-phase insertion and stale commit detection
fn test_tree_0() {
    use self::bst::fixture::*;

    let slab = slab(&[10, 20, 30, 20]);
    let mut tree = BsTree::new(hook(), RedBlack, ByKey, Natural);

    tree.insert_unique(&slab, 0).unwrap();
    tree.insert_unique(&slab, 2).unwrap();

    let commit = match tree.insert_unique_check(&slab, &20) {
        Lookup::Vacant(commit) => commit,
        Lookup::Occupied(_) => panic!("20 is not in the tree yet"),
    };
    debug_assert_eq!(tree.insert_unique_commit(&slab, 1, commit), Ok(1));
    debug_assert_eq!(tree.insert_unique_check(&slab, &20), Lookup::Occupied(1));

    // A commit taken before an erase must be rejected
    let commit = match tree.insert_unique_check(&slab, &25) {
        Lookup::Vacant(commit) => commit,
        Lookup::Occupied(_) => panic!("25 is not in the tree"),
    };
    tree.erase(&slab, 0).unwrap();
    debug_assert_eq!(
        tree.insert_unique_commit(&slab, 3, commit),
        Err(Error::StaleCommit)
    );

    debug_assert_eq!(tree.insert_unique(&slab, 3), Ok((1, false)));
    debug_assert_eq!(tree.insert_unique(&slab, 1), Err(Error::AlreadyLinked(1)));
    debug_assert_eq!(tree.erase(&slab, 0), Err(Error::NotLinked(0)));
    debug_assert_eq!(tree.check(&slab), Ok(()));
}

#[test]
// Duplicates keep insertion order and are removed together
fn test_tree_1() {
    use self::bst::fixture::*;
    use alloc::vec::Vec;

    let slab = slab(&[4, 2, 4, 1, 4, 3]);
    let mut tree = BsTree::new(hook(), Avl, ByKey, Natural);
    debug_assert_eq!(tree.extend_equal(&slab, 0..slab.len()), Ok(6));

    let fours: Vec<usize> = tree.equal_range(&slab, &4).collect();
    debug_assert_eq!(fours, [0, 2, 4]);
    debug_assert_eq!(tree.count(&slab, &4), 3);
    debug_assert_eq!(tree.find(&slab, &4), Some(0));

    let mut disposed = Vec::new();
    debug_assert_eq!(tree.remove_and_dispose(&slab, &4, |x| disposed.push(x)), 3);
    debug_assert_eq!(disposed, [0, 2, 4]);
    debug_assert_eq!(tree.len(), 3);
    debug_assert!(!slab[2].hook.is_linked());

    let keys: Vec<u32> = tree.iter(&slab).rev().map(|x| slab[x].key).collect();
    debug_assert_eq!(keys, [3, 2, 1]);
    debug_assert_eq!(tree.check(&slab), Ok(()));

    let mut order = Vec::new();
    tree.clear_and_dispose(&slab, |x| order.push(slab[x].key));
    debug_assert_eq!(order, [1, 2, 3]);
    debug_assert!(tree.is_empty());
    debug_assert!(slab.iter().all(|leaf| !leaf.hook.is_linked()));
}

#[test]
// Structural clones match their source and unwind on failure
fn test_tree_2() {
    use self::bst::fixture::*;
    use alloc::vec::Vec;

    let source_slab = slab(&[50, 20, 80, 10, 30]);
    let mut source = BsTree::new(hook(), RedBlack, ByKey, Natural);
    source.extend_unique(&source_slab, 0..5).unwrap();

    let copy = |leaf: &Leaf| -> Result<Leaf, ()> {
        Ok(Leaf {
            key: leaf.key,
            hook: TreeHook::new(),
        })
    };

    let mut slab = slab(&[0; 5]);
    let mut tree = BsTree::new(hook(), RedBlack, ByKey, Natural);
    tree.clone_from(&mut slab, &source, &source_slab, copy, |_| {})
        .unwrap();

    debug_assert_eq!(tree.len(), 5);
    debug_assert_eq!(tree.root(), source.root());
    debug_assert_eq!(tree.check(&slab), Ok(()));
    let keys: Vec<u32> = tree.iter(&slab).map(|x| slab[x].key).collect();
    debug_assert_eq!(keys, [10, 20, 30, 50, 80]);

    // Mutating the copy leaves the source alone
    tree.erase(&slab, 0).unwrap();
    debug_assert_eq!(source.len(), 5);
    debug_assert_eq!(source.check(&source_slab), Ok(()));

    // Fail on the fourth clone; the three before it are disposed
    let mut calls = 0;
    let failing = |leaf: &Leaf| -> Result<Leaf, &'static str> {
        calls += 1;
        if calls == 4 {
            return Err("out of slots");
        }
        Ok(Leaf {
            key: leaf.key,
            hook: TreeHook::new(),
        })
    };

    let mut disposed = Vec::new();
    let result = tree.clone_from(&mut slab, &source, &source_slab, failing, |x| {
        disposed.push(x)
    });
    debug_assert!(matches!(result, Err(CloneError::Cloner("out of slots"))));

    // Four leaves from the earlier copy, then the three partial clones
    debug_assert_eq!(disposed.len(), 7);
    debug_assert_eq!(&disposed[4..], [3, 1, 4]);
    debug_assert!(tree.is_empty());
    debug_assert!(slab.iter().all(|leaf| !leaf.hook.is_linked()));
}

#[test]
// Merging moves values between trees over one slab
fn test_tree_3() {
    use self::bst::fixture::*;
    use alloc::vec::Vec;

    let slab = slab(&[1, 3, 5, 3, 4, 5]);
    let mut a = BsTree::new(hook(), RedBlack, ByKey, Natural);
    let mut b = BsTree::new(hook(), RedBlack, ByKey, Natural);

    a.extend_unique(&slab, 0..3).unwrap();
    b.extend_unique(&slab, 3..6).unwrap();

    debug_assert_eq!(a.merge_unique(&slab, &mut b), 1);
    debug_assert_eq!(a.len(), 4);
    debug_assert_eq!(b.len(), 2);
    debug_assert_eq!(a.check(&slab), Ok(()));
    debug_assert_eq!(b.check(&slab), Ok(()));

    debug_assert_eq!(a.merge_equal(&slab, &mut b), 2);
    debug_assert!(b.is_empty());
    let keys: Vec<u32> = a.iter(&slab).map(|x| slab[x].key).collect();
    debug_assert_eq!(keys, [1, 3, 3, 4, 5, 5]);

    a.swap(&mut b);
    debug_assert!(a.is_empty());
    debug_assert_eq!(b.len(), 6);
}

#[test]
// Two trees sharing a hook refuse to unlink each other's values
fn test_tree_4() {
    use self::bst::fixture::*;

    let slab = slab(&[1, 2, 3, 10, 20, 30]);
    let mut low = BsTree::new(hook(), RedBlack, ByKey, Natural);
    let mut high = BsTree::new(hook(), RedBlack, ByKey, Natural);
    debug_assert_eq!(low.extend_unique(&slab, 0..3), Ok(3));
    debug_assert_eq!(high.extend_unique(&slab, 3..6), Ok(3));

    debug_assert_eq!(high.erase(&slab, 1), Err(Error::NotLinked(1)));
    debug_assert_eq!(
        low.erase_and_dispose(&slab, 4, |_| panic!("4 belongs to the other tree")),
        Err(Error::NotLinked(4))
    );
    debug_assert!(slab[1].hook.is_linked());
    debug_assert!(slab[4].hook.is_linked());
    debug_assert_eq!((low.len(), high.len()), (3, 3));
    debug_assert_eq!(low.check(&slab), Ok(()));
    debug_assert_eq!(high.check(&slab), Ok(()));

    debug_assert_eq!(high.erase(&slab, 4), Ok(Some(5)));
    debug_assert_eq!(low.erase(&slab, 1), Ok(Some(2)));
    debug_assert_eq!(low.check(&slab), Ok(()));
    debug_assert_eq!(high.check(&slab), Ok(()));
}
