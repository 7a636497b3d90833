//! Binary search tree algorithms shared by every balancing strategy
//!
//! The functions below work on slot indices and a [`Nodes`] view of the caller's slab. A null
//! link is `!0`. They never allocate and never touch a value other than through its key.

use core::cmp::Ordering;

use crate::{
    functor::{Compare, KeyOf},
    hook::{Hook, TreeHook},
    Error,
};

//-----------------------------------------------------------------------------------------------//

/// The sentinel that anchors a tree: its root and the cached extremes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    /// The root leaf, or `!0` if the tree is empty
    pub root: usize,
    /// The first leaf in order
    pub leftmost: usize,
    /// The last leaf in order
    pub rightmost: usize,
}

impl Header {
    /// An empty tree
    pub const fn new() -> Header {
        Header {
            root: !0,
            leftmost: !0,
            rightmost: !0,
        }
    }

    /// Make `x` the child of `parent` that `old` used to be, or the root
    #[inline]
    pub fn replace_child<V>(&mut self, t: Nodes<'_, V>, parent: usize, old: usize, x: usize) {
        if !parent == 0 {
            self.root = x;
        } else if t.left(parent) == old {
            t.set_left(parent, x);
        } else {
            debug_assert_eq!(t.right(parent), old);
            t.set_right(parent, x);
        }
    }
}

impl Default for Header {
    fn default() -> Self {
        Header::new()
    }
}

//-----------------------------------------------------------------------------------------------//

/// A view of the leaves of a tree: the caller's slab and the hook used to reach the linkage
pub struct Nodes<'s, V> {
    slab: &'s [V],
    hook: Hook<V, TreeHook>,
}

impl<V> Clone for Nodes<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for Nodes<'_, V> {}

impl<'s, V> Nodes<'s, V> {
    /// Construct a view
    #[inline]
    pub fn new(slab: &'s [V], hook: Hook<V, TreeHook>) -> Nodes<'s, V> {
        Nodes { slab, hook }
    }

    /// The value in a slot
    #[inline]
    pub fn value(&self, x: usize) -> &'s V {
        &self.slab[x]
    }

    /// The hook of the value in a slot
    #[inline]
    pub fn hook(&self, x: usize) -> &'s TreeHook {
        self.hook.of(&self.slab[x])
    }

    /// Number of slots in the slab
    #[inline]
    pub fn slots(&self) -> usize {
        self.slab.len()
    }

    /// The parent link
    #[inline]
    pub fn parent(&self, x: usize) -> usize {
        self.hook(x).parent.get()
    }

    /// The left child link
    #[inline]
    pub fn left(&self, x: usize) -> usize {
        self.hook(x).left.get()
    }

    /// The right child link
    #[inline]
    pub fn right(&self, x: usize) -> usize {
        self.hook(x).right.get()
    }

    /// The balance metadata
    #[inline]
    pub fn meta(&self, x: usize) -> i8 {
        self.hook(x).meta.get()
    }

    /// Set the parent link
    #[inline]
    pub fn set_parent(&self, x: usize, y: usize) {
        self.hook(x).parent.set(y);
    }

    /// Set the left child link
    #[inline]
    pub fn set_left(&self, x: usize, y: usize) {
        self.hook(x).left.set(y);
    }

    /// Set the right child link
    #[inline]
    pub fn set_right(&self, x: usize, y: usize) {
        self.hook(x).right.set(y);
    }

    /// Set the balance metadata
    #[inline]
    pub fn set_meta(&self, x: usize, meta: i8) {
        self.hook(x).meta.set(meta);
    }

    /// The key of the value in a slot
    #[inline]
    pub fn key<K: KeyOf<V>>(&self, key_of: &K, x: usize) -> &'s K::Key {
        key_of.key_of(&self.slab[x])
    }
}

//-----------------------------------------------------------------------------------------------//

/// Where a key was found, or where it should be linked
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Location {
    /// A leaf with an equal key
    Found(usize),
    /// The tree is empty
    Root,
    /// As the left child of a leaf
    Left(usize),
    /// As the right child of a leaf
    Right(usize),
}

/// Locate a key, or if not found identify where to link it
pub fn locate_unique<V, K, C>(
    t: Nodes<'_, V>,
    mut x: usize,
    key: &K::Key,
    key_of: &K,
    compare: &C,
) -> Location
where
    K: KeyOf<V>,
    C: Compare<K::Key>,
{
    // `x` should be a root
    debug_assert!(!x == 0 || !t.parent(x) == 0);

    // First leaf is a special case
    if !x == 0 {
        return Location::Root;
    }

    loop {
        match compare.compare(key, t.key(key_of, x)) {
            Ordering::Equal => return Location::Found(x),
            Ordering::Less => {
                let y = t.left(x);
                if !y == 0 {
                    return Location::Left(x);
                }
                x = y;
            }
            Ordering::Greater => {
                let y = t.right(x);
                if !y == 0 {
                    return Location::Right(x);
                }
                x = y;
            }
        }
    }
}

/// Identify where to link a key that may already be present
///
/// Equal keys descend to the right, so a new leaf lands after every existing equal leaf and
/// duplicates keep their insertion order.
pub fn locate_equal<V, K, C>(
    t: Nodes<'_, V>,
    mut x: usize,
    key: &K::Key,
    key_of: &K,
    compare: &C,
) -> Location
where
    K: KeyOf<V>,
    C: Compare<K::Key>,
{
    if !x == 0 {
        return Location::Root;
    }

    loop {
        if compare.compare(key, t.key(key_of, x)) == Ordering::Less {
            let y = t.left(x);
            if !y == 0 {
                return Location::Left(x);
            }
            x = y;
        } else {
            let y = t.right(x);
            if !y == 0 {
                return Location::Right(x);
            }
            x = y;
        }
    }
}

/// Get a leaf with an equal key, or `!0`
///
/// With duplicate keys this is the first equal leaf in order.
pub fn find<V, K, C>(
    t: Nodes<'_, V>,
    root: usize,
    key: &K::Key,
    key_of: &K,
    compare: &C,
) -> usize
where
    K: KeyOf<V>,
    C: Compare<K::Key>,
{
    let x = lower_bound(t, root, key, key_of, compare);
    if !x != 0 && compare.compare(key, t.key(key_of, x)) == Ordering::Equal {
        x
    } else {
        !0
    }
}

/// Get the first leaf whose key is not less than `key`, or `!0`
pub fn lower_bound<V, K, C>(
    t: Nodes<'_, V>,
    mut x: usize,
    key: &K::Key,
    key_of: &K,
    compare: &C,
) -> usize
where
    K: KeyOf<V>,
    C: Compare<K::Key>,
{
    let mut bound = !0;
    while !x != 0 {
        if compare.compare(t.key(key_of, x), key) == Ordering::Less {
            x = t.right(x);
        } else {
            bound = x;
            x = t.left(x);
        }
    }
    bound
}

/// Get the first leaf whose key is greater than `key`, or `!0`
pub fn upper_bound<V, K, C>(
    t: Nodes<'_, V>,
    mut x: usize,
    key: &K::Key,
    key_of: &K,
    compare: &C,
) -> usize
where
    K: KeyOf<V>,
    C: Compare<K::Key>,
{
    let mut bound = !0;
    while !x != 0 {
        if compare.compare(key, t.key(key_of, x)) == Ordering::Less {
            bound = x;
            x = t.left(x);
        } else {
            x = t.right(x);
        }
    }
    bound
}

//-----------------------------------------------------------------------------------------------//

/// Link `x` as a leaf at a located position, keeping the cached extremes up to date
pub fn link<V>(t: Nodes<'_, V>, header: &mut Header, x: usize, location: Location) {
    let hook = t.hook(x);
    hook.left.set(!0);
    hook.right.set(!0);
    hook.linked.set(true);

    match location {
        Location::Found(_) => unreachable!("a found key is never linked"),
        Location::Root => {
            hook.parent.set(!0);
            header.root = x;
            header.leftmost = x;
            header.rightmost = x;
        }
        Location::Left(parent) => {
            hook.parent.set(parent);
            t.set_left(parent, x);
            if header.leftmost == parent {
                header.leftmost = x;
            }
        }
        Location::Right(parent) => {
            hook.parent.set(parent);
            t.set_right(parent, x);
            if header.rightmost == parent {
                header.rightmost = x;
            }
        }
    }
}

/// Rotate `x` down to the left, so its right child takes its place
pub fn rotate_left<V>(t: Nodes<'_, V>, header: &mut Header, x: usize) {
    let y = t.right(x);
    debug_assert!(!y != 0);

    let b = t.left(y);
    t.set_right(x, b);
    if !b != 0 {
        t.set_parent(b, x);
    }

    let p = t.parent(x);
    t.set_parent(y, p);
    header.replace_child(t, p, x, y);

    t.set_left(y, x);
    t.set_parent(x, y);
}

/// Rotate `x` down to the right, so its left child takes its place
pub fn rotate_right<V>(t: Nodes<'_, V>, header: &mut Header, x: usize) {
    let y = t.left(x);
    debug_assert!(!y != 0);

    let b = t.right(y);
    t.set_left(x, b);
    if !b != 0 {
        t.set_parent(b, x);
    }

    let p = t.parent(x);
    t.set_parent(y, p);
    header.replace_child(t, p, x, y);

    t.set_right(y, x);
    t.set_parent(x, y);
}

/// What an erase left behind, for the balancing strategy to repair
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Removed {
    /// The leaf that moved into the vacated position, or `!0`
    pub x: usize,
    /// The parent of that position
    pub parent: usize,
    /// Whether the position is the left child of `parent`
    pub is_left: bool,
    /// The metadata of the position that physically disappeared
    pub meta: i8,
}

/// Unlink `z` from the tree
///
/// A leaf with at most one child is spliced out. Otherwise its successor takes its place (and its
/// metadata), and the successor's old position is the one that disappears. The hook of `z` is
/// left untouched.
pub fn erase<V>(t: Nodes<'_, V>, header: &mut Header, z: usize) -> Removed {
    let zl = t.left(z);
    let zr = t.right(z);
    let zp = t.parent(z);

    if !zl != 0 && !zr != 0 {
        let y = first(t, zr);
        let x = t.right(y);

        t.set_parent(zl, y);
        t.set_left(y, zl);

        let (parent, is_left) = if y != zr {
            let yp = t.parent(y);
            if !x != 0 {
                t.set_parent(x, yp);
            }
            t.set_left(yp, x);
            t.set_right(y, zr);
            t.set_parent(zr, y);
            (yp, true)
        } else {
            (y, false)
        };

        t.set_parent(y, zp);
        header.replace_child(t, zp, z, y);

        let meta = t.meta(y);
        t.set_meta(y, t.meta(z));

        // Two children means `z` was neither the first nor the last leaf
        return Removed {
            x,
            parent,
            is_left,
            meta,
        };
    }

    let x = if !zl == 0 { zr } else { zl };
    let is_left = !zp != 0 && t.left(zp) == z;

    if !x != 0 {
        t.set_parent(x, zp);
    }
    header.replace_child(t, zp, z, x);

    if header.leftmost == z {
        header.leftmost = if !x == 0 { zp } else { first(t, x) };
    }
    if header.rightmost == z {
        header.rightmost = if !x == 0 { zp } else { last(t, x) };
    }

    Removed {
        x,
        parent: zp,
        is_left,
        meta: t.meta(z),
    }
}

//-----------------------------------------------------------------------------------------------//

/// Get the first leaf (the left-most) of the subtree at `x`
pub fn first<V>(t: Nodes<'_, V>, mut x: usize) -> usize {
    if !x == 0 {
        return !0;
    }

    loop {
        let y = t.left(x);
        if !y == 0 {
            return x;
        }
        x = y;
    }
}

/// Get the last leaf (the right-most) of the subtree at `x`
pub fn last<V>(t: Nodes<'_, V>, mut x: usize) -> usize {
    if !x == 0 {
        return !0;
    }

    loop {
        let y = t.right(x);
        if !y == 0 {
            return x;
        }
        x = y;
    }
}

/// Get the logical predecessor to a leaf
pub fn prev<V>(t: Nodes<'_, V>, mut x: usize) -> usize {
    let y = t.left(x);
    if !y != 0 {
        return last(t, y);
    }

    loop {
        let y = t.parent(x);
        if !y == 0 {
            return !0;
        }
        if t.right(y) == x {
            return y;
        }
        debug_assert_eq!(t.left(y), x);
        x = y;
    }
}

/// Get the logical successor to a leaf
pub fn next<V>(t: Nodes<'_, V>, mut x: usize) -> usize {
    let y = t.right(x);
    if !y != 0 {
        return first(t, y);
    }

    loop {
        let y = t.parent(x);
        if !y == 0 {
            return !0;
        }
        if t.left(y) == x {
            return y;
        }
        debug_assert_eq!(t.right(y), x);
        x = y;
    }
}

/// Number of edges between a leaf and the root
pub fn depth<V>(t: Nodes<'_, V>, mut x: usize) -> usize {
    let mut depth = 0;
    loop {
        x = t.parent(x);
        if !x == 0 {
            return depth;
        }
        depth += 1;
    }
}

/// The root of the tree that `x` is linked into
pub fn root_of<V>(t: Nodes<'_, V>, mut x: usize) -> usize {
    loop {
        let p = t.parent(x);
        if !p == 0 {
            return x;
        }
        x = p;
    }
}

/// Number of edges on the longest path down from `x`, with an empty tree at -1
///
/// Walks the subtree through parent links, so degenerate trees cost no stack.
pub fn height<V>(t: Nodes<'_, V>, x: usize) -> isize {
    if !x == 0 {
        return -1;
    }

    let mut y = x;
    let mut depth = 0;
    let mut deepest = 0;
    loop {
        while !t.left(y) != 0 {
            y = t.left(y);
            depth += 1;
        }
        deepest = deepest.max(depth);

        if !t.right(y) != 0 {
            y = t.right(y);
            depth += 1;
            continue;
        }

        // Climb until a left child whose parent has a right subtree still to visit
        loop {
            if y == x {
                return deepest;
            }
            let p = t.parent(y);
            let from_left = t.left(p) == y;
            y = p;
            depth -= 1;
            if from_left && !t.right(y) != 0 {
                y = t.right(y);
                depth += 1;
                break;
            }
        }
    }
}

/// Number of leaves in the subtree at `x`
pub fn subtree_size<V>(t: Nodes<'_, V>, x: usize) -> usize {
    if !x == 0 {
        return 0;
    }

    let end = last(t, x);
    let mut y = first(t, x);
    let mut count = 1;
    while y != end {
        y = next(t, y);
        count += 1;
    }
    count
}

//-----------------------------------------------------------------------------------------------//

// IMPLEMENTATION NOTE
//
// Rebuilding a subtree follows Day, Stout and Warren: right rotations flatten it into a sorted
// 'vine' linked through `right`, then rounds of left rotations fold the vine into a complete
// tree. Parent links are ignored while folding and repaired in one pass at the end.

/// Rebuild the subtree at `x` into a perfectly balanced shape, returning its new root
pub fn rebuild<V>(t: Nodes<'_, V>, header: &mut Header, x: usize) -> usize {
    if !x == 0 {
        return !0;
    }

    let parent = t.parent(x);
    let (mut head, size) = tree_to_vine(t, x);
    vine_to_tree(t, &mut head, size);

    fix_parents(t, head, parent);
    header.replace_child(t, parent, x, head);
    head
}

// Flatten a subtree into a vine, returning the head and the length
fn tree_to_vine<V>(t: Nodes<'_, V>, x: usize) -> (usize, usize) {
    let mut head = !0;
    let mut tail = !0;
    let mut rest = x;
    let mut size = 0;

    while !rest != 0 {
        let l = t.left(rest);
        if !l == 0 {
            if !tail == 0 {
                head = rest;
            } else {
                t.set_right(tail, rest);
            }
            tail = rest;
            rest = t.right(rest);
            size += 1;
        } else {
            t.set_left(rest, t.right(l));
            t.set_right(l, rest);
            rest = l;
        }
    }

    (head, size)
}

// Fold a vine into a complete tree
fn vine_to_tree<V>(t: Nodes<'_, V>, head: &mut usize, size: usize) {
    let mut full = 1;
    while full <= size {
        full = full * 2 + 1;
    }
    full /= 2;

    compress(t, head, size - full);

    let mut size = full;
    while size > 1 {
        size /= 2;
        compress(t, head, size);
    }
}

// Apply `count` left rotations to every other leaf along the vine
fn compress<V>(t: Nodes<'_, V>, head: &mut usize, count: usize) {
    let mut scanner = !0;
    for _ in 0..count {
        let child = if !scanner == 0 { *head } else { t.right(scanner) };
        let grand = t.right(child);

        t.set_right(child, t.left(grand));
        t.set_left(grand, child);

        if !scanner == 0 {
            *head = grand;
        } else {
            t.set_right(scanner, grand);
        }
        scanner = grand;
    }
}

// Repair parent links below `x`, which is balanced so recursion stays shallow
fn fix_parents<V>(t: Nodes<'_, V>, x: usize, parent: usize) {
    if !x == 0 {
        return;
    }
    t.set_parent(x, parent);
    fix_parents(t, t.left(x), x);
    fix_parents(t, t.right(x), x);
}

//-----------------------------------------------------------------------------------------------//

/// Check the linkage, the order of keys and the cached extremes, returning the leaf count
///
/// When `unique` is set neighbouring keys must be strictly increasing.
pub fn check<V, K, C>(
    t: Nodes<'_, V>,
    header: &Header,
    key_of: &K,
    compare: &C,
    unique: bool,
) -> Result<usize, Error>
where
    K: KeyOf<V>,
    C: Compare<K::Key>,
{
    let root = header.root;
    if !root == 0 {
        if !header.leftmost != 0 || !header.rightmost != 0 {
            return Err(Error::Corrupt("empty tree caches a leaf"));
        }
        return Ok(0);
    }

    if !t.parent(root) != 0 {
        return Err(Error::Corrupt("root has a parent"));
    }
    if header.leftmost != first(t, root) {
        return Err(Error::Corrupt("cached leftmost leaf is wrong"));
    }
    if header.rightmost != last(t, root) {
        return Err(Error::Corrupt("cached rightmost leaf is wrong"));
    }

    let mut count_f = 0;
    let mut x = header.leftmost;
    let mut previous = !0;

    while !x != 0 {
        if !t.hook(x).is_linked() {
            return Err(Error::Corrupt("reachable leaf is not marked linked"));
        }

        let l = t.left(x);
        let r = t.right(x);
        if !l != 0 && t.parent(l) != x {
            return Err(Error::Corrupt("left child does not point back to its parent"));
        }
        if !r != 0 && t.parent(r) != x {
            return Err(Error::Corrupt("right child does not point back to its parent"));
        }

        if !previous != 0 {
            match compare.compare(t.key(key_of, previous), t.key(key_of, x)) {
                Ordering::Greater => return Err(Error::Corrupt("keys are out of order")),
                Ordering::Equal if unique => {
                    return Err(Error::Corrupt("duplicate key in a unique tree"));
                }
                _ => {}
            }
        }

        count_f += 1;
        previous = x;
        x = next(t, x);
    }

    // Count leaves (backwards)
    let mut count_b = 0;
    x = header.rightmost;
    while !x != 0 {
        count_b += 1;
        x = prev(t, x);
    }

    if count_f != count_b {
        return Err(Error::Corrupt("forward and backward walks disagree"));
    }

    Ok(count_f)
}

//-----------------------------------------------------------------------------------------------//

#[cfg(test)]
pub(crate) mod fixture {
    use super::*;
    use crate::functor::KeyOf;

    pub struct Leaf {
        pub key: u32,
        pub hook: TreeHook,
    }

    pub struct ByKey;

    impl KeyOf<Leaf> for ByKey {
        type Key = u32;

        fn key_of<'a>(&self, value: &'a Leaf) -> &'a u32 {
            &value.key
        }
    }

    pub fn slab(keys: &[u32]) -> alloc::vec::Vec<Leaf> {
        keys.iter()
            .map(|&key| Leaf {
                key,
                hook: TreeHook::new(),
            })
            .collect()
    }

    pub fn hook() -> Hook<Leaf, TreeHook> {
        Hook::new(|v: &Leaf| &v.hook)
    }
}

#[test]
// Plain unbalanced insertion, navigation and erasure
fn test_bst_0() {
    use self::fixture::*;
    use crate::functor::Natural;
    use alloc::vec::Vec;

    let slab = slab(&[5, 3, 8, 1, 4, 7, 9]);
    let t = Nodes::new(&slab, hook());
    let mut header = Header::new();

    for x in 0..slab.len() {
        let location = locate_unique(t, header.root, &slab[x].key, &ByKey, &Natural);
        link(t, &mut header, x, location);
    }

    debug_assert_eq!(check(t, &header, &ByKey, &Natural, true), Ok(7));
    debug_assert_eq!(slab[header.leftmost].key, 1);
    debug_assert_eq!(slab[header.rightmost].key, 9);
    debug_assert_eq!(height(t, header.root), 2);

    let mut keys = Vec::new();
    let mut x = header.leftmost;
    while !x != 0 {
        keys.push(slab[x].key);
        x = next(t, x);
    }
    debug_assert_eq!(keys, [1, 3, 4, 5, 7, 8, 9]);

    debug_assert_eq!(find(t, header.root, &4, &ByKey, &Natural), 4);
    debug_assert_eq!(find(t, header.root, &6, &ByKey, &Natural), !0);
    debug_assert_eq!(lower_bound(t, header.root, &6, &ByKey, &Natural), 5);
    debug_assert_eq!(upper_bound(t, header.root, &9, &ByKey, &Natural), !0);

    // Erase the root, which has two children
    let removed = erase(t, &mut header, 0);
    slab[0].hook.reset();
    debug_assert_eq!(removed.parent, 2);
    debug_assert_eq!(slab[header.root].key, 7);
    debug_assert_eq!(check(t, &header, &ByKey, &Natural, true), Ok(6));

    // Erase the first leaf
    erase(t, &mut header, 3);
    slab[3].hook.reset();
    debug_assert_eq!(slab[header.leftmost].key, 3);
    debug_assert_eq!(check(t, &header, &ByKey, &Natural, true), Ok(5));
}

#[test]
// A degenerate vine rebuilds into a complete tree
fn test_bst_1() {
    use self::fixture::*;
    use crate::functor::Natural;
    use alloc::vec::Vec;

    let keys: Vec<u32> = (0..100).collect();
    let slab = slab(&keys);
    let t = Nodes::new(&slab, hook());
    let mut header = Header::new();

    for x in 0..slab.len() {
        let location = locate_equal(t, header.root, &slab[x].key, &ByKey, &Natural);
        link(t, &mut header, x, location);
    }
    debug_assert_eq!(height(t, header.root), 99);

    let old = header.root;
    let root = rebuild(t, &mut header, old);
    debug_assert_eq!(root, header.root);
    debug_assert_eq!(height(t, header.root), 6);
    debug_assert_eq!(subtree_size(t, header.root), 100);
    debug_assert_eq!(check(t, &header, &ByKey, &Natural, true), Ok(100));
    debug_assert_eq!(depth(t, header.leftmost), 6);
}

#[test]
// Height walks vines of any length and matches the recursive definition on bushy shapes
fn test_bst_2() {
    use self::fixture::*;
    use crate::functor::Natural;
    use alloc::vec::Vec;

    fn longest<V>(t: Nodes<'_, V>, x: usize) -> isize {
        if !x == 0 {
            -1
        } else {
            1 + longest(t, t.left(x)).max(longest(t, t.right(x)))
        }
    }

    let keys: Vec<u32> = (0..200_000).collect();
    let vine = slab(&keys);
    let t = Nodes::new(&vine, hook());
    let mut header = Header::new();
    link(t, &mut header, 0, Location::Root);
    for x in 1..vine.len() {
        link(t, &mut header, x, Location::Right(x - 1));
    }
    debug_assert_eq!(height(t, header.root), 199_999);
    debug_assert_eq!(height(t, 150_000), 49_999);
    debug_assert_eq!(root_of(t, vine.len() - 1), header.root);
    debug_assert_eq!(height(t, !0), -1);

    let keys: Vec<u32> = (0..101).map(|i| (i * 37) % 101).collect();
    let bushy = slab(&keys);
    let t = Nodes::new(&bushy, hook());
    let mut header = Header::new();
    for x in 0..bushy.len() {
        let location = locate_equal(t, header.root, &bushy[x].key, &ByKey, &Natural);
        link(t, &mut header, x, location);
    }
    for x in 0..bushy.len() {
        debug_assert_eq!(height(t, x), longest(t, x));
        debug_assert_eq!(root_of(t, x), header.root);
    }
}
