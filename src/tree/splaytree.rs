//! Splay balancing
//!
//! Splay trees keep no balance metadata. Instead every insertion, erasure and successful lookup
//! moves the leaf concerned to the root, which gives amortised `log(n)` access and keeps recently
//! used leaves near the top.

use core::cmp::Ordering;

use super::{
    bst::{self, Header, Nodes},
    Balance, BsTree,
};
use crate::{
    functor::{Compare, KeyOf},
    Error,
};

/// Self-adjusting splay trees
#[derive(Clone, Copy, Debug, Default)]
pub struct Splay;

impl<V> Balance<V> for Splay {
    const SELF_ADJUSTING: bool = true;

    fn after_insert(&mut self, t: Nodes<'_, V>, header: &mut Header, x: usize, _size: usize) {
        splay_up(t, header, x);
    }

    fn erase(&mut self, t: Nodes<'_, V>, header: &mut Header, z: usize, _size: usize) {
        splay_up(t, header, z);
        prune(t, header, z);

        if header.leftmost == z {
            header.leftmost = bst::first(t, header.root);
        }
        if header.rightmost == z {
            header.rightmost = bst::last(t, header.root);
        }
    }

    fn on_access(&self, t: Nodes<'_, V>, header: &mut Header, x: usize) {
        splay_up(t, header, x);
    }
}

//-----------------------------------------------------------------------------------------------//

/// Promote a leaf to the root of the tree
///
/// Repeated 'single' and 'double' rotations move `x` up two levels at a time; this is the
/// mechanism that gives splay trees their amortised time bounds.
pub fn splay_up<V>(t: Nodes<'_, V>, header: &mut Header, x: usize) {
    // Check we aren't already at the root
    if !x == 0 || !t.parent(x) == 0 {
        return;
    }

    loop {
        let y = t.parent(x);
        if !t.parent(y) == 0 {
            let b;
            if t.left(y) == x {
                b = t.right(x);
                t.set_right(x, y);
                t.set_left(y, b);
            } else {
                debug_assert_eq!(t.right(y), x);
                b = t.left(x);
                t.set_left(x, y);
                t.set_right(y, b);
            }

            t.set_parent(x, !0);
            t.set_parent(y, x);
            if !b != 0 {
                t.set_parent(b, y);
            }
            break;
        }

        let z = t.parent(y);
        let e = t.parent(z);

        let b;
        let c;

        if t.left(y) == x {
            b = t.right(x);
            t.set_right(x, y);
            if t.left(z) == y {
                c = t.right(y);
                t.set_right(y, z);
                t.set_left(y, b);
                t.set_left(z, c);
                t.set_parent(z, y);
            } else {
                debug_assert_eq!(t.right(z), y);
                c = t.left(x);
                t.set_left(x, z);
                t.set_left(y, b);
                t.set_right(z, c);
                t.set_parent(z, x);
            }
        } else {
            debug_assert_eq!(t.right(y), x);
            b = t.left(x);
            t.set_left(x, y);
            if t.right(z) == y {
                c = t.left(y);
                t.set_left(y, z);
                t.set_right(y, b);
                t.set_right(z, c);
                t.set_parent(z, y);
            } else {
                debug_assert_eq!(t.left(z), y);
                c = t.right(x);
                t.set_right(x, z);
                t.set_right(y, b);
                t.set_left(z, c);
                t.set_parent(z, x);
            }
        }

        t.set_parent(x, e);
        t.set_parent(y, x);
        if !b != 0 {
            t.set_parent(b, y);
        }
        if !c != 0 {
            t.set_parent(c, z);
        }

        if !e == 0 {
            break;
        }
        if t.left(e) == z {
            t.set_left(e, x);
        } else {
            debug_assert_eq!(t.right(e), z);
            t.set_right(e, x);
        }
    }

    header.root = x;
}

/// Splay top-down towards `key`, returning the new root
///
/// The root afterwards is a leaf with an equal key if there is one, otherwise the last leaf
/// visited on the search path, which is a neighbour of `key` in order.
pub fn splay_down<V, K, C>(
    t: Nodes<'_, V>,
    header: &mut Header,
    key: &K::Key,
    key_of: &K,
    compare: &C,
) -> usize
where
    K: KeyOf<V>,
    C: Compare<K::Key>,
{
    let mut x = header.root;
    if !x == 0 {
        return !0;
    }

    // Leaves split off to the left of the path hang from `l_max` and those to the right from
    // `r_min`; each grows at its inner edge
    let mut l_root = !0;
    let mut l_max = !0;
    let mut r_root = !0;
    let mut r_min = !0;

    loop {
        match compare.compare(key, t.key(key_of, x)) {
            Ordering::Equal => break,
            Ordering::Less => {
                let mut y = t.left(x);
                if !y == 0 {
                    break;
                }
                if compare.compare(key, t.key(key_of, y)) == Ordering::Less {
                    let b = t.right(y);
                    t.set_left(x, b);
                    if !b != 0 {
                        t.set_parent(b, x);
                    }
                    t.set_right(y, x);
                    t.set_parent(x, y);

                    x = y;
                    y = t.left(x);
                    if !y == 0 {
                        break;
                    }
                }

                if !r_min == 0 {
                    r_root = x;
                } else {
                    t.set_left(r_min, x);
                    t.set_parent(x, r_min);
                }
                r_min = x;
                x = y;
            }
            Ordering::Greater => {
                let mut y = t.right(x);
                if !y == 0 {
                    break;
                }
                if compare.compare(key, t.key(key_of, y)) == Ordering::Greater {
                    let b = t.left(y);
                    t.set_right(x, b);
                    if !b != 0 {
                        t.set_parent(b, x);
                    }
                    t.set_left(y, x);
                    t.set_parent(x, y);

                    x = y;
                    y = t.right(x);
                    if !y == 0 {
                        break;
                    }
                }

                if !l_max == 0 {
                    l_root = x;
                } else {
                    t.set_right(l_max, x);
                    t.set_parent(x, l_max);
                }
                l_max = x;
                x = y;
            }
        }
    }

    // Reassemble around `x`
    let a = t.left(x);
    let b = t.right(x);

    if !l_max == 0 {
        l_root = a;
    } else {
        t.set_right(l_max, a);
        if !a != 0 {
            t.set_parent(a, l_max);
        }
    }
    if !r_min == 0 {
        r_root = b;
    } else {
        t.set_left(r_min, b);
        if !b != 0 {
            t.set_parent(b, r_min);
        }
    }

    t.set_left(x, l_root);
    if !l_root != 0 {
        t.set_parent(l_root, x);
    }
    t.set_right(x, r_root);
    if !r_root != 0 {
        t.set_parent(r_root, x);
    }
    t.set_parent(x, !0);

    header.root = x;
    x
}

// Remove a leaf from the tree
//
// A leaf with a free child is spliced out directly. Otherwise its predecessor is promoted, which
// leaves `x` with a free left child. The hook of `x` is not modified.
fn prune<V>(t: Nodes<'_, V>, header: &mut Header, x: usize) {
    debug_assert!(!x != 0);

    let y = t.parent(x);
    let a = t.left(x);
    let b = t.right(x);

    if !a == 0 || !b == 0 {
        let c = if !a == 0 { b } else { a };
        if !c != 0 {
            t.set_parent(c, y);
        }
        header.replace_child(t, y, x, c);
        return;
    }

    let z = bst::prev(t, x);
    splay_up(t, header, z);

    debug_assert_ne!(t.parent(x), !0);
    debug_assert_eq!(t.left(x), !0);

    let y = t.parent(x);
    let b = t.right(x);
    t.set_parent(b, y);
    header.replace_child(t, y, x, b);
}

//-----------------------------------------------------------------------------------------------//

impl<V, K, C> BsTree<V, Splay, K, C>
where
    K: KeyOf<V>,
    C: Compare<K::Key>,
{
    /// Move a linked value to the root
    pub fn splay_up(&self, slab: &[V], x: usize) -> Result<(), Error> {
        let t = self.nodes(slab);
        self.ensure_member(t, x)?;

        let mut header = self.header();
        splay_up(t, &mut header, x);
        self.set_header(header);
        Ok(())
    }

    /// Splay towards a key, returning the new root
    ///
    /// The root is a value with an equal key if one exists, otherwise a neighbour of the key.
    pub fn splay_down(&self, slab: &[V], key: &K::Key) -> Option<usize> {
        let t = self.nodes(slab);
        let mut header = self.header();
        let root = splay_down(t, &mut header, key, self.key_of(), self.compare());
        self.set_header(header);
        super::slot(root)
    }

    /// Rebuild the whole tree into a perfectly balanced shape
    pub fn rebalance(&mut self, slab: &[V]) {
        let t = self.nodes(slab);
        let mut header = self.header();
        let root = header.root;
        bst::rebuild(t, &mut header, root);
        self.set_header(header);
    }
}

//-----------------------------------------------------------------------------------------------//

#[test]
// Lookups bring the found value to the root
fn test_splaytree_0() {
    use super::bst::fixture::*;
    use crate::functor::Natural;
    use alloc::vec::Vec;

    let keys: Vec<u32> = (0..50).map(|k| k * 2).collect();
    let slab = slab(&keys);
    let mut tree = BsTree::new(hook(), Splay, ByKey, Natural);
    tree.extend_unique(&slab, 0..slab.len()).unwrap();

    // Each insert splays, so the last value inserted is the root
    debug_assert_eq!(tree.root(), Some(49));
    debug_assert_eq!(tree.height(&slab), 49);

    debug_assert_eq!(tree.find(&slab, &20), Some(10));
    debug_assert_eq!(tree.root(), Some(10));
    debug_assert_eq!(tree.check(&slab), Ok(()));

    // A miss leaves the shape alone
    debug_assert_eq!(tree.find(&slab, &21), None);
    debug_assert_eq!(tree.root(), Some(10));
    debug_assert!(tree.contains(&slab, &98));
    debug_assert_eq!(tree.root(), Some(10));

    // Splaying down to an absent key roots one of its neighbours
    let root = tree.splay_down(&slab, &31).unwrap();
    debug_assert!(root == 15 || root == 16);
    debug_assert_eq!(tree.check(&slab), Ok(()));

    debug_assert_eq!(tree.splay_down(&slab, &0), Some(0));
    debug_assert_eq!(tree.check(&slab), Ok(()));

    tree.splay_up(&slab, 30).unwrap();
    debug_assert_eq!(tree.root(), Some(30));

    tree.rebalance(&slab);
    debug_assert_eq!(tree.height(&slab), 5);
    debug_assert_eq!(tree.check(&slab), Ok(()));
}

#[test]
// Erasures through the predecessor promotion path
fn test_splaytree_1() {
    use super::bst::fixture::*;
    use crate::functor::Natural;
    use alloc::vec::Vec;
    use rand::prelude::*;

    let mut rng = SmallRng::seed_from_u64(9876543210);
    let keys: Vec<u32> = (0..300).map(|_| rng.random_range(0..1000)).collect();
    let slab = slab(&keys);
    let mut tree = BsTree::new(hook(), Splay, ByKey, Natural);
    tree.extend_equal(&slab, 0..slab.len()).unwrap();
    debug_assert_eq!(tree.check(&slab), Ok(()));

    let mut order: Vec<usize> = (0..slab.len()).collect();
    order.shuffle(&mut rng);
    for (i, &x) in order.iter().enumerate() {
        tree.erase(&slab, x).unwrap();
        if i % 20 == 0 {
            debug_assert_eq!(tree.check(&slab), Ok(()));
        }
    }

    debug_assert!(tree.is_empty());
    debug_assert_eq!(tree.first(), None);
    debug_assert_eq!(tree.check(&slab), Ok(()));
}
