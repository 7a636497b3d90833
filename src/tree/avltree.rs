//! AVL balancing
//!
//! The metadata byte holds the balance factor, the height of the right subtree minus the height
//! of the left, which is kept within -1..=1.

use super::{
    bst::{self, Header, Nodes},
    Balance,
};
use crate::Error;

/// AVL trees: sibling subtrees differ in height by at most one
#[derive(Clone, Copy, Debug, Default)]
pub struct Avl;

// Rotate the left-right grandchild of `a` to the top, where `b` is the left child of `a`
fn rotate_left_right<V>(t: Nodes<'_, V>, header: &mut Header, a: usize, b: usize) -> usize {
    let c = t.right(b);
    bst::rotate_left(t, header, b);
    bst::rotate_right(t, header, a);

    let (bb, ab) = match t.meta(c) {
        -1 => (0, 1),
        0 => (0, 0),
        _ => (-1, 0),
    };
    t.set_meta(b, bb);
    t.set_meta(a, ab);
    t.set_meta(c, 0);
    c
}

// Rotate the right-left grandchild of `a` to the top, where `b` is the right child of `a`
fn rotate_right_left<V>(t: Nodes<'_, V>, header: &mut Header, a: usize, b: usize) -> usize {
    let c = t.left(b);
    bst::rotate_right(t, header, b);
    bst::rotate_left(t, header, a);

    let (bb, ab) = match t.meta(c) {
        1 => (0, -1),
        0 => (0, 0),
        _ => (1, 0),
    };
    t.set_meta(b, bb);
    t.set_meta(a, ab);
    t.set_meta(c, 0);
    c
}

impl<V> Balance<V> for Avl {
    fn after_insert(&mut self, t: Nodes<'_, V>, header: &mut Header, mut x: usize, _size: usize) {
        // `x` is the root of a subtree that just grew by one
        loop {
            let p = t.parent(x);
            if !p == 0 {
                return;
            }

            if t.left(p) == x {
                match t.meta(p) {
                    1 => {
                        t.set_meta(p, 0);
                        return;
                    }
                    0 => {
                        t.set_meta(p, -1);
                        x = p;
                    }
                    _ => {
                        if t.meta(x) == -1 {
                            bst::rotate_right(t, header, p);
                            t.set_meta(x, 0);
                            t.set_meta(p, 0);
                        } else {
                            rotate_left_right(t, header, p, x);
                        }
                        return;
                    }
                }
            } else {
                match t.meta(p) {
                    -1 => {
                        t.set_meta(p, 0);
                        return;
                    }
                    0 => {
                        t.set_meta(p, 1);
                        x = p;
                    }
                    _ => {
                        if t.meta(x) == 1 {
                            bst::rotate_left(t, header, p);
                            t.set_meta(x, 0);
                            t.set_meta(p, 0);
                        } else {
                            rotate_right_left(t, header, p, x);
                        }
                        return;
                    }
                }
            }
        }
    }

    fn erase(&mut self, t: Nodes<'_, V>, header: &mut Header, z: usize, _size: usize) {
        let removed = bst::erase(t, header, z);

        // The child of `p` on the `is_left` side just shrank by one
        let mut p = removed.parent;
        let mut is_left = removed.is_left;

        while !p != 0 {
            let top = if is_left {
                match t.meta(p) {
                    -1 => {
                        t.set_meta(p, 0);
                        p
                    }
                    0 => {
                        t.set_meta(p, 1);
                        return;
                    }
                    _ => {
                        let s = t.right(p);
                        match t.meta(s) {
                            0 => {
                                bst::rotate_left(t, header, p);
                                t.set_meta(s, -1);
                                t.set_meta(p, 1);
                                return;
                            }
                            1 => {
                                bst::rotate_left(t, header, p);
                                t.set_meta(s, 0);
                                t.set_meta(p, 0);
                                s
                            }
                            _ => rotate_right_left(t, header, p, s),
                        }
                    }
                }
            } else {
                match t.meta(p) {
                    1 => {
                        t.set_meta(p, 0);
                        p
                    }
                    0 => {
                        t.set_meta(p, -1);
                        return;
                    }
                    _ => {
                        let s = t.left(p);
                        match t.meta(s) {
                            0 => {
                                bst::rotate_right(t, header, p);
                                t.set_meta(s, 1);
                                t.set_meta(p, -1);
                                return;
                            }
                            -1 => {
                                bst::rotate_right(t, header, p);
                                t.set_meta(s, 0);
                                t.set_meta(p, 0);
                                s
                            }
                            _ => rotate_left_right(t, header, p, s),
                        }
                    }
                }
            };

            p = t.parent(top);
            is_left = !p != 0 && t.left(p) == top;
        }
    }

    fn check(&self, t: Nodes<'_, V>, header: &Header, _size: usize) -> Result<(), Error> {
        checked_height(t, header.root).map(|_| ())
    }
}

// Compute the height below `x`, failing on a stale or out of range balance factor
fn checked_height<V>(t: Nodes<'_, V>, x: usize) -> Result<isize, Error> {
    if !x == 0 {
        return Ok(-1);
    }

    let lh = checked_height(t, t.left(x))?;
    let rh = checked_height(t, t.right(x))?;
    let balance = rh - lh;

    if !(-1..=1).contains(&balance) {
        return Err(Error::Corrupt("subtree heights differ by more than one"));
    }
    if balance != t.meta(x) as isize {
        return Err(Error::Corrupt("stored balance factor is stale"));
    }

    Ok(1 + lh.max(rh))
}

//-----------------------------------------------------------------------------------------------//

#[test]
// Sorted input stays within the AVL height bound
fn test_avltree_0() {
    use super::{bst::fixture::*, BsTree};
    use crate::functor::Natural;
    use alloc::vec::Vec;

    let keys: Vec<u32> = (0..1000).collect();
    let slab = slab(&keys);
    let mut tree = BsTree::new(hook(), Avl, ByKey, Natural);

    tree.extend_unique(&slab, 0..slab.len()).unwrap();
    debug_assert_eq!(tree.check(&slab), Ok(()));
    // 1.44 log2(n + 2) bounds the height of an AVL tree
    debug_assert!(tree.height(&slab) <= 14);

    for x in (0..slab.len()).rev().step_by(2) {
        tree.erase(&slab, x).unwrap();
    }
    debug_assert_eq!(tree.check(&slab), Ok(()));
    debug_assert_eq!(tree.len(), 500);
    debug_assert_eq!(tree.last(), Some(998));
}

#[test]
// Every double rotation case, driven by random traffic
fn test_avltree_1() {
    use super::{bst::fixture::*, BsTree};
    use crate::functor::Natural;
    use alloc::vec::Vec;
    use rand::prelude::*;

    let mut rng = SmallRng::seed_from_u64(1234567890);
    let keys: Vec<u32> = (0..2000).map(|_| rng.random_range(0..u32::MAX)).collect();
    let slab = slab(&keys);
    let mut tree = BsTree::new(hook(), Avl, ByKey, Natural);

    let mut linked = Vec::new();
    for round in 0..4000 {
        if linked.is_empty() || rng.random_bool(0.6) {
            let x = rng.random_range(0..slab.len());
            if !slab[x].hook.is_linked() {
                tree.insert_equal(&slab, x).unwrap();
                linked.push(x);
            }
        } else {
            let x = linked.swap_remove(rng.random_range(0..linked.len()));
            tree.erase(&slab, x).unwrap();
        }

        if round % 250 == 0 {
            debug_assert_eq!(tree.check(&slab), Ok(()));
        }
    }

    debug_assert_eq!(tree.len(), linked.len());
    debug_assert_eq!(tree.check(&slab), Ok(()));
}
