//! Red-black balancing
//!
//! The colour lives in the hook's metadata byte. Insertion and erasure repair the colouring with
//! recolours and at most three rotations.

use super::{
    bst::{self, Header, Nodes},
    Balance,
};
use crate::Error;

const RED: i8 = 0;
const BLACK: i8 = 1;

/// Red-black trees: no red leaf has a red child, and every path to a null link crosses the same
/// number of black leaves
#[derive(Clone, Copy, Debug, Default)]
pub struct RedBlack;

#[inline]
fn is_black<V>(t: Nodes<'_, V>, x: usize) -> bool {
    !x == 0 || t.meta(x) == BLACK
}

impl<V> Balance<V> for RedBlack {
    fn init(&self, t: Nodes<'_, V>, x: usize) {
        t.set_meta(x, RED);
    }

    fn after_insert(&mut self, t: Nodes<'_, V>, header: &mut Header, mut x: usize, _size: usize) {
        loop {
            let p = t.parent(x);
            if is_black(t, p) {
                break;
            }

            // A red parent is never the root, so the grandparent exists
            let g = t.parent(p);
            if t.left(g) == p {
                let u = t.right(g);
                if !is_black(t, u) {
                    t.set_meta(p, BLACK);
                    t.set_meta(u, BLACK);
                    t.set_meta(g, RED);
                    x = g;
                    continue;
                }

                if t.right(p) == x {
                    bst::rotate_left(t, header, p);
                    x = p;
                }
                t.set_meta(t.parent(x), BLACK);
                t.set_meta(g, RED);
                bst::rotate_right(t, header, g);
            } else {
                let u = t.left(g);
                if !is_black(t, u) {
                    t.set_meta(p, BLACK);
                    t.set_meta(u, BLACK);
                    t.set_meta(g, RED);
                    x = g;
                    continue;
                }

                if t.left(p) == x {
                    bst::rotate_right(t, header, p);
                    x = p;
                }
                t.set_meta(t.parent(x), BLACK);
                t.set_meta(g, RED);
                bst::rotate_left(t, header, g);
            }
            break;
        }

        t.set_meta(header.root, BLACK);
    }

    fn erase(&mut self, t: Nodes<'_, V>, header: &mut Header, z: usize, _size: usize) {
        let removed = bst::erase(t, header, z);
        if removed.meta != BLACK {
            return;
        }

        let mut x = removed.x;
        let mut p = removed.parent;
        let mut is_left = removed.is_left;

        // `x` carries an extra black; a black leaf was removed, so its sibling is never null
        while x != header.root && is_black(t, x) {
            if is_left {
                let mut w = t.right(p);
                if !is_black(t, w) {
                    t.set_meta(w, BLACK);
                    t.set_meta(p, RED);
                    bst::rotate_left(t, header, p);
                    w = t.right(p);
                }

                if is_black(t, t.left(w)) && is_black(t, t.right(w)) {
                    t.set_meta(w, RED);
                    x = p;
                } else {
                    if is_black(t, t.right(w)) {
                        t.set_meta(t.left(w), BLACK);
                        t.set_meta(w, RED);
                        bst::rotate_right(t, header, w);
                        w = t.right(p);
                    }
                    t.set_meta(w, t.meta(p));
                    t.set_meta(p, BLACK);
                    t.set_meta(t.right(w), BLACK);
                    bst::rotate_left(t, header, p);
                    x = header.root;
                    break;
                }
            } else {
                let mut w = t.left(p);
                if !is_black(t, w) {
                    t.set_meta(w, BLACK);
                    t.set_meta(p, RED);
                    bst::rotate_right(t, header, p);
                    w = t.left(p);
                }

                if is_black(t, t.left(w)) && is_black(t, t.right(w)) {
                    t.set_meta(w, RED);
                    x = p;
                } else {
                    if is_black(t, t.left(w)) {
                        t.set_meta(t.right(w), BLACK);
                        t.set_meta(w, RED);
                        bst::rotate_left(t, header, w);
                        w = t.left(p);
                    }
                    t.set_meta(w, t.meta(p));
                    t.set_meta(p, BLACK);
                    t.set_meta(t.left(w), BLACK);
                    bst::rotate_right(t, header, p);
                    x = header.root;
                    break;
                }
            }

            p = t.parent(x);
            is_left = !p != 0 && t.left(p) == x;
        }

        if !x != 0 {
            t.set_meta(x, BLACK);
        }
    }

    fn check(&self, t: Nodes<'_, V>, header: &Header, _size: usize) -> Result<(), Error> {
        if !is_black(t, header.root) {
            return Err(Error::Corrupt("red root"));
        }
        black_height(t, header.root).map(|_| ())
    }
}

// Count the black leaves on every path below `x`, failing if the paths disagree
fn black_height<V>(t: Nodes<'_, V>, x: usize) -> Result<usize, Error> {
    if !x == 0 {
        return Ok(1);
    }

    let meta = t.meta(x);
    if meta != RED && meta != BLACK {
        return Err(Error::Corrupt("leaf is neither red nor black"));
    }

    let l = t.left(x);
    let r = t.right(x);
    if meta == RED && (!is_black(t, l) || !is_black(t, r)) {
        return Err(Error::Corrupt("red leaf has a red child"));
    }

    let lh = black_height(t, l)?;
    if lh != black_height(t, r)? {
        return Err(Error::Corrupt("black heights differ"));
    }
    Ok(lh + meta as usize)
}

//-----------------------------------------------------------------------------------------------//

#[test]
// Ascending inserts and interleaved erases keep the colouring valid
fn test_rbtree_0() {
    use super::{bst::fixture::*, BsTree};
    use crate::functor::Natural;
    use alloc::vec::Vec;

    let keys: Vec<u32> = (0..256).collect();
    let slab = slab(&keys);
    let mut tree = BsTree::new(hook(), RedBlack, ByKey, Natural);

    for x in 0..slab.len() {
        tree.insert_unique(&slab, x).unwrap();
        debug_assert_eq!(tree.check(&slab), Ok(()));
    }
    // 2 log2(n + 1) bounds the height of a red-black tree
    debug_assert!(tree.height(&slab) < 16);

    for x in (0..slab.len()).step_by(3) {
        tree.erase(&slab, x).unwrap();
        debug_assert_eq!(tree.check(&slab), Ok(()));
    }
    debug_assert_eq!(tree.len(), 256 - 86);
    debug_assert_eq!(tree.first(), Some(1));
}

#[test]
// Random inserts and erases with the seeded generator
fn test_rbtree_1() {
    use super::{bst::fixture::*, BsTree};
    use crate::functor::Natural;
    use alloc::vec::Vec;
    use rand::prelude::*;

    let mut rng = SmallRng::seed_from_u64(7);
    let keys: Vec<u32> = (0..500).map(|_| rng.random_range(0..200)).collect();
    let slab = slab(&keys);
    let mut tree = BsTree::new(hook(), RedBlack, ByKey, Natural);

    let mut order: Vec<usize> = (0..slab.len()).collect();
    order.shuffle(&mut rng);
    for &x in &order {
        tree.insert_equal(&slab, x).unwrap();
    }
    debug_assert_eq!(tree.check(&slab), Ok(()));

    order.shuffle(&mut rng);
    for &x in &order[..400] {
        tree.erase(&slab, x).unwrap();
    }
    debug_assert_eq!(tree.len(), 100);
    debug_assert_eq!(tree.check(&slab), Ok(()));

    let mut sorted: Vec<u32> = order[400..].iter().map(|&x| keys[x]).collect();
    sorted.sort_unstable();
    let walked: Vec<u32> = tree.iter(&slab).map(|x| keys[x]).collect();
    debug_assert_eq!(walked, sorted);
}
