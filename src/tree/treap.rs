//! Treap balancing
//!
//! A treap is a search tree by key and a max-heap by priority. The priority order is supplied by
//! the caller as a comparison over whole values, so priorities can be stored in the value, drawn
//! from a random generator at construction, or derived from the key.

use core::cmp::Ordering;

use super::{
    bst::{self, Header, Nodes},
    Balance, BsTree,
};
use crate::{
    functor::{Compare, KeyOf},
    Error,
};

/// Treaps ordered by a priority comparison `P`
///
/// A leaf is never below a child with a higher priority. Equal priorities never trigger a
/// rotation.
#[derive(Clone, Copy, Debug, Default)]
pub struct Treap<P> {
    priority: P,
}

impl<P> Treap<P> {
    /// Constructor
    pub const fn new(priority: P) -> Treap<P> {
        Treap { priority }
    }

    /// The priority comparison
    pub fn priority(&self) -> &P {
        &self.priority
    }
}

impl<V, P> Balance<V> for Treap<P>
where
    P: Compare<V>,
{
    fn after_insert(&mut self, t: Nodes<'_, V>, header: &mut Header, x: usize, _size: usize) {
        loop {
            let p = t.parent(x);
            if !p == 0 || self.priority.compare(t.value(x), t.value(p)) != Ordering::Greater {
                break;
            }

            if t.left(p) == x {
                bst::rotate_right(t, header, p);
            } else {
                bst::rotate_left(t, header, p);
            }
        }
    }

    fn erase(&mut self, t: Nodes<'_, V>, header: &mut Header, z: usize, _size: usize) {
        // Sink `z` below its higher priority child until it has one free link
        loop {
            let l = t.left(z);
            let r = t.right(z);
            if !l == 0 || !r == 0 {
                break;
            }

            if self.priority.compare(t.value(l), t.value(r)) != Ordering::Less {
                bst::rotate_right(t, header, z);
            } else {
                bst::rotate_left(t, header, z);
            }
        }

        bst::erase(t, header, z);
    }

    fn check(&self, t: Nodes<'_, V>, header: &Header, _size: usize) -> Result<(), Error> {
        let mut x = header.leftmost;
        while !x != 0 {
            for child in [t.left(x), t.right(x)] {
                if !child != 0
                    && self.priority.compare(t.value(child), t.value(x)) == Ordering::Greater
                {
                    return Err(Error::Corrupt("treap child outranks its parent"));
                }
            }
            x = bst::next(t, x);
        }
        Ok(())
    }
}

impl<V, P, K, C> BsTree<V, Treap<P>, K, C>
where
    P: Compare<V>,
    K: KeyOf<V>,
    C: Compare<K::Key>,
{
    /// The value with the highest priority, which is the root
    pub fn top(&self) -> Option<usize> {
        self.root()
    }
}

//-----------------------------------------------------------------------------------------------//

#[test]
// The root always holds the highest priority
fn test_treap_0() {
    use super::bst::fixture::*;
    use crate::functor::Natural;
    use alloc::vec::Vec;

    // Priority is the key reversed within a byte, so order and priority disagree
    let by_priority = |a: &Leaf, b: &Leaf| (a.key as u8).reverse_bits().cmp(&(b.key as u8).reverse_bits());

    let keys: Vec<u32> = (0..200).collect();
    let slab = slab(&keys);
    let mut tree = BsTree::new(hook(), Treap::new(by_priority), ByKey, Natural);
    tree.extend_unique(&slab, 0..slab.len()).unwrap();
    debug_assert_eq!(tree.check(&slab), Ok(()));

    // 127 is 0b0111_1111, which reverses to 254, the highest priority among 0..200
    debug_assert_eq!(tree.top(), Some(127));

    tree.erase(&slab, 127).unwrap();
    debug_assert_eq!(tree.check(&slab), Ok(()));
    debug_assert_eq!(tree.top(), Some(191));

    for x in (0..200).filter(|&x| x != 127) {
        tree.erase(&slab, x).unwrap();
        debug_assert_eq!(tree.check(&slab), Ok(()));
    }
    debug_assert!(tree.is_empty());
}

#[test]
// Random priorities from the seeded generator
fn test_treap_1() {
    use super::bst::fixture::*;
    use crate::functor::Natural;
    use alloc::vec::Vec;
    use rand::prelude::*;

    let mut rng = SmallRng::seed_from_u64(42);
    let priorities: Vec<u32> = (0..1000).map(|_| rng.random()).collect();
    let by_priority = |a: &Leaf, b: &Leaf| priorities[a.key as usize].cmp(&priorities[b.key as usize]);

    let keys: Vec<u32> = (0..1000).collect();
    let slab = slab(&keys);
    let mut tree = BsTree::new(hook(), Treap::new(by_priority), ByKey, Natural);

    let mut order: Vec<usize> = (0..slab.len()).collect();
    order.shuffle(&mut rng);
    tree.extend_unique(&slab, order.iter().copied()).unwrap();
    debug_assert_eq!(tree.check(&slab), Ok(()));

    let top = (0..1000).max_by_key(|&x| priorities[x]).unwrap();
    debug_assert_eq!(tree.top(), Some(top));

    // A random treap is shallow with high probability
    debug_assert!(tree.height(&slab) < 40);
}
