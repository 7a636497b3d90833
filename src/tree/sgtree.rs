//! Scapegoat balancing
//!
//! Leaves carry no balance metadata. A tree of `n` leaves is kept no deeper than
//! `log(n) / log(1 / alpha)` (plus one) by rebuilding a subtree whenever an insertion lands too
//! deep, and the whole tree whenever erasures shrink it below `alpha` of its recent maximum.

use tracing::debug;

use super::{
    bst::{self, Header, Nodes},
    Balance, BsTree,
};
use crate::{
    functor::{Compare, KeyOf},
    Error,
};

/// Scapegoat trees with a configurable balance factor `alpha` in (0.5, 1.0)
#[derive(Clone, Copy, Debug)]
pub struct Scapegoat {
    alpha: f32,
    max_tree_size: usize,
}

impl Scapegoat {
    /// The balance factor used by [`Scapegoat::new`], `1 / sqrt(2)`
    pub const DEFAULT_BALANCE_FACTOR: f32 = core::f32::consts::FRAC_1_SQRT_2;

    /// Constructor
    pub const fn new() -> Scapegoat {
        Scapegoat {
            alpha: Scapegoat::DEFAULT_BALANCE_FACTOR,
            max_tree_size: 0,
        }
    }

    /// Construct with a balance factor, which must lie strictly between 0.5 and 1.0
    pub fn with_balance_factor(alpha: f32) -> Result<Scapegoat, Error> {
        validate(alpha)?;
        Ok(Scapegoat {
            alpha,
            max_tree_size: 0,
        })
    }

    /// The balance factor
    #[inline]
    pub fn balance_factor(&self) -> f32 {
        self.alpha
    }

    /// The largest size reached since the last full rebuild
    #[inline]
    pub fn max_tree_size(&self) -> usize {
        self.max_tree_size
    }

    // Largest depth allowed for a tree of `n` leaves: floor(log(n) / log(1 / alpha))
    fn h_alpha(&self, n: usize) -> usize {
        let base = 1.0 / self.alpha as f64;
        let n = n as f64;

        let mut h = 0;
        let mut x = base;
        while x <= n {
            x *= base;
            h += 1;
        }
        h
    }
}

impl Default for Scapegoat {
    fn default() -> Self {
        Scapegoat::new()
    }
}

fn validate(alpha: f32) -> Result<(), Error> {
    if alpha > 0.5 && alpha < 1.0 {
        Ok(())
    } else {
        Err(Error::BalanceFactor(alpha))
    }
}

impl<V> Balance<V> for Scapegoat {
    fn after_insert(&mut self, t: Nodes<'_, V>, header: &mut Header, x: usize, size: usize) {
        self.max_tree_size = self.max_tree_size.max(size);
        if size <= 2 {
            return;
        }

        let depth = bst::depth(t, x);
        if depth <= self.h_alpha(size) {
            return;
        }

        // Climb towards the root looking for the first ancestor too deep for its own weight
        let mut s = x;
        let mut weight = 1;
        for height in 1..depth {
            let p = t.parent(s);
            let sibling = if t.left(p) == s { t.right(p) } else { t.left(p) };
            weight += 1 + bst::subtree_size(t, sibling);
            s = p;

            if height > self.h_alpha(weight) {
                debug!(size, weight, depth, "rebuilding scapegoat subtree");
                bst::rebuild(t, header, s);
                return;
            }
        }

        debug!(size, depth, "rebuilding scapegoat tree");
        self.max_tree_size = size;
        let root = header.root;
        bst::rebuild(t, header, root);
    }

    fn erase(&mut self, t: Nodes<'_, V>, header: &mut Header, z: usize, size: usize) {
        bst::erase(t, header, z);

        if (size as f64) < self.alpha as f64 * self.max_tree_size as f64 {
            debug!(size, max = self.max_tree_size, "rebuilding scapegoat tree after erasure");
            let root = header.root;
            bst::rebuild(t, header, root);
            self.max_tree_size = size;
        }
    }

    fn check(&self, t: Nodes<'_, V>, header: &Header, size: usize) -> Result<(), Error> {
        if size > self.max_tree_size {
            return Err(Error::Corrupt("size exceeds the scapegoat maximum"));
        }

        let height = bst::height(t, header.root);
        if height > self.h_alpha(self.max_tree_size) as isize + 1 {
            return Err(Error::Corrupt("scapegoat tree is too deep"));
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.max_tree_size = 0;
    }
}

//-----------------------------------------------------------------------------------------------//

impl<V, K, C> BsTree<V, Scapegoat, K, C>
where
    K: KeyOf<V>,
    C: Compare<K::Key>,
{
    /// The balance factor
    pub fn balance_factor(&self) -> f32 {
        self.balance().alpha
    }

    /// Change the balance factor
    ///
    /// Lowering it tightens the height bound, so the whole tree is rebuilt.
    pub fn set_balance_factor(&mut self, slab: &[V], alpha: f32) -> Result<(), Error> {
        validate(alpha)?;

        let old = self.balance().alpha;
        self.balance_mut().alpha = alpha;
        debug!(old, alpha, "scapegoat balance factor changed");

        if alpha < old {
            self.rebalance(slab);
        }
        Ok(())
    }

    /// Rebuild the whole tree into a perfectly balanced shape
    pub fn rebalance(&mut self, slab: &[V]) {
        let t = self.nodes(slab);
        let mut header = self.header();
        let root = header.root;
        bst::rebuild(t, &mut header, root);
        self.set_header(header);

        let size = self.len();
        self.balance_mut().max_tree_size = size;
    }

    /// Rebuild the subtree at `x` into a perfectly balanced shape, returning its new root
    pub fn rebalance_subtree(&mut self, slab: &[V], x: usize) -> Result<usize, Error> {
        let t = self.nodes(slab);
        self.ensure_member(t, x)?;

        let mut header = self.header();
        let root = bst::rebuild(t, &mut header, x);
        self.set_header(header);
        Ok(root)
    }
}

//-----------------------------------------------------------------------------------------------//

#[test]
// Ascending keys with a loose balance factor
fn test_sgtree_0() {
    use super::bst::fixture::*;
    use crate::functor::Natural;
    use alloc::vec::Vec;

    let keys: Vec<u32> = (1..=100).collect();
    let slab = slab(&keys);
    let balance = Scapegoat::with_balance_factor(0.57).unwrap();
    let mut tree = BsTree::new(hook(), balance, ByKey, Natural);

    tree.extend_unique(&slab, 0..slab.len()).unwrap();
    debug_assert_eq!(tree.check(&slab), Ok(()));
    debug_assert_eq!(tree.height(&slab), 8);
    debug_assert_eq!(tree.balance().max_tree_size(), 100);

    // Tightening the factor rebuilds the tree
    tree.set_balance_factor(&slab, 0.55).unwrap();
    debug_assert_eq!(tree.height(&slab), 6);
    debug_assert_eq!(tree.check(&slab), Ok(()));

    debug_assert_eq!(
        tree.set_balance_factor(&slab, 1.0),
        Err(Error::BalanceFactor(1.0))
    );
    debug_assert_eq!(tree.balance_factor(), 0.55);
}

#[test]
// Shrinking below alpha of the recent maximum triggers a full rebuild
fn test_sgtree_1() {
    use super::bst::fixture::*;
    use crate::functor::Natural;
    use alloc::vec::Vec;

    let keys: Vec<u32> = (0..64).collect();
    let slab = slab(&keys);
    let mut tree = BsTree::new(hook(), Scapegoat::new(), ByKey, Natural);
    tree.extend_unique(&slab, 0..slab.len()).unwrap();
    debug_assert_eq!(tree.balance().max_tree_size(), 64);

    for x in 0..18 {
        tree.erase(&slab, x).unwrap();
    }
    debug_assert_eq!(tree.balance().max_tree_size(), 64);

    // 45 < 0.7071 * 64
    tree.erase(&slab, 18).unwrap();
    debug_assert_eq!(tree.balance().max_tree_size(), 45);
    debug_assert_eq!(tree.height(&slab), 5);
    debug_assert_eq!(tree.check(&slab), Ok(()));

    tree.clear(&slab);
    debug_assert_eq!(tree.balance().max_tree_size(), 0);
}
