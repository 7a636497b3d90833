//! Chain and group links of hashed values
//!
//! Every bucket is a singly linked chain through [`HashHook::next`]. With `optimize_multikey` the
//! `group` field also threads each run of equal keys `[f .. l]` backwards: `group(f)` is the last
//! value of the run and every other value points at its predecessor. A value on its own points
//! at itself. The head of a run therefore reaches the next run in one step, and the predecessor
//! of any value but a head is known without walking the chain.

use crate::{
    functor::KeyOf,
    hook::{HashHook, Hook},
};

//-----------------------------------------------------------------------------------------------//

/// A view of the chain links of hashed values: the caller's slab and the hook that reaches them
pub struct Links<'s, V> {
    slab: &'s [V],
    hook: Hook<V, HashHook>,
}

impl<V> Clone for Links<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for Links<'_, V> {}

impl<'s, V> Links<'s, V> {
    /// Construct a view
    #[inline]
    pub fn new(slab: &'s [V], hook: Hook<V, HashHook>) -> Links<'s, V> {
        Links { slab, hook }
    }

    /// The hook of the value in a slot
    #[inline]
    pub fn hook(&self, x: usize) -> &'s HashHook {
        self.hook.of(&self.slab[x])
    }

    /// The value in a slot
    #[inline]
    pub fn value(&self, x: usize) -> &'s V {
        &self.slab[x]
    }

    /// The key of the value in a slot
    #[inline]
    pub fn key<K: KeyOf<V>>(&self, key_of: &K, x: usize) -> &'s K::Key {
        key_of.key_of(&self.slab[x])
    }

    /// The next value in the chain, or `!0`
    #[inline]
    pub fn next(&self, x: usize) -> usize {
        self.hook(x).next.get()
    }

    /// Set the next value in the chain
    #[inline]
    pub fn set_next(&self, x: usize, y: usize) {
        self.hook(x).next.set(y);
    }

    /// The group link
    #[inline]
    pub fn group(&self, x: usize) -> usize {
        self.hook(x).group.get()
    }

    /// Set the group link
    #[inline]
    pub fn set_group(&self, x: usize, y: usize) {
        self.hook(x).group.set(y);
    }
}

//-----------------------------------------------------------------------------------------------//

/// Check if `x` heads its run
#[inline]
pub fn is_first_in_group<V>(t: Links<'_, V>, x: usize) -> bool {
    t.next(t.group(x)) != x
}

/// Check if `x` ends its run
#[inline]
pub fn is_last_in_group<V>(t: Links<'_, V>, x: usize) -> bool {
    let n = t.next(x);
    !n == 0 || t.group(n) != x
}

/// Get the head of the run holding `x`
pub fn first_in_group<V>(t: Links<'_, V>, mut x: usize) -> usize {
    while !is_first_in_group(t, x) {
        x = t.group(x);
    }
    x
}

/// Get the end of the run holding `x`
pub fn last_in_group<V>(t: Links<'_, V>, x: usize) -> usize {
    t.group(first_in_group(t, x))
}

/// Make `x` a run of its own
#[inline]
pub fn init_group<V>(t: Links<'_, V>, x: usize) {
    t.set_group(x, x);
}

/// Link `x` into the chain after the end of the run headed by `first`, extending the run
pub fn append_to_group<V>(t: Links<'_, V>, first: usize, x: usize) {
    let last = t.group(first);
    t.set_next(x, t.next(last));
    t.set_next(last, x);
    t.set_group(x, last);
    t.set_group(first, x);
}

/// Repair the group links around `x` before it is unlinked from its chain
///
/// `x` must still be in the chain. Its own links are left alone.
pub fn leave_group<V>(t: Links<'_, V>, x: usize) {
    let g = t.group(x);

    if t.next(g) != x {
        // `x` heads its run, and `g` ends it
        if g != x {
            let second = t.next(x);
            t.set_group(second, g);
        }
        return;
    }

    // `g` is the predecessor of `x`
    let n = t.next(x);
    if !n != 0 && t.group(n) == x {
        t.set_group(n, g);
    } else {
        let first = first_in_group(t, g);
        t.set_group(first, g);
    }
}

/// Count the values in the run headed by `first`
pub fn group_size<V>(t: Links<'_, V>, first: usize) -> usize {
    let last = t.group(first);
    let mut x = first;
    let mut count = 1;
    while x != last {
        x = t.next(x);
        count += 1;
    }
    count
}

//-----------------------------------------------------------------------------------------------//

#[test]
// Appending to and leaving runs keeps the back-links consistent
fn test_group_0() {
    use alloc::vec::Vec;

    struct Item {
        hook: HashHook,
    }

    let slab: Vec<Item> = (0..6).map(|_| Item { hook: HashHook::new() }).collect();
    let t = Links::new(&slab, Hook::new(|v: &Item| &v.hook));

    // Chain 0 -> 1 -> 2 -> 3 with runs [0 1 2] and [3]
    init_group(t, 0);
    init_group(t, 3);
    t.set_next(0, 3);
    append_to_group(t, 0, 1);
    append_to_group(t, 0, 2);

    debug_assert_eq!(t.next(0), 1);
    debug_assert_eq!(t.next(2), 3);
    debug_assert!(is_first_in_group(t, 0));
    debug_assert!(!is_first_in_group(t, 1));
    debug_assert!(is_first_in_group(t, 3));
    debug_assert!(is_last_in_group(t, 2));
    debug_assert!(is_last_in_group(t, 3));
    debug_assert_eq!(last_in_group(t, 1), 2);
    debug_assert_eq!(first_in_group(t, 2), 0);
    debug_assert_eq!(group_size(t, 0), 3);
    debug_assert_eq!(group_size(t, 3), 1);

    // Drop the middle of the run
    leave_group(t, 1);
    t.set_next(0, 2);
    debug_assert_eq!(t.group(2), 0);
    debug_assert_eq!(group_size(t, 0), 2);

    // Drop the end of the run
    leave_group(t, 2);
    t.set_next(0, 3);
    debug_assert_eq!(t.group(0), 0);
    debug_assert!(is_last_in_group(t, 0));

    // Drop the head of a fresh run [0 4]
    append_to_group(t, 0, 4);
    leave_group(t, 0);
    debug_assert_eq!(t.group(4), 4);
    debug_assert!(is_first_in_group(t, 4));
}
