//! Hooks embedded in user values, and the value traits that find them
//!
//! A container never owns its elements. The caller keeps values in a slice of slots (the
//! "slab") and embeds one hook per container the value may join. Containers name values by slot
//! index and reach the linkage through a [`Hook`], a copyable accessor from a value to one of its
//! embedded hooks. The hook fields are `Cell`s, so the algorithms relink values through a shared
//! borrow of the slab, and a value can sit in several containers at once through several hooks.

use core::{cell::Cell, fmt};

//-----------------------------------------------------------------------------------------------//

/// Linkage embedded in a value so that it can join one binary search tree
pub struct TreeHook {
    pub(crate) parent: Cell<usize>,
    pub(crate) left: Cell<usize>,
    pub(crate) right: Cell<usize>,
    pub(crate) meta: Cell<i8>,
    pub(crate) linked: Cell<bool>,
}

impl TreeHook {
    /// Construct an unlinked hook
    pub const fn new() -> TreeHook {
        TreeHook {
            parent: Cell::new(!0),
            left: Cell::new(!0),
            right: Cell::new(!0),
            meta: Cell::new(0),
            linked: Cell::new(false),
        }
    }

    /// Check if the hook is currently linked into a tree
    #[inline]
    pub fn is_linked(&self) -> bool {
        self.linked.get()
    }

    // Return the hook to the unlinked state
    pub(crate) fn reset(&self) {
        self.parent.set(!0);
        self.left.set(!0);
        self.right.set(!0);
        self.meta.set(0);
        self.linked.set(false);
    }

    // Copy the linkage of another hook, used by structural clones
    pub(crate) fn copy_from(&self, other: &TreeHook) {
        self.parent.set(other.parent.get());
        self.left.set(other.left.get());
        self.right.set(other.right.get());
        self.meta.set(other.meta.get());
        self.linked.set(other.linked.get());
    }
}

impl Default for TreeHook {
    fn default() -> Self {
        TreeHook::new()
    }
}

// A copied value does not inherit membership of its source's containers
impl Clone for TreeHook {
    fn clone(&self) -> Self {
        TreeHook::new()
    }
}

impl fmt::Debug for TreeHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeHook")
            .field("linked", &self.linked.get())
            .field("parent", &self.parent.get())
            .field("left", &self.left.get())
            .field("right", &self.right.get())
            .finish()
    }
}

//-----------------------------------------------------------------------------------------------//

/// Linkage embedded in a value so that it can join one hash table
pub struct HashHook {
    pub(crate) next: Cell<usize>,
    pub(crate) group: Cell<usize>,
    pub(crate) hash: Cell<usize>,
    pub(crate) linked: Cell<bool>,
}

impl HashHook {
    /// Construct an unlinked hook
    pub const fn new() -> HashHook {
        HashHook {
            next: Cell::new(!0),
            group: Cell::new(!0),
            hash: Cell::new(0),
            linked: Cell::new(false),
        }
    }

    /// Check if the hook is currently linked into a hash table
    #[inline]
    pub fn is_linked(&self) -> bool {
        self.linked.get()
    }

    /// The hash stored when the value was linked, if the table stores hashes
    #[inline]
    pub fn stored_hash(&self) -> usize {
        self.hash.get()
    }

    pub(crate) fn reset(&self) {
        self.next.set(!0);
        self.group.set(!0);
        self.hash.set(0);
        self.linked.set(false);
    }

    pub(crate) fn copy_from(&self, other: &HashHook) {
        self.next.set(other.next.get());
        self.group.set(other.group.get());
        self.hash.set(other.hash.get());
        self.linked.set(other.linked.get());
    }
}

impl Default for HashHook {
    fn default() -> Self {
        HashHook::new()
    }
}

impl Clone for HashHook {
    fn clone(&self) -> Self {
        HashHook::new()
    }
}

impl fmt::Debug for HashHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashHook")
            .field("linked", &self.linked.get())
            .field("next", &self.next.get())
            .field("hash", &self.hash.get())
            .finish()
    }
}

//-----------------------------------------------------------------------------------------------//

/// Value traits: how to reach a hook of type `L` inside a value of type `V`
///
/// A member hook is described by a plain accessor, e.g. `Hook::new(|v: &Item| &v.tree)`. Values
/// that implement `AsRef<L>` can use [`Hook::base`].
pub struct Hook<V, L> {
    get: fn(&V) -> &L,
}

impl<V, L> Hook<V, L> {
    /// Describe a member hook
    pub const fn new(get: fn(&V) -> &L) -> Hook<V, L> {
        Hook { get }
    }

    /// Get the hook embedded in a value
    #[inline]
    pub fn of<'a>(&self, value: &'a V) -> &'a L {
        (self.get)(value)
    }
}

impl<V, L> Hook<V, L>
where
    V: AsRef<L>,
{
    /// Describe a base hook, found through `AsRef`
    pub fn base() -> Hook<V, L> {
        Hook {
            get: <V as AsRef<L>>::as_ref,
        }
    }
}

impl<V, L> Clone for Hook<V, L> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V, L> Copy for Hook<V, L> {}

impl<V, L> fmt::Debug for Hook<V, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Hook")
    }
}

//-----------------------------------------------------------------------------------------------//

#[test]
// Cloned hooks start unlinked, and member and base hooks reach the same fields
fn test_hook_0() {
    struct Item {
        key: u32,
        tree: TreeHook,
        hash: HashHook,
    }

    impl AsRef<TreeHook> for Item {
        fn as_ref(&self) -> &TreeHook {
            &self.tree
        }
    }

    let item = Item {
        key: 1,
        tree: TreeHook::new(),
        hash: HashHook::default(),
    };

    item.tree.linked.set(true);
    item.tree.parent.set(7);
    debug_assert!(item.tree.is_linked());
    debug_assert!(!item.tree.clone().is_linked());
    debug_assert!(!item.hash.is_linked());

    let member: Hook<Item, TreeHook> = Hook::new(|v: &Item| &v.tree);
    let base: Hook<Item, TreeHook> = Hook::base();
    debug_assert_eq!(member.of(&item).parent.get(), 7);
    debug_assert_eq!(base.of(&item).parent.get(), 7);
    debug_assert_eq!(item.key, 1);

    item.tree.reset();
    debug_assert!(!member.of(&item).is_linked());
}
