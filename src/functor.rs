//! Key extraction, ordering, equality and hashing functors
//!
//! Every container is generic over the functors it calls. Plain closures work for ordering,
//! equality and hashing; key extraction uses a `fn` pointer or a type implementing [`KeyOf`].

use core::{
    cmp::Ordering,
    hash::{BuildHasher, Hash},
};

use rustc_hash::FxBuildHasher;

//-----------------------------------------------------------------------------------------------//

/// Extract the key a container orders or hashes a value by
pub trait KeyOf<V> {
    /// The key type
    type Key: ?Sized;

    /// Borrow the key of a value
    fn key_of<'a>(&self, value: &'a V) -> &'a Self::Key;
}

/// The value is its own key
#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

impl<V> KeyOf<V> for Identity {
    type Key = V;

    #[inline]
    fn key_of<'a>(&self, value: &'a V) -> &'a V {
        value
    }
}

impl<V, K: ?Sized> KeyOf<V> for fn(&V) -> &K {
    type Key = K;

    #[inline]
    fn key_of<'a>(&self, value: &'a V) -> &'a K {
        self(value)
    }
}

//-----------------------------------------------------------------------------------------------//

/// A total order over keys
pub trait Compare<K: ?Sized> {
    /// Compare two keys
    fn compare(&self, a: &K, b: &K) -> Ordering;
}

/// Equality over keys
pub trait KeyEq<K: ?Sized> {
    /// Check if two keys are equal
    fn eq(&self, a: &K, b: &K) -> bool;
}

/// Use the key's own `Ord` or `Eq`
#[derive(Clone, Copy, Debug, Default)]
pub struct Natural;

impl<K: Ord + ?Sized> Compare<K> for Natural {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}

impl<K: Eq + ?Sized> KeyEq<K> for Natural {
    #[inline]
    fn eq(&self, a: &K, b: &K) -> bool {
        a == b
    }
}

impl<K: ?Sized, F> Compare<K> for F
where
    F: Fn(&K, &K) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        self(a, b)
    }
}

impl<K: ?Sized, F> KeyEq<K> for F
where
    F: Fn(&K, &K) -> bool,
{
    #[inline]
    fn eq(&self, a: &K, b: &K) -> bool {
        self(a, b)
    }
}

//-----------------------------------------------------------------------------------------------//

/// Hash a key to a bucket-independent `usize`
pub trait KeyHash<K: ?Sized> {
    /// Hash a key
    fn hash(&self, key: &K) -> usize;
}

/// Hash through a `BuildHasher`
#[derive(Clone, Copy, Debug, Default)]
pub struct Hashing<S>(pub S);

/// The default hasher, `rustc-hash`'s Fx hash
pub type FxHashing = Hashing<FxBuildHasher>;

impl<K: Hash + ?Sized, S: BuildHasher> KeyHash<K> for Hashing<S> {
    #[inline]
    fn hash(&self, key: &K) -> usize {
        self.0.hash_one(key) as usize
    }
}

impl<K: ?Sized, F> KeyHash<K> for F
where
    F: Fn(&K) -> usize,
{
    #[inline]
    fn hash(&self, key: &K) -> usize {
        self(key)
    }
}

//-----------------------------------------------------------------------------------------------//

#[test]
// Natural order, closures and fn pointer key extraction agree
fn test_functor_0() {
    struct Pair {
        key: u32,
        other: u32,
    }

    let a = Pair { key: 1, other: 9 };
    let b = Pair { key: 2, other: 0 };

    let key: fn(&Pair) -> &u32 = |p| &p.key;
    debug_assert_eq!(*key.key_of(&a), 1);
    debug_assert_eq!(*Identity.key_of(&5u8), 5);

    debug_assert_eq!(
        Natural.compare(key.key_of(&a), key.key_of(&b)),
        Ordering::Less
    );
    let reverse = |x: &u32, y: &u32| y.cmp(x);
    debug_assert_eq!(
        reverse.compare(key.key_of(&a), key.key_of(&b)),
        Ordering::Greater
    );

    debug_assert!(KeyEq::eq(&Natural, &a.other, &9));
    let identity = |k: &u32| *k as usize;
    debug_assert_eq!(identity.hash(&b.other), 0);

    let fx = FxHashing::default();
    debug_assert_eq!(fx.hash(&42u64), fx.hash(&42u64));
}
