//! Unordered sets of intrusively linked values, backed by a hash table

use core::iter::FusedIterator;

use crate::{
    functor::{FxHashing, Identity, KeyEq, KeyHash, KeyOf, Natural},
    hashtable::{self, Bucket, Chain, HashCommit, HashOptions, HashLookup, HashTable},
    hook::{HashHook, Hook},
    Error, Rejected,
};

//-----------------------------------------------------------------------------------------------//

/// A set of unique keys over values in a borrowed slab, hashed into a borrowed bucket array
pub struct UnorderedSet<'s, 'b, V, K = Identity, H = FxHashing, E = Natural> {
    slab: &'s [V],
    table: HashTable<'b, V, K, H, E>,
}

impl<'s, 'b, V, K, H, E> UnorderedSet<'s, 'b, V, K, H, E>
where
    K: KeyOf<V>,
    H: KeyHash<K::Key>,
    E: KeyEq<K::Key>,
{
    /// Constructor
    ///
    /// Fails, handing the bucket array back, if the options or the array are invalid.
    pub fn new(
        slab: &'s [V],
        buckets: &'b mut [Bucket],
        hook: Hook<V, HashHook>,
        options: HashOptions,
        key_of: K,
        hasher: H,
        key_eq: E,
    ) -> Result<Self, Rejected<'b>> {
        Ok(UnorderedSet {
            slab,
            table: HashTable::new(buckets, hook, options, key_of, hasher, key_eq)?,
        })
    }

    /// Get the number of values in the `UnorderedSet`
    pub fn len(&self) -> usize {
        self.table.len(self.slab)
    }

    /// Check if there are any values in the `UnorderedSet`
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// The slab the set links into
    #[inline]
    pub fn slab(&self) -> &'s [V] {
        self.slab
    }

    /// The underlying table
    #[inline]
    pub fn table(&self) -> &HashTable<'b, V, K, H, E> {
        &self.table
    }

    /// Link the value in slot `x`, unless one with an equal key is present
    pub fn insert(&mut self, x: usize) -> Result<bool, Error> {
        Ok(self.table.insert_unique(self.slab, x)?.1)
    }

    /// Look for a key before building the value that would carry it
    pub fn insert_check(&self, key: &K::Key) -> HashLookup {
        self.table.insert_unique_check(self.slab, key)
    }

    /// Link the value in slot `x` with a key checked by [`UnorderedSet::insert_check`]
    pub fn insert_commit(&mut self, x: usize, commit: HashCommit) -> Result<(), Error> {
        self.table.insert_unique_commit(self.slab, x, commit).map(|_| ())
    }

    /// Link a sequence of slots, skipping keys already present
    pub fn extend<I>(&mut self, slots: I) -> Result<usize, Error>
    where
        I: IntoIterator<Item = usize>,
    {
        self.table.extend_unique(self.slab, slots)
    }

    /// Get a value by key
    pub fn get(&self, key: &K::Key) -> Option<&'s V> {
        self.find(key).map(|x| &self.slab[x])
    }

    /// Get the slot of a value by key
    pub fn find(&self, key: &K::Key) -> Option<usize> {
        self.table.find(self.slab, key)
    }

    /// Check if a key is in the set
    pub fn contains(&self, key: &K::Key) -> bool {
        self.table.contains(self.slab, key)
    }

    /// Unlink a value by key, returning its slot
    pub fn remove(&mut self, key: &K::Key) -> Option<usize> {
        let x = self.table.find(self.slab, key)?;
        self.table.erase(self.slab, x).ok()?;
        Some(x)
    }

    /// Unlink the value in slot `x`
    pub fn erase(&mut self, x: usize) -> Result<(), Error> {
        self.table.erase(self.slab, x)
    }

    /// Unlink every value
    pub fn clear(&mut self) {
        self.table.clear(self.slab);
    }

    /// Unlink every value, handing each slot to a disposer
    pub fn clear_and_dispose<D>(&mut self, disposer: D)
    where
        D: FnMut(usize),
    {
        self.table.clear_and_dispose(self.slab, disposer);
    }

    /// Move every value into a new bucket array, returning the old one
    pub fn rehash(&mut self, buckets: &'b mut [Bucket]) -> Result<&'b mut [Bucket], Rejected<'b>> {
        self.table.rehash(self.slab, buckets)
    }

    /// Split or merge one bucket of an incremental table
    pub fn incremental_rehash(&mut self, grow: bool) -> Result<bool, Error> {
        self.table.incremental_rehash(self.slab, grow)
    }

    /// Switch an incremental table to a twice or half as large array
    pub fn incremental_rehash_with(
        &mut self,
        buckets: &'b mut [Bucket],
    ) -> Result<&'b mut [Bucket], Rejected<'b>> {
        self.table.incremental_rehash_with(buckets)
    }

    /// Check the structure of the set, including that keys are unique
    pub fn check(&self) -> Result<(), Error> {
        self.table.check_keys(self.slab, true)
    }

    /// Get an iterator over the values, bucket by bucket
    pub fn iter(&self) -> Values<'_, V, hashtable::Iter<'_, V>> {
        Values {
            slab: self.slab,
            slots: self.table.iter(self.slab),
        }
    }
}

impl<'a, V, K, H, E> IntoIterator for &'a UnorderedSet<'_, '_, V, K, H, E>
where
    K: KeyOf<V>,
    H: KeyHash<K::Key>,
    E: KeyEq<K::Key>,
{
    type Item = &'a V;
    type IntoIter = Values<'a, V, hashtable::Iter<'a, V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

//-----------------------------------------------------------------------------------------------//

/// A set of values that may share keys, hashed into a borrowed bucket array
///
/// Values with equal keys are always adjacent.
pub struct UnorderedMultiSet<'s, 'b, V, K = Identity, H = FxHashing, E = Natural> {
    slab: &'s [V],
    table: HashTable<'b, V, K, H, E>,
}

impl<'s, 'b, V, K, H, E> UnorderedMultiSet<'s, 'b, V, K, H, E>
where
    K: KeyOf<V>,
    H: KeyHash<K::Key>,
    E: KeyEq<K::Key>,
{
    /// Constructor
    pub fn new(
        slab: &'s [V],
        buckets: &'b mut [Bucket],
        hook: Hook<V, HashHook>,
        options: HashOptions,
        key_of: K,
        hasher: H,
        key_eq: E,
    ) -> Result<Self, Rejected<'b>> {
        Ok(UnorderedMultiSet {
            slab,
            table: HashTable::new(buckets, hook, options, key_of, hasher, key_eq)?,
        })
    }

    /// Get the number of values in the `UnorderedMultiSet`
    pub fn len(&self) -> usize {
        self.table.len(self.slab)
    }

    /// Check if there are any values in the `UnorderedMultiSet`
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// The underlying table
    #[inline]
    pub fn table(&self) -> &HashTable<'b, V, K, H, E> {
        &self.table
    }

    /// Link the value in slot `x` next to any values with an equal key
    pub fn insert(&mut self, x: usize) -> Result<(), Error> {
        self.table.insert_equal(self.slab, x).map(|_| ())
    }

    /// Link a sequence of slots
    pub fn extend<I>(&mut self, slots: I) -> Result<usize, Error>
    where
        I: IntoIterator<Item = usize>,
    {
        self.table.extend_equal(self.slab, slots)
    }

    /// Get the first value with an equal key
    pub fn get(&self, key: &K::Key) -> Option<&'s V> {
        self.table.find(self.slab, key).map(|x| &self.slab[x])
    }

    /// Check if a key is in the set
    pub fn contains(&self, key: &K::Key) -> bool {
        self.table.contains(self.slab, key)
    }

    /// Count the values with an equal key
    pub fn count(&self, key: &K::Key) -> usize {
        self.table.count(self.slab, key)
    }

    /// Iterate over the values with an equal key
    pub fn equal_range(&self, key: &K::Key) -> Values<'s, V, Chain<'s, V>> {
        Values {
            slab: self.slab,
            slots: self.table.equal_range(self.slab, key),
        }
    }

    /// Unlink every value with an equal key, returning how many were unlinked
    pub fn remove(&mut self, key: &K::Key) -> usize {
        self.table.remove(self.slab, key)
    }

    /// Unlink the value in slot `x`
    pub fn erase(&mut self, x: usize) -> Result<(), Error> {
        self.table.erase(self.slab, x)
    }

    /// Unlink every value
    pub fn clear(&mut self) {
        self.table.clear(self.slab);
    }

    /// Move every value into a new bucket array, returning the old one
    pub fn rehash(&mut self, buckets: &'b mut [Bucket]) -> Result<&'b mut [Bucket], Rejected<'b>> {
        self.table.rehash(self.slab, buckets)
    }

    /// Check the structure of the multiset
    pub fn check(&self) -> Result<(), Error> {
        self.table.check(self.slab)
    }

    /// Get an iterator over the values, bucket by bucket
    pub fn iter(&self) -> Values<'_, V, hashtable::Iter<'_, V>> {
        Values {
            slab: self.slab,
            slots: self.table.iter(self.slab),
        }
    }
}

impl<'a, V, K, H, E> IntoIterator for &'a UnorderedMultiSet<'_, '_, V, K, H, E>
where
    K: KeyOf<V>,
    H: KeyHash<K::Key>,
    E: KeyEq<K::Key>,
{
    type Item = &'a V;
    type IntoIter = Values<'a, V, hashtable::Iter<'a, V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

//-----------------------------------------------------------------------------------------------//

/// An iterator over the values behind a sequence of slots
pub struct Values<'a, V, I> {
    slab: &'a [V],
    slots: I,
}

impl<'a, V, I> Iterator for Values<'a, V, I>
where
    I: Iterator<Item = usize>,
{
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.slots.next().map(|x| &self.slab[x])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.slots.size_hint()
    }
}

impl<V, I> ExactSizeIterator for Values<'_, V, I> where I: ExactSizeIterator<Item = usize> {}

impl<V, I> FusedIterator for Values<'_, V, I> where I: FusedIterator<Item = usize> {}

//-----------------------------------------------------------------------------------------------//

#[cfg(test)]
mod fixture {
    use crate::hook::{HashHook, Hook};
    use compact_str::CompactString;

    pub struct Word {
        pub text: CompactString,
        pub hook: HashHook,
    }

    pub fn words(texts: &[&str]) -> alloc::vec::Vec<Word> {
        texts
            .iter()
            .map(|&text| Word {
                text: CompactString::from(text),
                hook: HashHook::new(),
            })
            .collect()
    }

    pub fn text(word: &Word) -> &str {
        &word.text
    }

    pub fn hook() -> Hook<Word, HashHook> {
        Hook::new(|w: &Word| &w.hook)
    }
}

#[test]
// Strings in a unique set, rehashed into a larger array
fn test_unordered_0() {
    use self::fixture::*;
    use alloc::vec::Vec;

    let slab = words(&["pear", "fig", "plum", "kiwi", "fig", "lime", "date"]);
    let key_of: fn(&Word) -> &str = text;
    let options = HashOptions::new().power_of_two(true).cache_begin(true);

    let mut small = [Bucket::new(); 4];
    let mut large = [Bucket::new(); 16];
    let mut set = UnorderedSet::new(
        &slab,
        &mut small,
        hook(),
        options,
        key_of,
        FxHashing::default(),
        Natural,
    )
    .unwrap();

    debug_assert_eq!(set.extend(0..slab.len()), Ok(6));
    debug_assert!(!slab[4].hook.is_linked());
    debug_assert_eq!(set.find("fig"), Some(1));
    debug_assert_eq!(set.get("apple").map(text), None);
    debug_assert_eq!(set.check(), Ok(()));

    let small = set.rehash(&mut large).unwrap();
    debug_assert_eq!(small.len(), 4);
    debug_assert_eq!(set.table().bucket_count(), 16);
    debug_assert_eq!(set.check(), Ok(()));

    debug_assert_eq!(set.remove("plum"), Some(2));
    debug_assert_eq!(set.remove("plum"), None);
    debug_assert_eq!(set.insert(4), Ok(false));

    let mut v: Vec<&str> = set.iter().map(text).collect();
    v.sort();
    debug_assert_eq!(v, ["date", "fig", "kiwi", "lime", "pear"]);
    debug_assert_eq!(set.len(), 5);

    let mut disposed = Vec::new();
    set.clear_and_dispose(|x| disposed.push(x));
    disposed.sort();
    debug_assert_eq!(disposed, [0, 1, 3, 5, 6]);
    debug_assert!(set.is_empty());
}

#[test]
// Grouped duplicates survive growing an incremental table
fn test_unordered_1() {
    use self::fixture::*;
    use alloc::vec::Vec;

    let slab = words(&["ant", "bee", "ant", "cat", "bee", "ant", "dog", "eel"]);
    let key_of: fn(&Word) -> &str = text;
    let options = HashOptions::new()
        .power_of_two(true)
        .incremental(true)
        .store_hash(true)
        .optimize_multikey(true);

    let mut first = [Bucket::new(); 2];
    let mut second = [Bucket::new(); 4];
    let mut set = UnorderedMultiSet::new(
        &slab,
        &mut first,
        hook(),
        options,
        key_of,
        FxHashing::default(),
        Natural,
    )
    .unwrap();
    set.extend(0..slab.len()).unwrap();

    debug_assert_eq!(set.count("ant"), 3);
    debug_assert_eq!(set.count("bee"), 2);
    debug_assert_eq!(set.equal_range("ant").len(), 3);

    set.table.incremental_rehash_with(&mut second).unwrap();
    while set.table.incremental_rehash(&slab, true).unwrap() {
        debug_assert_eq!(set.check(), Ok(()));
    }
    debug_assert_eq!(set.table().split_count(), 4);

    let ants: Vec<&str> = set.equal_range("ant").map(text).collect();
    debug_assert_eq!(ants, ["ant", "ant", "ant"]);

    debug_assert_eq!(set.remove("bee"), 2);
    debug_assert!(!set.contains("bee"));
    set.erase(0).unwrap();
    debug_assert_eq!(set.count("ant"), 2);
    debug_assert_eq!(set.len(), 5);
    debug_assert_eq!(set.check(), Ok(()));
}
