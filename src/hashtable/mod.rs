//! Intrusive hash tables with separate chaining
//!
//! [`HashTable`] links values that live in a caller-owned slab into a bucket array that is also
//! borrowed from the caller. The table never allocates: growing or shrinking means handing it
//! another array, and it hands the old one back. Each bucket is a singly linked chain through
//! the values' [`HashHook`]s, and values with equal keys are always adjacent in their chain.
//!
//! The behaviour is configured by [`HashOptions`]. With `incremental` the table can also grow
//! and shrink one bucket at a time by linear splitting, switching to a twice or half as large
//! array only at the boundaries.

use core::{fmt, iter::FusedIterator, mem};

use tracing::{debug, trace};

use crate::{
    functor::{FxHashing, Identity, KeyEq, KeyHash, KeyOf, Natural},
    hook::{HashHook, Hook},
    CloneError, Error, Rejected,
};

pub mod bucket;
pub mod group;
mod options;

pub use bucket::Bucket;
pub use group::Links;
pub use options::HashOptions;

//-----------------------------------------------------------------------------------------------//

/// The result of the first phase of a two-phase unique insert
#[derive(Debug, PartialEq, Eq)]
pub enum HashLookup {
    /// A value with an equal key is already in the table
    Occupied(usize),
    /// The key is absent; committing the token links a value with that key
    Vacant(HashCommit),
}

/// The hash found by `insert_unique_check`, valid until the table is next modified
#[derive(Debug, PartialEq, Eq)]
pub struct HashCommit {
    hash: usize,
    generation: u64,
}

//-----------------------------------------------------------------------------------------------//

/// An intrusive hash table over values stored in a caller-owned slab
///
/// Values are named by their slot index, and every operation borrows the slab. The bucket array
/// is borrowed for `'b` and must outlive the table.
pub struct HashTable<'b, V, K = Identity, H = FxHashing, E = Natural> {
    buckets: &'b mut [Bucket],
    hook: Hook<V, HashHook>,
    options: HashOptions,
    size: usize,
    split: usize,
    cached_begin: usize,
    generation: u64,
    key_of: K,
    hasher: H,
    key_eq: E,
}

impl<'b, V, K, H, E> HashTable<'b, V, K, H, E>
where
    K: KeyOf<V>,
    H: KeyHash<K::Key>,
    E: KeyEq<K::Key>,
{
    /// Construct an empty table over a bucket array
    ///
    /// Every bucket is reset to empty. An array or an option set that does not fit is handed
    /// back untouched.
    pub fn new(
        buckets: &'b mut [Bucket],
        hook: Hook<V, HashHook>,
        options: HashOptions,
        key_of: K,
        hasher: H,
        key_eq: E,
    ) -> Result<HashTable<'b, V, K, H, E>, Rejected<'b>> {
        if let Err(error) = options
            .validate()
            .and_then(|_| bucket::validate(&options, buckets.len()))
        {
            return Err(Rejected { error, buckets });
        }

        bucket::clear(buckets);
        let count = buckets.len();
        Ok(HashTable {
            buckets,
            hook,
            options,
            size: 0,
            split: count,
            cached_begin: count,
            generation: 0,
            key_of,
            hasher,
            key_eq,
        })
    }

    /// Get the number of values in the table
    ///
    /// Without `constant_time_size` this walks every bucket.
    pub fn len(&self, slab: &[V]) -> usize {
        if self.options.constant_time_size {
            self.size
        } else {
            self.iter(slab).count()
        }
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        if self.options.constant_time_size {
            self.size == 0
        } else {
            self.first_bucket() == self.buckets.len()
        }
    }

    /// The options the table was built with
    #[inline]
    pub fn options(&self) -> &HashOptions {
        &self.options
    }

    /// The hook this table links values through
    #[inline]
    pub fn hook(&self) -> Hook<V, HashHook> {
        self.hook
    }

    /// The key extractor
    #[inline]
    pub fn key_of(&self) -> &K {
        &self.key_of
    }

    /// The hasher
    #[inline]
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// The key equality
    #[inline]
    pub fn key_eq(&self) -> &E {
        &self.key_eq
    }

    /// Number of buckets in the array
    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of buckets in use; below `bucket_count` only while an incremental split is pending
    #[inline]
    pub fn split_count(&self) -> usize {
        self.split
    }

    /// The bucket array
    #[inline]
    pub fn buckets(&self) -> &[Bucket] {
        &*self.buckets
    }

    /// The bucket a hash routes to
    #[inline]
    pub fn bucket_for_hash(&self, hash: usize) -> usize {
        bucket::route(&self.options, hash, self.buckets.len(), self.split)
    }

    /// The bucket a key routes to
    pub fn bucket_of(&self, key: &K::Key) -> usize {
        self.bucket_for_hash(self.hasher.hash(key))
    }

    /// Count the values in one bucket
    pub fn bucket_size(&self, slab: &[V], b: usize) -> usize {
        let t = self.links(slab);
        let mut x = self.buckets[b].head;
        let mut count = 0;
        while !x != 0 {
            count += 1;
            x = t.next(x);
        }
        count
    }

    /// Iterate over every slot, bucket by bucket
    pub fn iter<'a>(&'a self, slab: &'a [V]) -> Iter<'a, V> {
        let b = self.first_bucket();
        Iter {
            links: self.links(slab),
            buckets: &*self.buckets,
            bucket: b,
            x: self.buckets.get(b).map_or(!0, |bucket| bucket.head),
        }
    }

    /// Iterate over the slots of one bucket
    pub fn iter_bucket<'a>(&self, slab: &'a [V], b: usize) -> Chain<'a, V> {
        Chain {
            links: self.links(slab),
            x: self.buckets[b].head,
            count: self.bucket_size(slab, b),
        }
    }

    //-------------------------------------------------------------------------------------------//

    /// Link a value unless one with an equal key is present
    ///
    /// Returns the slot of the value with that key and whether `x` was linked.
    pub fn insert_unique(&mut self, slab: &[V], x: usize) -> Result<(usize, bool), Error> {
        let t = self.links(slab);
        ensure_unlinked(t, x)?;

        let key = t.key(&self.key_of, x);
        let hash = self.hasher.hash(key);
        let (b, _, y) = self.search(t, key, hash, |a, c| self.key_eq.eq(a, c));
        if !y != 0 {
            return Ok((y, false));
        }

        self.prepare(t, x, hash);
        self.push_front(t, b, x);
        Ok((x, true))
    }

    /// Link a value next to any values with an equal key
    ///
    /// With `optimize_multikey` the value joins the end of its key's group.
    pub fn insert_equal(&mut self, slab: &[V], x: usize) -> Result<usize, Error> {
        let t = self.links(slab);
        ensure_unlinked(t, x)?;

        let key = t.key(&self.key_of, x);
        let hash = self.hasher.hash(key);
        let (b, _, first) = self.search(t, key, hash, |a, c| self.key_eq.eq(a, c));

        self.prepare(t, x, hash);
        if !first == 0 {
            self.push_front(t, b, x);
            return Ok(x);
        }

        if self.options.optimize_multikey {
            group::append_to_group(t, first, x);
        } else {
            let last = self.run_last(t, first);
            t.set_next(x, t.next(last));
            t.set_next(last, x);
        }
        self.grow(1);
        self.bump();
        Ok(x)
    }

    /// Search for a key ahead of a unique insert, without constructing a value
    pub fn insert_unique_check(&self, slab: &[V], key: &K::Key) -> HashLookup {
        self.insert_unique_check_with(slab, key, &self.hasher, |a, c| self.key_eq.eq(a, c))
    }

    /// Search ahead of a unique insert with a different key type
    ///
    /// `hasher` must hash a `Q` exactly as the table hashes the equal key, and `eq` must agree
    /// with the table's equality.
    pub fn insert_unique_check_with<Q, G, F>(
        &self,
        slab: &[V],
        key: &Q,
        hasher: &G,
        eq: F,
    ) -> HashLookup
    where
        Q: ?Sized,
        G: KeyHash<Q>,
        F: Fn(&Q, &K::Key) -> bool,
    {
        let t = self.links(slab);
        let hash = hasher.hash(key);
        match self.search(t, key, hash, eq) {
            (_, _, y) if !y != 0 => HashLookup::Occupied(y),
            _ => HashLookup::Vacant(HashCommit {
                hash,
                generation: self.generation,
            }),
        }
    }

    /// Link a value with the key checked by `insert_unique_check`
    ///
    /// Fails with `StaleCommit` if the table changed since the check, or if the key of `x` does
    /// not hash to the value the token was taken for.
    pub fn insert_unique_commit(
        &mut self,
        slab: &[V],
        x: usize,
        commit: HashCommit,
    ) -> Result<usize, Error> {
        if commit.generation != self.generation {
            return Err(Error::StaleCommit);
        }

        let t = self.links(slab);
        ensure_unlinked(t, x)?;
        if self.hasher.hash(t.key(&self.key_of, x)) != commit.hash {
            return Err(Error::StaleCommit);
        }

        let b = self.bucket_for_hash(commit.hash);
        self.prepare(t, x, commit.hash);
        self.push_front(t, b, x);
        Ok(x)
    }

    /// Link a sequence of values, skipping those whose key is already present
    ///
    /// Stops at the first value that is already linked. Returns how many values were linked.
    pub fn extend_unique<I>(&mut self, slab: &[V], slots: I) -> Result<usize, Error>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut count = 0;
        for x in slots {
            if self.insert_unique(slab, x)?.1 {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Link a sequence of values, keeping duplicates
    pub fn extend_equal<I>(&mut self, slab: &[V], slots: I) -> Result<usize, Error>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut count = 0;
        for x in slots {
            self.insert_equal(slab, x)?;
            count += 1;
        }
        Ok(count)
    }

    //-------------------------------------------------------------------------------------------//

    /// Get the slot of a value with an equal key; the first of them with duplicates
    pub fn find(&self, slab: &[V], key: &K::Key) -> Option<usize> {
        self.find_with(slab, key, &self.hasher, |a, c| self.key_eq.eq(a, c))
    }

    /// Find with a different key type, hashed and compared compatibly with the table's own
    pub fn find_with<Q, G, F>(&self, slab: &[V], key: &Q, hasher: &G, eq: F) -> Option<usize>
    where
        Q: ?Sized,
        G: KeyHash<Q>,
        F: Fn(&Q, &K::Key) -> bool,
    {
        let t = self.links(slab);
        let (_, _, x) = self.search(t, key, hasher.hash(key), eq);
        slot(x)
    }

    /// Check if a value with an equal key is present
    pub fn contains(&self, slab: &[V], key: &K::Key) -> bool {
        self.find(slab, key).is_some()
    }

    /// Count the values with an equal key
    pub fn count(&self, slab: &[V], key: &K::Key) -> usize {
        self.equal_range(slab, key).len()
    }

    /// Count with a different key type
    pub fn count_with<Q, G, F>(&self, slab: &[V], key: &Q, hasher: &G, eq: F) -> usize
    where
        Q: ?Sized,
        G: KeyHash<Q>,
        F: Fn(&Q, &K::Key) -> bool,
    {
        match self.find_with(slab, key, hasher, eq) {
            Some(first) => self.run_len(self.links(slab), first),
            None => 0,
        }
    }

    /// Iterate over the slots whose key is equal to `key`
    pub fn equal_range<'a>(&self, slab: &'a [V], key: &K::Key) -> Chain<'a, V> {
        let t = self.links(slab);
        let first = self.find(slab, key).unwrap_or(!0);
        let count = if !first == 0 { 0 } else { self.run_len(t, first) };
        Chain { links: t, x: first, count }
    }

    //-------------------------------------------------------------------------------------------//

    /// Unlink a value
    pub fn erase(&mut self, slab: &[V], x: usize) -> Result<(), Error> {
        let t = self.links(slab);
        if !t.hook(x).is_linked() {
            return Err(Error::NotLinked(x));
        }

        let b = self.bucket_for_hash(self.hash_of(t, x));
        self.unlink(t, b, x)
    }

    /// Unlink a value and hand its slot to a disposer
    pub fn erase_and_dispose<D>(&mut self, slab: &[V], x: usize, disposer: D) -> Result<(), Error>
    where
        D: FnOnce(usize),
    {
        self.erase(slab, x)?;
        disposer(x);
        Ok(())
    }

    /// Unlink every value with an equal key, returning how many were unlinked
    pub fn remove(&mut self, slab: &[V], key: &K::Key) -> usize {
        self.remove_and_dispose(slab, key, |_| {})
    }

    /// Unlink every value with an equal key and hand each slot to a disposer
    pub fn remove_and_dispose<D>(&mut self, slab: &[V], key: &K::Key, mut disposer: D) -> usize
    where
        D: FnMut(usize),
    {
        let t = self.links(slab);
        let hash = self.hasher.hash(key);
        let (b, pred, first) = self.search(t, key, hash, |a, c| self.key_eq.eq(a, c));
        if !first == 0 {
            return 0;
        }

        // The run is contiguous, so it leaves the chain in one splice
        let last = self.run_last(t, first);
        let after = t.next(last);
        if !pred == 0 {
            self.buckets[b].head = after;
        } else {
            t.set_next(pred, after);
        }

        let mut x = first;
        let mut count = 0;
        loop {
            let next = t.next(x);
            t.hook(x).reset();
            disposer(x);
            count += 1;
            if x == last {
                break;
            }
            x = next;
        }

        self.shrink(count);
        self.note_emptied(b);
        self.bump();
        count
    }

    /// Unlink every value
    pub fn clear(&mut self, slab: &[V]) {
        self.clear_and_dispose(slab, |_| {});
    }

    /// Unlink every value and hand each slot, bucket by bucket, to a disposer
    pub fn clear_and_dispose<D>(&mut self, slab: &[V], mut disposer: D)
    where
        D: FnMut(usize),
    {
        let t = self.links(slab);
        for bucket in self.buckets.iter_mut() {
            let mut x = bucket.head;
            while !x != 0 {
                let next = t.next(x);
                t.hook(x).reset();
                disposer(x);
                x = next;
            }
            *bucket = Bucket::new();
        }

        self.size = 0;
        self.cached_begin = self.buckets.len();
        self.bump();
    }

    //-------------------------------------------------------------------------------------------//

    /// Move every value into a new bucket array, returning the old one
    ///
    /// Stored hashes are reused. The new array is handed back if it does not suit the options.
    pub fn rehash(
        &mut self,
        slab: &[V],
        buckets: &'b mut [Bucket],
    ) -> Result<&'b mut [Bucket], Rejected<'b>> {
        if let Err(error) = bucket::validate(&self.options, buckets.len()) {
            return Err(Rejected { error, buckets });
        }

        let t = self.links(slab);
        let list = self.detach_all(t);

        bucket::clear(buckets);
        let old = mem::replace(&mut self.buckets, buckets);
        self.split = self.buckets.len();
        self.relink(t, list, false);

        debug!(from = old.len(), to = self.buckets.len(), "rehashed into a new bucket array");
        Ok(old)
    }

    /// Recompute the hash of every value and relink it, in the same array
    pub fn full_rehash(&mut self, slab: &[V]) {
        let t = self.links(slab);
        let list = self.detach_all(t);
        self.relink(t, list, true);
        debug!(buckets = self.buckets.len(), "recomputed every hash");
    }

    /// Shrink to the first `count` buckets without hashing, returning the buckets let go
    ///
    /// The current count must be a multiple of `count`, so every chain folds onto a single
    /// bucket as a whole.
    pub fn shrink_in_place(&mut self, slab: &[V], count: usize) -> Result<&'b mut [Bucket], Error> {
        let old = self.buckets.len();
        bucket::validate(&self.options, count)?;
        if count > old || old % count != 0 || self.split != old {
            return Err(Error::BucketMismatch {
                current: old,
                actual: count,
            });
        }

        let t = self.links(slab);
        for b in count..old {
            let head = self.buckets[b].head;
            if !head == 0 {
                continue;
            }

            let mut tail = head;
            while !t.next(tail) != 0 {
                tail = t.next(tail);
            }

            let to = b % count;
            t.set_next(tail, self.buckets[to].head);
            self.buckets[to].head = head;
            self.buckets[b] = Bucket::new();
        }

        let buckets = mem::take(&mut self.buckets);
        let (live, rest) = buckets.split_at_mut(count);
        self.buckets = live;
        self.split = count;
        self.refresh_begin();
        self.bump();

        debug!(from = old, to = count, "shrank bucket array in place");
        Ok(rest)
    }

    /// Split one bucket (`grow`) or merge the last one back, in incremental mode
    ///
    /// Returns `false` once the split point reaches the end or the middle of the array; the
    /// next step is then [`incremental_rehash_with`](Self::incremental_rehash_with).
    pub fn incremental_rehash(&mut self, slab: &[V], grow: bool) -> Result<bool, Error> {
        if !self.options.incremental {
            return Err(Error::InvalidOptions("incremental rehash is disabled"));
        }

        let t = self.links(slab);
        let count = self.buckets.len();

        if grow {
            if self.split == count {
                return Ok(false);
            }

            let to = self.split;
            let from = to - count / 2;
            self.split += 1;

            // Move the runs that now route to the new bucket, keeping their order
            let mut pred = !0;
            let mut tail = !0;
            let mut x = self.buckets[from].head;
            while !x != 0 {
                let last = self.run_last(t, x);
                let after = t.next(last);

                if self.bucket_for_hash(self.hash_of(t, x)) == to {
                    if !pred == 0 {
                        self.buckets[from].head = after;
                    } else {
                        t.set_next(pred, after);
                    }

                    t.set_next(last, !0);
                    if !tail == 0 {
                        self.buckets[to].head = x;
                    } else {
                        t.set_next(tail, x);
                    }
                    tail = last;
                } else {
                    pred = last;
                }

                x = after;
            }

            if !tail != 0 {
                self.note_linked(to);
            }
            self.note_emptied(from);
            trace!(from, to, "split bucket");
        } else {
            if self.split <= bucket::min_split(count) {
                return Ok(false);
            }

            self.split -= 1;
            let from = self.split;
            let to = from - count / 2;

            let head = self.buckets[from].head;
            if !head != 0 {
                self.buckets[from] = Bucket::new();
                let mut tail = self.buckets[to].head;
                if !tail == 0 {
                    self.buckets[to].head = head;
                } else {
                    while !t.next(tail) != 0 {
                        tail = t.next(tail);
                    }
                    t.set_next(tail, head);
                }

                self.note_linked(to);
                self.note_emptied(from);
            }
            trace!(from, to, "merged bucket");
        }

        self.bump();
        Ok(true)
    }

    /// Switch to an array twice as large, once every bucket is split, or half as large, once
    /// every split bucket is merged back; returns the old array
    ///
    /// Chains keep their bucket index, so no value is rehashed.
    pub fn incremental_rehash_with(
        &mut self,
        buckets: &'b mut [Bucket],
    ) -> Result<&'b mut [Bucket], Rejected<'b>> {
        if !self.options.incremental {
            return Err(Rejected {
                error: Error::InvalidOptions("incremental rehash is disabled"),
                buckets,
            });
        }

        let count = self.buckets.len();
        let new = buckets.len();
        let grow = new == count * 2 && self.split == count;
        let shrink = new * 2 == count && self.split == new;
        if !grow && !shrink {
            return Err(Rejected {
                error: Error::BucketMismatch {
                    current: count,
                    actual: new,
                },
                buckets,
            });
        }

        bucket::clear(buckets);
        let live = count.min(new);
        buckets[..live].copy_from_slice(&self.buckets[..live]);
        bucket::clear(self.buckets);

        let old = mem::replace(&mut self.buckets, buckets);
        self.split = live;
        self.refresh_begin();
        self.bump();

        debug!(from = count, to = new, "switched incremental bucket array");
        Ok(old)
    }

    //-------------------------------------------------------------------------------------------//

    /// Make this table a copy of `source`, cloning each of its values
    ///
    /// The clone of the value in source slot `i` is written to slot `i` of `slab`. When the
    /// source bucket count is a multiple of this table's and neither table is mid-split, whole
    /// chains are copied without hashing. Otherwise each group is routed by its stored hash, or
    /// by hashing the clone. Existing values of this table are unlinked and disposed first. If
    /// the cloner fails, every slot cloned so far is disposed and the error is returned.
    pub fn clone_from<R, F, D>(
        &mut self,
        slab: &mut [V],
        source: &Self,
        source_slab: &[V],
        mut cloner: F,
        mut disposer: D,
    ) -> Result<(), CloneError<R>>
    where
        F: FnMut(&V) -> Result<V, R>,
        D: FnMut(usize),
    {
        self.clear_and_dispose(slab, &mut disposer);

        let required = source.iter(source_slab).max().map_or(0, |x| x + 1);
        if slab.len() < required {
            return Err(Error::SlabTooSmall {
                required,
                actual: slab.len(),
            }
            .into());
        }

        for x in source.iter(source_slab) {
            match cloner(&source_slab[x]) {
                Ok(value) => slab[x] = value,
                Err(error) => {
                    trace!(slot = x, "cloner failed, disposing partial copy");
                    for y in source.iter(source_slab).take_while(|&y| y != x) {
                        self.hook.of(&slab[y]).reset();
                        disposer(y);
                    }
                    return Err(CloneError::Cloner(error));
                }
            }
        }

        let slab: &[V] = slab;
        let t = self.links(slab);
        let s = source.links(source_slab);
        let count = self.buckets.len();

        let structural = source.buckets.len() % count == 0
            && source.split == source.buckets.len()
            && self.split == count
            && source.options.optimize_multikey == self.options.optimize_multikey
            && (source.options.store_hash || !self.options.store_hash);

        let mut linked = 0;
        if structural {
            for (b, bucket) in source.buckets.iter().enumerate() {
                let head = bucket.head;
                if !head == 0 {
                    continue;
                }

                let mut x = head;
                let mut tail = head;
                while !x != 0 {
                    let hook = t.hook(x);
                    hook.copy_from(s.hook(x));
                    if !self.options.store_hash {
                        hook.hash.set(0);
                    }
                    linked += 1;
                    tail = x;
                    x = s.next(x);
                }

                let to = b % count;
                t.set_next(tail, self.buckets[to].head);
                self.buckets[to].head = head;
            }
        } else {
            for bucket in source.buckets.iter() {
                let mut x = bucket.head;
                while !x != 0 {
                    let last = source.run_last(s, x);
                    let after = s.next(last);
                    let hash = if source.options.store_hash {
                        s.hook(x).hash.get()
                    } else {
                        self.hasher.hash(t.key(&self.key_of, x))
                    };

                    let b = self.bucket_for_hash(hash);
                    self.prepare(t, x, hash);
                    t.set_next(x, self.buckets[b].head);
                    self.buckets[b].head = x;
                    linked += 1;

                    let mut prev = x;
                    while prev != last {
                        let y = s.next(prev);
                        self.prepare(t, y, hash);
                        if self.options.optimize_multikey {
                            group::append_to_group(t, x, y);
                        } else {
                            t.set_next(y, t.next(prev));
                            t.set_next(prev, y);
                        }
                        linked += 1;
                        prev = y;
                    }

                    x = after;
                }
            }
        }

        self.grow(linked);
        self.refresh_begin();
        self.bump();
        Ok(())
    }

    /// Exchange the contents of two tables, bucket arrays included
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Check every structural invariant: routing, stored hashes, groups and counters
    pub fn check(&self, slab: &[V]) -> Result<(), Error> {
        self.check_keys(slab, false)
    }

    pub(crate) fn check_keys(&self, slab: &[V], unique: bool) -> Result<(), Error> {
        let t = self.links(slab);
        let count = self.buckets.len();
        let lowest = if self.options.incremental {
            bucket::min_split(count)
        } else {
            count
        };
        if self.split > count || self.split < lowest {
            return Err(Error::Corrupt("split point out of range"));
        }

        let mut size = 0;
        let mut begin = count;
        for (b, bucket) in self.buckets.iter().enumerate() {
            let head = bucket.head;
            if !head == 0 {
                continue;
            }
            if b >= self.split {
                return Err(Error::Corrupt("bucket above the split point holds values"));
            }
            begin = begin.min(b);

            let mut x = head;
            while !x != 0 {
                let first = x;
                let key = t.key(&self.key_of, first);
                let last = self.check_run(t, b, first)?;
                let run = self.run_len(t, first);
                if unique && run > 1 {
                    return Err(Error::Corrupt("duplicate key in a unique table"));
                }
                size += run;

                // Equal keys never reappear later in the chain
                let mut y = t.next(last);
                while !y != 0 {
                    if self.key_eq.eq(key, t.key(&self.key_of, y)) {
                        return Err(Error::Corrupt("equal keys are not adjacent"));
                    }
                    y = t.next(y);
                }

                x = t.next(last);
            }
        }

        if self.options.constant_time_size && size != self.size {
            return Err(Error::Corrupt("size counter does not match the table"));
        }
        if self.options.cache_begin && begin != self.cached_begin {
            return Err(Error::Corrupt("cached first bucket is wrong"));
        }
        Ok(())
    }

    // Check the linkage, hash and routing of each value of the run headed by `first`
    fn check_run(&self, t: Links<'_, V>, b: usize, first: usize) -> Result<usize, Error> {
        let key = t.key(&self.key_of, first);
        let last = self.run_last(t, first);

        let mut x = first;
        loop {
            let hook = t.hook(x);
            if !hook.is_linked() {
                return Err(Error::Corrupt("unlinked value in a chain"));
            }

            let hash = self.hasher.hash(t.key(&self.key_of, x));
            if self.options.store_hash && hook.hash.get() != hash {
                return Err(Error::Corrupt("stored hash is stale"));
            }
            if self.bucket_for_hash(hash) != b {
                return Err(Error::Corrupt("value is in the wrong bucket"));
            }
            if !self.key_eq.eq(key, t.key(&self.key_of, x)) {
                return Err(Error::Corrupt("group mixes keys"));
            }

            if x == last {
                break;
            }
            let next = t.next(x);
            if !next == 0 {
                return Err(Error::Corrupt("group ends outside of its chain"));
            }
            if self.options.optimize_multikey && t.group(next) != x {
                return Err(Error::Corrupt("group back-link is wrong"));
            }
            x = next;
        }

        let after = t.next(last);
        if !after != 0 && self.key_eq.eq(key, t.key(&self.key_of, after)) {
            return Err(Error::Corrupt("equal keys are split across groups"));
        }
        Ok(last)
    }

    //-------------------------------------------------------------------------------------------//

    #[inline]
    pub(crate) fn links<'s>(&self, slab: &'s [V]) -> Links<'s, V> {
        Links::new(slab, self.hook)
    }

    // Any structural change invalidates outstanding commit tokens
    #[inline]
    fn bump(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    #[inline]
    fn grow(&mut self, n: usize) {
        if self.options.constant_time_size {
            self.size += n;
        }
    }

    #[inline]
    fn shrink(&mut self, n: usize) {
        if self.options.constant_time_size {
            self.size -= n;
        }
    }

    // The hash of a linked value
    fn hash_of(&self, t: Links<'_, V>, x: usize) -> usize {
        if self.options.store_hash {
            t.hook(x).hash.get()
        } else {
            self.hasher.hash(t.key(&self.key_of, x))
        }
    }

    // Find the head of the run of `key` in its bucket, with the head's chain predecessor
    //
    // Returns `(bucket, predecessor, head)`; `head` is `!0` if absent and `predecessor` is `!0`
    // when the head is the bucket's first value.
    fn search<Q, F>(&self, t: Links<'_, V>, key: &Q, hash: usize, eq: F) -> (usize, usize, usize)
    where
        Q: ?Sized,
        F: Fn(&Q, &K::Key) -> bool,
    {
        let b = self.bucket_for_hash(hash);
        let mut pred = !0;
        let mut x = self.buckets[b].head;

        while !x != 0 {
            let hashes_match = !self.options.compare_hash || t.hook(x).hash.get() == hash;
            if hashes_match && eq(key, t.key(&self.key_of, x)) {
                break;
            }

            pred = if self.options.optimize_multikey {
                t.group(x)
            } else {
                x
            };
            x = t.next(pred);
        }

        (b, pred, x)
    }

    // The last value of the run headed by `first`
    fn run_last(&self, t: Links<'_, V>, first: usize) -> usize {
        if self.options.optimize_multikey {
            return t.group(first);
        }

        let key = t.key(&self.key_of, first);
        let mut last = first;
        loop {
            let next = t.next(last);
            if !next == 0 || !self.key_eq.eq(key, t.key(&self.key_of, next)) {
                return last;
            }
            last = next;
        }
    }

    fn run_len(&self, t: Links<'_, V>, first: usize) -> usize {
        if self.options.optimize_multikey {
            return group::group_size(t, first);
        }

        let last = self.run_last(t, first);
        let mut x = first;
        let mut count = 1;
        while x != last {
            x = t.next(x);
            count += 1;
        }
        count
    }

    // Fill in the hook of a value about to be linked
    fn prepare(&self, t: Links<'_, V>, x: usize, hash: usize) {
        let hook = t.hook(x);
        hook.next.set(!0);
        hook.hash.set(if self.options.store_hash { hash } else { 0 });
        hook.linked.set(true);
        group::init_group(t, x);
    }

    fn push_front(&mut self, t: Links<'_, V>, b: usize, x: usize) {
        t.set_next(x, self.buckets[b].head);
        self.buckets[b].head = x;
        self.grow(1);
        self.note_linked(b);
        self.bump();
    }

    fn unlink(&mut self, t: Links<'_, V>, b: usize, x: usize) -> Result<(), Error> {
        let pred = if self.options.optimize_multikey && !group::is_first_in_group(t, x) {
            t.group(x)
        } else {
            self.chain_pred(t, b, x).ok_or(Error::NotLinked(x))?
        };

        if self.options.optimize_multikey {
            group::leave_group(t, x);
        }

        let next = t.next(x);
        if !pred == 0 {
            self.buckets[b].head = next;
        } else {
            t.set_next(pred, next);
        }
        t.hook(x).reset();

        self.shrink(1);
        self.note_emptied(b);
        self.bump();
        Ok(())
    }

    // The value before `x` in bucket `b`, `!0` if `x` is the head, or `None` if `x` is not there
    fn chain_pred(&self, t: Links<'_, V>, b: usize, x: usize) -> Option<usize> {
        let mut pred = !0;
        let mut y = self.buckets[b].head;
        while y != x {
            if !y == 0 {
                return None;
            }
            pred = if self.options.optimize_multikey {
                t.group(y)
            } else {
                y
            };
            y = t.next(pred);
        }
        Some(pred)
    }

    // Empty every bucket into one list, chains concatenated in bucket order
    fn detach_all(&mut self, t: Links<'_, V>) -> usize {
        let mut list = !0;
        let mut tail = !0;
        for bucket in self.buckets.iter_mut() {
            let head = bucket.head;
            if !head == 0 {
                continue;
            }
            *bucket = Bucket::new();

            if !tail == 0 {
                list = head;
            } else {
                t.set_next(tail, head);
            }
            tail = head;
            while !t.next(tail) != 0 {
                tail = t.next(tail);
            }
        }
        list
    }

    // Route every run of a detached list to its bucket
    fn relink(&mut self, t: Links<'_, V>, mut x: usize, recompute: bool) {
        while !x != 0 {
            let last = self.run_last(t, x);
            let after = t.next(last);

            let hash = if recompute || !self.options.store_hash {
                self.hasher.hash(t.key(&self.key_of, x))
            } else {
                t.hook(x).hash.get()
            };

            if recompute && self.options.store_hash {
                let mut y = x;
                loop {
                    t.hook(y).hash.set(hash);
                    if y == last {
                        break;
                    }
                    y = t.next(y);
                }
            }

            let b = self.bucket_for_hash(hash);
            t.set_next(last, self.buckets[b].head);
            self.buckets[b].head = x;

            x = after;
        }

        self.refresh_begin();
        self.bump();
    }

    fn scan_from(&self, b: usize) -> usize {
        self.buckets[b..]
            .iter()
            .position(|bucket| !bucket.is_empty())
            .map_or(self.buckets.len(), |i| b + i)
    }

    fn first_bucket(&self) -> usize {
        if self.options.cache_begin {
            self.cached_begin
        } else {
            self.scan_from(0)
        }
    }

    fn refresh_begin(&mut self) {
        self.cached_begin = self.scan_from(0);
    }

    #[inline]
    fn note_linked(&mut self, b: usize) {
        if self.options.cache_begin && b < self.cached_begin {
            self.cached_begin = b;
        }
    }

    #[inline]
    fn note_emptied(&mut self, b: usize) {
        if self.options.cache_begin && b == self.cached_begin && self.buckets[b].is_empty() {
            self.cached_begin = self.scan_from(b);
        }
    }
}

impl<V, K, H, E> fmt::Debug for HashTable<'_, V, K, H, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashTable")
            .field("options", &self.options)
            .field("buckets", &self.buckets.len())
            .field("split", &self.split)
            .field("size", &self.size)
            .finish()
    }
}

// Map the `!0` null index to `None`
#[inline]
fn slot(x: usize) -> Option<usize> {
    if !x == 0 {
        None
    } else {
        Some(x)
    }
}

fn ensure_unlinked<V>(t: Links<'_, V>, x: usize) -> Result<(), Error> {
    if t.hook(x).is_linked() {
        Err(Error::AlreadyLinked(x))
    } else {
        Ok(())
    }
}

//-----------------------------------------------------------------------------------------------//

/// Iterator over every slot of a table, bucket by bucket
pub struct Iter<'a, V> {
    links: Links<'a, V>,
    buckets: &'a [Bucket],
    bucket: usize,
    x: usize,
}

impl<V> Iterator for Iter<'_, V> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            if !self.x != 0 {
                let x = self.x;
                self.x = self.links.next(x);
                return Some(x);
            }

            self.bucket += 1;
            if self.bucket >= self.buckets.len() {
                self.bucket = self.buckets.len();
                return None;
            }
            self.x = self.buckets[self.bucket].head;
        }
    }
}

impl<V> FusedIterator for Iter<'_, V> {}

/// Iterator along one chain: a bucket, or a run of equal keys
pub struct Chain<'a, V> {
    links: Links<'a, V>,
    x: usize,
    count: usize,
}

impl<V> Iterator for Chain<'_, V> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.count == 0 {
            return None;
        }

        let x = self.x;
        self.x = self.links.next(x);
        self.count -= 1;
        Some(x)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.count, Some(self.count))
    }
}

impl<V> ExactSizeIterator for Chain<'_, V> {}

impl<V> FusedIterator for Chain<'_, V> {}

//-----------------------------------------------------------------------------------------------//

#[cfg(test)]
pub(crate) mod fixture {
    use alloc::vec::Vec;

    use crate::{
        functor::KeyOf,
        hook::{HashHook, Hook},
    };

    pub struct Entry {
        pub key: u32,
        pub hook: HashHook,
    }

    /// Entries are keyed by their `key` field
    pub struct ByKey;

    impl KeyOf<Entry> for ByKey {
        type Key = u32;

        fn key_of<'a>(&self, value: &'a Entry) -> &'a u32 {
            &value.key
        }
    }

    pub fn slab(keys: &[u32]) -> Vec<Entry> {
        keys.iter()
            .map(|&key| Entry {
                key,
                hook: HashHook::new(),
            })
            .collect()
    }

    pub fn hook() -> Hook<Entry, HashHook> {
        Hook::new(|v: &Entry| &v.hook)
    }

    pub fn identity(key: &u32) -> usize {
        *key as usize
    }
}

#[test]
// Keys that collide modulo the bucket count share one chain
fn test_hashtable_0() {
    use self::fixture::*;
    use alloc::vec::Vec;

    let slab = slab(&[0, 7, 14, 21, 14]);
    let mut buckets = [Bucket::new(); 7];
    let mut table = HashTable::new(&mut buckets, hook(), HashOptions::new(), ByKey, identity, Natural).unwrap();

    debug_assert_eq!(table.extend_unique(&slab, 0..5), Ok(4));
    debug_assert_eq!(table.bucket_size(&slab, 0), 4);
    debug_assert_eq!(table.len(&slab), 4);
    for key in [0, 7, 14, 21] {
        debug_assert_eq!(table.count(&slab, &key), 1);
    }

    // The second value with key 14 was refused
    debug_assert_eq!(table.insert_unique(&slab, 4), Ok((2, false)));
    debug_assert!(!slab[4].hook.is_linked());

    debug_assert_eq!(table.find(&slab, &14), Some(2));
    table.erase(&slab, 2).unwrap();
    debug_assert_eq!(table.find(&slab, &14), None);
    debug_assert_eq!(table.erase(&slab, 2), Err(Error::NotLinked(2)));

    let mut chain: Vec<usize> = table.iter_bucket(&slab, 0).collect();
    chain.sort();
    debug_assert_eq!(chain, [0, 1, 3]);
    debug_assert_eq!(table.check(&slab), Ok(()));
}

#[test]
// Duplicates stay adjacent with and without group links
fn test_hashtable_1() {
    use self::fixture::*;
    use alloc::vec::Vec;

    for multikey in [false, true] {
        let slab = slab(&[3, 1, 3, 3, 1, 2]);
        let options = HashOptions::new()
            .power_of_two(true)
            .optimize_multikey(multikey);
        let mut buckets = [Bucket::new(); 4];
        let mut table = HashTable::new(&mut buckets, hook(), options, ByKey, identity, Natural).unwrap();

        debug_assert_eq!(table.extend_equal(&slab, 0..6), Ok(6));
        debug_assert_eq!(table.check(&slab), Ok(()));

        let threes: Vec<usize> = table.equal_range(&slab, &3).collect();
        debug_assert_eq!(threes, [0, 2, 3]);
        debug_assert_eq!(table.count(&slab, &1), 2);

        // Middle, then head of the run
        table.erase(&slab, 2).unwrap();
        debug_assert_eq!(table.check(&slab), Ok(()));
        table.erase(&slab, 0).unwrap();
        debug_assert_eq!(table.check(&slab), Ok(()));
        let threes: Vec<usize> = table.equal_range(&slab, &3).collect();
        debug_assert_eq!(threes, [3]);

        let mut disposed = Vec::new();
        debug_assert_eq!(table.remove_and_dispose(&slab, &1, |x| disposed.push(x)), 2);
        debug_assert_eq!(disposed, [1, 4]);
        debug_assert_eq!(table.len(&slab), 2);
        debug_assert_eq!(table.check(&slab), Ok(()));
    }
}

#[test]
// Growing and shrinking one bucket at a time
fn test_hashtable_2() {
    use self::fixture::*;
    use alloc::vec::Vec;

    let keys: Vec<u32> = (0..32).collect();
    let slab = slab(&keys);
    let options = HashOptions::new()
        .power_of_two(true)
        .incremental(true)
        .store_hash(true);

    let mut large = [Bucket::new(); 8];
    let mut small = [Bucket::new(); 4];
    let mut wrong = [Bucket::new(); 3];
    let mut table = HashTable::new(&mut large, hook(), options, ByKey, identity, Natural).unwrap();
    table.extend_unique(&slab, 0..32).unwrap();

    debug_assert_eq!(table.incremental_rehash(&slab, true), Ok(false));
    for _ in 0..4 {
        debug_assert_eq!(table.incremental_rehash(&slab, false), Ok(true));
        debug_assert_eq!(table.check(&slab), Ok(()));
    }
    debug_assert_eq!(table.split_count(), 4);
    debug_assert_eq!(table.bucket_size(&slab, 0), 8);
    debug_assert_eq!(table.incremental_rehash(&slab, false), Ok(false));

    let rejected = table.incremental_rehash_with(&mut wrong).unwrap_err();
    debug_assert_eq!(
        rejected.error,
        Error::BucketMismatch {
            current: 8,
            actual: 3
        }
    );
    debug_assert_eq!(rejected.buckets.len(), 3);

    // Switch down to the half-size array, then back up
    let large = table.incremental_rehash_with(&mut small).unwrap();
    debug_assert_eq!(table.bucket_count(), 4);
    debug_assert_eq!(table.check(&slab), Ok(()));

    let small = table.incremental_rehash_with(large).unwrap();
    debug_assert_eq!(small.len(), 4);
    debug_assert_eq!((table.bucket_count(), table.split_count()), (8, 4));

    for _ in 0..4 {
        debug_assert_eq!(table.incremental_rehash(&slab, true), Ok(true));
        debug_assert_eq!(table.check(&slab), Ok(()));
    }
    for b in 0..8 {
        debug_assert_eq!(table.bucket_size(&slab, b), 4);
    }
    debug_assert_eq!(table.find(&slab, &29), Some(29));
}

#[test]
// Rehashing into other arrays, folding in place, and counting by walking
fn test_hashtable_3() {
    use self::fixture::*;
    use alloc::vec::Vec;

    let keys: Vec<u32> = (1..=20).collect();
    let slab = slab(&keys);
    let options = HashOptions::new()
        .constant_time_size(false)
        .cache_begin(true)
        .store_hash(true);

    let mut first = [Bucket::new(); 6];
    let mut second = [Bucket::new(); 13];
    let mut table = HashTable::new(&mut first, hook(), options, ByKey, identity, Natural).unwrap();
    table.extend_unique(&slab, 0..20).unwrap();
    debug_assert_eq!(table.len(&slab), 20);

    let first = table.rehash(&slab, &mut second).unwrap();
    debug_assert_eq!(first.len(), 6);
    debug_assert_eq!(table.bucket_count(), 13);
    debug_assert_eq!(table.bucket_size(&slab, 0), 1);
    debug_assert_eq!(table.check(&slab), Ok(()));

    debug_assert_eq!(
        table.shrink_in_place(&slab, 5).unwrap_err(),
        Error::BucketMismatch {
            current: 13,
            actual: 5
        }
    );
    let rest = table.shrink_in_place(&slab, 1).unwrap();
    debug_assert_eq!(rest.len(), 12);
    debug_assert_eq!(table.bucket_size(&slab, 0), 20);
    debug_assert_eq!(table.check(&slab), Ok(()));

    table.full_rehash(&slab);
    debug_assert_eq!(table.check(&slab), Ok(()));

    let mut seen: Vec<u32> = table.iter(&slab).map(|x| slab[x].key).collect();
    seen.sort();
    debug_assert_eq!(seen, keys);

    table.clear(&slab);
    debug_assert!(table.is_empty());
    debug_assert_eq!(table.iter(&slab).next(), None);
    debug_assert_eq!(table.check(&slab), Ok(()));
}

#[test]
// Two-phase insertion, heterogeneous lookups and checked preconditions
fn test_hashtable_4() {
    use self::fixture::*;

    let slab = slab(&[5, 9, 12]);
    let options = HashOptions::new().store_hash(true).compare_hash(true);
    let mut buckets = [Bucket::new(); 5];
    let mut table = HashTable::new(&mut buckets, hook(), options, ByKey, identity, Natural).unwrap();
    table.insert_unique(&slab, 0).unwrap();

    let commit = match table.insert_unique_check(&slab, &9) {
        HashLookup::Vacant(commit) => commit,
        HashLookup::Occupied(_) => panic!("9 is not in the table yet"),
    };
    debug_assert_eq!(table.insert_unique_commit(&slab, 1, commit), Ok(1));

    // A u64 key hashes exactly as the u32 key does
    let wide = |k: &u64| *k as usize;
    let same = |a: &u64, b: &u32| *a == *b as u64;
    debug_assert_eq!(table.find_with(&slab, &9u64, &wide, same), Some(1));
    debug_assert_eq!(table.count_with(&slab, &5u64, &wide, same), 1);
    debug_assert_eq!(
        table.insert_unique_check_with(&slab, &5u64, &wide, same),
        HashLookup::Occupied(0)
    );

    let commit = match table.insert_unique_check(&slab, &12) {
        HashLookup::Vacant(commit) => commit,
        HashLookup::Occupied(_) => panic!("12 is not in the table yet"),
    };
    table.erase(&slab, 0).unwrap();
    debug_assert_eq!(
        table.insert_unique_commit(&slab, 2, commit),
        Err(Error::StaleCommit)
    );

    debug_assert_eq!(table.insert_equal(&slab, 1), Err(Error::AlreadyLinked(1)));
    debug_assert!(table.contains(&slab, &9));
    debug_assert!(!table.contains(&slab, &5));

    let mut small = [Bucket::new(); 0];
    let rejected = table.rehash(&slab, &mut small).unwrap_err();
    debug_assert_eq!(rejected.error, Error::EmptyBuckets);
    debug_assert_eq!(
        table.incremental_rehash(&slab, true),
        Err(Error::InvalidOptions("incremental rehash is disabled"))
    );

    let mut pow = [Bucket::new(); 6];
    let options = HashOptions::new().power_of_two(true);
    let rejected = HashTable::new(&mut pow, hook(), options, ByKey, identity, Natural).unwrap_err();
    debug_assert_eq!(rejected.error, Error::NotPowerOfTwo(6));
    debug_assert_eq!(table.check(&slab), Ok(()));
}

#[test]
// Copies by whole chains or by group, and unwinding after a failed clone
fn test_hashtable_5() {
    use self::fixture::*;
    use alloc::vec::Vec;

    let keys = [4, 8, 4, 15, 16, 23, 42, 8];
    let source_slab = slab(&keys);
    let options = HashOptions::new()
        .power_of_two(true)
        .store_hash(true)
        .optimize_multikey(true);

    let mut source_buckets = [Bucket::new(); 8];
    let mut source = HashTable::new(&mut source_buckets, hook(), options, ByKey, identity, Natural).unwrap();
    source.extend_equal(&source_slab, 0..keys.len()).unwrap();

    let copy = |entry: &Entry| -> Result<Entry, ()> {
        Ok(Entry {
            key: entry.key,
            hook: HashHook::new(),
        })
    };

    // Eight buckets fold onto two without hashing
    let mut slab = slab(&[0; 8]);
    let mut buckets = [Bucket::new(); 2];
    let mut table = HashTable::new(&mut buckets, hook(), options, ByKey, identity, Natural).unwrap();
    table.clone_from(&mut slab, &source, &source_slab, copy, |_| {}).unwrap();
    debug_assert_eq!(table.len(&slab), 8);
    debug_assert_eq!(table.count(&slab, &8), 2);
    debug_assert_eq!(table.bucket_size(&slab, 1), 2);
    debug_assert_eq!(table.check(&slab), Ok(()));

    // Three buckets cannot take whole chains, so groups are routed one by one
    let modulo = HashOptions::new().optimize_multikey(true);
    let mut odd = [Bucket::new(); 3];
    let mut other = HashTable::new(&mut odd, hook(), modulo, ByKey, identity, Natural).unwrap();
    let mut other_slab = fixture::slab(&[0; 8]);
    other.clone_from(&mut other_slab, &source, &source_slab, copy, |_| {}).unwrap();
    debug_assert_eq!(other.check(&other_slab), Ok(()));
    let fours: Vec<usize> = other.equal_range(&other_slab, &4).collect();
    debug_assert_eq!(fours, [0, 2]);

    // Fail on the third clone; the two before it are disposed
    let mut calls = 0;
    let failing = |entry: &Entry| -> Result<Entry, &'static str> {
        calls += 1;
        if calls == 3 {
            return Err("no room");
        }
        Ok(Entry {
            key: entry.key,
            hook: HashHook::new(),
        })
    };
    let mut disposed = Vec::new();
    let result = table.clone_from(&mut slab, &source, &source_slab, failing, |x| disposed.push(x));
    debug_assert!(matches!(result, Err(CloneError::Cloner("no room"))));
    debug_assert_eq!(disposed.len(), 10);
    debug_assert!(table.is_empty());
    debug_assert!(slab.iter().all(|entry| !entry.hook.is_linked()));
}

#[test]
// Random traffic against a counted reference
fn test_hashtable_6() {
    use self::fixture::*;
    use alloc::vec::Vec;
    use rand::prelude::*;

    let mut rng = SmallRng::seed_from_u64(7);
    let keys: Vec<u32> = (0..2000).map(|_| rng.random_range(0..300)).collect();
    let slab = slab(&keys);

    let options = HashOptions::new()
        .power_of_two(true)
        .cache_begin(true)
        .store_hash(true)
        .compare_hash(true)
        .optimize_multikey(true);
    let mut buckets = [Bucket::new(); 64];
    let mut table = HashTable::new(&mut buckets, hook(), options, ByKey, FxHashing::default(), Natural).unwrap();

    let mut counts = [0usize; 300];
    let mut linked = Vec::new();
    for x in 0..slab.len() {
        if !linked.is_empty() && rng.random_bool(0.3) {
            let i = rng.random_range(0..linked.len());
            let y = linked.swap_remove(i);
            table.erase(&slab, y).unwrap();
            counts[keys[y] as usize] -= 1;
        }

        table.insert_equal(&slab, x).unwrap();
        linked.push(x);
        counts[keys[x] as usize] += 1;
    }

    debug_assert_eq!(table.check(&slab), Ok(()));
    debug_assert_eq!(table.len(&slab), linked.len());
    for key in 0..300u32 {
        debug_assert_eq!(table.count(&slab, &key), counts[key as usize]);
    }
}

#[test]
// A token only commits a value whose key hashes as the checked key did
fn test_hashtable_7() {
    use self::fixture::*;

    let slab = slab(&[5, 9, 12]);
    let options = HashOptions::new().store_hash(true).compare_hash(true);
    let mut buckets = [Bucket::new(); 5];
    let mut table = HashTable::new(&mut buckets, hook(), options, ByKey, identity, Natural).unwrap();
    table.insert_unique(&slab, 0).unwrap();

    let commit = match table.insert_unique_check(&slab, &9) {
        HashLookup::Vacant(commit) => commit,
        HashLookup::Occupied(_) => panic!("9 is not in the table yet"),
    };
    debug_assert_eq!(table.insert_unique_commit(&slab, 2, commit), Err(Error::StaleCommit));
    debug_assert!(!slab[2].hook.is_linked());
    debug_assert_eq!(table.len(&slab), 1);
    debug_assert_eq!(table.find(&slab, &12), None);

    // A refused commit leaves the table as it was, so a fresh token still links 9
    let commit = match table.insert_unique_check(&slab, &9) {
        HashLookup::Vacant(commit) => commit,
        HashLookup::Occupied(_) => panic!("9 is not in the table yet"),
    };
    debug_assert_eq!(table.insert_unique_commit(&slab, 1, commit), Ok(1));
    debug_assert_eq!(table.find(&slab, &9), Some(1));
    debug_assert_eq!(table.check(&slab), Ok(()));
}

#[test]
// Switching the bucket array of an empty table keeps the cached first bucket in range
fn test_hashtable_8() {
    use self::fixture::*;
    use alloc::vec::Vec;

    let slab = slab(&[3, 6]);
    let options = HashOptions::new()
        .power_of_two(true)
        .incremental(true)
        .cache_begin(true)
        .constant_time_size(false);
    let mut four = [Bucket::new(); 4];
    let mut eight = [Bucket::new(); 8];
    let mut table = HashTable::new(&mut four, hook(), options, ByKey, identity, Natural).unwrap();

    let old = table.incremental_rehash_with(&mut eight).unwrap();
    debug_assert_eq!(old.len(), 4);
    debug_assert!(table.is_empty());
    debug_assert_eq!(table.check(&slab), Ok(()));
    debug_assert_eq!(table.iter(&slab).next(), None);

    table.insert_unique(&slab, 1).unwrap();
    debug_assert!(!table.is_empty());
    debug_assert_eq!(table.iter(&slab).collect::<Vec<_>>(), [1]);
    debug_assert_eq!(table.check(&slab), Ok(()));
}
