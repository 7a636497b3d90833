mod common;

use common::{hash_hook, identity, init_tracing, items, ByKey, Item};
use compact_str::CompactString;
use copse::{
    functor::KeyHash, Bucket, CloneError, Error, FxHashing, HashHook, HashOptions, HashTable, Hook,
    Natural, UnorderedMultiSet,
};
use rand::{prelude::*, rngs::SmallRng};
use rstest::rstest;

type Table<'b, H> = HashTable<'b, Item, ByKey, H, Natural>;

fn table<H: KeyHash<u32>>(buckets: &mut [Bucket], options: HashOptions, hasher: H) -> Table<'_, H> {
    match HashTable::new(buckets, hash_hook(), options, ByKey, hasher, Natural) {
        Ok(table) => table,
        Err(rejected) => panic!("bucket array rejected: {}", rejected.error),
    }
}

fn switch<'b, H>(table: &mut Table<'b, H>, buckets: &'b mut [Bucket]) -> &'b mut [Bucket]
where
    H: KeyHash<u32>,
{
    match table.incremental_rehash_with(buckets) {
        Ok(old) => old,
        Err(rejected) => panic!("bucket array rejected: {}", rejected.error),
    }
}

/// Every linked slot is found by its key and sits in the bucket its key routes to
fn assert_reachable<H: KeyHash<u32>>(table: &Table<'_, H>, slab: &[Item], linked: usize) {
    for (x, item) in slab.iter().enumerate().take(linked) {
        assert!(table.equal_range(slab, &item.key).any(|y| y == x), "slot {x} lost");
        let b = table.bucket_of(&item.key);
        assert!(b < table.split_count());
        assert!(table.iter_bucket(slab, b).any(|y| y == x), "slot {x} misrouted");
    }
    assert_eq!(table.len(slab), linked);
    assert_eq!(table.check(slab), Ok(()));
}

//-----------------------------------------------------------------------------------------------//

#[rstest]
#[case::plain(HashOptions::new())]
#[case::stored_hash(HashOptions::new().store_hash(true).compare_hash(true))]
#[case::cached_begin(HashOptions::new().cache_begin(true).constant_time_size(false))]
#[case::multikey(HashOptions::new().optimize_multikey(true))]
#[case::everything(
    HashOptions::new()
        .store_hash(true)
        .compare_hash(true)
        .cache_begin(true)
        .optimize_multikey(true)
)]
fn colliding_keys_share_a_bucket(#[case] options: HashOptions) {
    init_tracing();
    let slab = items(&[0, 7, 14, 21]);
    let mut buckets = [Bucket::new(); 7];
    let mut table = table(&mut buckets, options, identity as fn(&u32) -> usize);

    assert_eq!(table.extend_unique(&slab, 0..4), Ok(4));
    assert_eq!(table.bucket_size(&slab, 0), 4);
    assert!((1..7).all(|b| table.bucket_size(&slab, b) == 0));
    for (x, item) in slab.iter().enumerate() {
        assert_eq!(table.find(&slab, &item.key), Some(x));
    }

    assert_eq!(table.erase(&slab, 1), Ok(()));
    assert_eq!(table.find(&slab, &7), None);
    assert_eq!(table.bucket_size(&slab, 0), 3);
    assert_eq!(table.len(&slab), 3);
    assert_eq!(table.erase(&slab, 1), Err(Error::NotLinked(1)));
    assert_eq!(table.check(&slab), Ok(()));

    let mut left: Vec<usize> = table.iter(&slab).collect();
    left.sort_unstable();
    assert_eq!(left, [0, 2, 3]);
}

#[rstest]
fn incremental_growth_keeps_keys_reachable(
    #[values(false, true)] multikey: bool,
    #[values(3, 11)] seed: u64,
) {
    init_tracing();
    let mut rng = SmallRng::seed_from_u64(seed);
    let keys: Vec<u32> = (0..300).map(|_| rng.random_range(0..150)).collect();
    let slab = items(&keys);

    let options = HashOptions::new()
        .power_of_two(true)
        .incremental(true)
        .store_hash(true)
        .optimize_multikey(multikey);
    let mut small = [Bucket::new(); 8];
    let mut medium = [Bucket::new(); 16];
    let mut large = [Bucket::new(); 32];
    let mut table = table(&mut small, options, FxHashing::default());

    let mut linked = 0;
    while linked < 100 {
        assert!(table.insert_equal(&slab, linked).is_ok());
        linked += 1;
    }
    assert_reachable(&table, &slab, linked);

    // A full array has nothing left to split
    assert_eq!(table.incremental_rehash(&slab, true), Ok(false));
    let small = switch(&mut table, &mut medium);
    assert_eq!(small.len(), 8);
    assert_eq!(table.split_count(), 8);

    while table.incremental_rehash(&slab, true) == Ok(true) {
        assert!(table.insert_equal(&slab, linked).is_ok());
        linked += 1;
        assert_reachable(&table, &slab, linked);
        if table.split_count() == 12 {
            break;
        }
    }

    // Half way through, a larger array does not fit yet
    let rejected = match table.incremental_rehash_with(&mut large) {
        Ok(_) => panic!("switched in the middle of a split"),
        Err(rejected) => rejected,
    };
    assert_eq!(
        rejected.error,
        Error::BucketMismatch {
            current: 16,
            actual: 32
        }
    );
    let large = rejected.buckets;
    assert_eq!(large.len(), 32);

    while table.incremental_rehash(&slab, true) == Ok(true) {
        assert!(table.insert_equal(&slab, linked).is_ok());
        linked += 1;
        assert_reachable(&table, &slab, linked);
    }
    assert_eq!(table.split_count(), 16);

    let medium = switch(&mut table, large);
    while table.incremental_rehash(&slab, true) == Ok(true) {
        assert!(table.insert_equal(&slab, linked).is_ok());
        linked += 1;
    }
    assert_reachable(&table, &slab, linked);
    while linked < slab.len() {
        assert!(table.insert_equal(&slab, linked).is_ok());
        linked += 1;
    }
    assert_reachable(&table, &slab, linked);

    // Merge back down to half of the large array, then hand the medium one back
    while table.incremental_rehash(&slab, false) == Ok(true) {}
    assert_eq!(table.split_count(), 16);
    assert_reachable(&table, &slab, linked);
    let large = switch(&mut table, medium);
    assert_eq!(large.len(), 32);
    assert_eq!(table.bucket_count(), 16);
    assert_reachable(&table, &slab, linked);
}

#[rstest]
fn removing_a_key_disposes_its_run_once(
    #[values(false, true)] multikey: bool,
    #[values(false, true)] store_hash: bool,
) {
    init_tracing();
    let keys: Vec<u32> = (0..50).map(|i| i % 10).collect();
    let slab = items(&keys);
    let options = HashOptions::new()
        .store_hash(store_hash)
        .optimize_multikey(multikey);
    let mut buckets = [Bucket::new(); 4];
    let mut table = table(&mut buckets, options, FxHashing::default());
    assert_eq!(table.extend_equal(&slab, 0..slab.len()), Ok(50));

    for key in 0..10 {
        let mut run: Vec<usize> = table.equal_range(&slab, &key).collect();
        run.sort_unstable();
        let expected: Vec<usize> = (0..5).map(|i| key as usize + 10 * i).collect();
        assert_eq!(run, expected);
    }

    // Unlinking from the middle of a run keeps the rest together
    assert_eq!(table.erase(&slab, 24), Ok(()));
    assert_eq!(table.count(&slab, &4), 4);
    assert_eq!(table.check(&slab), Ok(()));

    let mut disposed = Vec::new();
    assert_eq!(table.remove_and_dispose(&slab, &3, |x| disposed.push(x)), 5);
    disposed.sort_unstable();
    assert_eq!(disposed, [3, 13, 23, 33, 43]);
    assert!(disposed.iter().all(|&x| !slab[x].hash.is_linked()));
    assert_eq!(table.count(&slab, &3), 0);
    assert_eq!(table.remove(&slab, &3), 0);
    assert_eq!(table.len(&slab), 44);
    assert_eq!(table.check(&slab), Ok(()));
}

#[rstest]
fn empty_table_switches_arrays(
    #[values(false, true)] cache_begin: bool,
    #[values(false, true)] constant_time_size: bool,
) {
    init_tracing();
    let slab = items(&[3, 6, 11]);
    let options = HashOptions::new()
        .power_of_two(true)
        .incremental(true)
        .cache_begin(cache_begin)
        .constant_time_size(constant_time_size);
    let mut four = [Bucket::new(); 4];
    let mut eight = [Bucket::new(); 8];
    let mut table = table(&mut four, options, identity as fn(&u32) -> usize);

    let four = switch(&mut table, &mut eight);
    assert_eq!(four.len(), 4);
    assert!(table.is_empty());
    assert_eq!(table.iter(&slab).next(), None);
    assert_eq!(table.check(&slab), Ok(()));

    assert_eq!(table.extend_unique(&slab, 0..3), Ok(3));
    assert!(!table.is_empty());
    assert_reachable(&table, &slab, 3);

    // Emptied again, then back down to the small array
    assert_eq!(table.remove(&slab, &3) + table.remove(&slab, &6) + table.remove(&slab, &11), 3);
    assert!(table.is_empty());
    while table.incremental_rehash(&slab, false) == Ok(true) {}
    let eight = switch(&mut table, four);
    assert_eq!(eight.len(), 8);
    assert!(table.is_empty());
    assert_eq!(table.iter(&slab).next(), None);
    assert_eq!(table.check(&slab), Ok(()));
}

#[test]
fn clone_into_fewer_buckets() {
    init_tracing();
    let keys: Vec<u32> = (0..64).map(|i| (i * 7) % 40).collect();
    let source_slab = items(&keys);
    let options = HashOptions::new()
        .power_of_two(true)
        .store_hash(true)
        .optimize_multikey(true);

    let mut source_buckets = [Bucket::new(); 16];
    let mut source = table(&mut source_buckets, options, FxHashing::default());
    assert_eq!(source.extend_equal(&source_slab, 0..64), Ok(64));

    let mut slab: Vec<Item> = (0..64).map(|_| Item::default()).collect();
    let mut buckets = [Bucket::new(); 4];
    let mut copy = table(&mut buckets, options, FxHashing::default());
    let cloned = copy.clone_from(
        &mut slab,
        &source,
        &source_slab,
        |item| Ok::<Item, ()>(Item::new(item.key)),
        |_| {},
    );
    assert_eq!(cloned, Ok(()));
    assert_eq!(copy.check(&slab), Ok(()));
    assert_eq!(copy.len(&slab), 64);
    for key in 0..40 {
        assert_eq!(copy.count(&slab, &key), source.count(&source_slab, &key));
    }

    // The source is untouched by changes to the copy
    assert_eq!(copy.remove(&slab, &keys[0]), source.count(&source_slab, &keys[0]));
    assert_eq!(source.len(&source_slab), 64);
    assert_eq!(source.check(&source_slab), Ok(()));

    let failed = copy.clone_from(
        &mut slab,
        &source,
        &source_slab,
        |item| if item.key == 39 { Err(item.key) } else { Ok(Item::new(item.key)) },
        |_| {},
    );
    assert_eq!(failed, Err(CloneError::Cloner(39)));
    assert!(copy.is_empty());
    assert!(slab.iter().all(|item| !item.hash.is_linked()));
}

//-----------------------------------------------------------------------------------------------//

struct Word {
    text: CompactString,
    hook: HashHook,
}

fn text(word: &Word) -> &str {
    &word.text
}

#[test]
fn word_counts_in_a_multiset() {
    init_tracing();
    let slab: Vec<Word> = "the cat and the dog and the bird"
        .split(' ')
        .map(|w| Word {
            text: CompactString::from(w),
            hook: HashHook::new(),
        })
        .collect();
    let key_of: fn(&Word) -> &str = text;
    let mut buckets = [Bucket::new(); 8];
    let mut words = match UnorderedMultiSet::new(
        &slab,
        &mut buckets,
        Hook::new(|w: &Word| &w.hook),
        HashOptions::new().power_of_two(true).optimize_multikey(true),
        key_of,
        FxHashing::default(),
        Natural,
    ) {
        Ok(words) => words,
        Err(rejected) => panic!("bucket array rejected: {}", rejected.error),
    };

    assert_eq!(words.extend(0..slab.len()), Ok(8));
    assert_eq!(words.count("the"), 3);
    assert_eq!(words.count("and"), 2);
    assert_eq!(words.count("fish"), 0);
    assert_eq!(words.equal_range("the").len(), 3);
    assert!(words.equal_range("and").all(|w| w.text == "and"));

    assert_eq!(words.remove("the"), 3);
    assert_eq!(words.len(), 5);
    assert!(!words.contains("the"));
    assert_eq!(words.check(), Ok(()));
}
