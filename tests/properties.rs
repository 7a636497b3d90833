#[macro_use]
mod common;

use std::collections::{BTreeMap, BTreeSet};

use common::{by_priority, hash_hook, tree_hook, ByKey, Item, Strategy};
use copse::{
    tree::{Balance, BsTree},
    Bucket, Error, FxHashing, HashOptions, HashTable, Natural,
};
use proptest::{prelude::*, strategy::Strategy as _};

const SLOTS: usize = 160;
const KEYS: u32 = 20;

const STRATEGIES: [Strategy; 5] = [
    Strategy::RedBlack,
    Strategy::Avl,
    Strategy::Scapegoat,
    Strategy::Splay,
    Strategy::Treap,
];

/// Slot `x` holds key `x % KEYS`, so every key is shared by several slots
fn slab() -> Vec<Item> {
    (0..SLOTS).map(|x| Item::new(x as u32 % KEYS)).collect()
}

#[derive(Clone, Copy, Debug)]
enum Op {
    Link(usize),
    LinkUnique(usize),
    Unlink(usize),
    Count(u32),
    Remove(u32),
    Split,
    Merge,
}

fn tree_ops() -> impl proptest::strategy::Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        40 => (0..SLOTS).prop_map(Op::Link),
        10 => (0..SLOTS).prop_map(Op::LinkUnique),
        30 => (0..SLOTS).prop_map(Op::Unlink),
        15 => (0..KEYS).prop_map(Op::Count),
        5 => (0..KEYS).prop_map(Op::Remove),
    ];
    prop::collection::vec(op, 0..=300)
}

fn table_ops() -> impl proptest::strategy::Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        40 => (0..SLOTS).prop_map(Op::Link),
        10 => (0..SLOTS).prop_map(Op::LinkUnique),
        25 => (0..SLOTS).prop_map(Op::Unlink),
        10 => (0..KEYS).prop_map(Op::Count),
        3 => (0..KEYS).prop_map(Op::Remove),
        8 => Just(Op::Split),
        4 => Just(Op::Merge),
    ];
    prop::collection::vec(op, 0..=300)
}

/// The linked slots of each key
#[derive(Default)]
struct Model {
    runs: BTreeMap<u32, BTreeSet<usize>>,
    len: usize,
}

impl Model {
    fn holds(&self, key: u32, x: usize) -> bool {
        self.runs.get(&key).is_some_and(|run| run.contains(&x))
    }

    fn run(&self, key: u32) -> BTreeSet<usize> {
        self.runs.get(&key).cloned().unwrap_or_default()
    }

    fn link(&mut self, key: u32, x: usize) {
        if self.runs.entry(key).or_default().insert(x) {
            self.len += 1;
        }
    }

    fn unlink(&mut self, key: u32, x: usize) {
        if self.runs.get_mut(&key).is_some_and(|run| run.remove(&x)) {
            self.len -= 1;
        }
    }

    fn remove(&mut self, key: u32) -> BTreeSet<usize> {
        let run = self.runs.remove(&key).unwrap_or_default();
        self.len -= run.len();
        run
    }

    fn sorted_keys(&self) -> Vec<u32> {
        self.runs
            .iter()
            .flat_map(|(&key, run)| std::iter::repeat(key).take(run.len()))
            .collect()
    }
}

fn fail(error: Error) -> TestCaseError {
    TestCaseError::fail(error.to_string())
}

//-----------------------------------------------------------------------------------------------//

fn run_tree_ops<A: Balance<Item>>(balance: A, ops: &[Op]) -> Result<(), TestCaseError> {
    let slab = slab();
    let mut tree = BsTree::new(tree_hook(), balance, ByKey, Natural);
    let mut model = Model::default();

    for &op in ops {
        match op {
            Op::Link(x) => {
                let key = slab[x].key;
                if model.holds(key, x) {
                    prop_assert_eq!(tree.insert_equal(&slab, x), Err(Error::AlreadyLinked(x)));
                } else {
                    prop_assert_eq!(tree.insert_equal(&slab, x), Ok(x));
                    model.link(key, x);
                }
            }
            Op::LinkUnique(x) => {
                let key = slab[x].key;
                let result = tree.insert_unique(&slab, x);
                if model.holds(key, x) {
                    prop_assert_eq!(result, Err(Error::AlreadyLinked(x)));
                } else if let Ok((y, false)) = result {
                    prop_assert!(model.holds(key, y));
                } else {
                    prop_assert_eq!(result, Ok((x, true)));
                    prop_assert_eq!(model.run(key).len(), 0);
                    model.link(key, x);
                }
            }
            Op::Unlink(x) => {
                let key = slab[x].key;
                if model.holds(key, x) {
                    prop_assert!(tree.erase(&slab, x).is_ok());
                    model.unlink(key, x);
                } else {
                    prop_assert_eq!(tree.erase(&slab, x), Err(Error::NotLinked(x)));
                }
            }
            Op::Count(key) => {
                prop_assert_eq!(tree.count(&slab, &key), model.run(key).len());
                let run: BTreeSet<usize> = tree.equal_range(&slab, &key).collect();
                prop_assert_eq!(run, model.run(key));
            }
            Op::Remove(key) => {
                let mut disposed = BTreeSet::new();
                let count = tree.remove_and_dispose(&slab, &key, |x| {
                    disposed.insert(x);
                });
                let run = model.remove(key);
                prop_assert_eq!(count, run.len());
                prop_assert_eq!(disposed, run);
            }
            Op::Split | Op::Merge => {}
        }

        prop_assert_eq!(tree.len(), model.len);
        tree.check(&slab).map_err(fail)?;
    }

    let keys: Vec<u32> = tree.iter(&slab).map(|x| slab[x].key).collect();
    prop_assert_eq!(keys, model.sorted_keys());
    Ok(())
}

fn run_table_ops(options: HashOptions, ops: &[Op]) -> Result<(), TestCaseError> {
    let slab = slab();
    let mut two = [Bucket::new(); 2];
    let mut four = [Bucket::new(); 4];
    let mut eight = [Bucket::new(); 8];
    let mut sixteen = [Bucket::new(); 16];
    let mut spare: Vec<&mut [Bucket]> = vec![&mut two[..], &mut eight[..], &mut sixteen[..]];

    let hasher = FxHashing::default();
    let mut table = HashTable::new(&mut four, hash_hook(), options, ByKey, hasher, Natural)
        .map_err(|rejected| fail(rejected.error))?;
    let mut model = Model::default();

    for &op in ops {
        match op {
            Op::Link(x) => {
                let key = slab[x].key;
                if model.holds(key, x) {
                    prop_assert_eq!(table.insert_equal(&slab, x), Err(Error::AlreadyLinked(x)));
                } else {
                    prop_assert_eq!(table.insert_equal(&slab, x), Ok(x));
                    model.link(key, x);
                }
            }
            Op::LinkUnique(x) => {
                let key = slab[x].key;
                let result = table.insert_unique(&slab, x);
                if model.holds(key, x) {
                    prop_assert_eq!(result, Err(Error::AlreadyLinked(x)));
                } else if let Ok((y, false)) = result {
                    prop_assert!(model.holds(key, y));
                } else {
                    prop_assert_eq!(result, Ok((x, true)));
                    prop_assert_eq!(model.run(key).len(), 0);
                    model.link(key, x);
                }
            }
            Op::Unlink(x) => {
                let key = slab[x].key;
                if model.holds(key, x) {
                    prop_assert_eq!(table.erase(&slab, x), Ok(()));
                    model.unlink(key, x);
                } else {
                    prop_assert_eq!(table.erase(&slab, x), Err(Error::NotLinked(x)));
                }
            }
            Op::Count(key) => {
                prop_assert_eq!(table.count(&slab, &key), model.run(key).len());
                prop_assert_eq!(table.contains(&slab, &key), !model.run(key).is_empty());
                let run: BTreeSet<usize> = table.equal_range(&slab, &key).collect();
                prop_assert_eq!(run, model.run(key));
            }
            Op::Remove(key) => {
                let mut disposed = BTreeSet::new();
                let count = table.remove_and_dispose(&slab, &key, |x| {
                    disposed.insert(x);
                });
                let run = model.remove(key);
                prop_assert_eq!(count, run.len());
                prop_assert_eq!(disposed, run);
            }
            Op::Split => {
                if !table.incremental_rehash(&slab, true).map_err(fail)? {
                    let wanted = table.bucket_count() * 2;
                    if let Some(i) = spare.iter().position(|b| b.len() == wanted) {
                        let buckets = spare.swap_remove(i);
                        let old = table
                            .incremental_rehash_with(buckets)
                            .map_err(|rejected| fail(rejected.error))?;
                        spare.push(old);
                    }
                }
            }
            Op::Merge => {
                if !table.incremental_rehash(&slab, false).map_err(fail)? {
                    let wanted = table.bucket_count() / 2;
                    if let Some(i) = spare.iter().position(|b| b.len() == wanted) {
                        let buckets = spare.swap_remove(i);
                        let old = table
                            .incremental_rehash_with(buckets)
                            .map_err(|rejected| fail(rejected.error))?;
                        spare.push(old);
                    }
                }
            }
        }

        prop_assert_eq!(table.len(&slab), model.len);
        table.check(&slab).map_err(fail)?;
    }

    let mut keys: Vec<u32> = table.iter(&slab).map(|x| slab[x].key).collect();
    keys.sort_unstable();
    prop_assert_eq!(keys, model.sorted_keys());
    Ok(())
}

//-----------------------------------------------------------------------------------------------//

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        max_shrink_iters: 10_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_trees_match_model(ops in tree_ops()) {
        for strategy in STRATEGIES {
            with_balance!(strategy, |balance| run_tree_ops(balance, &ops))?;
        }
    }

    #[test]
    fn prop_incremental_tables_match_model(ops in table_ops()) {
        let incremental = HashOptions::new().power_of_two(true).incremental(true);
        for options in [
            incremental,
            incremental.optimize_multikey(true),
            incremental.store_hash(true).compare_hash(true),
            incremental
                .store_hash(true)
                .optimize_multikey(true)
                .cache_begin(true)
                .constant_time_size(false),
        ] {
            run_table_ops(options, &ops)?;
        }
    }
}
