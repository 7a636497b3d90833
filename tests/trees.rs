#[macro_use]
mod common;

use common::{by_priority, init_tracing, items, tree_hook, ByKey, Item, Strategy};
use copse::{
    tree::{Balance, BsTree},
    CloneError, Error, Natural, RbSet, Scapegoat, SgSet, Splay, SplaySet,
};
use rand::{prelude::*, rngs::SmallRng};
use rstest::rstest;

type Tree<A> = BsTree<Item, A, ByKey, Natural>;

fn tree<A: Balance<Item>>(balance: A) -> Tree<A> {
    BsTree::new(tree_hook(), balance, ByKey, Natural)
}

fn keys<A: Balance<Item>>(tree: &Tree<A>, slab: &[Item]) -> Vec<u32> {
    tree.iter(slab).map(|x| slab[x].key).collect()
}

#[derive(Clone, Copy, Debug)]
enum Order {
    Ascending,
    Descending,
    Shuffled,
}

fn slots(order: Order, count: usize, seed: u64) -> Vec<usize> {
    let mut slots: Vec<usize> = (0..count).collect();
    match order {
        Order::Ascending => {}
        Order::Descending => slots.reverse(),
        Order::Shuffled => slots.shuffle(&mut SmallRng::seed_from_u64(seed)),
    }
    slots
}

//-----------------------------------------------------------------------------------------------//

fn sorts_seven_keys<A: Balance<Item>>(balance: A) {
    let slab = items(&[5, 3, 8, 1, 4, 7, 9]);
    let mut tree = tree(balance);

    assert_eq!(tree.extend_unique(&slab, 0..slab.len()), Ok(7));
    assert_eq!(keys(&tree, &slab), [1, 3, 4, 5, 7, 8, 9]);
    assert_eq!(tree.len(), 7);
    assert_eq!(tree.check(&slab), Ok(()));

    assert_eq!(tree.find(&slab, &4), Some(4));
    assert_eq!(tree.lower_bound(&slab, &6).map(|x| slab[x].key), Some(7));
    assert_eq!(tree.upper_bound(&slab, &9), None);
    assert_eq!(tree.insert_unique(&slab, 0), Err(Error::AlreadyLinked(0)));
    assert_eq!(tree.check(&slab), Ok(()));
}

#[rstest]
#[case::red_black(Strategy::RedBlack)]
#[case::avl(Strategy::Avl)]
#[case::scapegoat(Strategy::Scapegoat)]
#[case::splay(Strategy::Splay)]
#[case::treap(Strategy::Treap)]
fn traversal_is_sorted(#[case] strategy: Strategy) {
    init_tracing();
    with_balance!(strategy, |balance| sorts_seven_keys(balance));
}

//-----------------------------------------------------------------------------------------------//

fn insert_then_erase<A: Balance<Item>>(balance: A, order: Order) {
    const COUNT: usize = 400;
    let slab = items(&(0..COUNT as u32).collect::<Vec<_>>());
    let mut tree = tree(balance);

    for (i, x) in slots(order, COUNT, 1).into_iter().enumerate() {
        assert_eq!(tree.insert_unique(&slab, x), Ok((x, true)));
        if i % 50 == 0 {
            assert_eq!(tree.check(&slab), Ok(()));
        }
    }
    assert_eq!(tree.check(&slab), Ok(()));
    assert_eq!(keys(&tree, &slab), (0..COUNT as u32).collect::<Vec<_>>());

    for (i, x) in slots(Order::Shuffled, COUNT, 2).into_iter().enumerate() {
        assert!(tree.erase(&slab, x).is_ok());
        assert!(!slab[x].tree.is_linked());
        if i % 50 == 0 {
            assert_eq!(tree.check(&slab), Ok(()));
        }
    }
    assert_eq!(tree.check(&slab), Ok(()));
    assert!(tree.is_empty());
    assert_eq!(tree.iter(&slab).next(), None);
    assert!(slab.iter().all(|item| !item.tree.is_linked()));
}

#[rstest]
fn round_trip_leaves_nothing_linked(
    #[values(
        Strategy::RedBlack,
        Strategy::Avl,
        Strategy::Scapegoat,
        Strategy::Splay,
        Strategy::Treap
    )]
    strategy: Strategy,
    #[values(Order::Ascending, Order::Descending, Order::Shuffled)] order: Order,
) {
    init_tracing();
    with_balance!(strategy, |balance| insert_then_erase(balance, order));
}

//-----------------------------------------------------------------------------------------------//

fn clone_is_independent<A: Balance<Item> + Clone>(balance: A, spare: A) {
    let mut rng = SmallRng::seed_from_u64(7);
    let source_keys: Vec<u32> = (0..120).map(|_| rng.random_range(0..60)).collect();
    let source_slab = items(&source_keys);
    let mut source = tree(balance);
    assert_eq!(source.extend_equal(&source_slab, 0..source_slab.len()), Ok(120));

    let mut slab: Vec<Item> = (0..source_slab.len()).map(|_| Item::default()).collect();
    let mut copy = tree(spare);
    let cloned = copy.clone_from(
        &mut slab,
        &source,
        &source_slab,
        |item| Ok::<Item, ()>(Item::new(item.key)),
        |_| {},
    );
    assert_eq!(cloned, Ok(()));
    assert_eq!(copy.check(&slab), Ok(()));
    assert_eq!(keys(&copy, &slab), keys(&source, &source_slab));
    assert_eq!(copy.height(&slab), source.height(&source_slab));

    // Changing the copy leaves the source alone
    let before = keys(&source, &source_slab);
    let erased = copy.remove(&slab, &source_keys[0]);
    assert!(erased > 0);
    assert_eq!(copy.len(), source.len() - erased);
    assert_eq!(keys(&source, &source_slab), before);
    assert_eq!(source.check(&source_slab), Ok(()));
    assert_eq!(copy.check(&slab), Ok(()));
}

#[rstest]
#[case::red_black(Strategy::RedBlack)]
#[case::avl(Strategy::Avl)]
#[case::scapegoat(Strategy::Scapegoat)]
#[case::splay(Strategy::Splay)]
#[case::treap(Strategy::Treap)]
fn clone_preserves_shape(#[case] strategy: Strategy) {
    init_tracing();
    with_balance!(strategy, |balance| clone_is_independent(balance.clone(), balance));
}

#[test]
fn failed_clone_disposes_partial_copy() {
    init_tracing();
    let source_slab = items(&[10, 20, 30, 40, 50]);
    let mut source = tree(copse::RedBlack);
    assert_eq!(source.extend_unique(&source_slab, 0..5), Ok(5));

    let mut slab: Vec<Item> = (0..5).map(|_| Item::default()).collect();
    let mut copy = tree(copse::RedBlack);
    let mut disposed = Vec::new();
    let cloned = copy.clone_from(
        &mut slab,
        &source,
        &source_slab,
        |item| {
            if item.key == 40 {
                Err("refused")
            } else {
                Ok(Item::new(item.key))
            }
        },
        |x| disposed.push(x),
    );

    assert_eq!(cloned, Err(CloneError::Cloner("refused")));
    assert_eq!(disposed, [0, 1, 2]);
    assert!(copy.is_empty());
    assert!(slab.iter().all(|item| !item.tree.is_linked()));
}

//-----------------------------------------------------------------------------------------------//

#[test]
fn scapegoat_height_stays_logarithmic() {
    init_tracing();
    let slab = items(&(1..=100).collect::<Vec<_>>());
    let balance = Scapegoat::with_balance_factor(0.57);
    assert!(balance.is_ok());
    let mut tree = tree(balance.unwrap_or_default());

    for x in 0..slab.len() {
        assert_eq!(tree.insert_unique(&slab, x), Ok((x, true)));
        assert_eq!(tree.check(&slab), Ok(()));
    }

    // floor(log(100) / log(1 / 0.57)) == 8
    assert!(tree.height(&slab) <= 8);
    assert_eq!(keys(&tree, &slab), (1..=100).collect::<Vec<_>>());
    assert_eq!(Scapegoat::with_balance_factor(0.5).err(), Some(Error::BalanceFactor(0.5)));
    assert_eq!(Scapegoat::with_balance_factor(1.0).err(), Some(Error::BalanceFactor(1.0)));
}

#[test]
fn one_value_in_a_tree_and_a_table() {
    init_tracing();
    let slab = items(&[3, 1, 2]);
    let mut buckets = [copse::Bucket::new(); 4];
    let mut table = match copse::HashTable::new(
        &mut buckets,
        common::hash_hook(),
        copse::HashOptions::new(),
        ByKey,
        common::identity as fn(&u32) -> usize,
        Natural,
    ) {
        Ok(table) => table,
        Err(rejected) => panic!("{:?}", rejected.error),
    };
    let mut tree = tree(copse::Avl);

    assert_eq!(tree.extend_unique(&slab, 0..3), Ok(3));
    assert_eq!(table.extend_unique(&slab, 0..3), Ok(3));
    assert_eq!(keys(&tree, &slab), [1, 2, 3]);

    assert!(tree.erase(&slab, 1).is_ok());
    assert_eq!(table.find(&slab, &1), Some(1));
    assert!(slab[1].hash.is_linked());
    assert!(!slab[1].tree.is_linked());
    assert_eq!(table.check(&slab), Ok(()));
    assert_eq!(tree.check(&slab), Ok(()));
}

#[test]
fn treap_keeps_heap_order() {
    let slab = items(&(0..64).collect::<Vec<_>>());
    let mut tree = tree(copse::Treap::new(by_priority as fn(&Item, &Item) -> std::cmp::Ordering));
    assert_eq!(tree.extend_unique(&slab, 0..64), Ok(64));
    assert_eq!(tree.check(&slab), Ok(()));

    let top = tree.top().map(|x| slab[x].key);
    let highest = slab.iter().max_by(|a, b| by_priority(a, b)).map(|item| item.key);
    assert_eq!(top, highest);
}

//-----------------------------------------------------------------------------------------------//

#[test]
fn splay_vine_measures_and_rebalances() {
    init_tracing();
    const COUNT: usize = 5_000;
    let slab = items(&(0..COUNT as u32).collect::<Vec<_>>());
    let mut set = SplaySet::new(&slab, tree_hook(), Splay, ByKey, Natural);

    // Ascending inserts leave a single path from the root
    assert_eq!(set.extend(0..COUNT), Ok(COUNT));
    assert_eq!(set.tree().height(&slab), COUNT - 1);
    assert_eq!(set.check(), Ok(()));

    set.rebalance();
    // floor(log2(5000)) == 12
    assert_eq!(set.tree().height(&slab), 12);
    assert_eq!(set.len(), COUNT);
    assert_eq!(set.check(), Ok(()));
    assert!(set.iter().map(|item| item.key).eq(0..COUNT as u32));
}

#[test]
fn loose_scapegoat_set_rebalances_on_demand() {
    init_tracing();
    let slab = items(&(0..200).collect::<Vec<_>>());
    let balance = Scapegoat::with_balance_factor(0.99);
    assert!(balance.is_ok());
    let mut set = SgSet::new(&slab, tree_hook(), balance.unwrap_or_default(), ByKey, Natural);

    // A factor this close to 1 tolerates a path through every value
    assert_eq!(set.extend(0..200), Ok(200));
    assert_eq!(set.tree().height(&slab), 199);
    assert_eq!(set.check(), Ok(()));

    set.rebalance();
    // floor(log2(200)) == 7
    assert_eq!(set.tree().height(&slab), 7);
    assert_eq!(set.check(), Ok(()));

    assert_eq!(set.set_balance_factor(0.6), Ok(()));
    assert!(set.tree().height(&slab) <= 7);
    assert_eq!(set.remove(&100), Some(100));
    assert_eq!(set.check(), Ok(()));
}

#[test]
fn sets_sharing_a_hook_keep_their_own_values() {
    init_tracing();
    let slab = items(&[1, 2, 3, 10, 20, 30]);
    let mut low = RbSet::new(&slab, tree_hook(), copse::RedBlack, ByKey, Natural);
    let mut high = RbSet::new(&slab, tree_hook(), copse::RedBlack, ByKey, Natural);
    assert_eq!(low.extend(0..3), Ok(3));
    assert_eq!(high.extend(3..6), Ok(3));

    assert_eq!(low.erase(4), Err(Error::NotLinked(4)));
    assert_eq!(high.erase(0), Err(Error::NotLinked(0)));
    assert!(slab.iter().all(|item| item.tree.is_linked()));
    assert_eq!((low.len(), high.len()), (3, 3));
    assert_eq!(low.check(), Ok(()));
    assert_eq!(high.check(), Ok(()));

    assert_eq!(high.erase(4), Ok(()));
    assert!(high.iter().map(|item| item.key).eq([10, 30]));
    assert!(low.iter().map(|item| item.key).eq([1, 2, 3]));
}
