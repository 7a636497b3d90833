#![allow(dead_code)]

use std::cmp::Ordering;

use copse::{functor::KeyOf, HashHook, Hook, TreeHook};
use tracing_subscriber::EnvFilter;

/// A value that can sit in one tree and one hash table at the same time
#[derive(Debug, Default)]
pub struct Item {
    pub key: u32,
    pub tree: TreeHook,
    pub hash: HashHook,
}

impl Item {
    pub fn new(key: u32) -> Item {
        Item {
            key,
            ..Item::default()
        }
    }
}

/// Items are ordered and hashed by `key`
#[derive(Clone, Copy, Debug, Default)]
pub struct ByKey;

impl KeyOf<Item> for ByKey {
    type Key = u32;

    fn key_of<'a>(&self, value: &'a Item) -> &'a u32 {
        &value.key
    }
}

pub fn items(keys: &[u32]) -> Vec<Item> {
    keys.iter().map(|&key| Item::new(key)).collect()
}

pub fn tree_hook() -> Hook<Item, TreeHook> {
    Hook::new(|v: &Item| &v.tree)
}

pub fn hash_hook() -> Hook<Item, HashHook> {
    Hook::new(|v: &Item| &v.hash)
}

/// Keys hash to themselves, so tests can aim at a bucket
pub fn identity(key: &u32) -> usize {
    *key as usize
}

/// Treap priority: a scrambled key, so ascending input still gives a random-looking heap
pub fn by_priority(a: &Item, b: &Item) -> Ordering {
    let scramble = |k: u32| k.wrapping_mul(0x9e37_79b9).rotate_left(13);
    scramble(a.key).cmp(&scramble(b.key))
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// The balancing strategies, for parameterized tests
#[derive(Clone, Copy, Debug)]
pub enum Strategy {
    RedBlack,
    Avl,
    Scapegoat,
    Splay,
    Treap,
}

/// Run `$body` with `$balance` bound to a fresh value of the strategy's balance type
macro_rules! with_balance {
    ($strategy:expr, |$balance:ident| $body:expr) => {
        match $strategy {
            Strategy::RedBlack => {
                let $balance = copse::RedBlack;
                $body
            }
            Strategy::Avl => {
                let $balance = copse::Avl;
                $body
            }
            Strategy::Scapegoat => {
                let $balance = copse::Scapegoat::new();
                $body
            }
            Strategy::Splay => {
                let $balance = copse::Splay;
                $body
            }
            Strategy::Treap => {
                let $balance =
                    copse::Treap::new(by_priority as fn(&Item, &Item) -> std::cmp::Ordering);
                $body
            }
        }
    };
}
