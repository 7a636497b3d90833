//! ## Introduction
//!
//! This crate implements intrusive containers: balanced binary search trees and hash tables that
//! link values together without owning them. The values stay where the caller put them, in a
//! slice of slots (the "slab"), and each value embeds a small hook for every container it may
//! join. A container stores nothing but slot indices, in the hooks and in a small header.
//!
//! ## Benefits
//!
//! - The containers never allocate, so they work in `#![no_std]` code without `alloc`.
//! - Values never move while linked. Inserting and erasing relinks hooks and nothing else.
//! - One value can be in several containers at once, through several hooks.
//! - Keys do not need to be `Clone` or `Copy`. Ordering, equality, hashing and key extraction
//!   are all supplied as functors, with natural defaults.
//! - Every precondition the containers rely on (a value being linked or not, a commit token
//!   being fresh, a bucket array fitting the configuration) is checked and reported as an
//!   [`Error`].
//!
//! ## Contents
//!
//! <center>
//!
//! | Type                 | Balancing / layout           | Keys      | Iterator      |
//! |:---------------------|:-----------------------------|:----------|---------------|
//! | `RbSet`              | Red-black                    | Unique    | `SetIterator` |
//! | `AvlSet`             | AVL                          | Unique    | `SetIterator` |
//! | `SgSet`              | Scapegoat                    | Unique    | `SetIterator` |
//! | `SplaySet`           | Splay                        | Unique    | `SetIterator` |
//! | `TreapSet`           | Treap                        | Unique    | `SetIterator` |
//! | `*MultiSet`          | As above                     | Repeated  | `SetIterator` |
//! | `UnorderedSet`       | Separate chaining            | Unique    | `Values`      |
//! | `UnorderedMultiSet`  | Separate chaining            | Repeated  | `Values`      |
//!
//! </center>
//!
//! The crate exposes the engines underneath: [`tree::BsTree`], generic over a
//! [`tree::Balance`] strategy, and [`hashtable::HashTable`], configured by
//! [`hashtable::HashOptions`]. Both take the slab on every call and work in slot indices. They
//! are provided to support development of additional container types.

#![no_std]
#![warn(missing_docs)]

#[cfg(test)]
extern crate alloc;

mod error;
pub mod functor;
pub mod hashtable;
pub mod hook;
mod set;
pub mod tree;
mod unordered;

pub use error::{CloneError, Error, Rejected};
pub use functor::{FxHashing, Hashing, Identity, Natural};
pub use hashtable::{Bucket, HashOptions, HashTable};
pub use hook::{HashHook, Hook, TreeHook};
pub use set::*;
pub use tree::{Avl, BsTree, RedBlack, Scapegoat, Splay, Treap};
pub use unordered::*;
