//! Bucket arrays and the routing of hashes to buckets

use core::fmt;

use super::HashOptions;
use crate::Error;

/// One bucket: the head of a chain of values, or empty
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    pub(crate) head: usize,
}

impl Bucket {
    /// Construct an empty bucket
    pub const fn new() -> Bucket {
        Bucket { head: !0 }
    }

    /// Check if no value hashes here
    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.head == 0
    }

    /// The first value in the chain
    #[inline]
    pub fn head(&self) -> Option<usize> {
        if self.is_empty() {
            None
        } else {
            Some(self.head)
        }
    }
}

impl Default for Bucket {
    fn default() -> Self {
        Bucket::new()
    }
}

impl fmt::Debug for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.head() {
            Some(x) => write!(f, "Bucket({x})"),
            None => f.write_str("Bucket(empty)"),
        }
    }
}

//-----------------------------------------------------------------------------------------------//

/// Map a hash to a bucket of an array of `count` buckets
///
/// In incremental mode only the first `split` buckets are in use, and a hash landing above the
/// split point folds back onto the bucket it was split from.
#[inline]
pub fn route(options: &HashOptions, hash: usize, count: usize, split: usize) -> usize {
    if options.incremental {
        let b = hash & (count - 1);
        if b >= split {
            b - count / 2
        } else {
            b
        }
    } else if options.power_of_two {
        hash & (count - 1)
    } else {
        hash % count
    }
}

/// Check that an array of `count` buckets suits the options
pub fn validate(options: &HashOptions, count: usize) -> Result<(), Error> {
    if count == 0 {
        return Err(Error::EmptyBuckets);
    }
    if options.power_of_two && !count.is_power_of_two() {
        return Err(Error::NotPowerOfTwo(count));
    }
    Ok(())
}

/// Empty every bucket
pub fn clear(buckets: &mut [Bucket]) {
    buckets.fill(Bucket::new());
}

/// The lowest split point of an incremental array of `count` buckets
#[inline]
pub fn min_split(count: usize) -> usize {
    (count / 2).max(1)
}

//-----------------------------------------------------------------------------------------------//

#[test]
// Modulo, mask and split routing
fn test_bucket_0() {
    let modulo = HashOptions::new();
    let mask = HashOptions::new().power_of_two(true);
    let split = mask.incremental(true);

    debug_assert_eq!(route(&modulo, 23, 7, 7), 2);
    debug_assert_eq!(route(&mask, 23, 8, 8), 7);

    // Buckets 0..6 of 8 are live, so 6 and 7 fold onto 2 and 3
    debug_assert_eq!(route(&split, 23, 8, 6), 3);
    debug_assert_eq!(route(&split, 22, 8, 6), 2);
    debug_assert_eq!(route(&split, 21, 8, 6), 5);

    debug_assert_eq!(validate(&modulo, 0), Err(Error::EmptyBuckets));
    debug_assert_eq!(validate(&modulo, 7), Ok(()));
    debug_assert_eq!(validate(&mask, 7), Err(Error::NotPowerOfTwo(7)));
    debug_assert_eq!(min_split(1), 1);
    debug_assert_eq!(min_split(16), 8);

    let mut buckets = [Bucket { head: 3 }, Bucket::new()];
    debug_assert_eq!(buckets[0].head(), Some(3));
    clear(&mut buckets);
    debug_assert!(buckets.iter().all(Bucket::is_empty));
}
