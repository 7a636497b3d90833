//! Hash table configuration

use crate::Error;

/// The configuration matrix of a [`HashTable`](super::HashTable)
///
/// Every switch is off by default except `constant_time_size`. Options are checked once, when
/// the table is constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HashOptions {
    /// Keep a size counter. Without it `len` walks every bucket
    pub constant_time_size: bool,
    /// Route hashes with a mask instead of a modulo. Bucket counts must be powers of two
    pub power_of_two: bool,
    /// Remember the first non-empty bucket so iteration starts without a scan
    pub cache_begin: bool,
    /// Store each value's hash in its hook, so rehashing never calls the hasher
    pub store_hash: bool,
    /// Compare stored hashes before comparing keys
    pub compare_hash: bool,
    /// Allow growing and shrinking one bucket at a time
    pub incremental: bool,
    /// Link runs of equal keys so lookups skip over them in one step
    pub optimize_multikey: bool,
}

impl HashOptions {
    /// The default configuration
    pub const fn new() -> HashOptions {
        HashOptions {
            constant_time_size: true,
            power_of_two: false,
            cache_begin: false,
            store_hash: false,
            compare_hash: false,
            incremental: false,
            optimize_multikey: false,
        }
    }

    /// Set `constant_time_size`
    pub const fn constant_time_size(mut self, on: bool) -> HashOptions {
        self.constant_time_size = on;
        self
    }

    /// Set `power_of_two`
    pub const fn power_of_two(mut self, on: bool) -> HashOptions {
        self.power_of_two = on;
        self
    }

    /// Set `cache_begin`
    pub const fn cache_begin(mut self, on: bool) -> HashOptions {
        self.cache_begin = on;
        self
    }

    /// Set `store_hash`
    pub const fn store_hash(mut self, on: bool) -> HashOptions {
        self.store_hash = on;
        self
    }

    /// Set `compare_hash`
    pub const fn compare_hash(mut self, on: bool) -> HashOptions {
        self.compare_hash = on;
        self
    }

    /// Set `incremental`
    pub const fn incremental(mut self, on: bool) -> HashOptions {
        self.incremental = on;
        self
    }

    /// Set `optimize_multikey`
    pub const fn optimize_multikey(mut self, on: bool) -> HashOptions {
        self.optimize_multikey = on;
        self
    }

    /// Check that the switches are consistent
    pub fn validate(&self) -> Result<(), Error> {
        if self.compare_hash && !self.store_hash {
            return Err(Error::InvalidOptions("compare_hash requires store_hash"));
        }
        if self.incremental && !self.power_of_two {
            return Err(Error::InvalidOptions("incremental requires power_of_two"));
        }
        Ok(())
    }
}

impl Default for HashOptions {
    fn default() -> Self {
        HashOptions::new()
    }
}

//-----------------------------------------------------------------------------------------------//

#[test]
// Contradictory switches are rejected
fn test_options_0() {
    debug_assert_eq!(HashOptions::default().validate(), Ok(()));
    debug_assert!(HashOptions::new().constant_time_size);

    debug_assert_eq!(
        HashOptions::new().compare_hash(true).validate(),
        Err(Error::InvalidOptions("compare_hash requires store_hash"))
    );
    debug_assert_eq!(
        HashOptions::new().store_hash(true).compare_hash(true).validate(),
        Ok(())
    );
    debug_assert_eq!(
        HashOptions::new().incremental(true).validate(),
        Err(Error::InvalidOptions("incremental requires power_of_two"))
    );
}
