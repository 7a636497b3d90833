//! Error types shared by the tree and hash table containers

use thiserror::Error;

use crate::hashtable::Bucket;

//-----------------------------------------------------------------------------------------------//

/// A checked precondition violation or a failed structural check
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum Error {
    /// The value in this slot is already linked into a container through the same hook
    #[error("slot {0} is already linked into a container")]
    AlreadyLinked(usize),

    /// The value in this slot is not linked into any container through this hook
    #[error("slot {0} is not linked into a container")]
    NotLinked(usize),

    /// A two-phase insert was committed after the container had been modified
    #[error("insert commit is stale, the container was modified after the check")]
    StaleCommit,

    /// A bucket array with no buckets was supplied
    #[error("bucket array must contain at least one bucket")]
    EmptyBuckets,

    /// The configuration requires a power of two bucket count
    #[error("bucket count {0} is not a power of two")]
    NotPowerOfTwo(usize),

    /// A replacement bucket array does not fit the current bucket layout
    #[error("bucket array of {actual} buckets cannot replace one of {current} buckets here")]
    BucketMismatch {
        /// Bucket count of the current array
        current: usize,
        /// Bucket count of the rejected array
        actual: usize,
    },

    /// Two or more hash options contradict each other
    #[error("invalid hash options: {0}")]
    InvalidOptions(&'static str),

    /// A scapegoat balance factor outside of the open interval (0.5, 1.0)
    #[error("balance factor {0} is outside of (0.5, 1.0)")]
    BalanceFactor(f32),

    /// A destination slab is too short to receive a structural copy
    #[error("destination slab holds {actual} slots, {required} are needed")]
    SlabTooSmall {
        /// Number of slots the copy needs
        required: usize,
        /// Number of slots supplied
        actual: usize,
    },

    /// A structural invariant does not hold
    #[error("container is corrupt: {0}")]
    Corrupt(&'static str),
}

/// The failure of a `clone_from` operation
#[derive(Debug, PartialEq, Error)]
pub enum CloneError<E> {
    /// The container refused the copy before cloning started
    #[error(transparent)]
    Container(#[from] Error),

    /// The caller's cloner failed; every slot cloned before it has been disposed
    #[error("cloner failed")]
    Cloner(E),
}

/// A bucket array handed back to the caller because it was rejected
#[derive(Debug)]
pub struct Rejected<'b> {
    /// Why the array was rejected
    pub error: Error,
    /// The rejected array, untouched
    pub buckets: &'b mut [Bucket],
}

impl From<Rejected<'_>> for Error {
    fn from(rejected: Rejected<'_>) -> Error {
        rejected.error
    }
}

//-----------------------------------------------------------------------------------------------//

#[test]
// Error messages carry their payloads
fn test_error_0() {
    use alloc::string::ToString;

    debug_assert_eq!(
        Error::AlreadyLinked(3).to_string(),
        "slot 3 is already linked into a container"
    );
    debug_assert_eq!(
        Error::BucketMismatch {
            current: 8,
            actual: 3
        }
        .to_string(),
        "bucket array of 3 buckets cannot replace one of 8 buckets here"
    );

    let error: CloneError<()> = Error::StaleCommit.into();
    debug_assert!(matches!(error, CloneError::Container(Error::StaleCommit)));
}
