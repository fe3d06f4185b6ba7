use std::hash::BuildHasher;

use rustc_hash::FxBuildHasher;

/// Maps a key to the hash its home bucket is derived from.
///
/// The hasher is not recorded in the file, so a table has to be reopened
/// with the hasher that built it.
pub trait BucketHasher {
    fn hash_key(key: &[u8]) -> u64;

    /// Home bucket of `key` in a table with `nbuckets` buckets.
    fn home_bucket(key: &[u8], nbuckets: usize) -> usize {
        (Self::hash_key(key) % nbuckets as u64) as usize
    }
}

/// `h = 31 * h + byte` over signed bytes with 32-bit wrapping arithmetic,
/// reinterpreted as unsigned.
///
/// Reproduces the bucket placement of existing table files. Leading zero
/// bytes only contribute `h * 31`, so keys with long zero runs cluster and
/// run into `NoBuckets` sooner than with a well-mixed hash.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolyHash;

impl BucketHasher for PolyHash {
    #[inline]
    fn hash_key(key: &[u8]) -> u64 {
        let h = key.iter().fold(0i32, |h, &b| {
            h.wrapping_mul(31).wrapping_add(i32::from(b as i8))
        });
        u64::from(h as u32)
    }
}

/// rustc-hash's `FxHasher`; better mixing, not compatible with `PolyHash` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct FxBucketHasher;

impl BucketHasher for FxBucketHasher {
    #[inline]
    fn hash_key(key: &[u8]) -> u64 {
        FxBuildHasher.hash_one(key)
    }
}
