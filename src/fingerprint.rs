//! Streaming 128-bit non-cryptographic hasher over a bounded I/O buffer,
//! plus the exponential block-size schedule shared by the comparator.
//!
//! `XXH3`'s 128-bit variant is the direct Rust-ecosystem analogue of the
//! `XXH3_128bits_*` calls the original C++ engine made against `xxhash.h`:
//! keyed by a 64-bit seed, non-cryptographic, and fast on small inputs,
//! which matters here since region 0 is usually the only region a
//! non-duplicate pair ever needs.

use xxhash_rust::xxh3::Xxh3;

use crate::error::{Error, Result};

/// A single fingerprint block: the 128-bit digest of one region.
pub type Digest = u128;

/// Stateful hasher reused across an entire worker's sort, one instance per
/// thread, per spec.md §9 ("reuse one buffer and one hasher per worker").
/// [`Self::reset`] is called between regions instead of constructing a new
/// engine, since `Xxh3` carries no state worth re-allocating for.
pub struct FingerprintEngine {
    hasher: Xxh3,
    seed: u64,
}

impl FingerprintEngine {
    pub fn new(seed: u64) -> Self {
        FingerprintEngine {
            hasher: Xxh3::with_seed(seed),
            seed,
        }
    }

    /// Rewinds to a fresh hasher state keyed by the same seed, so the next
    /// region starts independently of whatever was hashed before it.
    pub fn reset(&mut self) {
        self.hasher = Xxh3::with_seed(self.seed);
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    pub fn digest(&self) -> Digest {
        self.hasher.digest128()
    }
}

/// `ceil(log2(x))`, `x >= 1`.
fn log2_ceil(x: u64) -> u32 {
    debug_assert!(x >= 1);
    (u64::BITS - (x - 1).leading_zeros()) * ((x > 1) as u32)
}

fn div_ceil(x: u64, y: u64) -> u64 {
    (x + y - 1) / y
}

/// Number of fingerprint blocks (`max_hash`) for a file of `size` bytes
/// given base block size `block_size`.
pub fn max_hash(size: u64, block_size: u64) -> u32 {
    if size <= block_size {
        1
    } else {
        log2_ceil(div_ceil(size, block_size)) + 1
    }
}

/// Byte length of region `idx` for a file of `remaining` unread bytes
/// (region lengths are `block_size`, `block_size`, `2*block_size`,
/// `4*block_size`, ... clipped to what's left in the file).
pub fn region_len(idx: u32, block_size: u64, remaining: u64) -> u64 {
    let wanted = if idx == 0 {
        block_size
    } else {
        block_size << (idx - 1)
    };
    wanted.min(remaining)
}

/// Allocates the reusable worker I/O buffer. Validated to be a power of
/// two >= 4 KiB by [`crate::config::Config`]; this function trusts that.
pub fn new_read_buffer(size: usize) -> Result<Vec<u8>> {
    if size == 0 || size < 4096 || !size.is_power_of_two() {
        return Err(Error::ResourceExhausted(
            "read buffer size must be a power of two >= 4096".into(),
        ));
    }
    Ok(vec![0u8; size])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_hash_small_file() {
        assert_eq!(max_hash(1, 512), 1);
        assert_eq!(max_hash(512, 512), 1);
    }

    #[test]
    fn max_hash_grows_with_size() {
        // 513 bytes needs 2 blocks worth of ceil-div -> log2_ceil(2) + 1 = 2
        assert_eq!(max_hash(513, 512), 2);
        // 512*4 + 1 bytes: div_ceil = 5, log2_ceil(5) = 3, +1 = 4
        assert_eq!(max_hash(512 * 4 + 1, 512), 4);
    }

    #[test]
    fn region_lengths_follow_exponential_schedule() {
        let block = 512u64;
        assert_eq!(region_len(0, block, 10_000), 512);
        assert_eq!(region_len(1, block, 10_000 - 512), 512);
        assert_eq!(region_len(2, block, 9_000), 1024);
        assert_eq!(region_len(3, block, 50), 50);
    }

    #[test]
    fn digest_is_deterministic_for_same_bytes_and_seed() {
        let mut a = FingerprintEngine::new(42);
        let mut b = FingerprintEngine::new(42);
        a.update(b"hello world");
        b.update(b"hello world");
        assert_eq!(a.digest(), b.digest());
    }

    #[test]
    fn digest_differs_for_different_seeds() {
        let mut a = FingerprintEngine::new(1);
        let mut b = FingerprintEngine::new(2);
        a.update(b"hello world");
        b.update(b"hello world");
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn reset_reproduces_a_fresh_digest_for_the_same_seed() {
        let mut engine = FingerprintEngine::new(7);
        engine.update(b"first region");
        let first = engine.digest();

        engine.reset();
        engine.update(b"first region");
        assert_eq!(engine.digest(), first);
    }
}
