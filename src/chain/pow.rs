//! Proof-of-work search and validation over a fixed difficulty target.

use num_bigint::BigInt;
use num_bigint::Sign;
use std::ops::ShlAssign;

use crate::crypto::hash::sha256_digest;

/// Compile-time difficulty. MUST match across implementations.
pub const TARGET_BITS: u64 = 16;
const MAX_NONCE: u64 = u64::MAX;

/// `1 << (256 - TARGET_BITS)`, as a big integer.
pub fn target() -> BigInt {
    let mut t = BigInt::from(1);
    t.shl_assign(256 - TARGET_BITS as usize);
    t
}

/// Build the canonical pre-image for nonce `nonce`. Field order is
/// load-bearing: prev_hash || merkle_root || timestamp(be) ||
/// target_bits(be) || nonce(be).
pub fn pre_image(prev_hash: &[u8; 32], merkle_root: &[u8; 32], timestamp: i64, nonce: u64) -> Vec<u8> {
    let mut data = Vec::with_capacity(32 + 32 + 8 + 8 + 8);
    data.extend_from_slice(prev_hash);
    data.extend_from_slice(merkle_root);
    data.extend_from_slice(&timestamp.to_be_bytes());
    data.extend_from_slice(&TARGET_BITS.to_be_bytes());
    data.extend_from_slice(&nonce.to_be_bytes());
    data
}

fn hash_as_bigint(hash: &[u8]) -> BigInt {
    BigInt::from_bytes_be(Sign::Plus, hash)
}

/// Search for a nonce whose pre-image hash is strictly below `target()`.
/// Returns `(nonce, hash)` on success, `None` if `MAX_NONCE` is exhausted.
pub fn run(prev_hash: &[u8; 32], merkle_root: &[u8; 32], timestamp: i64) -> Option<(u64, [u8; 32])> {
    let target = target();
    for nonce in 0..=MAX_NONCE {
        let data = pre_image(prev_hash, merkle_root, timestamp, nonce);
        let hash = sha256_digest(&data);
        if hash_as_bigint(&hash) < target {
            let mut out = [0u8; 32];
            out.copy_from_slice(&hash);
            return Some((nonce, out));
        }
    }
    None
}

/// Recompute the pre-image hash for a stored `(nonce, timestamp)` and
/// check it is still below target and matches the stored hash.
pub fn validate(
    prev_hash: &[u8; 32],
    merkle_root: &[u8; 32],
    timestamp: i64,
    nonce: u64,
    claimed_hash: &[u8; 32],
) -> bool {
    let data = pre_image(prev_hash, merkle_root, timestamp, nonce);
    let hash = sha256_digest(&data);
    hash.as_slice() == claimed_hash && hash_as_bigint(&hash) < target()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mined_block_validates() {
        let prev = [1u8; 32];
        let root = [2u8; 32];
        let (nonce, hash) = run(&prev, &root, 1_700_000_000).expect("pow should succeed");
        assert!(validate(&prev, &root, 1_700_000_000, nonce, &hash));
    }

    #[test]
    fn tampered_nonce_fails_validation() {
        let prev = [1u8; 32];
        let root = [2u8; 32];
        let (nonce, hash) = run(&prev, &root, 1_700_000_000).expect("pow should succeed");
        assert!(!validate(&prev, &root, 1_700_000_000, nonce + 1, &hash));
    }

    #[test]
    fn tampered_timestamp_fails_validation() {
        let prev = [1u8; 32];
        let root = [2u8; 32];
        let (nonce, hash) = run(&prev, &root, 1_700_000_000).expect("pow should succeed");
        assert!(!validate(&prev, &root, 1_700_000_001, nonce, &hash));
    }

    #[test]
    fn tampered_merkle_root_fails_validation() {
        let prev = [1u8; 32];
        let root = [2u8; 32];
        let other_root = [3u8; 32];
        let (nonce, hash) = run(&prev, &root, 1_700_000_000).expect("pow should succeed");
        assert!(!validate(&prev, &other_root, 1_700_000_000, nonce, &hash));
    }

    #[test]
    fn pre_image_field_order_and_lengths() {
        let prev = [0xAAu8; 32];
        let root = [0xBBu8; 32];
        let data = pre_image(&prev, &root, 42, 7);
        assert_eq!(data.len(), 32 + 32 + 8 + 8 + 8);
        assert_eq!(&data[0..32], &prev[..]);
        assert_eq!(&data[32..64], &root[..]);
        assert_eq!(&data[64..72], &42i64.to_be_bytes());
        assert_eq!(&data[72..80], &TARGET_BITS.to_be_bytes());
        assert_eq!(&data[80..88], &7u64.to_be_bytes());
    }
}
