//! Binary Merkle tree over transaction hashes.
//!
//! The tutorial this was distilled from runs a build loop bounded by
//! `len(data)/2` iterations rather than halving until one node remains,
//! which under-builds the tree for more than two leaves. This is the
//! standard, correct construction instead: duplicate the last leaf on an
//! odd count, hash pairs level by level until one hash remains.

use crate::crypto::hash::sha256_digest;

/// Compute the Merkle root over already-hashed leaves (one 32-byte hash
/// per transaction). Returns the all-zero hash for an empty leaf set.
pub fn merkle_root(leaves: &[[u8; 32]]) -> [u8; 32] {
    if leaves.is_empty() {
        return [0u8; 32];
    }

    let mut level: Vec<[u8; 32]> = leaves.to_vec();
    while level.len() > 1 {
        if level.len() % 2 == 1 {
            level.push(*level.last().unwrap());
        }
        level = level
            .chunks(2)
            .map(|pair| {
                let mut data = Vec::with_capacity(64);
                data.extend_from_slice(&pair[0]);
                data.extend_from_slice(&pair[1]);
                let digest = sha256_digest(&data);
                let mut out = [0u8; 32];
                out.copy_from_slice(&digest);
                out
            })
            .collect();
    }
    level[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(n: u8) -> [u8; 32] {
        let digest = sha256_digest(&[n]);
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        out
    }

    #[test]
    fn empty_root_is_zero() {
        assert_eq!(merkle_root(&[]), [0u8; 32]);
    }

    #[test]
    fn single_leaf_root_is_the_leaf() {
        let l = leaf(1);
        assert_eq!(merkle_root(&[l]), l);
    }

    #[test]
    fn deterministic_across_builds() {
        let leaves = vec![leaf(1), leaf(2), leaf(3), leaf(4), leaf(5)];
        assert_eq!(merkle_root(&leaves), merkle_root(&leaves));
    }

    #[test]
    fn odd_count_duplicates_last_leaf() {
        let three = vec![leaf(1), leaf(2), leaf(3)];
        let four = vec![leaf(1), leaf(2), leaf(3), leaf(3)];
        assert_eq!(merkle_root(&three), merkle_root(&four));
    }

    #[test]
    fn order_sensitive() {
        let a = vec![leaf(1), leaf(2)];
        let b = vec![leaf(2), leaf(1)];
        assert_ne!(merkle_root(&a), merkle_root(&b));
    }

    #[test]
    fn larger_tree_builds_to_single_root() {
        // Regression for the under-iterating len(data)/2 bound: 7 leaves
        // needs 3 levels (7 -> 4 -> 2 -> 1), not len(data)/2 = 3 naive
        // halvings from the initial count alone happening to coincide.
        let leaves: Vec<[u8; 32]> = (0..7u8).map(leaf).collect();
        let root = merkle_root(&leaves);
        assert_ne!(root, [0u8; 32]);
    }
}
