//! Block header and the transactions it carries.

use data_encoding::HEXLOWER;
use serde::{Deserialize, Serialize};

use super::merkle::merkle_root;
use super::pow;
use super::transaction::Transaction;
use crate::crypto::hash::sha256_digest;
use crate::error::Result;

/// Merkle leaves are `SHA-256` of each transaction's serialized bytes, not
/// the transaction's own id (which is computed over a different, id-zeroed
/// representation) — using the id here would make two conformant
/// implementations compute different merkle roots for the same block.
fn transaction_leaves(transactions: &[Transaction]) -> Result<Vec<[u8; 32]>> {
    transactions
        .iter()
        .map(|tx| {
            let digest = sha256_digest(&tx.serialize()?);
            let mut leaf = [0u8; 32];
            leaf.copy_from_slice(&digest);
            Ok(leaf)
        })
        .collect()
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Block {
    pub timestamp: i64,
    pub prev_hash: [u8; 32],
    pub hash: [u8; 32],
    pub merkle_root: [u8; 32],
    pub target_bits: u64,
    pub nonce: u64,
    pub height: u64,
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Mine a new block on top of `prev_hash` at `height` containing
    /// `transactions`. Runs proof-of-work inline; this can be slow.
    pub fn new_block(
        prev_hash: [u8; 32],
        transactions: Vec<Transaction>,
        height: u64,
        timestamp: i64,
    ) -> Result<Block> {
        let leaves = transaction_leaves(&transactions)?;
        let root = merkle_root(&leaves);

        let (nonce, hash) = pow::run(&prev_hash, &root, timestamp).ok_or_else(|| {
            crate::error::Error::ProtocolError("proof-of-work search exhausted nonce space".into())
        })?;

        Ok(Block {
            timestamp,
            prev_hash,
            hash,
            merkle_root: root,
            target_bits: pow::TARGET_BITS,
            nonce,
            height,
            transactions,
        })
    }

    /// The distinguished first block: height 0, all-zero previous hash.
    pub fn genesis(coinbase: Transaction, timestamp: i64) -> Result<Block> {
        Block::new_block([0u8; 32], vec![coinbase], 0, timestamp)
    }

    pub fn is_genesis(&self) -> bool {
        self.height == 0 && self.prev_hash == [0u8; 32]
    }

    /// Recheck that `hash` is still a valid proof-of-work solution over
    /// this block's header fields.
    pub fn validate_pow(&self) -> bool {
        pow::validate(
            &self.prev_hash,
            &self.merkle_root,
            self.timestamp,
            self.nonce,
            &self.hash,
        )
    }

    /// Recompute the merkle root from `transactions` and compare against
    /// the stored `merkle_root`, catching a tampered transaction list.
    pub fn validate_merkle_root(&self) -> Result<bool> {
        let leaves = transaction_leaves(&self.transactions)?;
        Ok(merkle_root(&leaves) == self.merkle_root)
    }

    pub fn hash_hex(&self) -> String {
        HEXLOWER.encode(&self.hash)
    }

    pub fn prev_hash_hex(&self) -> String {
        HEXLOWER.encode(&self.prev_hash)
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        Ok(bincode::serde::encode_to_vec(self, bincode::config::standard())?)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Block> {
        let (block, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())?;
        Ok(block)
    }
}
