//! UTXO index: a cache over the chain's unspent outputs, keyed by txid,
//! kept in the `chainstate` sled tree.

use std::collections::HashMap;

use data_encoding::HEXLOWER;

use super::block::Block;
use super::store::ChainStore;
use super::transaction::TXOutput;
use crate::error::{Error, Result};

pub struct UtxoSet<'a> {
    store: &'a ChainStore,
}

fn config() -> bincode::config::Configuration {
    bincode::config::standard()
}

impl<'a> UtxoSet<'a> {
    pub fn new(store: &'a ChainStore) -> UtxoSet<'a> {
        UtxoSet { store }
    }

    /// Walk the whole chain and rebuild the UTXO tree from scratch. Used
    /// on startup and whenever incremental tracking falls behind (initial
    /// block download completing, fork reorganization).
    pub fn reindex(&self) -> Result<()> {
        let tree = self.store.chainstate_tree()?;
        tree.clear()?;

        let mut unspent: HashMap<[u8; 32], Vec<TXOutput>> = HashMap::new();
        let mut spent: HashMap<[u8; 32], Vec<u32>> = HashMap::new();

        for block in self.store.iterator() {
            let block = block?;
            for tx in &block.transactions {
                if !tx.is_coinbase() {
                    for input in &tx.vin {
                        spent.entry(input.txid).or_default().push(input.vout);
                    }
                }
                unspent.insert(tx.id, tx.vout.clone());
            }
        }

        for (txid, outs) in unspent.iter_mut() {
            if let Some(spent_indices) = spent.get(txid) {
                // Remove in descending index order so earlier removals
                // don't shift the indices still pending removal.
                let mut indices = spent_indices.clone();
                indices.sort_unstable();
                indices.dedup();
                for idx in indices.into_iter().rev() {
                    if (idx as usize) < outs.len() {
                        outs.remove(idx as usize);
                    }
                }
            }
        }

        for (txid, outs) in unspent {
            if outs.is_empty() {
                continue;
            }
            let bytes = bincode::serde::encode_to_vec(&outs, config())?;
            tree.insert(txid, bytes)?;
        }
        Ok(())
    }

    /// Apply a single newly-mined or newly-accepted block to the index
    /// incrementally: drop inputs it spends, add its outputs.
    pub fn update(&self, block: &Block) -> Result<()> {
        let tree = self.store.chainstate_tree()?;

        for tx in &block.transactions {
            if !tx.is_coinbase() {
                for input in &tx.vin {
                    let existing = tree.get(input.txid)?.ok_or_else(|| {
                        Error::CorruptedDatabase(format!(
                            "utxo update: {} references unknown prior output",
                            HEXLOWER.encode(&input.txid)
                        ))
                    })?;
                    let (mut outs, _): (Vec<TXOutput>, usize) =
                        bincode::serde::decode_from_slice(existing.as_ref(), config())?;
                    if (input.vout as usize) < outs.len() {
                        outs.remove(input.vout as usize);
                    }
                    if outs.is_empty() {
                        tree.remove(input.txid)?;
                    } else {
                        let bytes = bincode::serde::encode_to_vec(&outs, config())?;
                        tree.insert(input.txid, bytes)?;
                    }
                }
            }

            let bytes = bincode::serde::encode_to_vec(&tx.vout, config())?;
            tree.insert(tx.id, bytes)?;
        }
        Ok(())
    }

    fn each_entry<F: FnMut([u8; 32], Vec<TXOutput>) -> Result<()>>(
        &self,
        mut f: F,
    ) -> Result<()> {
        let tree = self.store.chainstate_tree()?;
        for item in tree.iter() {
            let (key, value) = item?;
            let mut txid = [0u8; 32];
            txid.copy_from_slice(key.as_ref());
            let (outs, _): (Vec<TXOutput>, usize) =
                bincode::serde::decode_from_slice(value.as_ref(), config())?;
            f(txid, outs)?;
        }
        Ok(())
    }

    /// All unspent outputs locked to `pubkey_hash`.
    pub fn find_utxo(&self, pubkey_hash: &[u8; 20]) -> Result<Vec<TXOutput>> {
        let mut result = Vec::new();
        self.each_entry(|_, outs| {
            for out in outs {
                if out.is_locked_with_key(pubkey_hash) {
                    result.push(out);
                }
            }
            Ok(())
        })?;
        Ok(result)
    }

    /// Accumulate outputs locked to `pubkey_hash` until `amount` is
    /// covered (or the index is exhausted). Returns the amount actually
    /// accumulated and the txid -> output-index map of what to spend.
    pub fn find_spendable_outputs(
        &self,
        pubkey_hash: &[u8; 20],
        amount: u64,
    ) -> Result<(u64, HashMap<[u8; 32], Vec<u32>>)> {
        let mut accumulated = 0u64;
        let mut spendable: HashMap<[u8; 32], Vec<u32>> = HashMap::new();

        self.each_entry(|txid, outs| {
            for (idx, out) in outs.iter().enumerate() {
                if accumulated >= amount {
                    break;
                }
                if out.is_locked_with_key(pubkey_hash) {
                    accumulated += out.value;
                    spendable.entry(txid).or_default().push(idx as u32);
                }
            }
            Ok(())
        })?;
        Ok((accumulated, spendable))
    }

    pub fn get_balance(&self, pubkey_hash: &[u8; 20]) -> Result<u64> {
        Ok(self.find_utxo(pubkey_hash)?.iter().map(|o| o.value).sum())
    }

    pub fn count_transactions(&self) -> Result<usize> {
        Ok(self.store.chainstate_tree()?.iter().count())
    }
}
