//! Sled-backed chain storage: a `blocks` tree keyed by block hash, plus a
//! reserved tip pointer, and a `chainstate` tree holding the UTXO index
//! (see [`super::utxo`]).

use std::collections::HashMap;
use std::path::Path;

use data_encoding::HEXLOWER;
use tracing::debug;

use super::block::Block;
use super::transaction::Transaction;
use crate::error::{Error, Result};

const BLOCKS_TREE: &str = "blocks";
pub(super) const CHAINSTATE_TREE: &str = "chainstate";
const TIP_KEY: &[u8] = b"l";

pub struct ChainStore {
    db: sled::Db,
}

impl ChainStore {
    fn blocks_tree(&self) -> Result<sled::Tree> {
        Ok(self.db.open_tree(BLOCKS_TREE)?)
    }

    pub fn chainstate_tree(&self) -> Result<sled::Tree> {
        Ok(self.db.open_tree(CHAINSTATE_TREE)?)
    }

    /// Open an existing database at `path`, or return `None` if it has no
    /// chain yet (no tip pointer recorded).
    pub fn open(path: impl AsRef<Path>) -> Result<Option<ChainStore>> {
        let db = sled::open(path)?;
        let store = ChainStore { db };
        if store.blocks_tree()?.get(TIP_KEY)?.is_some() {
            Ok(Some(store))
        } else {
            Ok(None)
        }
    }

    /// Open `path`, creating a fresh chain seeded with a coinbase-only
    /// genesis block paying `genesis_address` if none exists yet.
    pub fn create_blockchain(path: impl AsRef<Path>, genesis_address: &str) -> Result<ChainStore> {
        let db = sled::open(path)?;
        let store = ChainStore { db };
        let blocks = store.blocks_tree()?;

        if blocks.get(TIP_KEY)?.is_none() {
            debug!("no existing tip found, mining genesis block");
            let coinbase = Transaction::new_coinbase_tx(genesis_address, None)?;
            let genesis = Block::genesis(coinbase, current_timestamp())?;
            store.persist_new_block(&genesis)?;
        }
        Ok(store)
    }

    fn persist_new_block(&self, block: &Block) -> Result<()> {
        let blocks = self.blocks_tree()?;
        let bytes = block.serialize()?;
        blocks
            .transaction(|tx_blocks| {
                tx_blocks.insert(&block.hash[..], bytes.clone())?;
                tx_blocks.insert(TIP_KEY, &block.hash[..])?;
                Ok::<(), sled::transaction::ConflictableTransactionError<Error>>(())
            })
            .map_err(|e| Error::CorruptedDatabase(e.to_string()))?;
        Ok(())
    }

    pub fn tip_hash(&self) -> Result<Option<[u8; 32]>> {
        let blocks = self.blocks_tree()?;
        match blocks.get(TIP_KEY)? {
            Some(ivec) => {
                let mut hash = [0u8; 32];
                hash.copy_from_slice(ivec.as_ref());
                Ok(Some(hash))
            }
            None => Ok(None),
        }
    }

    pub fn get_block(&self, hash: &[u8; 32]) -> Result<Option<Block>> {
        let blocks = self.blocks_tree()?;
        match blocks.get(hash)? {
            Some(ivec) => Ok(Some(Block::deserialize(ivec.as_ref())?)),
            None => Ok(None),
        }
    }

    pub fn get_best_height(&self) -> Result<u64> {
        match self.tip_hash()? {
            Some(hash) => {
                let tip = self
                    .get_block(&hash)?
                    .ok_or_else(|| Error::CorruptedDatabase("tip block missing".into()))?;
                Ok(tip.height)
            }
            None => Err(Error::NotFound("chain has no blocks yet".into())),
        }
    }

    /// Insert `block`, idempotent on a duplicate hash. Advances the tip
    /// only if `block` is taller than the current tip.
    pub fn add_block(&self, block: &Block) -> Result<()> {
        let blocks = self.blocks_tree()?;
        if blocks.get(block.hash)?.is_some() {
            return Ok(());
        }

        let current_height = match self.tip_hash()? {
            Some(tip) => self
                .get_block(&tip)?
                .map(|b| b.height)
                .unwrap_or_default(),
            None => 0,
        };

        let bytes = block.serialize()?;
        let should_advance_tip = block.height > current_height || self.tip_hash()?.is_none();
        let new_hash = block.hash;
        blocks
            .transaction(move |tx_blocks| {
                tx_blocks.insert(&new_hash[..], bytes.clone())?;
                if should_advance_tip {
                    tx_blocks.insert(TIP_KEY, &new_hash[..])?;
                }
                Ok::<(), sled::transaction::ConflictableTransactionError<Error>>(())
            })
            .map_err(|e| Error::CorruptedDatabase(e.to_string()))?;
        Ok(())
    }

    /// Verify every non-coinbase transaction against already-known
    /// previous transactions, mine a block containing them on top of the
    /// current tip, and persist it. Does not touch the UTXO index; call
    /// [`super::utxo::UtxoSet::update`] with the returned block afterward.
    pub fn mine_block(&self, transactions: Vec<Transaction>) -> Result<Block> {
        for tx in &transactions {
            if tx.is_coinbase() {
                continue;
            }
            let mut prev_txs = HashMap::new();
            for input in &tx.vin {
                let prev = self
                    .find_transaction(&input.txid)?
                    .ok_or_else(|| Error::InvalidTransaction("unknown input".into()))?;
                prev_txs.insert(input.txid, prev);
            }
            if !tx.verify(&prev_txs)? {
                return Err(Error::InvalidTransaction(format!(
                    "signature verification failed for {}",
                    tx.id_hex()
                )));
            }
        }

        let tip = self
            .tip_hash()?
            .ok_or_else(|| Error::NotFound("chain has no blocks yet".into()))?;
        let tip_block = self
            .get_block(&tip)?
            .ok_or_else(|| Error::CorruptedDatabase("tip block missing".into()))?;

        let block = Block::new_block(tip, transactions, tip_block.height + 1, current_timestamp())?;
        self.persist_new_block(&block)?;
        Ok(block)
    }

    pub fn get_block_hashes(&self) -> Result<Vec<[u8; 32]>> {
        let mut hashes = Vec::new();
        for block in self.iterator() {
            hashes.push(block?.hash);
        }
        Ok(hashes)
    }

    pub fn find_transaction(&self, txid: &[u8; 32]) -> Result<Option<Transaction>> {
        for block in self.iterator() {
            let block = block?;
            if let Some(tx) = block.transactions.iter().find(|tx| &tx.id == txid) {
                return Ok(Some(tx.clone()));
            }
        }
        Ok(None)
    }

    pub fn iterator(&self) -> ChainIterator<'_> {
        ChainIterator {
            store: self,
            next_hash: self.tip_hash().ok().flatten(),
        }
    }
}

/// Walks the chain backward from the tip to genesis.
pub struct ChainIterator<'a> {
    store: &'a ChainStore,
    next_hash: Option<[u8; 32]>,
}

impl<'a> Iterator for ChainIterator<'a> {
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        let hash = self.next_hash.take()?;
        match self.store.get_block(&hash) {
            Ok(Some(block)) => {
                if !block.is_genesis() {
                    self.next_hash = Some(block.prev_hash);
                }
                Some(Ok(block))
            }
            Ok(None) => Some(Err(Error::CorruptedDatabase(format!(
                "block {} referenced but missing",
                HEXLOWER.encode(&hash)
            )))),
            Err(e) => Some(Err(e)),
        }
    }
}

fn current_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_secs() as i64
}
