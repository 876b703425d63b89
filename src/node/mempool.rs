//! Pending-transaction pool and the in-flight block-download list.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::chain::Transaction;

/// Mutex-guarded map of not-yet-mined transactions, keyed by txid.
#[derive(Default)]
pub struct Mempool {
    inner: RwLock<HashMap<[u8; 32], Transaction>>,
}

impl Mempool {
    pub fn new() -> Mempool {
        Mempool {
            inner: RwLock::new(HashMap::new()),
        }
    }

    pub fn contains(&self, txid: &[u8; 32]) -> bool {
        self.inner.read().expect("mempool lock poisoned").contains_key(txid)
    }

    pub fn add(&self, tx: Transaction) {
        self.inner.write().expect("mempool lock poisoned").insert(tx.id, tx);
    }

    pub fn get(&self, txid: &[u8; 32]) -> Option<Transaction> {
        self.inner.read().expect("mempool lock poisoned").get(txid).cloned()
    }

    /// Removes a transaction. The gossip handler that services `getdata`
    /// requests for transactions deliberately does NOT call this: a peer
    /// may ask for the same pending transaction more than once before it
    /// is mined, and evicting it on first request would break that.
    pub fn remove(&self, txid: &[u8; 32]) {
        self.inner.write().expect("mempool lock poisoned").remove(txid);
    }

    pub fn remove_all(&self, txids: impl IntoIterator<Item = [u8; 32]>) {
        let mut guard = self.inner.write().expect("mempool lock poisoned");
        for txid in txids {
            guard.remove(&txid);
        }
    }

    pub fn all(&self) -> Vec<Transaction> {
        self.inner.read().expect("mempool lock poisoned").values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("mempool lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Hashes of blocks a node has announced via `inv` but not yet fetched.
#[derive(Default)]
pub struct BlocksInTransit {
    inner: RwLock<Vec<[u8; 32]>>,
}

impl BlocksInTransit {
    pub fn new() -> BlocksInTransit {
        BlocksInTransit {
            inner: RwLock::new(Vec::new()),
        }
    }

    pub fn set(&self, hashes: Vec<[u8; 32]>) {
        *self.inner.write().expect("blocks-in-transit lock poisoned") = hashes;
    }

    pub fn first(&self) -> Option<[u8; 32]> {
        self.inner.read().expect("blocks-in-transit lock poisoned").first().copied()
    }

    pub fn remove(&self, hash: &[u8; 32]) {
        self.inner
            .write()
            .expect("blocks-in-transit lock poisoned")
            .retain(|h| h != hash);
    }

    pub fn clear(&self) {
        self.inner.write().expect("blocks-in-transit lock poisoned").clear();
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().expect("blocks-in-transit lock poisoned").is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::Wallet;

    fn sample_tx() -> Transaction {
        let wallet = Wallet::new().expect("wallet");
        Transaction::new_coinbase_tx(&wallet.get_address(), None).expect("coinbase")
    }

    #[test]
    fn add_then_contains() {
        let pool = Mempool::new();
        let tx = sample_tx();
        pool.add(tx.clone());
        assert!(pool.contains(&tx.id));
    }

    #[test]
    fn blocks_in_transit_tracks_progress() {
        let transit = BlocksInTransit::new();
        let a = [1u8; 32];
        let b = [2u8; 32];
        transit.set(vec![a, b]);
        assert_eq!(transit.first(), Some(a));
        transit.remove(&a);
        assert_eq!(transit.first(), Some(b));
    }
}
