//! Node aggregate: the single owned handle a gossip server and its
//! background tasks share, replacing the global mutable statics
//! (`GLOBAL_NODES`, `GLOBAL_MEMORY_POOL`, `GLOBAL_BLOCKS_IN_TRANSIT`,
//! a process-wide mining address) that the tutorial this was distilled
//! from keeps as process-lifetime singletons. Passing `Node` by value
//! (it is cheap to clone, every field is an `Arc`) lets more than one
//! node run in the same process, which the singleton design couldn't
//! support at all — a prerequisite for testing gossip sync in one binary.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::chain::ChainStore;
use crate::config::NodeConfig;
use crate::error::Result;

use super::mempool::{BlocksInTransit, Mempool};
use super::peers::Peers;

#[derive(Clone)]
pub struct Node {
    pub config: NodeConfig,
    pub store: Arc<ChainStore>,
    pub peers: Arc<Peers>,
    pub mempool: Arc<Mempool>,
    pub blocks_in_transit: Arc<BlocksInTransit>,
    /// Serializes "mine a block, update the UTXO index, broadcast it" as
    /// one logical step so two mining attempts can't race over the tip.
    mining_lock: Arc<Mutex<()>>,
}

impl Node {
    pub fn new(config: NodeConfig, store: ChainStore) -> Node {
        let peers = Peers::new();
        peers.add(config.seed_addr);
        Node {
            config,
            store: Arc::new(store),
            peers: Arc::new(peers),
            mempool: Arc::new(Mempool::new()),
            blocks_in_transit: Arc::new(BlocksInTransit::new()),
            mining_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn best_height(&self) -> Result<u64> {
        self.store.get_best_height()
    }

    /// Runs `f` while holding the node's mining lock, guaranteeing only
    /// one mine-update-broadcast sequence proceeds at a time.
    pub async fn with_mining_lock<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&Node) -> T,
    {
        let _guard = self.mining_lock.lock().await;
        f(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::Wallet;

    fn test_node() -> (tempfile::TempDir, Node) {
        let dir = tempfile::tempdir().expect("tempdir");
        let wallet = Wallet::new().expect("wallet");
        let store =
            ChainStore::create_blockchain(dir.path(), &wallet.get_address()).expect("create");
        let config = NodeConfig::new("127.0.0.1:0".parse().unwrap(), None).expect("config");
        (dir, Node::new(config, store))
    }

    #[test]
    fn new_node_seeds_its_own_seed_address_as_a_known_peer() {
        let (_dir, node) = test_node();
        assert!(node.peers.is_known(&node.config.seed_addr));
    }

    #[tokio::test]
    async fn mining_lock_serializes_access() {
        let (_dir, node) = test_node();
        let result = node.with_mining_lock(|n| n.best_height().unwrap()).await;
        assert_eq!(result, 0);
    }
}
