//! Mining trigger and the mine-update-broadcast sequence.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::chain::{Block, Transaction, UtxoSet};
use crate::config::MEMPOOL_MINING_THRESHOLD;
use crate::error::{Error, Result};

use super::context::Node;

/// `true` once the mempool has accumulated enough pending transactions
/// and this node has a mining address configured.
pub fn should_mine(node: &Node) -> bool {
    node.config.mining_address.is_some() && node.mempool.len() >= MEMPOOL_MINING_THRESHOLD
}

/// Drop any mempool transaction that no longer verifies against the
/// current UTXO set, logging each one. A transaction can go stale between
/// insertion (unconditional, matching the mempool's syntactic-validity
/// invariant) and mining time if the output it spends has since been
/// spent by another mined transaction.
fn verified_pending(node: &Node) -> Result<Vec<Transaction>> {
    let mut verified = Vec::new();
    for tx in node.mempool.all() {
        if tx.is_coinbase() {
            // Mirrors Transaction::verify's own short-circuit: a
            // coinbase-shaped mempool entry has no previous output to
            // resolve and verifies unconditionally.
            verified.push(tx);
            continue;
        }

        let mut prev_txs = HashMap::new();
        let mut resolvable = true;
        for input in &tx.vin {
            match node.store.find_transaction(&input.txid)? {
                Some(prev) => {
                    prev_txs.insert(input.txid, prev);
                }
                None => {
                    resolvable = false;
                    break;
                }
            }
        }

        let valid = resolvable && tx.verify(&prev_txs).unwrap_or(false);
        if valid {
            verified.push(tx);
        } else {
            warn!(txid = tx.id_hex(), "dropping invalid mempool transaction before mining");
            node.mempool.remove(&tx.id);
        }
    }
    Ok(verified)
}

/// Mine every verified pending transaction plus a fresh coinbase into one
/// block, apply it to the UTXO index, and drop the mined transactions from
/// the mempool. Caller is responsible for broadcasting the result.
pub fn mine_pending(node: &Node) -> Result<Block> {
    let mining_address = node
        .config
        .mining_address
        .clone()
        .expect("should_mine checked mining_address is set");

    let mut txs = verified_pending(node)?;
    if txs.is_empty() {
        return Err(Error::InvalidTransaction(
            "mempool has no valid transactions left to mine".into(),
        ));
    }

    let coinbase = Transaction::new_coinbase_tx(&mining_address, None)?;
    txs.push(coinbase);

    let mined_txids: Vec<[u8; 32]> = txs.iter().filter(|t| !t.is_coinbase()).map(|t| t.id).collect();

    let block = node.store.mine_block(txs)?;
    UtxoSet::new(&node.store).update(&block)?;
    node.mempool.remove_all(mined_txids);

    info!(height = block.height, hash = %block.hash_hex(), "mined block");
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainStore;
    use crate::config::NodeConfig;
    use crate::node::context::Node;
    use crate::wallet::Wallet;

    fn test_node(mining_address: Option<String>) -> (tempfile::TempDir, Node, Wallet) {
        let dir = tempfile::tempdir().expect("tempdir");
        let seed_wallet = Wallet::new().expect("wallet");
        let store =
            ChainStore::create_blockchain(dir.path(), &seed_wallet.get_address()).expect("create");
        let config = NodeConfig::new("127.0.0.1:0".parse().unwrap(), mining_address).expect("config");
        (dir, Node::new(config, store), seed_wallet)
    }

    #[test]
    fn does_not_trigger_below_threshold_or_without_mining_address() {
        let (_dir, node, _wallet) = test_node(None);
        assert!(!should_mine(&node));
    }

    #[test]
    fn mining_produces_a_taller_block_and_drains_mempool() {
        let miner_wallet = Wallet::new().expect("wallet");
        let (_dir, node, seed_wallet) = test_node(Some(miner_wallet.get_address()));

        let genesis_coinbase = node
            .store
            .get_block(&node.store.tip_hash().unwrap().unwrap())
            .unwrap()
            .unwrap()
            .transactions[0]
            .clone();
        let mut prev_txs = std::collections::HashMap::new();
        prev_txs.insert(genesis_coinbase.id, genesis_coinbase.clone());

        let utxo = UtxoSet::new(&node.store);
        utxo.reindex().expect("reindex");
        let (accumulated, spendable) = utxo
            .find_spendable_outputs(&seed_wallet.pubkey_hash(), 1)
            .expect("spendable");

        let recipient = Wallet::new().expect("wallet");
        let spend = Transaction::new_utxo_transaction(
            &seed_wallet,
            &recipient.get_address(),
            1,
            accumulated,
            spendable,
            &prev_txs,
        )
        .expect("spend");
        node.mempool.add(spend.clone());

        let block = mine_pending(&node).expect("mine");
        assert_eq!(block.height, 1);
        assert!(node.mempool.is_empty());
    }

    #[test]
    fn invalid_mempool_transaction_is_dropped_instead_of_wedging_mining() {
        let miner_wallet = Wallet::new().expect("wallet");
        let (_dir, node, _seed_wallet) = test_node(Some(miner_wallet.get_address()));

        let mut bogus =
            Transaction::new_coinbase_tx(&miner_wallet.get_address(), None).expect("tx");
        bogus.vin[0].vout = 0;
        bogus.vin[0].txid = [9u8; 32];
        node.mempool.add(bogus.clone());

        let err = mine_pending(&node).expect_err("should refuse to mine with nothing valid");
        assert!(matches!(err, Error::InvalidTransaction(_)));
        assert!(!node.mempool.contains(&bogus.id));

        node.mempool.add(
            Transaction::new_coinbase_tx(&Wallet::new().expect("wallet").get_address(), None)
                .expect("tx"),
        );
        assert!(!should_mine(&node));
    }
}
