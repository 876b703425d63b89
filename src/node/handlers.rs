//! Gossip command handlers. Grounded directly in the tutorial's
//! `handleVersion`/`handleAddr`/`handleInv`/`handleGetBlocks`/
//! `handleGetData`/`handleBlock`/`handleTx`, including the two
//! deliberately-preserved quirks: `getdata` for a mempool transaction
//! never evicts it (a peer may ask again before it's mined), and a
//! non-seed, sufficiently-funded miner mines in a loop until its mempool
//! drops back below threshold rather than mining one block per `tx`.

use std::net::SocketAddr;

use tracing::{debug, info, warn};

use crate::chain::UtxoSet;
use crate::error::Result;

use super::client::{broadcast_inv, send_block, send_getblocks, send_getdata, send_tx, send_version};
use super::context::Node;
use super::miner;
use super::protocol::{
    AddrPayload, BlockPayload, GetBlocksPayload, GetDataPayload, InvKind, InvPayload, TxPayload,
    VersionPayload,
};
use super::wire::decode_payload;

pub async fn handle_version(node: &Node, peer_addr: SocketAddr, payload: VersionPayload) {
    if !node.peers.is_known(&payload.addr_from) {
        node.peers.add(payload.addr_from);
    }

    let my_height = node.best_height().unwrap_or(0);
    if my_height < payload.best_height {
        send_getblocks(node, payload.addr_from).await;
    } else if my_height > payload.best_height {
        send_version(node, payload.addr_from).await;
    }
    debug!(peer = %peer_addr, my_height, their_height = payload.best_height, "handled version");
}

pub async fn handle_addr(node: &Node, payload: AddrPayload) {
    node.peers.add_all(payload.addr_list.iter().copied());
    debug!(count = payload.addr_list.len(), "merged known peers");
}

pub async fn handle_inv(node: &Node, payload: InvPayload) {
    if payload.items.is_empty() {
        return;
    }

    match payload.kind {
        InvKind::Block => {
            node.blocks_in_transit.set(payload.items.clone());
            let first = payload.items[0];
            send_getdata(node, payload.addr_from, InvKind::Block, first).await;
            node.blocks_in_transit.remove(&first);
        }
        InvKind::Tx => {
            let txid = payload.items[0];
            if !node.mempool.contains(&txid) {
                send_getdata(node, payload.addr_from, InvKind::Tx, txid).await;
            }
        }
    }
}

pub async fn handle_getblocks(node: &Node, payload: GetBlocksPayload) {
    match node.store.get_block_hashes() {
        Ok(hashes) => super::client::send_inv(node, payload.addr_from, InvKind::Block, hashes).await,
        Err(e) => warn!(error = %e, "failed to list block hashes"),
    }
}

pub async fn handle_getdata(node: &Node, payload: GetDataPayload) {
    match payload.kind {
        InvKind::Block => match node.store.get_block(&payload.id) {
            Ok(Some(block)) => send_block(node, payload.addr_from, block).await,
            Ok(None) => warn!(peer = %payload.addr_from, "requested unknown block"),
            Err(e) => warn!(error = %e, "failed to load requested block"),
        },
        InvKind::Tx => {
            if let Some(tx) = node.mempool.get(&payload.id) {
                send_tx(node, payload.addr_from, tx).await;
            }
        }
    }
}

pub async fn handle_block(node: &Node, payload: BlockPayload) -> Result<()> {
    let block = payload.block;
    node.store.add_block(&block)?;
    info!(height = block.height, hash = %block.hash_hex(), "accepted block from peer");

    if let Some(next) = node.blocks_in_transit.first() {
        send_getdata(node, payload.addr_from, InvKind::Block, next).await;
        node.blocks_in_transit.remove(&next);
    } else {
        UtxoSet::new(&node.store).reindex()?;
    }
    Ok(())
}

pub async fn handle_tx(node: &Node, payload: TxPayload) -> Result<()> {
    let tx = payload.transaction;
    if !node.mempool.contains(&tx.id) {
        node.mempool.add(tx.clone());
    }

    if node.config.is_seed {
        broadcast_inv(node, payload.addr_from, InvKind::Tx, vec![tx.id]).await;
        return Ok(());
    }

    while miner::should_mine(node) {
        let block = node
            .with_mining_lock(miner::mine_pending)
            .await?;
        broadcast_inv(node, node.config.listen_addr, InvKind::Block, vec![block.hash]).await;
    }
    Ok(())
}

/// Decode `body` per `command` and run the matching handler.
pub async fn dispatch(node: &Node, peer_addr: SocketAddr, command: &str, body: &[u8]) -> Result<()> {
    use super::protocol::{CMD_ADDR, CMD_BLOCK, CMD_GETBLOCKS, CMD_GETDATA, CMD_INV, CMD_TX, CMD_VERSION};

    match command {
        CMD_VERSION => {
            let payload: VersionPayload = decode_payload(body)?;
            handle_version(node, peer_addr, payload).await;
        }
        CMD_ADDR => {
            let payload: AddrPayload = decode_payload(body)?;
            handle_addr(node, payload).await;
        }
        CMD_INV => {
            let payload: InvPayload = decode_payload(body)?;
            handle_inv(node, payload).await;
        }
        CMD_GETBLOCKS => {
            let payload: GetBlocksPayload = decode_payload(body)?;
            handle_getblocks(node, payload).await;
        }
        CMD_GETDATA => {
            let payload: GetDataPayload = decode_payload(body)?;
            handle_getdata(node, payload).await;
        }
        CMD_BLOCK => {
            let payload: BlockPayload = decode_payload(body)?;
            handle_block(node, payload).await?;
        }
        CMD_TX => {
            let payload: TxPayload = decode_payload(body)?;
            handle_tx(node, payload).await?;
        }
        other => {
            warn!(command = other, "unknown gossip command");
        }
    }
    Ok(())
}
