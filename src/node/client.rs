//! Outbound gossip: one short-lived TCP connection per message, mirroring
//! the tutorial's `sendData`. A peer that refuses a connection is evicted
//! from the known-peers table; there is no retry.

use std::net::SocketAddr;
use std::time::Duration;

use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::warn;

use crate::chain::{Block, Transaction};
use crate::config::{NODE_VERSION, TCP_WRITE_TIMEOUT_MS};

use super::context::Node;
use super::protocol::{
    AddrPayload, BlockPayload, GetBlocksPayload, GetDataPayload, InvKind, InvPayload, TxPayload,
    VersionPayload, CMD_ADDR, CMD_BLOCK, CMD_GETBLOCKS, CMD_GETDATA, CMD_INV, CMD_TX, CMD_VERSION,
};
use super::wire::write_message;

async fn send_data<T: Serialize>(node: &Node, to: SocketAddr, command: &str, payload: &T) {
    let attempt = async {
        let mut stream = TcpStream::connect(to).await?;
        write_message(&mut stream, command, payload).await?;
        stream.shutdown().await.map_err(crate::error::Error::from)
    };

    match timeout(Duration::from_millis(TCP_WRITE_TIMEOUT_MS), attempt).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            warn!(peer = %to, error = %e, "send failed, evicting peer");
            node.peers.evict(&to);
        }
        Err(_) => {
            warn!(peer = %to, "send timed out, evicting peer");
            node.peers.evict(&to);
        }
    }
}

pub async fn send_version(node: &Node, to: SocketAddr) {
    let best_height = node.best_height().unwrap_or(0);
    let payload = VersionPayload {
        version: NODE_VERSION,
        best_height,
        addr_from: node.config.listen_addr,
    };
    send_data(node, to, CMD_VERSION, &payload).await;
}

pub async fn send_addr(node: &Node, to: SocketAddr, addr_list: Vec<SocketAddr>) {
    send_data(node, to, CMD_ADDR, &AddrPayload { addr_list }).await;
}

pub async fn send_inv(node: &Node, to: SocketAddr, kind: InvKind, items: Vec<[u8; 32]>) {
    let payload = InvPayload {
        addr_from: node.config.listen_addr,
        kind,
        items,
    };
    send_data(node, to, CMD_INV, &payload).await;
}

pub async fn send_getblocks(node: &Node, to: SocketAddr) {
    let payload = GetBlocksPayload {
        addr_from: node.config.listen_addr,
    };
    send_data(node, to, CMD_GETBLOCKS, &payload).await;
}

pub async fn send_getdata(node: &Node, to: SocketAddr, kind: InvKind, id: [u8; 32]) {
    let payload = GetDataPayload {
        addr_from: node.config.listen_addr,
        kind,
        id,
    };
    send_data(node, to, CMD_GETDATA, &payload).await;
}

pub async fn send_block(node: &Node, to: SocketAddr, block: Block) {
    let payload = BlockPayload {
        addr_from: node.config.listen_addr,
        block,
    };
    send_data(node, to, CMD_BLOCK, &payload).await;
}

pub async fn send_tx(node: &Node, to: SocketAddr, transaction: Transaction) {
    let payload = TxPayload {
        addr_from: node.config.listen_addr,
        transaction,
    };
    send_data(node, to, CMD_TX, &payload).await;
}

/// Broadcast `items` as an `inv` to every known peer but `except`.
pub async fn broadcast_inv(node: &Node, except: SocketAddr, kind: InvKind, items: Vec<[u8; 32]>) {
    for peer in node.peers.all() {
        if peer == except {
            continue;
        }
        send_inv(node, peer, kind, items.clone()).await;
    }
}
