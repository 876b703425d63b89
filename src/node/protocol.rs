//! Gossip message payloads. Each is bincode-encoded and framed by
//! [`super::wire`] under its command name.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::chain::{Block, Transaction};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum InvKind {
    Block,
    Tx,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VersionPayload {
    pub version: u32,
    pub best_height: u64,
    pub addr_from: SocketAddr,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AddrPayload {
    pub addr_list: Vec<SocketAddr>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InvPayload {
    pub addr_from: SocketAddr,
    pub kind: InvKind,
    pub items: Vec<[u8; 32]>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GetBlocksPayload {
    pub addr_from: SocketAddr,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GetDataPayload {
    pub addr_from: SocketAddr,
    pub kind: InvKind,
    pub id: [u8; 32],
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockPayload {
    pub addr_from: SocketAddr,
    pub block: Block,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TxPayload {
    pub addr_from: SocketAddr,
    pub transaction: Transaction,
}

pub const CMD_VERSION: &str = "version";
pub const CMD_ADDR: &str = "addr";
pub const CMD_INV: &str = "inv";
pub const CMD_GETBLOCKS: &str = "getblocks";
pub const CMD_GETDATA: &str = "getdata";
pub const CMD_BLOCK: &str = "block";
pub const CMD_TX: &str = "tx";
