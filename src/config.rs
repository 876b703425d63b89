//! Node-wide constants and the per-run configuration struct.
//!
//! The tutorial this was distilled from keeps its node address in a
//! hardcoded constant shared by every node in the process, which only
//! works because its test setup never runs two nodes in one binary. Each
//! [`NodeConfig`] here instead carries its own listen address, set
//! explicitly by the caller, so multiple nodes can coexist.

use std::env;
use std::net::SocketAddr;

use crate::error::{Error, Result};

/// Gossip protocol version advertised in `version` messages.
pub const NODE_VERSION: u32 = 1;

/// Mempool size at which a non-seed node with a mining address configured
/// starts mining the pending transactions into a block.
pub const MEMPOOL_MINING_THRESHOLD: usize = 2;

/// Write timeout applied to outbound peer connections.
pub const TCP_WRITE_TIMEOUT_MS: u64 = 1000;

const DEFAULT_SEED_ADDR: &str = "127.0.0.1:3000";

#[derive(Clone, Debug)]
pub struct NodeConfig {
    /// Address this node listens on.
    pub listen_addr: SocketAddr,
    /// Address of the network's seed node.
    pub seed_addr: SocketAddr,
    /// `true` if this node IS the seed (`listen_addr == seed_addr`).
    pub is_seed: bool,
    /// Address mined coinbase rewards are paid to, if this node mines.
    pub mining_address: Option<String>,
}

impl NodeConfig {
    pub fn new(listen_addr: SocketAddr, mining_address: Option<String>) -> Result<NodeConfig> {
        let seed_addr = seed_addr_from_env()?;
        Ok(NodeConfig {
            listen_addr,
            seed_addr,
            is_seed: listen_addr == seed_addr,
            mining_address,
        })
    }
}

fn seed_addr_from_env() -> Result<SocketAddr> {
    env::var("SEED_NODE")
        .unwrap_or_else(|_| DEFAULT_SEED_ADDR.to_string())
        .parse()
        .map_err(|e| Error::ProtocolError(format!("invalid SEED_NODE address: {e}")))
}
