//! TCP accept loop dispatching each inbound connection to an independent
//! task, plus the startup handshake with the network's seed node.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::error::Result;

use super::client::send_version;
use super::context::Node;
use super::handlers::dispatch;
use super::wire::read_message;

/// Bind `node.config.listen_addr` and serve gossip connections until the
/// process exits. If this node is not the seed, it first announces
/// itself to the seed with a `version` message.
pub async fn run(node: Node) -> Result<()> {
    let listener = TcpListener::bind(node.config.listen_addr).await?;
    info!(addr = %node.config.listen_addr, "node listening");

    if !node.config.is_seed {
        send_version(&node, node.config.seed_addr).await;
    }

    let node = Arc::new(node);
    loop {
        let (mut stream, peer_addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "accept failed");
                continue;
            }
        };

        let node = Arc::clone(&node);
        tokio::spawn(async move {
            match read_message(&mut stream).await {
                Ok((command, body)) => {
                    if let Err(e) = dispatch(&node, peer_addr, &command, &body).await {
                        error!(peer = %peer_addr, command = %command, error = %e, "handler failed");
                    }
                }
                Err(e) => warn!(peer = %peer_addr, error = %e, "failed to read message"),
            }
        });
    }
}
