//! Known-peer table.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::RwLock;

/// Mutex-guarded set of known peer addresses, shared across a node's
/// accept loop and outbound gossip tasks.
#[derive(Default)]
pub struct Peers {
    inner: RwLock<HashSet<SocketAddr>>,
}

impl Peers {
    pub fn new() -> Peers {
        Peers {
            inner: RwLock::new(HashSet::new()),
        }
    }

    pub fn add(&self, addr: SocketAddr) {
        self.inner.write().expect("peers lock poisoned").insert(addr);
    }

    pub fn add_all(&self, addrs: impl IntoIterator<Item = SocketAddr>) {
        let mut guard = self.inner.write().expect("peers lock poisoned");
        guard.extend(addrs);
    }

    pub fn evict(&self, addr: &SocketAddr) {
        self.inner.write().expect("peers lock poisoned").remove(addr);
    }

    pub fn is_known(&self, addr: &SocketAddr) -> bool {
        self.inner.read().expect("peers lock poisoned").contains(addr)
    }

    pub fn all(&self) -> Vec<SocketAddr> {
        self.inner.read().expect("peers lock poisoned").iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("peers lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_evict() {
        let peers = Peers::new();
        let addr: SocketAddr = "127.0.0.1:4000".parse().unwrap();
        peers.add(addr);
        assert!(peers.is_known(&addr));
        peers.evict(&addr);
        assert!(!peers.is_known(&addr));
    }

    #[test]
    fn add_all_is_additive() {
        let peers = Peers::new();
        let a: SocketAddr = "127.0.0.1:4001".parse().unwrap();
        let b: SocketAddr = "127.0.0.1:4002".parse().unwrap();
        peers.add(a);
        peers.add_all([a, b]);
        assert_eq!(peers.len(), 2);
    }
}
