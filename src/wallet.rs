//! Wallet keypair and address derivation.
//!
//! Keystore persistence (loading/saving a collection of wallets to disk)
//! is treated as a thin adapter over this type rather than part of the
//! core model; [`WalletStore`] here is the minimal in-memory surface a
//! CLI or RPC layer can build on.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::crypto::address::address_from_pubkey_hash;
use crate::crypto::hash::hash_pubkey;
use crate::crypto::keypair::new_key_pair;
use crate::error::Result;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Wallet {
    pub private_key: Vec<u8>,
    pub public_key: Vec<u8>,
}

impl Wallet {
    pub fn new() -> Result<Wallet> {
        let kp = new_key_pair()?;
        Ok(Wallet {
            private_key: kp.private_key,
            public_key: kp.public_key,
        })
    }

    pub fn pubkey_hash(&self) -> [u8; 20] {
        hash_pubkey(&self.public_key)
    }

    pub fn get_address(&self) -> String {
        address_from_pubkey_hash(&self.pubkey_hash())
    }
}

/// In-memory keyed collection of wallets. Disk persistence is left to
/// callers (CLI, RPC) that know the deployment's storage conventions.
#[derive(Default)]
pub struct WalletStore {
    wallets: HashMap<String, Wallet>,
}

impl WalletStore {
    pub fn new() -> WalletStore {
        WalletStore {
            wallets: HashMap::new(),
        }
    }

    pub fn create_wallet(&mut self) -> Result<String> {
        let wallet = Wallet::new()?;
        let address = wallet.get_address();
        self.wallets.insert(address.clone(), wallet);
        Ok(address)
    }

    pub fn get_addresses(&self) -> Vec<String> {
        self.wallets.keys().cloned().collect()
    }

    pub fn get_wallet(&self, address: &str) -> Option<&Wallet> {
        self.wallets.get(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_is_stable_for_a_given_key() {
        let wallet = Wallet::new().expect("wallet generation");
        let a = wallet.get_address();
        let b = wallet.get_address();
        assert_eq!(a, b);
    }

    #[test]
    fn two_wallets_get_different_addresses() {
        let a = Wallet::new().expect("wallet generation");
        let b = Wallet::new().expect("wallet generation");
        assert_ne!(a.get_address(), b.get_address());
    }

    #[test]
    fn store_round_trips_a_created_wallet() {
        let mut store = WalletStore::new();
        let address = store.create_wallet().expect("create");
        assert!(store.get_wallet(&address).is_some());
        assert_eq!(store.get_addresses(), vec![address]);
    }
}
