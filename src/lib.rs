pub mod chain;
pub mod config;
pub mod crypto;
pub mod error;
pub mod node;
pub mod wallet;

pub use chain::{Block, ChainStore, TXInput, TXOutput, Transaction, UtxoSet};
pub use config::NodeConfig;
pub use error::{Error, Result};
pub use node::Node;
pub use wallet::{Wallet, WalletStore};
