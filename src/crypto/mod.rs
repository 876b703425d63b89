//! Cryptographic primitives: hashing, key generation, signing, and the
//! address codec built on top of them.

pub mod address;
pub mod hash;
pub mod keypair;
pub mod signature;

pub use address::{address_from_pubkey_hash, base58check_decode, base58check_encode};
pub use hash::{hash_pubkey, sha256_digest};
pub use keypair::{KeyPair, new_key_pair};
pub use signature::{sign, verify};
