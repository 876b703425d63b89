//! ECDSA P-256 key pair generation.
//!
//! Keys are generated through `ring`'s PKCS#8 document API. `ring` hands
//! back an uncompressed SEC1 public key (`0x04 || X || Y`, 65 bytes); we
//! strip the leading tag so the public key stored on wallets and transaction
//! inputs is the raw 64-byte `X || Y` concatenation, and re-add the tag at
//! the boundary whenever we need to hand the key back to `ring`.

use crate::error::{Error, Result};
use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, KeyPair as _, ECDSA_P256_SHA256_FIXED_SIGNING};

/// An ECDSA P-256 key pair: a PKCS#8 private key document and the raw
/// 64-byte `X || Y` public key.
#[derive(Clone, Debug)]
pub struct KeyPair {
    pub private_key: Vec<u8>,
    pub public_key: Vec<u8>,
}

/// Generate a new ECDSA P-256 key pair.
pub fn new_key_pair() -> Result<KeyPair> {
    let rng = SystemRandom::new();
    let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &rng)
        .map_err(|e| Error::CorruptedDatabase(format!("key generation failed: {e}")))?;
    let key_pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8.as_ref(), &rng)
        .map_err(|e| Error::CorruptedDatabase(format!("key parsing failed: {e}")))?;

    let sec1 = key_pair.public_key().as_ref();
    if sec1.len() != 65 || sec1[0] != 0x04 {
        return Err(Error::CorruptedDatabase(
            "unexpected public key encoding".to_string(),
        ));
    }

    Ok(KeyPair {
        private_key: pkcs8.as_ref().to_vec(),
        public_key: sec1[1..].to_vec(),
    })
}

/// Re-add the `0x04` SEC1 uncompressed-point tag stripped off by
/// [`new_key_pair`], for handing a raw 64-byte public key back to `ring`.
pub fn to_sec1_uncompressed(raw_pubkey: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(65);
    out.push(0x04);
    out.extend_from_slice(raw_pubkey);
    out
}
