//! Base58Check address codec.

use super::hash::double_sha256;
use crate::error::{Error, Result};

/// Address version byte. MUST stay `0x00` for interoperability.
pub const VERSION: u8 = 0x00;
/// Checksum length in bytes.
pub const CHECKSUM_LEN: usize = 4;

fn checksum(versioned_payload: &[u8]) -> [u8; CHECKSUM_LEN] {
    let digest = double_sha256(versioned_payload);
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&digest[..CHECKSUM_LEN]);
    out
}

/// Encode a 20-byte pubkey hash as a Base58Check address string.
pub fn address_from_pubkey_hash(pubkey_hash: &[u8]) -> String {
    let mut versioned = Vec::with_capacity(1 + pubkey_hash.len());
    versioned.push(VERSION);
    versioned.extend_from_slice(pubkey_hash);

    let check = checksum(&versioned);
    let mut full = versioned;
    full.extend_from_slice(&check);

    bs58::encode(full).into_string()
}

/// Decode a Base58Check address into `(version, pubkey_hash)`, verifying
/// the checksum. Returns `Error::InvalidAddress` on malformed base58 or a
/// checksum mismatch.
pub fn validate_and_decode_address(address: &str) -> Result<(u8, Vec<u8>)> {
    let full = bs58::decode(address)
        .into_vec()
        .map_err(|e| Error::InvalidAddress(e.to_string()))?;

    if full.len() < 1 + CHECKSUM_LEN {
        return Err(Error::InvalidAddress("address too short".to_string()));
    }

    let (versioned, actual_checksum) = full.split_at(full.len() - CHECKSUM_LEN);
    let expected_checksum = checksum(versioned);
    if expected_checksum.as_slice() != actual_checksum {
        return Err(Error::InvalidAddress("checksum mismatch".to_string()));
    }

    let version = versioned[0];
    let pubkey_hash = versioned[1..].to_vec();
    Ok((version, pubkey_hash))
}

/// `true` iff `address` base58-decodes, has the expected length, and its
/// checksum verifies.
pub fn validate_address(address: &str) -> bool {
    validate_and_decode_address(address).is_ok()
}

/// Encode raw bytes as Base58Check with an explicit version byte. Exposed
/// for callers (tests, diagnostics) that already have a version+payload.
pub fn base58check_encode(version: u8, payload: &[u8]) -> String {
    let mut versioned = Vec::with_capacity(1 + payload.len());
    versioned.push(version);
    versioned.extend_from_slice(payload);
    let check = checksum(&versioned);
    let mut full = versioned;
    full.extend_from_slice(&check);
    bs58::encode(full).into_string()
}

/// Inverse of [`base58check_encode`].
pub fn base58check_decode(address: &str) -> Result<(u8, Vec<u8>)> {
    validate_and_decode_address(address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::hash_pubkey;

    #[test]
    fn address_roundtrip() {
        let pubkey = b"fake 64 byte public key padded to look plausible..............";
        let hash = hash_pubkey(pubkey);
        let address = address_from_pubkey_hash(&hash);
        assert!(validate_address(&address));

        let (version, decoded_hash) = validate_and_decode_address(&address).expect("decode");
        assert_eq!(version, VERSION);
        assert_eq!(decoded_hash, hash.to_vec());
    }

    #[test]
    fn mutated_address_fails_validation() {
        let pubkey = b"another fake public key, 64 bytes of filler to pad it out......";
        let hash = hash_pubkey(pubkey);
        let mut address = address_from_pubkey_hash(&hash).into_bytes();
        // Flip one character near the end (checksum region).
        let last = address.len() - 1;
        address[last] = if address[last] == b'1' { b'2' } else { b'1' };
        let mutated = String::from_utf8(address).unwrap();
        assert!(!validate_address(&mutated));
    }

    #[test]
    fn garbage_input_is_invalid() {
        assert!(!validate_address("not-a-valid-base58-address!!"));
    }
}
