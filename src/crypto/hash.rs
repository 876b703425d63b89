//! SHA-256 and RIPEMD-160 digests.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// SHA-256 of `data`.
pub fn sha256_digest(data: &[u8]) -> Vec<u8> {
    let mut ctx = ring::digest::Context::new(&ring::digest::SHA256);
    ctx.update(data);
    ctx.finish().as_ref().to_vec()
}

/// Double SHA-256, used for address checksums.
pub fn double_sha256(data: &[u8]) -> Vec<u8> {
    sha256_digest(&sha256_digest(data))
}

/// `RIPEMD160(SHA256(pubkey))`, the 20-byte lock used by addresses and
/// transaction outputs.
pub fn hash_pubkey(pubkey: &[u8]) -> [u8; 20] {
    let sha = sha256_digest(pubkey);
    let mut hasher = Ripemd160::new();
    hasher.update(sha);
    let result = hasher.finalize();
    let mut out = [0u8; 20];
    out.copy_from_slice(&result);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_is_deterministic() {
        let a = sha256_digest(b"hello");
        let b = sha256_digest(b"hello");
        assert_eq!(a, b);
    }

    #[test]
    fn sha256_distinguishes_inputs() {
        assert_ne!(sha256_digest(b"hello"), sha256_digest(b"hellp"));
    }

    #[test]
    fn sha256_empty_input() {
        let digest = sha256_digest(b"");
        assert_eq!(digest.len(), 32);
    }

    #[test]
    fn hash_pubkey_is_20_bytes_and_deterministic() {
        let pk = b"some fake 64 byte public key padded out to look right............";
        let h1 = hash_pubkey(pk);
        let h2 = hash_pubkey(pk);
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 20);
    }

    #[test]
    fn hash_pubkey_avalanche() {
        let h1 = hash_pubkey(b"abc");
        let h2 = hash_pubkey(b"abd");
        assert_ne!(h1, h2);
    }
}
