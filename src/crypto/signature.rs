//! ECDSA P-256 signing and verification, fixed r||s encoding.

use super::keypair::to_sec1_uncompressed;
use ring::rand::SystemRandom;
use ring::signature::{
    EcdsaKeyPair, UnparsedPublicKey, ECDSA_P256_SHA256_FIXED, ECDSA_P256_SHA256_FIXED_SIGNING,
};

/// Sign `message` with a PKCS#8-encoded ECDSA P-256 private key. Returns
/// the fixed-format signature: 32-byte `r` followed by 32-byte `s`.
pub fn sign(pkcs8: &[u8], message: &[u8]) -> Option<Vec<u8>> {
    let rng = SystemRandom::new();
    let key_pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8, &rng).ok()?;
    let signature = key_pair.sign(&rng, message).ok()?;
    Some(signature.as_ref().to_vec())
}

/// Verify a raw 64-byte `X||Y` public key's signature over `message`.
pub fn verify(raw_pubkey: &[u8], signature: &[u8], message: &[u8]) -> bool {
    let sec1 = to_sec1_uncompressed(raw_pubkey);
    let public_key = UnparsedPublicKey::new(&ECDSA_P256_SHA256_FIXED, sec1);
    public_key.verify(message, signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keypair::new_key_pair;

    #[test]
    fn sign_then_verify_roundtrip() {
        let kp = new_key_pair().expect("keygen");
        let msg = b"deadbeef\n";
        let sig = sign(&kp.private_key, msg).expect("sign");
        assert_eq!(sig.len(), 64);
        assert!(verify(&kp.public_key, &sig, msg));
    }

    #[test]
    fn verify_rejects_wrong_message() {
        let kp = new_key_pair().expect("keygen");
        let sig = sign(&kp.private_key, b"message one").expect("sign");
        assert!(!verify(&kp.public_key, &sig, b"message two"));
    }

    #[test]
    fn verify_rejects_wrong_key() {
        let kp_a = new_key_pair().expect("keygen");
        let kp_b = new_key_pair().expect("keygen");
        let sig = sign(&kp_a.private_key, b"hello").expect("sign");
        assert!(!verify(&kp_b.public_key, &sig, b"hello"));
    }

    #[test]
    fn verify_rejects_tampered_signature() {
        let kp = new_key_pair().expect("keygen");
        let mut sig = sign(&kp.private_key, b"hello").expect("sign");
        sig[0] ^= 0xff;
        assert!(!verify(&kp.public_key, &sig, b"hello"));
    }
}
