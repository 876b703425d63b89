//! Transaction model: inputs, outputs, coinbase and spend construction,
//! and the trimmed-copy ECDSA signing scheme.

use std::collections::HashMap;

use data_encoding::HEXLOWER;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::crypto::address::validate_and_decode_address;
use crate::crypto::hash::{hash_pubkey, sha256_digest};
use crate::crypto::signature::{sign as ecdsa_sign, verify as ecdsa_verify};
use crate::error::{Error, Result};
use crate::wallet::Wallet;

/// Coinbase reward paid per mined block. MUST match across implementations.
pub const SUBSIDY: u64 = 10;

const COINBASE_TXID: [u8; 32] = [0u8; 32];
const COINBASE_VOUT: u32 = u32::MAX;

fn bincode_config() -> bincode::config::Configuration {
    bincode::config::standard()
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TXInput {
    pub txid: [u8; 32],
    pub vout: u32,
    pub signature: Vec<u8>,
    pub pub_key: Vec<u8>,
}

impl TXInput {
    /// `true` for the distinguished coinbase input (no real previous output).
    pub fn is_coinbase_input(&self) -> bool {
        self.txid == COINBASE_TXID && self.vout == COINBASE_VOUT
    }

    /// Does the input's public key hash to `pubkey_hash`? Used to decide
    /// which unspent outputs an input is entitled to spend.
    pub fn uses_key(&self, pubkey_hash: &[u8; 20]) -> bool {
        &hash_pubkey(&self.pub_key) == pubkey_hash
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TXOutput {
    pub value: u64,
    pub pub_key_hash: [u8; 20],
}

impl TXOutput {
    pub fn new(value: u64, address: &str) -> Result<TXOutput> {
        let (_version, pubkey_hash) = validate_and_decode_address(address)?;
        if pubkey_hash.len() != 20 {
            return Err(Error::InvalidAddress(format!(
                "address {address} decodes to a {}-byte hash, expected 20",
                pubkey_hash.len()
            )));
        }
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&pubkey_hash);
        Ok(TXOutput {
            value,
            pub_key_hash: hash,
        })
    }

    pub fn is_locked_with_key(&self, pubkey_hash: &[u8; 20]) -> bool {
        &self.pub_key_hash == pubkey_hash
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub id: [u8; 32],
    pub vin: Vec<TXInput>,
    pub vout: Vec<TXOutput>,
}

impl Transaction {
    /// Build the coinbase transaction that mints the block subsidy.
    ///
    /// `data`, if empty, is replaced with 20 random bytes hex-encoded so
    /// two coinbases mined to the same address at the same height still
    /// get distinct ids.
    pub fn new_coinbase_tx(to_address: &str, data: Option<Vec<u8>>) -> Result<Transaction> {
        let data = match data {
            Some(d) if !d.is_empty() => d,
            _ => {
                let mut random = [0u8; 20];
                rand::rng().fill_bytes(&mut random);
                HEXLOWER.encode(&random).into_bytes()
            }
        };

        let txin = TXInput {
            txid: COINBASE_TXID,
            vout: COINBASE_VOUT,
            signature: Vec::new(),
            pub_key: data,
        };
        let txout = TXOutput::new(SUBSIDY, to_address)?;

        let mut tx = Transaction {
            id: [0u8; 32],
            vin: vec![txin],
            vout: vec![txout],
        };
        tx.id = tx.compute_id()?;
        Ok(tx)
    }

    /// Build a spend transaction from `wallet` to `to_address` for
    /// `amount`, given the spendable-output set found via the UTXO index.
    pub fn new_utxo_transaction(
        wallet: &Wallet,
        to_address: &str,
        amount: u64,
        accumulated: u64,
        spendable: HashMap<[u8; 32], Vec<u32>>,
        prev_txs: &HashMap<[u8; 32], Transaction>,
    ) -> Result<Transaction> {
        if accumulated < amount {
            return Err(Error::InsufficientFunds {
                have: accumulated,
                need: amount,
            });
        }

        let mut vin = Vec::new();
        for (txid, outs) in spendable {
            for vout in outs {
                vin.push(TXInput {
                    txid,
                    vout,
                    signature: Vec::new(),
                    pub_key: wallet.public_key.clone(),
                });
            }
        }

        let mut vout = vec![TXOutput::new(amount, to_address)?];
        if accumulated > amount {
            vout.push(TXOutput::new(accumulated - amount, &wallet.get_address())?);
        }

        let mut tx = Transaction {
            id: [0u8; 32],
            vin,
            vout,
        };
        tx.id = tx.compute_id()?;
        tx.sign(&wallet.private_key, prev_txs)?;
        Ok(tx)
    }

    /// `true` iff this is the distinguished coinbase transaction: exactly
    /// one input whose previous txid/vout are the coinbase sentinels.
    pub fn is_coinbase(&self) -> bool {
        self.vin.len() == 1 && self.vin[0].is_coinbase_input()
    }

    fn compute_id(&self) -> Result<[u8; 32]> {
        let mut copy = self.clone();
        copy.id = [0u8; 32];
        let bytes = bincode::serde::encode_to_vec(&copy, bincode_config())?;
        let digest = sha256_digest(&bytes);
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        Ok(out)
    }

    /// A copy with every input's signature and public key blanked, used
    /// as the basis of the per-input signing/verification message.
    pub fn trimmed_copy(&self) -> Transaction {
        let vin = self
            .vin
            .iter()
            .map(|input| TXInput {
                txid: input.txid,
                vout: input.vout,
                signature: Vec::new(),
                pub_key: Vec::new(),
            })
            .collect();
        Transaction {
            id: self.id,
            vin,
            vout: self.vout.clone(),
        }
    }

    fn signing_message(trimmed: &Transaction) -> Result<Vec<u8>> {
        let bytes = bincode::serde::encode_to_vec(trimmed, bincode_config())?;
        let mut message = HEXLOWER.encode(&bytes).into_bytes();
        message.push(b'\n');
        Ok(message)
    }

    /// Sign every non-coinbase input under the trimmed-copy scheme
    /// described in the module docs: for each input, temporarily set its
    /// copy's `pub_key` to the referenced previous output's pubkey hash,
    /// sign the hex+newline serialization of the copy, then blank it again
    /// before moving to the next input. Coinbase signing is a no-op.
    pub fn sign(
        &mut self,
        private_key: &[u8],
        prev_txs: &HashMap<[u8; 32], Transaction>,
    ) -> Result<()> {
        if self.is_coinbase() {
            return Ok(());
        }

        for input in &self.vin {
            if !prev_txs.contains_key(&input.txid) {
                return Err(Error::CorruptedDatabase(format!(
                    "could not resolve previous transaction {}",
                    HEXLOWER.encode(&input.txid)
                )));
            }
        }

        let mut trimmed = self.trimmed_copy();
        for i in 0..self.vin.len() {
            let prev_tx = &prev_txs[&self.vin[i].txid];
            let prev_out = &prev_tx.vout[self.vin[i].vout as usize];

            trimmed.vin[i].pub_key = prev_out.pub_key_hash.to_vec();

            let message = Self::signing_message(&trimmed)?;
            let signature = ecdsa_sign(private_key, &message)
                .ok_or_else(|| Error::InvalidTransaction("signing failed".to_string()))?;
            self.vin[i].signature = signature;

            trimmed.vin[i].pub_key = Vec::new();
        }
        Ok(())
    }

    /// Verify every non-coinbase input's signature. Coinbases verify
    /// unconditionally. Failure to resolve a referenced previous
    /// transaction is a fatal condition, not a verification failure.
    pub fn verify(&self, prev_txs: &HashMap<[u8; 32], Transaction>) -> Result<bool> {
        if self.is_coinbase() {
            return Ok(true);
        }

        for input in &self.vin {
            if !prev_txs.contains_key(&input.txid) {
                return Err(Error::CorruptedDatabase(format!(
                    "could not resolve previous transaction {}",
                    HEXLOWER.encode(&input.txid)
                )));
            }
        }

        let mut trimmed = self.trimmed_copy();
        for i in 0..self.vin.len() {
            let input = &self.vin[i];
            let prev_tx = &prev_txs[&input.txid];
            let prev_out = &prev_tx.vout[input.vout as usize];

            trimmed.vin[i].pub_key = prev_out.pub_key_hash.to_vec();

            let message = Self::signing_message(&trimmed)?;
            if !ecdsa_verify(&input.pub_key, &input.signature, &message) {
                return Ok(false);
            }

            trimmed.vin[i].pub_key = Vec::new();
        }
        Ok(true)
    }

    pub fn id_hex(&self) -> String {
        HEXLOWER.encode(&self.id)
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        Ok(bincode::serde::encode_to_vec(self, bincode_config())?)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Transaction> {
        let (tx, _) = bincode::serde::decode_from_slice(bytes, bincode_config())?;
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::Wallet;

    fn new_test_wallet() -> Wallet {
        Wallet::new().expect("wallet generation")
    }

    #[test]
    fn coinbase_is_recognized() {
        let wallet = new_test_wallet();
        let tx = Transaction::new_coinbase_tx(&wallet.get_address(), None).expect("coinbase");
        assert!(tx.is_coinbase());
        assert_eq!(tx.vout[0].value, SUBSIDY);
    }

    #[test]
    fn two_coinbases_to_same_address_have_different_ids() {
        let wallet = new_test_wallet();
        let a = Transaction::new_coinbase_tx(&wallet.get_address(), None).expect("coinbase");
        let b = Transaction::new_coinbase_tx(&wallet.get_address(), None).expect("coinbase");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn serialize_roundtrip() {
        let wallet = new_test_wallet();
        let tx = Transaction::new_coinbase_tx(&wallet.get_address(), None).expect("coinbase");
        let bytes = tx.serialize().expect("serialize");
        let back = Transaction::deserialize(&bytes).expect("deserialize");
        assert_eq!(tx, back);
    }

    #[test]
    fn spend_signs_and_verifies() {
        let sender = new_test_wallet();
        let recipient = new_test_wallet();

        let coinbase =
            Transaction::new_coinbase_tx(&sender.get_address(), None).expect("coinbase");
        let mut prev_txs = HashMap::new();
        prev_txs.insert(coinbase.id, coinbase.clone());

        let mut spendable = HashMap::new();
        spendable.insert(coinbase.id, vec![0u32]);

        let spend = Transaction::new_utxo_transaction(
            &sender,
            &recipient.get_address(),
            4,
            SUBSIDY,
            spendable,
            &prev_txs,
        )
        .expect("spend");

        assert!(spend.verify(&prev_txs).expect("verify"));
        assert_eq!(spend.vout[0].value, 4);
        assert_eq!(spend.vout[1].value, SUBSIDY - 4);
    }

    #[test]
    fn verify_fails_if_signature_replaced() {
        let sender = new_test_wallet();
        let recipient = new_test_wallet();

        let coinbase =
            Transaction::new_coinbase_tx(&sender.get_address(), None).expect("coinbase");
        let mut prev_txs = HashMap::new();
        prev_txs.insert(coinbase.id, coinbase.clone());

        let mut spendable = HashMap::new();
        spendable.insert(coinbase.id, vec![0u32]);

        let mut spend = Transaction::new_utxo_transaction(
            &sender,
            &recipient.get_address(),
            4,
            SUBSIDY,
            spendable,
            &prev_txs,
        )
        .expect("spend");

        let other = new_test_wallet();
        let bogus_sig = crate::crypto::signature::sign(&other.private_key, b"wrong\n").unwrap();
        spend.vin[0].signature = bogus_sig;

        assert!(!spend.verify(&prev_txs).expect("verify"));
    }

    #[test]
    fn insufficient_funds_is_rejected() {
        let sender = new_test_wallet();
        let recipient = new_test_wallet();
        let coinbase =
            Transaction::new_coinbase_tx(&sender.get_address(), None).expect("coinbase");
        let mut prev_txs = HashMap::new();
        prev_txs.insert(coinbase.id, coinbase.clone());
        let mut spendable = HashMap::new();
        spendable.insert(coinbase.id, vec![0u32]);

        let err = Transaction::new_utxo_transaction(
            &sender,
            &recipient.get_address(),
            100,
            SUBSIDY,
            spendable,
            &prev_txs,
        )
        .expect_err("should fail");
        assert!(matches!(err, Error::InsufficientFunds { .. }));
    }
}
