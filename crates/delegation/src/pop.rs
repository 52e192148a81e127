//! Proof that the owner of a host chain key also controls a bitcoin key.

use bitcoin::XOnlyPublicKey;
use btc_staking_primitives::{
    errors::SignatureError,
    secp::{sign_schnorr, verify_schnorr},
};
use secp256k1::{schnorr, Message, PublicKey, SecretKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A BIP-340 signature by the bitcoin key over `sha256(host public key)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProofOfPossession {
    /// The signature of the bitcoin key.
    pub btc_sig: schnorr::Signature,
}

impl ProofOfPossession {
    /// Proves possession of `btc_sk` on behalf of `host_pk`.
    pub fn new(host_pk: &PublicKey, btc_sk: &SecretKey) -> Self {
        Self {
            btc_sig: sign_schnorr(btc_sk, &pop_message(host_pk)),
        }
    }

    /// Verifies that `btc_pk` signed `host_pk`.
    pub fn verify(&self, host_pk: &PublicKey, btc_pk: &XOnlyPublicKey) -> Result<(), SignatureError> {
        verify_schnorr(btc_pk, &pop_message(host_pk), &self.btc_sig)
    }
}

fn pop_message(host_pk: &PublicKey) -> Message {
    let digest: [u8; 32] = Sha256::digest(host_pk.serialize()).into();

    Message::from_digest(digest)
}
