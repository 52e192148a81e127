//! SECP256K1 primitives.

use std::ops::Deref;

use secp256k1::{schnorr, Keypair, Message, Parity, SecretKey, XOnlyPublicKey, SECP256K1};

use crate::errors::SignatureError;

/// A secret key that is guaranteed to have a even x-only public key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvenSecretKey(SecretKey);

impl EvenSecretKey {
    /// Returns the wrapped secret key.
    pub const fn into_inner(self) -> SecretKey {
        self.0
    }
}

impl Deref for EvenSecretKey {
    type Target = SecretKey;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<SecretKey> for EvenSecretKey {
    fn as_ref(&self) -> &SecretKey {
        &self.0
    }
}

impl From<SecretKey> for EvenSecretKey {
    fn from(value: SecretKey) -> Self {
        match value.x_only_public_key(SECP256K1).1 == Parity::Odd {
            true => Self(value.negate()),
            false => Self(value),
        }
    }
}

/// Produces a BIP-340 signature over `msg`.
pub fn sign_schnorr(sk: &SecretKey, msg: &Message) -> schnorr::Signature {
    let keypair = Keypair::from_secret_key(SECP256K1, sk);

    SECP256K1.sign_schnorr(msg, &keypair)
}

/// Verifies a BIP-340 signature over `msg`.
pub fn verify_schnorr(
    pk: &XOnlyPublicKey,
    msg: &Message,
    sig: &schnorr::Signature,
) -> Result<(), SignatureError> {
    SECP256K1
        .verify_schnorr(sig, msg, pk)
        .map_err(|_| SignatureError::Verification)
}
