//! Schnorr adaptor signatures over secp256k1.
//!
//! An adaptor signature is a BIP-340 signature that is "encrypted" under an encryption key
//! `T = t*G`. Anyone can check it against the signer's public key and `T`, but it only becomes a
//! valid BIP-340 signature once it is decrypted with `t`. Conversely, anyone holding both the
//! adaptor signature and the decrypted signature can recover `t`.
//!
//! Covenant members encrypt their signatures on slashing transactions under the finality
//! provider's key. If the finality provider ever leaks its secret key, the slashing transaction
//! can be completed by anyone.

use std::{fmt, str::FromStr};

use secp256k1::{
    constants::CURVE_ORDER, schnorr, Message, Parity, PublicKey, Scalar, SecretKey,
    XOnlyPublicKey, SECP256K1,
};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use sha2::{Digest, Sha256};

use crate::{
    constants::{ADAPTOR_NONCE_TAG, ADAPTOR_SIGNATURE_SIZE, BIP340_CHALLENGE_TAG},
    errors::SignatureError,
    secp::EvenSecretKey,
};

/// The public point `T` under which an adaptor signature is encrypted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct EncryptionKey(PublicKey);

impl EncryptionKey {
    /// Lifts a BIP-340 public key to the point with even y-coordinate.
    ///
    /// This is how a finality provider's key is used as an encryption key.
    pub fn from_x_only(pk: XOnlyPublicKey) -> Self {
        Self(pk.public_key(Parity::Even))
    }

    /// Parses a 33-byte compressed point.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SignatureError> {
        PublicKey::from_slice(bytes)
            .map(Self)
            .map_err(|_| SignatureError::Malformed("encryption key"))
    }

    /// Returns the 33-byte compressed encoding.
    pub fn serialize(&self) -> [u8; 33] {
        self.0.serialize()
    }

    /// Returns the underlying point.
    pub const fn as_public_key(&self) -> &PublicKey {
        &self.0
    }
}

impl From<PublicKey> for EncryptionKey {
    fn from(pk: PublicKey) -> Self {
        Self(pk)
    }
}

impl fmt::Display for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.serialize()))
    }
}

impl FromStr for EncryptionKey {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| SignatureError::Malformed("encryption key"))?;

        Self::from_slice(&bytes)
    }
}

/// The secret scalar `t` that decrypts an adaptor signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecryptionKey(SecretKey);

impl DecryptionKey {
    /// Creates a decryption key from a secret key.
    ///
    /// The key is negated if needed so that its [`EncryptionKey`] has an even y-coordinate, i.e.
    /// it matches [`EncryptionKey::from_x_only`] of the corresponding BIP-340 public key.
    pub fn new(sk: SecretKey) -> Self {
        Self(EvenSecretKey::from(sk).into_inner())
    }

    /// Parses a 32-byte secret scalar.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SignatureError> {
        SecretKey::from_slice(bytes)
            .map(Self)
            .map_err(|_| SignatureError::Malformed("decryption key"))
    }

    /// Returns the encryption key `T = t*G`.
    pub fn encryption_key(&self) -> EncryptionKey {
        EncryptionKey(PublicKey::from_secret_key(SECP256K1, &self.0))
    }

    /// Returns the underlying secret key.
    pub const fn as_secret_key(&self) -> &SecretKey {
        &self.0
    }
}

/// A Schnorr signature encrypted under an [`EncryptionKey`].
///
/// Serialized as `R (33) || s' (32) || need_negation (1)` where `R = R' + T` is the public nonce
/// of the eventual BIP-340 signature and `need_negation` records whether the secret nonce was
/// negated to make `R` even.
#[derive(Debug, Clone, Copy, PartialEq, Eq, SerializeDisplay, DeserializeFromStr)]
pub struct AdaptorSignature {
    r: PublicKey,
    s_hat: SecretKey,
    need_negation: bool,
}

impl AdaptorSignature {
    /// Produces an adaptor signature over `msg` with `sk`, encrypted under `enc_key`.
    ///
    /// The nonce is derived deterministically from the secret key, the encryption key and the
    /// message, so signing the same inputs twice yields the same signature.
    pub fn enc_sign(
        sk: &SecretKey,
        enc_key: &EncryptionKey,
        msg: &Message,
    ) -> Result<Self, SignatureError> {
        let sk = EvenSecretKey::from(*sk);
        let (pk, _) = sk.x_only_public_key(SECP256K1);

        let k = derive_nonce(&sk, &pk, enc_key, msg)?;
        let r_hat = PublicKey::from_secret_key(SECP256K1, &k);
        let r = r_hat.combine(&enc_key.0)?;

        let need_negation = r.x_only_public_key().1 == Parity::Odd;
        let k = if need_negation { k.negate() } else { k };

        let e = challenge(&r.x_only_public_key().0, &pk, msg)?;
        let ed = sk.into_inner().mul_tweak(&e)?;
        let s_hat = k.add_tweak(&Scalar::from(ed))?;

        Ok(Self {
            r,
            s_hat,
            need_negation,
        })
    }

    /// Checks that this adaptor signature decrypts to a valid signature of `pk` over `msg` when
    /// decrypted with the secret behind `enc_key`.
    pub fn enc_verify(
        &self,
        pk: &XOnlyPublicKey,
        enc_key: &EncryptionKey,
        msg: &Message,
    ) -> Result<(), SignatureError> {
        let (r_x, r_parity) = self.r.x_only_public_key();
        if (r_parity == Parity::Odd) != self.need_negation {
            return Err(SignatureError::Verification);
        }

        let e = challenge(&r_x, pk, msg)?;
        let minus_ep = pk
            .public_key(Parity::Even)
            .mul_tweak(SECP256K1, &e)?
            .negate(SECP256K1);

        // R' = s'*G - e*P, negated back if the nonce was negated while signing
        let r_hat = PublicKey::from_secret_key(SECP256K1, &self.s_hat)
            .combine(&minus_ep)
            .map_err(|_| SignatureError::Verification)?;
        let r_hat = if self.need_negation {
            r_hat.negate(SECP256K1)
        } else {
            r_hat
        };

        match r_hat.combine(&enc_key.0) {
            Ok(r) if r == self.r => Ok(()),
            _ => Err(SignatureError::Verification),
        }
    }

    /// Decrypts into a BIP-340 signature.
    pub fn decrypt(&self, dec_key: &DecryptionKey) -> Result<schnorr::Signature, SignatureError> {
        let t = if self.need_negation {
            dec_key.0.negate()
        } else {
            dec_key.0
        };
        let s = self.s_hat.add_tweak(&Scalar::from(t))?;

        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&self.r.x_only_public_key().0.serialize());
        bytes[32..].copy_from_slice(&s.secret_bytes());

        schnorr::Signature::from_slice(&bytes).map_err(|_| SignatureError::Malformed("signature"))
    }

    /// Recovers the decryption key from the BIP-340 signature this adaptor signature was
    /// decrypted into.
    pub fn recover(&self, sig: &schnorr::Signature) -> Result<DecryptionKey, SignatureError> {
        let bytes = sig.serialize();
        if bytes[..32] != self.r.x_only_public_key().0.serialize() {
            return Err(SignatureError::Mismatch);
        }

        let s = SecretKey::from_slice(&bytes[32..]).map_err(|_| SignatureError::Mismatch)?;
        let t = s
            .add_tweak(&Scalar::from(self.s_hat.negate()))
            .map_err(|_| SignatureError::Mismatch)?;

        Ok(DecryptionKey(if self.need_negation {
            t.negate()
        } else {
            t
        }))
    }

    /// Returns the 65-byte encoding.
    pub fn serialize(&self) -> [u8; ADAPTOR_SIGNATURE_SIZE] {
        let mut bytes = [0u8; ADAPTOR_SIGNATURE_SIZE];
        bytes[..33].copy_from_slice(&self.r.serialize());
        bytes[33..65].copy_from_slice(&self.s_hat.secret_bytes());
        bytes[64] = self.need_negation as u8;

        bytes
    }

    /// Parses the 65-byte encoding.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SignatureError> {
        if bytes.len() != ADAPTOR_SIGNATURE_SIZE {
            return Err(SignatureError::Malformed("adaptor signature length"));
        }

        let r = PublicKey::from_slice(&bytes[..33])
            .map_err(|_| SignatureError::Malformed("adaptor signature nonce"))?;
        let s_hat = SecretKey::from_slice(&bytes[33..65])
            .map_err(|_| SignatureError::Malformed("adaptor signature scalar"))?;
        let need_negation = match bytes[64] {
            0 => false,
            1 => true,
            _ => return Err(SignatureError::Malformed("adaptor signature negation flag")),
        };

        Ok(Self {
            r,
            s_hat,
            need_negation,
        })
    }
}

impl fmt::Display for AdaptorSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.serialize()))
    }
}

impl FromStr for AdaptorSignature {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| SignatureError::Malformed("adaptor signature"))?;

        Self::from_slice(&bytes)
    }
}

/// BIP-340 tagged hash: `sha256(sha256(tag) || sha256(tag) || chunks...)`.
pub fn tagged_hash(tag: &str, chunks: &[&[u8]]) -> [u8; 32] {
    let tag_hash = Sha256::digest(tag.as_bytes());

    let mut hasher = Sha256::new();
    hasher.update(tag_hash);
    hasher.update(tag_hash);
    for chunk in chunks {
        hasher.update(chunk);
    }

    hasher.finalize().into()
}

/// Reduces a 32-byte big-endian integer modulo the curve order.
///
/// A single subtraction suffices since `2^256 < 2n`.
fn reduce_mod_order(mut bytes: [u8; 32]) -> [u8; 32] {
    if bytes < CURVE_ORDER {
        return bytes;
    }

    let mut borrow = 0u16;
    for i in (0..32).rev() {
        let diff = (bytes[i] as u16)
            .wrapping_sub(CURVE_ORDER[i] as u16)
            .wrapping_sub(borrow);
        bytes[i] = diff as u8;
        borrow = (diff >> 8) & 1;
    }

    bytes
}

/// `e = H_challenge(R.x || P.x || m) mod n`.
fn challenge(
    r: &XOnlyPublicKey,
    pk: &XOnlyPublicKey,
    msg: &Message,
) -> Result<Scalar, SignatureError> {
    let msg: &[u8; 32] = msg.as_ref();
    let digest = tagged_hash(
        BIP340_CHALLENGE_TAG,
        &[&r.serialize(), &pk.serialize(), &msg[..]],
    );

    Scalar::from_be_bytes(reduce_mod_order(digest))
        .map_err(|_| SignatureError::Malformed("challenge"))
}

fn derive_nonce(
    sk: &EvenSecretKey,
    pk: &XOnlyPublicKey,
    enc_key: &EncryptionKey,
    msg: &Message,
) -> Result<SecretKey, SignatureError> {
    let msg: &[u8; 32] = msg.as_ref();
    let digest = tagged_hash(
        ADAPTOR_NONCE_TAG,
        &[
            &sk.secret_bytes(),
            &pk.serialize(),
            &enc_key.serialize(),
            &msg[..],
        ],
    );

    Ok(SecretKey::from_slice(&reduce_mod_order(digest))?)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use secp256k1::rand::{rngs::OsRng, Rng};

    use super::*;
    use crate::secp::verify_schnorr;

    fn random_message() -> Message {
        Message::from_digest(OsRng.gen())
    }

    #[test]
    fn enc_sign_verify_decrypt_recover() {
        let sk = SecretKey::new(&mut OsRng);
        let (pk, _) = sk.x_only_public_key(SECP256K1);
        let dec_key = DecryptionKey::new(SecretKey::new(&mut OsRng));
        let enc_key = dec_key.encryption_key();
        let msg = random_message();

        let asig = AdaptorSignature::enc_sign(&sk, &enc_key, &msg).unwrap();
        asig.enc_verify(&pk, &enc_key, &msg)
            .expect("adaptor signature must verify");

        let sig = asig.decrypt(&dec_key).unwrap();
        verify_schnorr(&pk, &msg, &sig).expect("decrypted signature must verify");

        let recovered = asig.recover(&sig).unwrap();
        assert_eq!(recovered.encryption_key(), enc_key);
        assert_eq!(recovered, dec_key);
    }

    #[test]
    fn enc_verify_rejects_wrong_inputs() {
        let sk = SecretKey::new(&mut OsRng);
        let (pk, _) = sk.x_only_public_key(SECP256K1);
        let enc_key = DecryptionKey::new(SecretKey::new(&mut OsRng)).encryption_key();
        let msg = random_message();

        let asig = AdaptorSignature::enc_sign(&sk, &enc_key, &msg).unwrap();

        let other_msg = random_message();
        assert_eq!(
            asig.enc_verify(&pk, &enc_key, &other_msg),
            Err(SignatureError::Verification)
        );

        let (other_pk, _) = SecretKey::new(&mut OsRng).x_only_public_key(SECP256K1);
        assert_eq!(
            asig.enc_verify(&other_pk, &enc_key, &msg),
            Err(SignatureError::Verification)
        );

        let other_enc_key = DecryptionKey::new(SecretKey::new(&mut OsRng)).encryption_key();
        assert_eq!(
            asig.enc_verify(&pk, &other_enc_key, &msg),
            Err(SignatureError::Verification)
        );
    }

    #[test]
    fn decrypt_with_wrong_key_does_not_verify() {
        let sk = SecretKey::new(&mut OsRng);
        let (pk, _) = sk.x_only_public_key(SECP256K1);
        let enc_key = DecryptionKey::new(SecretKey::new(&mut OsRng)).encryption_key();
        let msg = random_message();

        let asig = AdaptorSignature::enc_sign(&sk, &enc_key, &msg).unwrap();
        let wrong = DecryptionKey::new(SecretKey::new(&mut OsRng));
        let sig = asig.decrypt(&wrong).unwrap();

        assert!(verify_schnorr(&pk, &msg, &sig).is_err());
    }

    #[test]
    fn recover_rejects_unrelated_signature() {
        let sk = SecretKey::new(&mut OsRng);
        let enc_key = DecryptionKey::new(SecretKey::new(&mut OsRng)).encryption_key();
        let msg = random_message();

        let asig = AdaptorSignature::enc_sign(&sk, &enc_key, &msg).unwrap();
        let unrelated = crate::secp::sign_schnorr(&sk, &msg);

        assert_eq!(asig.recover(&unrelated), Err(SignatureError::Mismatch));
    }

    #[test]
    fn enc_sign_is_deterministic() {
        let sk = SecretKey::new(&mut OsRng);
        let enc_key = DecryptionKey::new(SecretKey::new(&mut OsRng)).encryption_key();
        let msg = random_message();

        assert_eq!(
            AdaptorSignature::enc_sign(&sk, &enc_key, &msg).unwrap(),
            AdaptorSignature::enc_sign(&sk, &enc_key, &msg).unwrap()
        );
    }

    #[test]
    fn finality_provider_key_as_encryption_key() {
        let fp_sk = SecretKey::new(&mut OsRng);
        let (fp_pk, _) = fp_sk.x_only_public_key(SECP256K1);

        let enc_key = EncryptionKey::from_x_only(fp_pk);
        assert_eq!(DecryptionKey::new(fp_sk).encryption_key(), enc_key);
    }

    #[test]
    fn wire_format() {
        let sk = SecretKey::new(&mut OsRng);
        let enc_key = DecryptionKey::new(SecretKey::new(&mut OsRng)).encryption_key();
        let asig = AdaptorSignature::enc_sign(&sk, &enc_key, &random_message()).unwrap();

        let bytes = asig.serialize();
        assert_eq!(bytes.len(), ADAPTOR_SIGNATURE_SIZE);
        assert!(bytes[0] == 0x02 || bytes[0] == 0x03);
        assert_eq!(bytes[64], asig.need_negation as u8);
        assert_eq!(AdaptorSignature::from_slice(&bytes).unwrap(), asig);

        let json = serde_json::to_string(&asig).unwrap();
        assert_eq!(json, format!("\"{}\"", hex::encode(bytes)));
        assert_eq!(serde_json::from_str::<AdaptorSignature>(&json).unwrap(), asig);

        assert!(AdaptorSignature::from_slice(&bytes[..64]).is_err());

        let mut bad_flag = bytes;
        bad_flag[64] = 2;
        assert!(AdaptorSignature::from_slice(&bad_flag).is_err());
    }

    #[test]
    fn reduce_mod_order_wraps_values_above_order() {
        assert_eq!(reduce_mod_order([0u8; 32]), [0u8; 32]);
        assert_eq!(reduce_mod_order(CURVE_ORDER), [0u8; 32]);

        let mut above = CURVE_ORDER;
        above[31] += 5;
        let mut expected = [0u8; 32];
        expected[31] = 5;
        assert_eq!(reduce_mod_order(above), expected);

        let max = reduce_mod_order([0xff; 32]);
        assert!(max < CURVE_ORDER);
    }

    fn secret_key() -> impl Strategy<Value = SecretKey> {
        any::<[u8; 32]>().prop_filter_map("valid secret key", |b| SecretKey::from_slice(&b).ok())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn adaptor_signature_roundtrip(
            sk in secret_key(),
            t in secret_key(),
            digest in any::<[u8; 32]>(),
        ) {
            let (pk, _) = sk.x_only_public_key(SECP256K1);
            let dec_key = DecryptionKey::new(t);
            let enc_key = dec_key.encryption_key();
            let msg = Message::from_digest(digest);

            let asig = AdaptorSignature::enc_sign(&sk, &enc_key, &msg).unwrap();
            prop_assert!(asig.enc_verify(&pk, &enc_key, &msg).is_ok());

            let sig = asig.decrypt(&dec_key).unwrap();
            prop_assert!(verify_schnorr(&pk, &msg, &sig).is_ok());
            prop_assert_eq!(asig.recover(&sig).unwrap(), dec_key);
        }
    }
}
