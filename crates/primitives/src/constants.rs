//! Constants that are fixed by the staking protocol.

use std::sync::LazyLock;

use secp256k1::XOnlyPublicKey;

/// The x-coordinate of the BIP-341 "nothing up my sleeve" point `H`.
///
/// `H = lift_x(0x50929b74c1a04954b78b4b6035e97a5e078a5a0f28ec96d547bfee9ace803ac0)` is the SHA-256
/// of the uncompressed encoding of the secp256k1 generator, so nobody knows its discrete log.
const UNSPENDABLE_KEY_BYTES: [u8; 32] = [
    0x50, 0x92, 0x9b, 0x74, 0xc1, 0xa0, 0x49, 0x54, 0xb7, 0x8b, 0x4b, 0x60, 0x35, 0xe9, 0x7a, 0x5e,
    0x07, 0x8a, 0x5a, 0x0f, 0x28, 0xec, 0x96, 0xd5, 0x47, 0xbf, 0xee, 0x9a, 0xce, 0x80, 0x3a, 0xc0,
];

/// A verifiably unspendable internal key.
///
/// Every staking, unbonding and slashing output uses this key as its taproot internal key so that
/// the output can only be spent through one of the leaf scripts.
///
/// See [BIP-341](https://github.com/bitcoin/bips/blob/master/bip-0341.mediawiki#constructing-and-spending-taproot-outputs).
pub static UNSPENDABLE_INTERNAL_KEY: LazyLock<XOnlyPublicKey> = LazyLock::new(|| {
    XOnlyPublicKey::from_slice(&UNSPENDABLE_KEY_BYTES).expect("H is a valid x-only public key")
});

/// Tag used to derive the challenge of a BIP-340 signature.
pub const BIP340_CHALLENGE_TAG: &str = "BIP0340/challenge";

/// Tag used to derive the deterministic nonce of an adaptor signature.
pub const ADAPTOR_NONCE_TAG: &str = "BTCStaking/adaptor-nonce";

/// Size of a serialized adaptor signature: `R (33) || s' (32) || need_negation (1)`.
pub const ADAPTOR_SIGNATURE_SIZE: usize = 65;
