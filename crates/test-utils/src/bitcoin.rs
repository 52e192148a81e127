//! Module to generate random bitcoin values for testing.

use std::collections::HashSet;

use bitcoin::{
    absolute::LockTime,
    hashes::Hash,
    transaction, Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness,
};
use btc_staking_primitives::secp::EvenSecretKey;
use secp256k1::{
    rand::{rngs::OsRng, Rng},
    schnorr::Signature,
    Keypair, SecretKey, XOnlyPublicKey, SECP256K1,
};

/// Generates a random transaction ID.
pub fn generate_txid() -> Txid {
    let mut txid = [0u8; 32];
    OsRng.fill(&mut txid);

    Txid::from_slice(&txid).expect("should be able to generate arbitrary txid")
}

/// Generates a random outpoint.
pub fn generate_outpoint() -> OutPoint {
    let vout: u32 = OsRng.gen();

    OutPoint {
        txid: generate_txid(),
        vout,
    }
}

/// Generates a random signature.
///
/// The signature is well-formed but does not verify against any key.
pub fn generate_signature() -> Signature {
    let mut sig = [0u8; 64];
    OsRng.fill(&mut sig);

    Signature::from_slice(&sig).expect("should be able to generate arbitrary signature")
}

/// Generates a random keypair that is guaranteed to be of even parity.
pub fn generate_keypair() -> Keypair {
    let sk = SecretKey::new(&mut OsRng);
    let sk: EvenSecretKey = sk.into();

    Keypair::from_secret_key(SECP256K1, &sk)
}

/// Generate `count` distinct (x-only public key, secret key) pairs as two separate [`Vec`].
pub fn generate_keypairs(count: usize) -> (Vec<XOnlyPublicKey>, Vec<SecretKey>) {
    let mut secret_keys: Vec<SecretKey> = Vec::with_capacity(count);
    let mut pubkeys: Vec<XOnlyPublicKey> = Vec::with_capacity(count);

    let mut pubkeys_set: HashSet<XOnlyPublicKey> = HashSet::new();

    while pubkeys_set.len() != count {
        let sk = SecretKey::new(&mut OsRng);
        let (pubkey, _) = sk.x_only_public_key(SECP256K1);

        if pubkeys_set.insert(pubkey) {
            secret_keys.push(sk);
            pubkeys.push(pubkey);
        }
    }

    (pubkeys, secret_keys)
}

/// Generates a random x-only public key.
pub fn generate_xonly_pubkey() -> XOnlyPublicKey {
    let sk = SecretKey::new(&mut OsRng);
    let even_sk: EvenSecretKey = sk.into();

    even_sk.x_only_public_key(SECP256K1).0
}

/// Generates an output with a random 32-byte script and a random value of at least 10,000 sats.
///
/// These outputs never look like staking or `OP_RETURN` outputs and are used as decoys.
pub fn generate_decoy_txout() -> TxOut {
    let mut script = [0u8; 32];
    OsRng.fill(&mut script);
    // never start with OP_RETURN
    if script[0] == 0x6a {
        script[0] = 0x51;
    }

    TxOut {
        value: Amount::from_sat(OsRng.gen_range(10_000..1_000_000_000)),
        script_pubkey: ScriptBuf::from_bytes(script.to_vec()),
    }
}

/// Generates a version 2 transaction with the given outputs and a single random input.
pub fn generate_tx(outputs: Vec<TxOut>) -> Transaction {
    Transaction {
        version: transaction::Version::TWO,
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: generate_outpoint(),
            script_sig: ScriptBuf::new(),
            sequence: Sequence::MAX,
            witness: Witness::new(),
        }],
        output: outputs,
    }
}

/// Generates a transaction with `num_outputs` outputs where `outputs` are placed at the given
/// indices and every other slot holds a decoy.
///
/// # Panics
///
/// If an index is out of bounds or two outputs share an index.
pub fn generate_tx_with_outputs_at(num_outputs: usize, outputs: &[(usize, TxOut)]) -> Transaction {
    let mut slots: Vec<Option<TxOut>> = vec![None; num_outputs];
    for (idx, output) in outputs {
        assert!(slots[*idx].is_none(), "two outputs at index {idx}");
        slots[*idx] = Some(output.clone());
    }

    generate_tx(
        slots
            .into_iter()
            .map(|slot| slot.unwrap_or_else(generate_decoy_txout))
            .collect(),
    )
}
