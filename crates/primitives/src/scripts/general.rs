//! Provides some common, standalone utilities and wrappers over [`bitcoin`] to create
//! scripts and transactions.

use bitcoin::{
    absolute::LockTime,
    opcodes::all::OP_RETURN,
    script::{Builder, PushBytesBuf},
    transaction, Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness,
};

/// Create an `OP_RETURN` script that carries `data` as a single push.
///
/// Returns `None` if `data` does not fit in a single push.
pub fn op_return_script(data: &[u8]) -> Option<ScriptBuf> {
    let mut push_data = PushBytesBuf::new();
    push_data.extend_from_slice(data).ok()?;

    Some(
        Builder::new()
            .push_opcode(OP_RETURN)
            .push_slice(push_data)
            .into_script(),
    )
}

/// Create a bitcoin [`Transaction`] for the given inputs and outputs.
pub fn create_tx(tx_ins: Vec<TxIn>, tx_outs: Vec<TxOut>) -> Transaction {
    Transaction {
        version: transaction::Version::TWO,
        lock_time: LockTime::ZERO,
        input: tx_ins,
        output: tx_outs,
    }
}

/// Create a list of [`TxIn`]'s from given [`OutPoint`]'s.
///
/// This wraps the [`OutPoint`] in a structure that includes an empty `witness`, an empty
/// `script_sig` and the `sequence` set to final, i.e. neither replace-by-fee nor a relative
/// timelock is signalled.
pub fn create_tx_ins(utxos: impl IntoIterator<Item = OutPoint>) -> Vec<TxIn> {
    utxos
        .into_iter()
        .map(|utxo| TxIn {
            previous_output: utxo,
            sequence: Sequence::MAX,
            script_sig: ScriptBuf::default(),
            witness: Witness::new(),
        })
        .collect()
}

/// Create a list of [`TxOut`]'s' based on pairs of scripts and corresponding amounts.
pub fn create_tx_outs(
    scripts_and_amounts: impl IntoIterator<Item = (ScriptBuf, Amount)>,
) -> Vec<TxOut> {
    scripts_and_amounts
        .into_iter()
        .map(|(script_pubkey, value)| TxOut {
            script_pubkey,
            value,
        })
        .collect()
}
