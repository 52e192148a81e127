//! Utilities to build taproot outputs and to compute script-path sighashes.

use bitcoin::{
    key::UntweakedPublicKey,
    secp256k1::SECP256K1,
    sighash::{Prevouts, SighashCache},
    taproot::{ControlBlock, LeafVersion, TaprootBuilder, TaprootSpendInfo},
    Address, Network, ScriptBuf, TapLeafHash, TapSighashType, Transaction, TxOut,
};
use secp256k1::Message;

use crate::{constants::UNSPENDABLE_INTERNAL_KEY, errors::TaprootError};

/// Creates a taproot address whose only spend paths are the given leaf `scripts`.
///
/// The internal key is the [`static@UNSPENDABLE_INTERNAL_KEY`], so the key path cannot be used.
///
/// # Errors
///
/// If `scripts` is empty.
pub fn create_taproot_addr(
    network: Network,
    scripts: &[ScriptBuf],
) -> Result<(Address, TaprootSpendInfo), TaprootError> {
    if scripts.is_empty() {
        return Err(TaprootError::EmptyTapscript);
    }

    build_taptree(*UNSPENDABLE_INTERNAL_KEY, network, scripts)
}

/// Constructs the taptree for the given scripts.
///
/// A taptree is a merkle tree made up of various scripts. Each script is a leaf in the merkle tree.
/// If the number of scripts is a power of 2, all the scripts lie at the deepest level (depth = n)
/// in the tree. If the number is not a power of 2, there are some scripts that will exist at the
/// penultimate level (depth = n - 1).
///
/// The leaves are added in the order given, so the same scripts in the same order always produce
/// the same output key.
fn build_taptree(
    internal_key: UntweakedPublicKey,
    network: Network,
    scripts: &[ScriptBuf],
) -> Result<(Address, TaprootSpendInfo), TaprootError> {
    let mut taproot_builder = TaprootBuilder::new();

    let num_scripts = scripts.len();

    // If the script count <= 1, the depth should be 0. Otherwise, 2 scripts fit in a height of 1
    // (0 being the root node), 4 fit in a height of 2 and so on.
    let max_depth = if num_scripts > 1 {
        (num_scripts - 1).ilog2() + 1
    } else {
        0
    };

    let max_num_scripts = 2usize.pow(max_depth);

    // With e.g. 3 scripts, two live at depth 2 and one is lifted to depth 1:
    //
    //          [Root Hash]
    //          /         \
    //     [Hash 0]        S2
    //     /      \
    //   S0        S1
    let num_penultimate_scripts = max_num_scripts.saturating_sub(num_scripts);
    let num_deepest_scripts = num_scripts.saturating_sub(num_penultimate_scripts);

    for (script_idx, script) in scripts.iter().enumerate() {
        let depth = if script_idx < num_deepest_scripts {
            max_depth as u8
        } else {
            // if the deepest node is not filled, use the node at the upper level instead
            (max_depth - 1) as u8
        };

        taproot_builder = taproot_builder.add_leaf(depth, script.clone())?;
    }

    let spend_info = taproot_builder
        .finalize(SECP256K1, internal_key)
        .map_err(|_| TaprootError::IncompleteTree)?;

    let merkle_root = spend_info.merkle_root();

    Ok((
        Address::p2tr(SECP256K1, internal_key, merkle_root, network),
        spend_info,
    ))
}

/// Returns the control block that proves `script` is a leaf of the taptree in `spend_info`.
pub fn control_block(
    spend_info: &TaprootSpendInfo,
    script: &ScriptBuf,
) -> Result<ControlBlock, TaprootError> {
    spend_info
        .control_block(&(script.clone(), LeafVersion::TapScript))
        .ok_or(TaprootError::UnknownLeaf)
}

/// Generate a sighash message for a taproot `script` spending path at the `input_index` of
/// all `prevouts`.
pub fn create_script_spend_hash(
    sighash_cache: &mut SighashCache<&Transaction>,
    script: &ScriptBuf,
    prevouts: Prevouts<'_, TxOut>,
    sighash_type: TapSighashType,
    input_index: usize,
) -> Result<Message, TaprootError> {
    let leaf_hash = TapLeafHash::from_script(script, LeafVersion::TapScript);

    let sighash = sighash_cache.taproot_script_spend_signature_hash(
        input_index,
        &prevouts,
        leaf_hash,
        sighash_type,
    )?;

    Ok(Message::from(sighash))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_taproot_addr() {
        // create a bunch of dummy scripts to add to the taptree
        let max_scripts = 10;
        let scripts: Vec<ScriptBuf> = (0..max_scripts)
            .map(|i| ScriptBuf::from_bytes(vec![i as u8; 32]))
            .collect();

        let network = Network::Regtest;

        assert!(
            create_taproot_addr(network, &scripts[0..1]).is_ok(),
            "should work if the number of scripts is exactly 1 i.e., only root node exists"
        );

        let (_, spend_info) = create_taproot_addr(network, &scripts[0..3])
            .expect("should work if the number of scripts is not an exact power of 2");
        assert_eq!(spend_info.internal_key(), *UNSPENDABLE_INTERNAL_KEY);
        for script in &scripts[0..3] {
            assert!(control_block(&spend_info, script).is_ok());
        }
        assert!(matches!(
            control_block(&spend_info, &scripts[5]),
            Err(TaprootError::UnknownLeaf)
        ));

        assert!(
            create_taproot_addr(network, &scripts[..]).is_ok(),
            "should work for larger trees"
        );

        assert!(matches!(
            create_taproot_addr(network, &[]),
            Err(TaprootError::EmptyTapscript)
        ));
    }

    #[test]
    fn taptree_is_deterministic() {
        let scripts: Vec<ScriptBuf> = (0..3)
            .map(|i| ScriptBuf::from_bytes(vec![i; 16]))
            .collect();

        let (first, _) = create_taproot_addr(Network::Regtest, &scripts).unwrap();
        let (second, _) = create_taproot_addr(Network::Regtest, &scripts).unwrap();

        assert_eq!(first, second);
    }
}
