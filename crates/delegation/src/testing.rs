//! Fixtures shared by the tests of this crate.

use bitcoin::{Amount, Network, OutPoint, ScriptBuf, XOnlyPublicKey};
use btc_staking_params::prelude::MagicBytes;
use btc_staking_primitives::{
    adaptor::{AdaptorSignature, DecryptionKey},
    scripts::general::{create_tx, create_tx_ins, create_tx_outs},
};
use btc_staking_test_utils::prelude::{
    generate_keypair, generate_keypairs, generate_outpoint, generate_signature, generate_tx,
};
use btc_staking_tx::{
    spend_tx::{SlashingTx, UnbondingTx},
    staking::StakingInfo,
};
use secp256k1::{
    rand::{rngs::OsRng, Rng},
    Message,
};

use crate::{delegation::BtcDelegation, pop::ProofOfPossession, undelegation::BtcUndelegation};

/// Returns `count` fresh covenant keys.
pub(crate) fn covenant_pks(count: u32) -> Vec<XOnlyPublicKey> {
    generate_keypairs(count as usize).0
}

/// Returns `count` adaptor signatures over an arbitrary message.
pub(crate) fn adaptor_sigs(count: usize) -> Vec<AdaptorSignature> {
    let msg = Message::from_digest(OsRng.gen());

    (0..count)
        .map(|_| {
            let signer = generate_keypair();
            let enc_key = DecryptionKey::new(generate_keypair().secret_key()).encryption_key();

            AdaptorSignature::enc_sign(&signer.secret_key(), &enc_key, &msg)
                .expect("random keys yield a valid adaptor signature")
        })
        .collect()
}

/// Builds a delegation to `num_fps` finality providers over a staking output of a committee of
/// `num_covenants` keys, without any covenant signature.
pub(crate) fn delegation(
    start_height: u64,
    end_height: u64,
    num_fps: usize,
    num_covenants: usize,
) -> BtcDelegation {
    let host = generate_keypair();
    let staker = generate_keypair();
    let (staker_pk, _) = staker.x_only_public_key();
    let (fp_pks, _) = generate_keypairs(num_fps);
    let (covenants, _) = generate_keypairs(num_covenants);

    let amount = Amount::from_sat(OsRng.gen_range(10_000..1_000_000));
    let staking_info = StakingInfo::build(
        MagicBytes::new(*b"bbte"),
        staker_pk,
        fp_pks[0],
        &covenants,
        num_covenants.div_ceil(2) as u32,
        (end_height - start_height) as u16,
        amount,
        Network::Regtest,
    )
    .expect("fixture keys and amounts are valid");
    let staking_tx = generate_tx(vec![
        staking_info.staking_output().clone(),
        staking_info.op_return_output().clone(),
    ]);

    let slashing_tx = create_tx(
        create_tx_ins([OutPoint::new(staking_tx.compute_txid(), 0)]),
        create_tx_outs([
            (ScriptBuf::new_op_return([]), amount / 10),
            (ScriptBuf::new_op_return([]), amount / 2),
        ]),
    );

    BtcDelegation::new(
        host.public_key(),
        staker_pk,
        Some(ProofOfPossession::new(&host.public_key(), &staker.secret_key())),
        fp_pks,
        bitcoin::consensus::serialize(&staking_tx),
        0,
        start_height,
        end_height,
        amount.to_sat(),
        SlashingTx::from_tx(&slashing_tx),
        generate_signature(),
    )
}

/// Builds an undelegation without any covenant signature.
pub(crate) fn undelegation() -> BtcUndelegation {
    let unbonding_tx = create_tx(
        create_tx_ins([generate_outpoint()]),
        create_tx_outs([(ScriptBuf::new_op_return([]), Amount::from_sat(90_000))]),
    );
    let slashing_tx = create_tx(
        create_tx_ins([OutPoint::new(unbonding_tx.compute_txid(), 0)]),
        create_tx_outs([(ScriptBuf::new_op_return([]), Amount::from_sat(80_000))]),
    );

    BtcUndelegation::new(
        UnbondingTx::from_tx(&unbonding_tx),
        SlashingTx::from_tx(&slashing_tx),
        generate_signature(),
        generate_signature(),
    )
}
