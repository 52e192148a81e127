//! Signature records collected from the covenant committee.

use std::collections::BTreeSet;

use bitcoin::XOnlyPublicKey;
use btc_staking_primitives::adaptor::AdaptorSignature;
use secp256k1::schnorr;
use serde::{Deserialize, Serialize};

/// A plain BIP-340 signature together with the key that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignatureInfo {
    /// The signer.
    pub pk: XOnlyPublicKey,

    /// The signature.
    pub sig: schnorr::Signature,
}

impl SignatureInfo {
    /// Creates a new signature record.
    pub const fn new(pk: XOnlyPublicKey, sig: schnorr::Signature) -> Self {
        Self { pk, sig }
    }
}

/// The adaptor signatures of one covenant member over a slashing transaction.
///
/// There is one signature per finality provider of the delegation, in the same order, each
/// encrypted under that finality provider's key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CovenantAdaptorSignatures {
    /// The covenant member.
    pub cov_pk: XOnlyPublicKey,

    /// One adaptor signature per finality provider.
    pub adaptor_sigs: Vec<AdaptorSignature>,
}

/// Returns the first key that appears twice in `pks`.
pub fn first_duplicate<'a>(
    pks: impl IntoIterator<Item = &'a XOnlyPublicKey>,
) -> Option<XOnlyPublicKey> {
    let mut seen = BTreeSet::new();

    pks.into_iter().find(|pk| !seen.insert(XOnlyPublicKey::serialize(pk))).copied()
}
