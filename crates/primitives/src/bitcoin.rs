//! Bitcoin primitives.

use bitcoin::{address::NetworkUnchecked, Address, Network, ScriptBuf};

use crate::errors::AddressError;

/// A bitcoin address that has been checked against the network it is used on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct BitcoinAddress(Address);

impl BitcoinAddress {
    /// Parses a bitcoin address from a string and requires it to be valid on `network`.
    pub fn parse(address_str: &str, network: Network) -> Result<Self, AddressError> {
        let invalid = |reason: String| AddressError {
            address: address_str.to_string(),
            reason,
        };

        let address = address_str
            .parse::<Address<NetworkUnchecked>>()
            .map_err(|e| invalid(e.to_string()))?;

        let checked_address = address
            .require_network(network)
            .map_err(|e| invalid(e.to_string()))?;

        Ok(Self(checked_address))
    }

    /// Returns the address.
    pub const fn address(&self) -> &Address {
        &self.0
    }

    /// Consumes the wrapper and returns the address.
    pub fn into_address(self) -> Address {
        self.0
    }

    /// Returns the locking script that pays to this address.
    pub fn script_pubkey(&self) -> ScriptBuf {
        self.0.script_pubkey()
    }
}

#[cfg(test)]
mod tests {
    use bitcoin::key::Keypair;
    use secp256k1::SECP256K1;

    use super::*;

    #[test]
    fn parse_requires_matching_network() {
        let keypair = Keypair::from_seckey_slice(SECP256K1, &[3u8; 32]).unwrap();
        let address = Address::p2tr(
            SECP256K1,
            keypair.x_only_public_key().0,
            None,
            Network::Regtest,
        )
        .to_string();

        let parsed = BitcoinAddress::parse(&address, Network::Regtest).unwrap();
        assert_eq!(parsed.address().to_string(), address);
        assert!(parsed.script_pubkey().is_p2tr());

        assert!(BitcoinAddress::parse(&address, Network::Bitcoin).is_err());
        assert!(BitcoinAddress::parse("not an address", Network::Regtest).is_err());
    }
}
