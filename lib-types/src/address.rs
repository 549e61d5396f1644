//! Shelley Addresses
//!
//! Only base (payment + stake) and enterprise (payment only) addresses are
//! modelled; pointer, reward and Byron addresses are rejected on parse.
//!
//! Byte layout: `header ++ payment_hash(28) [++ stake_hash(28)]` where the
//! header's high nibble is the address type and the low nibble the network id.

use bech32::{FromBase32, ToBase32, Variant};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::errors::{TypesError, TypesResult};
use crate::primitives::{KeyHash, ScriptHash};

/// Target network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Preprod,
    Preview,
    /// In-memory simulated ledger
    Emulator,
}

impl Network {
    /// Network id nibble carried in address headers
    pub fn id(&self) -> u8 {
        match self {
            Network::Mainnet => 1,
            _ => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Preprod => "preprod",
            Network::Preview => "preview",
            Network::Emulator => "emulator",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = TypesError;

    fn from_str(s: &str) -> TypesResult<Self> {
        match s.to_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "preprod" => Ok(Network::Preprod),
            "preview" => Ok(Network::Preview),
            "emulator" | "custom" => Ok(Network::Emulator),
            other => Err(TypesError::InvalidAddress(format!(
                "Unknown network: '{}'. Supported: mainnet, preprod, preview, emulator",
                other
            ))),
        }
    }
}

/// Payment or stake credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Credential {
    Key(KeyHash),
    Script(ScriptHash),
}

impl Credential {
    pub fn is_script(&self) -> bool {
        matches!(self, Credential::Script(_))
    }

    fn hash_bytes(&self) -> &[u8; 28] {
        match self {
            Credential::Key(hash) => hash.as_bytes(),
            Credential::Script(hash) => hash.as_bytes(),
        }
    }
}

/// Shelley address
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    pub network_id: u8,
    pub payment: Credential,
    pub stake: Option<Credential>,
}

impl Address {
    /// Payment-only address
    pub fn enterprise(network: Network, payment: Credential) -> Self {
        Self {
            network_id: network.id(),
            payment,
            stake: None,
        }
    }

    /// Payment + stake address
    pub fn base(network: Network, payment: Credential, stake: Credential) -> Self {
        Self {
            network_id: network.id(),
            payment,
            stake: Some(stake),
        }
    }

    fn header(&self) -> u8 {
        let kind = match (self.payment, self.stake) {
            (Credential::Key(_), Some(Credential::Key(_))) => 0u8,
            (Credential::Script(_), Some(Credential::Key(_))) => 1,
            (Credential::Key(_), Some(Credential::Script(_))) => 2,
            (Credential::Script(_), Some(Credential::Script(_))) => 3,
            (Credential::Key(_), None) => 6,
            (Credential::Script(_), None) => 7,
        };
        (kind << 4) | (self.network_id & 0x0f)
    }

    /// Raw address bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(57);
        out.push(self.header());
        out.extend_from_slice(self.payment.hash_bytes());
        if let Some(stake) = &self.stake {
            out.extend_from_slice(stake.hash_bytes());
        }
        out
    }

    /// Parse raw address bytes
    pub fn from_bytes(bytes: &[u8]) -> TypesResult<Self> {
        let header = *bytes
            .first()
            .ok_or_else(|| TypesError::InvalidAddress("empty address".to_string()))?;
        let kind = header >> 4;
        let network_id = header & 0x0f;

        let expected_len = match kind {
            0..=3 => 57,
            6 | 7 => 29,
            other => {
                return Err(TypesError::InvalidAddress(format!(
                    "unsupported address type {}",
                    other
                )))
            }
        };
        if bytes.len() != expected_len {
            return Err(TypesError::InvalidLength {
                expected: expected_len,
                got: bytes.len(),
            });
        }

        let payment_hash = &bytes[1..29];
        let payment = if kind & 0x01 == 1 {
            Credential::Script(ScriptHash::from_slice(payment_hash)?)
        } else {
            Credential::Key(KeyHash::from_slice(payment_hash)?)
        };

        let stake = if expected_len == 57 {
            let stake_hash = &bytes[29..57];
            Some(if kind & 0x02 == 2 {
                Credential::Script(ScriptHash::from_slice(stake_hash)?)
            } else {
                Credential::Key(KeyHash::from_slice(stake_hash)?)
            })
        } else {
            None
        };

        Ok(Self {
            network_id,
            payment,
            stake,
        })
    }

    fn hrp(&self) -> &'static str {
        if self.network_id == 1 {
            "addr"
        } else {
            "addr_test"
        }
    }

    /// Bech32 rendering (`addr1...` / `addr_test1...`)
    pub fn to_bech32(&self) -> String {
        // The hrp is a fixed valid literal, so encoding cannot fail
        bech32::encode(self.hrp(), self.to_bytes().to_base32(), Variant::Bech32)
            .unwrap_or_else(|_| hex::encode(self.to_bytes()))
    }

    /// Parse a bech32 address
    pub fn from_bech32(s: &str) -> TypesResult<Self> {
        let (hrp, data, _variant) =
            bech32::decode(s).map_err(|e| TypesError::InvalidAddress(format!("{}: {}", s, e)))?;
        let bytes = Vec::<u8>::from_base32(&data)
            .map_err(|e| TypesError::InvalidAddress(format!("{}: {}", s, e)))?;
        let address = Self::from_bytes(&bytes)?;
        if address.hrp() != hrp {
            return Err(TypesError::InvalidAddress(format!(
                "prefix '{}' does not match network id {}",
                hrp, address.network_id
            )));
        }
        Ok(address)
    }

    /// Payment key hash, if the payment part is a key
    pub fn payment_key_hash(&self) -> Option<KeyHash> {
        match self.payment {
            Credential::Key(hash) => Some(hash),
            Credential::Script(_) => None,
        }
    }

    /// Payment script hash, if the payment part is a script
    pub fn payment_script_hash(&self) -> Option<ScriptHash> {
        match self.payment {
            Credential::Script(hash) => Some(hash),
            Credential::Key(_) => None,
        }
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_bech32())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_bech32())
    }
}

impl FromStr for Address {
    type Err = TypesError;

    fn from_str(s: &str) -> TypesResult<Self> {
        Self::from_bech32(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_bech32())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_bech32(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> Credential {
        Credential::Key(KeyHash::new([byte; 28]))
    }

    fn script(byte: u8) -> Credential {
        Credential::Script(ScriptHash::new([byte; 28]))
    }

    #[test]
    fn test_header_nibbles() {
        let base = Address::base(Network::Mainnet, key(1), key(2));
        assert_eq!(base.to_bytes()[0], 0x01);

        let contract = Address::enterprise(Network::Preprod, script(3));
        assert_eq!(contract.to_bytes()[0], 0x70);
        assert_eq!(contract.to_bytes().len(), 29);
    }

    #[test]
    fn test_bech32_roundtrip() {
        for address in [
            Address::base(Network::Mainnet, key(1), key(2)),
            Address::base(Network::Emulator, script(1), key(2)),
            Address::enterprise(Network::Preview, script(9)),
            Address::enterprise(Network::Mainnet, key(4)),
        ] {
            let encoded = address.to_bech32();
            let decoded = Address::from_bech32(&encoded).unwrap();
            assert_eq!(decoded, address);
        }
    }

    #[test]
    fn test_prefix_by_network() {
        let mainnet = Address::enterprise(Network::Mainnet, key(1));
        let testnet = Address::enterprise(Network::Preprod, key(1));
        assert!(mainnet.to_bech32().starts_with("addr1"));
        assert!(testnet.to_bech32().starts_with("addr_test1"));
    }

    #[test]
    fn test_reject_reward_address() {
        let mut bytes = vec![0xe1];
        bytes.extend_from_slice(&[0u8; 28]);
        assert!(Address::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_credential_accessors() {
        let contract = Address::enterprise(Network::Emulator, script(5));
        assert_eq!(contract.payment_script_hash(), Some(ScriptHash::new([5u8; 28])));
        assert_eq!(contract.payment_key_hash(), None);
    }

    #[test]
    fn test_network_parse() {
        assert_eq!("Custom".parse::<Network>().unwrap(), Network::Emulator);
        assert_eq!("mainnet".parse::<Network>().unwrap().id(), 1);
        assert!("moonnet".parse::<Network>().is_err());
    }
}
