//! Script Handles
//!
//! Native scripts (key-signature trees) and opaque Plutus V2 validators,
//! each reduced to the script hash that names its policy or address.

use std::collections::HashSet;

use ciborium::value::Value as Cbor;
use lib_cip68::PlutusData;
use lib_types::{Address, Credential, KeyHash, Network, ScriptHash};
use serde::Serialize;

use crate::cbor::{to_bytes, uint};
use crate::errors::TxResult;

/// Language tag prefixed to native scripts before hashing
pub const NATIVE_SCRIPT_TAG: u8 = 0;
/// Language tag prefixed to Plutus V2 scripts before hashing
pub const PLUTUS_V2_TAG: u8 = 2;

/// Timelock-free native script
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NativeScript {
    Sig {
        #[serde(rename = "keyHash")]
        key_hash: KeyHash,
    },
    All { scripts: Vec<NativeScript> },
    Any { scripts: Vec<NativeScript> },
}

impl NativeScript {
    /// `all[sig(owner)]`: single-owner policy
    pub fn single_owner(owner: KeyHash) -> Self {
        NativeScript::All {
            scripts: vec![NativeScript::Sig { key_hash: owner }],
        }
    }

    pub(crate) fn to_cbor_value(&self) -> Cbor {
        match self {
            NativeScript::Sig { key_hash } => {
                Cbor::Array(vec![uint(0), Cbor::Bytes(key_hash.as_bytes().to_vec())])
            }
            NativeScript::All { scripts } => Cbor::Array(vec![
                uint(1),
                Cbor::Array(scripts.iter().map(NativeScript::to_cbor_value).collect()),
            ]),
            NativeScript::Any { scripts } => Cbor::Array(vec![
                uint(2),
                Cbor::Array(scripts.iter().map(NativeScript::to_cbor_value).collect()),
            ]),
        }
    }

    pub fn to_cbor(&self) -> TxResult<Vec<u8>> {
        to_bytes(&self.to_cbor_value())
    }

    /// Policy id of the script
    pub fn hash(&self) -> TxResult<ScriptHash> {
        Ok(ScriptHash::of_script(NATIVE_SCRIPT_TAG, &self.to_cbor()?))
    }

    /// Every key that appears in the script
    pub fn key_hashes(&self) -> Vec<KeyHash> {
        match self {
            NativeScript::Sig { key_hash } => vec![*key_hash],
            NativeScript::All { scripts } | NativeScript::Any { scripts } => {
                scripts.iter().flat_map(NativeScript::key_hashes).collect()
            }
        }
    }

    /// Evaluate against the set of keys that signed
    pub fn is_satisfied_by(&self, signers: &HashSet<KeyHash>) -> bool {
        match self {
            NativeScript::Sig { key_hash } => signers.contains(key_hash),
            NativeScript::All { scripts } => scripts.iter().all(|s| s.is_satisfied_by(signers)),
            NativeScript::Any { scripts } => scripts.iter().any(|s| s.is_satisfied_by(signers)),
        }
    }
}

/// Plutus V2 script, as compiled code with any parameters applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlutusScript {
    #[serde(serialize_with = "crate::script::hex_vec")]
    code: Vec<u8>,
}

fn hex_vec<S: serde::Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(bytes))
}

impl PlutusScript {
    pub fn new(code: Vec<u8>) -> Self {
        Self { code }
    }

    /// Apply a parameter list to compiled code.
    ///
    /// The applied script is the code followed by the CBOR of the
    /// parameter list, so the hash commits to every parameter.
    pub fn apply_params(code: &[u8], params: &PlutusData) -> TxResult<Self> {
        let mut applied = code.to_vec();
        applied.extend_from_slice(&params.to_cbor()?);
        Ok(Self { code: applied })
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn hash(&self) -> ScriptHash {
        ScriptHash::of_script(PLUTUS_V2_TAG, &self.code)
    }

    /// Enterprise address locking funds under this validator
    pub fn address(&self, network: Network) -> Address {
        Address::enterprise(network, Credential::Script(self.hash()))
    }
}

/// Any script that can be attached as a minting policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Script {
    Native(NativeScript),
    PlutusV2(PlutusScript),
}

impl Script {
    pub fn hash(&self) -> TxResult<ScriptHash> {
        match self {
            Script::Native(script) => script.hash(),
            Script::PlutusV2(script) => Ok(script.hash()),
        }
    }

    /// Plutus scripts need a redeemer and an execution budget
    pub fn is_plutus(&self) -> bool {
        matches!(self, Script::PlutusV2(_))
    }
}

impl From<NativeScript> for Script {
    fn from(script: NativeScript) -> Self {
        Script::Native(script)
    }
}

impl From<PlutusScript> for Script {
    fn from(script: PlutusScript) -> Self {
        Script::PlutusV2(script)
    }
}
