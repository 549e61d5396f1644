//! Plutus Data
//!
//! The untyped data language consumed by validators (datums and redeemers),
//! with its canonical CBOR encoding:
//!
//! | variant       | CBOR                                                   |
//! |---------------|--------------------------------------------------------|
//! | `Constr 0..6` | tag 121+i, array of fields                             |
//! | `Constr 7..127` | tag 1280+(i-7), array of fields                      |
//! | `Constr n`    | tag 102, `[n, fields]`                                 |
//! | `Map`         | map                                                    |
//! | `List`        | array                                                  |
//! | `Integer`     | major type 0/1 (64-bit range only)                     |
//! | `Bytes`       | byte string, chunked past 64 bytes                     |

use ciborium::value::Value as Cbor;
use ciborium_ll::{Encoder, Header};
use serde::{Serialize, Serializer};
use serde_json::json;

use crate::errors::{Cip68Error, Cip68Result};

const CONSTR_TAG_BASE: u64 = 121;
const CONSTR_TAG_EXTENDED_BASE: u64 = 1280;
const CONSTR_TAG_GENERAL: u64 = 102;

/// Longest byte string written in one piece
pub const BYTES_CHUNK_LEN: usize = 64;

fn push(out: &mut Vec<u8>, header: Header) -> Cip68Result<()> {
    Encoder::from(&mut *out)
        .push(header)
        .map_err(|e| Cip68Error::Cbor(format!("{:?}", e)))
}

/// Untyped Plutus data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlutusData {
    Constr { tag: u64, fields: Vec<PlutusData> },
    Map(Vec<(PlutusData, PlutusData)>),
    List(Vec<PlutusData>),
    Integer(i128),
    Bytes(Vec<u8>),
}

impl PlutusData {
    pub fn constr(tag: u64, fields: Vec<PlutusData>) -> Self {
        PlutusData::Constr { tag, fields }
    }

    pub fn int(value: impl Into<i128>) -> Self {
        PlutusData::Integer(value.into())
    }

    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        PlutusData::Bytes(value.into())
    }

    /// UTF-8 text stored as a byte string
    pub fn text(value: &str) -> Self {
        PlutusData::Bytes(value.as_bytes().to_vec())
    }

    /// `Constr 0 []`, the unit datum
    pub fn unit() -> Self {
        PlutusData::constr(0, Vec::new())
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            PlutusData::Bytes(bytes) => Some(bytes.as_slice()),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i128> {
        match self {
            PlutusData::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_constr(&self) -> Option<(u64, &[PlutusData])> {
        match self {
            PlutusData::Constr { tag, fields } => Some((*tag, fields.as_slice())),
            _ => None,
        }
    }

    /// Write the CBOR item onto `out`
    ///
    /// Byte strings longer than [`BYTES_CHUNK_LEN`] become indefinite-length
    /// strings of 64-byte chunks, the shape the ledger accepts for data bytes.
    pub fn encode(&self, out: &mut Vec<u8>) -> Cip68Result<()> {
        match self {
            PlutusData::Constr { tag, fields } => {
                if *tag < 7 {
                    push(out, Header::Tag(CONSTR_TAG_BASE + tag))?;
                } else if *tag < 128 {
                    push(out, Header::Tag(CONSTR_TAG_EXTENDED_BASE + tag - 7))?;
                } else {
                    push(out, Header::Tag(CONSTR_TAG_GENERAL))?;
                    push(out, Header::Array(Some(2)))?;
                    push(out, Header::Positive(*tag))?;
                }
                push(out, Header::Array(Some(fields.len())))?;
                for field in fields {
                    field.encode(out)?;
                }
            }
            PlutusData::Map(entries) => {
                push(out, Header::Map(Some(entries.len())))?;
                for (k, v) in entries {
                    k.encode(out)?;
                    v.encode(out)?;
                }
            }
            PlutusData::List(items) => {
                push(out, Header::Array(Some(items.len())))?;
                for item in items {
                    item.encode(out)?;
                }
            }
            PlutusData::Integer(value) => {
                let out_of_range = || Cip68Error::IntegerOutOfRange(*value);
                let header = if *value >= 0 {
                    Header::Positive(u64::try_from(*value).map_err(|_| out_of_range())?)
                } else {
                    Header::Negative(u64::try_from(-1 - *value).map_err(|_| out_of_range())?)
                };
                push(out, header)?;
            }
            PlutusData::Bytes(bytes) => {
                Encoder::from(&mut *out)
                    .bytes(bytes, BYTES_CHUNK_LEN)
                    .map_err(|e| Cip68Error::Cbor(format!("{:?}", e)))?;
            }
        }
        Ok(())
    }

    fn from_cbor_value(value: &Cbor) -> Cip68Result<Self> {
        match value {
            Cbor::Tag(tag, inner) => {
                let (constr, fields) = match *tag {
                    t if (CONSTR_TAG_BASE..CONSTR_TAG_BASE + 7).contains(&t) => {
                        (t - CONSTR_TAG_BASE, inner.as_ref())
                    }
                    t if (CONSTR_TAG_EXTENDED_BASE..CONSTR_TAG_EXTENDED_BASE + 121).contains(&t) => {
                        (t - CONSTR_TAG_EXTENDED_BASE + 7, inner.as_ref())
                    }
                    CONSTR_TAG_GENERAL => match inner.as_ref() {
                        Cbor::Array(pair) if pair.len() == 2 => {
                            let index = match &pair[0] {
                                Cbor::Integer(i) => u64::try_from(*i).map_err(|_| {
                                    Cip68Error::UnsupportedItem("negative constructor".into())
                                })?,
                                other => {
                                    return Err(Cip68Error::UnsupportedItem(format!("{:?}", other)))
                                }
                            };
                            (index, &pair[1])
                        }
                        other => return Err(Cip68Error::UnsupportedItem(format!("{:?}", other))),
                    },
                    other => return Err(Cip68Error::UnsupportedItem(format!("tag {}", other))),
                };
                match fields {
                    Cbor::Array(items) => Ok(PlutusData::Constr {
                        tag: constr,
                        fields: items
                            .iter()
                            .map(PlutusData::from_cbor_value)
                            .collect::<Cip68Result<Vec<_>>>()?,
                    }),
                    other => Err(Cip68Error::UnsupportedItem(format!("{:?}", other))),
                }
            }
            Cbor::Map(entries) => Ok(PlutusData::Map(
                entries
                    .iter()
                    .map(|(k, v)| Ok((PlutusData::from_cbor_value(k)?, PlutusData::from_cbor_value(v)?)))
                    .collect::<Cip68Result<Vec<_>>>()?,
            )),
            Cbor::Array(items) => Ok(PlutusData::List(
                items
                    .iter()
                    .map(PlutusData::from_cbor_value)
                    .collect::<Cip68Result<Vec<_>>>()?,
            )),
            Cbor::Integer(i) => Ok(PlutusData::Integer(i128::from(*i))),
            Cbor::Bytes(bytes) => Ok(PlutusData::Bytes(bytes.clone())),
            other => Err(Cip68Error::UnsupportedItem(format!("{:?}", other))),
        }
    }

    /// Canonical CBOR bytes
    pub fn to_cbor(&self) -> Cip68Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.encode(&mut buf)?;
        Ok(buf)
    }

    /// Decode CBOR bytes
    pub fn from_cbor(bytes: &[u8]) -> Cip68Result<Self> {
        let value: Cbor =
            ciborium::from_reader(bytes).map_err(|e| Cip68Error::Cbor(e.to_string()))?;
        Self::from_cbor_value(&value)
    }

    /// Hex of the CBOR encoding
    pub fn to_cbor_hex(&self) -> Cip68Result<String> {
        Ok(hex::encode(self.to_cbor()?))
    }

    /// Detailed JSON schema (`{"constructor":..,"fields":..}`, `{"bytes":..}`, ...)
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            PlutusData::Constr { tag, fields } => json!({
                "constructor": tag,
                "fields": fields.iter().map(PlutusData::to_json).collect::<Vec<_>>(),
            }),
            PlutusData::Map(entries) => json!({
                "map": entries
                    .iter()
                    .map(|(k, v)| json!({ "k": k.to_json(), "v": v.to_json() }))
                    .collect::<Vec<_>>(),
            }),
            PlutusData::List(items) => json!({
                "list": items.iter().map(PlutusData::to_json).collect::<Vec<_>>(),
            }),
            // JSON numbers lose precision past 2^53; keep them as strings
            PlutusData::Integer(value) => json!({ "int": value.to_string() }),
            PlutusData::Bytes(bytes) => json!({ "bytes": hex::encode(bytes) }),
        }
    }
}

impl Serialize for PlutusData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
