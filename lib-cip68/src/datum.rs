//! CIP-68 Metadata Datum
//!
//! `Constr 0 [metadata: Map bytes bytes, version: Int, extra: Map bytes bytes]`
//!
//! Map entries keep insertion order; the encoding is order-sensitive.

use crate::errors::{Cip68Error, Cip68Result};
use crate::plutus_data::PlutusData;

/// Datum version written by this tool
pub const CIP68_VERSION: i64 = 2;

/// Extra-map key carrying the tier index
pub const TIER_KEY: &str = "Tier";

/// Inline datum locked with a reference token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cip68Datum {
    pub metadata: Vec<(Vec<u8>, Vec<u8>)>,
    pub version: i64,
    pub extra: Vec<(Vec<u8>, Vec<u8>)>,
}

impl Cip68Datum {
    pub fn new(version: i64) -> Self {
        Self {
            metadata: Vec::new(),
            version,
            extra: Vec::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        upsert(&mut self.metadata, key, value);
        self
    }

    pub fn with_extra(mut self, key: &str, value: &str) -> Self {
        upsert(&mut self.extra, key, value);
        self
    }

    pub fn metadata_text(&self, key: &str) -> Option<String> {
        lookup(&self.metadata, key)
    }

    pub fn extra_text(&self, key: &str) -> Option<String> {
        lookup(&self.extra, key)
    }

    /// Tier index from the `Tier` extra entry
    pub fn tier(&self) -> Option<u8> {
        self.extra_text(TIER_KEY)?.parse().ok()
    }

    pub fn to_plutus_data(&self) -> PlutusData {
        PlutusData::constr(
            0,
            vec![
                to_map(&self.metadata),
                PlutusData::int(self.version),
                to_map(&self.extra),
            ],
        )
    }

    pub fn from_plutus_data(data: &PlutusData) -> Cip68Result<Self> {
        let (tag, fields) = data
            .as_constr()
            .ok_or_else(|| Cip68Error::InvalidDatum("expected a constructor".into()))?;
        if tag != 0 || fields.len() != 3 {
            return Err(Cip68Error::InvalidDatum(format!(
                "expected Constr 0 with 3 fields, got Constr {} with {}",
                tag,
                fields.len()
            )));
        }
        let version = fields[1]
            .as_integer()
            .and_then(|v| i64::try_from(v).ok())
            .ok_or_else(|| Cip68Error::InvalidDatum("version must be an integer".into()))?;
        Ok(Self {
            metadata: from_map(&fields[0], "metadata")?,
            version,
            extra: from_map(&fields[2], "extra")?,
        })
    }
}

fn upsert(entries: &mut Vec<(Vec<u8>, Vec<u8>)>, key: &str, value: &str) {
    let key = key.as_bytes().to_vec();
    let value = value.as_bytes().to_vec();
    match entries.iter_mut().find(|(k, _)| *k == key) {
        Some(entry) => entry.1 = value,
        None => entries.push((key, value)),
    }
}

fn lookup(entries: &[(Vec<u8>, Vec<u8>)], key: &str) -> Option<String> {
    entries
        .iter()
        .find(|(k, _)| k.as_slice() == key.as_bytes())
        .map(|(_, v)| String::from_utf8_lossy(v).into_owned())
}

fn to_map(entries: &[(Vec<u8>, Vec<u8>)]) -> PlutusData {
    PlutusData::Map(
        entries
            .iter()
            .map(|(k, v)| (PlutusData::bytes(k.clone()), PlutusData::bytes(v.clone())))
            .collect(),
    )
}

fn from_map(data: &PlutusData, field: &str) -> Cip68Result<Vec<(Vec<u8>, Vec<u8>)>> {
    match data {
        PlutusData::Map(entries) => entries
            .iter()
            .map(|(k, v)| match (k.as_bytes(), v.as_bytes()) {
                (Some(k), Some(v)) => Ok((k.to_vec(), v.to_vec())),
                _ => Err(Cip68Error::InvalidDatum(format!(
                    "{} entries must be bytes to bytes",
                    field
                ))),
            })
            .collect(),
        _ => Err(Cip68Error::InvalidDatum(format!("{} must be a map", field))),
    }
}
