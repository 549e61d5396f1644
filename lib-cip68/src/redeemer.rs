//! Redeemer Wire Shapes
//!
//! These shapes are fixed by the deployed validator; this crate only
//! produces them.

use crate::plutus_data::PlutusData;
use crate::tier::Tier;

/// Minting policy redeemer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MintRedeemer {
    /// `MintBushWifPlanesRFT(tier)`: mint one user token of a tier.
    /// Constructor 0.
    MintRft { tier: Tier },
    /// `MintReferenceTokens(tiers)`: mint the reference tokens of the listed tiers.
    /// Constructor 1.
    MintReferenceTokens { tiers: Vec<Tier> },
}

impl MintRedeemer {
    pub fn to_plutus_data(&self) -> PlutusData {
        match self {
            MintRedeemer::MintRft { tier } => {
                PlutusData::constr(0, vec![PlutusData::int(tier.index())])
            }
            MintRedeemer::MintReferenceTokens { tiers } => PlutusData::constr(
                1,
                vec![PlutusData::List(
                    tiers.iter().map(|t| PlutusData::int(t.index())).collect(),
                )],
            ),
        }
    }

    /// Parse a redeemer back (used by the simulated validator)
    pub fn from_plutus_data(data: &PlutusData) -> Option<Self> {
        let (tag, fields) = data.as_constr()?;
        match (tag, fields) {
            (0, [tier]) => Some(MintRedeemer::MintRft {
                tier: tier_of(tier)?,
            }),
            (1, [PlutusData::List(items)]) => Some(MintRedeemer::MintReferenceTokens {
                tiers: items.iter().map(tier_of).collect::<Option<Vec<_>>>()?,
            }),
            _ => None,
        }
    }
}

/// Spending validator redeemer: `{wrapper: {wrapper: tier}}`.
///
/// The validator schema nests the tier inside two single-field records, so
/// the encoding is `Constr 0 [Constr 0 [Int tier]]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpendRedeemer {
    pub tier: Tier,
}

impl SpendRedeemer {
    pub fn new(tier: Tier) -> Self {
        Self { tier }
    }

    pub fn to_plutus_data(&self) -> PlutusData {
        PlutusData::constr(
            0,
            vec![PlutusData::constr(0, vec![PlutusData::int(self.tier.index())])],
        )
    }

    pub fn from_plutus_data(data: &PlutusData) -> Option<Self> {
        match data.as_constr()? {
            (0, [inner]) => match inner.as_constr()? {
                (0, [tier]) => Some(Self { tier: tier_of(tier)? }),
                _ => None,
            },
            _ => None,
        }
    }
}

fn tier_of(data: &PlutusData) -> Option<Tier> {
    let index = u8::try_from(data.as_integer()?).ok()?;
    Tier::new(index).ok()
}
