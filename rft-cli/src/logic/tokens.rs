//! Token selection logic
//!
//! Tier parsing, reference-token lookup and balance arithmetic over
//! already-fetched UTXO sets.

use crate::error::{CliError, CliResult};
use lib_cip68::{PlutusData, Tier, TierTable};
use lib_types::{Amount, PolicyId, Unit};
use lib_utxo::UtxoEntry;

/// Parse requested tiers, rejecting empty and repeated selections
pub fn parse_tiers(raw: &[u8]) -> CliResult<Vec<Tier>> {
    if raw.is_empty() {
        return Err(CliError::InvalidTier("at least one tier is required".to_string()));
    }
    let mut tiers = Vec::with_capacity(raw.len());
    for index in raw {
        let tier = Tier::new(*index)?;
        if tiers.contains(&tier) {
            return Err(CliError::InvalidTier(format!("tier {} listed twice", tier)));
        }
        tiers.push(tier);
    }
    tiers.sort();
    Ok(tiers)
}

/// First UTXO holding `unit`
pub fn find_reference_utxo(entries: &[UtxoEntry], unit: &Unit) -> Option<UtxoEntry> {
    entries.iter().find(|entry| entry.utxo.holds(unit)).cloned()
}

/// Sum of `unit` across a UTXO set
pub fn total_quantity(entries: &[UtxoEntry], unit: &Unit) -> Amount {
    entries
        .iter()
        .map(|entry| entry.utxo.value.quantity_of(unit))
        .sum()
}

/// Reference token plus the datum to lock it with, for each tier
pub fn reference_locks(
    table: &TierTable,
    tiers: &[Tier],
    policy_id: PolicyId,
    description: &str,
    version: i64,
) -> CliResult<Vec<(Unit, PlutusData)>> {
    tiers
        .iter()
        .map(|tier| {
            let spec = table.get(*tier)?;
            Ok((
                spec.reference_unit(policy_id)?,
                spec.datum(description, version).to_plutus_data(),
            ))
        })
        .collect()
}
