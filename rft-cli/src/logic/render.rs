//! UTXO and policy rendering
//!
//! Builds the JSON documents and text tables printed by the inspection
//! commands. Datums that parse as CIP-68 metadata are decoded; anything
//! else is shown in the detailed Plutus JSON schema.

use lib_cip68::{split_label, Cip68Datum, PlutusData, TierTable, REFERENCE_TOKEN_LABEL, RFT_LABEL};
use lib_tx::{Deployment, PolicyConfig};
use lib_types::{Address, Unit};
use lib_utxo::UtxoEntry;
use serde_json::{json, Value as Json};

/// CIP-67 class of an asset
pub fn token_kind(unit: &Unit) -> &'static str {
    match split_label(&unit.asset_name) {
        Some((REFERENCE_TOKEN_LABEL, _)) => "reference",
        Some((RFT_LABEL, _)) => "user",
        Some(_) => "labeled",
        None => "plain",
    }
}

/// Display name with any label stripped
pub fn token_name(unit: &Unit) -> String {
    match split_label(&unit.asset_name) {
        Some((_, name)) => String::from_utf8_lossy(name).into_owned(),
        None => unit.asset_name.to_text_lossy(),
    }
}

pub fn datum_to_json(datum: &PlutusData) -> Json {
    match Cip68Datum::from_plutus_data(datum) {
        Ok(cip68) => json!({
            "name": cip68.metadata_text("name"),
            "description": cip68.metadata_text("description"),
            "image": cip68.metadata_text("image"),
            "version": cip68.version,
            "tier": cip68.tier(),
        }),
        Err(_) => datum.to_json(),
    }
}

pub fn utxo_to_json(entry: &UtxoEntry) -> Json {
    let assets: Vec<Json> = entry
        .utxo
        .value
        .assets()
        .map(|(unit, quantity)| {
            json!({
                "unit": unit.to_hex(),
                "policy_id": unit.policy_id.to_hex(),
                "name": token_name(unit),
                "kind": token_kind(unit),
                "quantity": quantity.to_string(),
            })
        })
        .collect();

    json!({
        "outpoint": entry.outpoint.to_string(),
        "address": entry.utxo.address.to_bech32(),
        "lovelace": entry.utxo.value.lovelace.to_string(),
        "assets": assets,
        "datum": entry.utxo.datum.as_ref().map(datum_to_json),
    })
}

/// JSON view of a UTXO set at one address
pub fn utxo_set_to_json(label: &str, address: &Address, entries: &[UtxoEntry]) -> Json {
    json!({
        "label": label,
        "address": address.to_bech32(),
        "count": entries.len(),
        "utxos": entries.iter().map(utxo_to_json).collect::<Vec<_>>(),
    })
}

/// Fixed-width table of a UTXO set
pub fn utxo_table(entries: &[UtxoEntry]) -> String {
    let mut result = format!("{:<70} {:>16}  {}\n", "OUTPOINT", "LOVELACE", "ASSETS");
    for entry in entries {
        let assets: Vec<String> = entry
            .utxo
            .value
            .assets()
            .map(|(unit, quantity)| format!("{} {} ({})", quantity, token_name(unit), token_kind(unit)))
            .collect();
        let tier = entry
            .utxo
            .datum
            .as_ref()
            .and_then(|d| Cip68Datum::from_plutus_data(d).ok())
            .and_then(|d| d.tier())
            .map(|t| format!(" [tier {}]", t))
            .unwrap_or_default();
        result.push_str(&format!(
            "{:<70} {:>16}  {}{}\n",
            entry.outpoint.to_string(),
            entry.utxo.value.lovelace,
            if assets.is_empty() { "-".to_string() } else { assets.join(", ") },
            tier
        ));
    }
    result
}

/// Deployment handles and tier units
pub fn policy_summary(
    policy: &PolicyConfig,
    deployment: &Deployment,
    tiers: &TierTable,
    wallet_address: &Address,
) -> Json {
    let tiers: Vec<Json> = tiers
        .iter()
        .map(|spec| {
            json!({
                "tier": spec.tier.index(),
                "name": spec.name,
                "price": spec.price.to_string(),
                "image": spec.image,
                "reference_unit": spec.reference_unit(deployment.policy_id).ok().map(|u| u.to_hex()),
                "user_unit": spec.user_unit(deployment.policy_id).ok().map(|u| u.to_hex()),
            })
        })
        .collect();

    json!({
        "policy_id": deployment.policy_id.to_hex(),
        "contract_address": deployment.contract_address.to_bech32(),
        "wallet_address": wallet_address.to_bech32(),
        "base_unit": policy.base_unit().to_hex(),
        "admins": policy.admins.iter().map(|k| k.to_hex()).collect::<Vec<_>>(),
        "tiers": tiers,
    })
}
