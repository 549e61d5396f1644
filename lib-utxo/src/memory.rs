//! In-memory UTXO store

use std::collections::{BTreeMap, HashSet};
use std::sync::RwLock;

use lib_types::Address;

use crate::errors::{UtxoError, UtxoResult};
use crate::types::{OutPoint, Utxo, UtxoEntry, UtxoStore};

#[derive(Debug, Default)]
struct StoreState {
    live: BTreeMap<OutPoint, Utxo>,
    spent: HashSet<OutPoint>,
}

/// UTXO set held in memory, backing the simulated ledger
#[derive(Debug, Default)]
pub struct MemoryUtxoStore {
    state: RwLock<StoreState>,
}

fn poisoned<T>(_: T) -> UtxoError {
    UtxoError::Storage("store lock poisoned".to_string())
}

impl MemoryUtxoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a UTXO directly (genesis seeding)
    pub fn add_utxo(&self, outpoint: OutPoint, utxo: Utxo) -> UtxoResult<()> {
        self.create_utxo(&outpoint, &utxo)
    }

    /// Number of live UTXOs
    pub fn len(&self) -> UtxoResult<usize> {
        Ok(self.state.read().map_err(poisoned)?.live.len())
    }

    pub fn is_empty(&self) -> UtxoResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl UtxoStore for MemoryUtxoStore {
    fn get_utxo(&self, outpoint: &OutPoint) -> UtxoResult<Option<Utxo>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.live.get(outpoint).cloned())
    }

    fn is_spent(&self, outpoint: &OutPoint) -> UtxoResult<bool> {
        Ok(self.state.read().map_err(poisoned)?.spent.contains(outpoint))
    }

    fn spend_utxo(&self, outpoint: &OutPoint) -> UtxoResult<Utxo> {
        let mut state = self.state.write().map_err(poisoned)?;
        if state.spent.contains(outpoint) {
            return Err(UtxoError::AlreadySpent(*outpoint));
        }
        let utxo = state
            .live
            .remove(outpoint)
            .ok_or(UtxoError::NotFound(*outpoint))?;
        state.spent.insert(*outpoint);
        Ok(utxo)
    }

    fn create_utxo(&self, outpoint: &OutPoint, utxo: &Utxo) -> UtxoResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.live.insert(*outpoint, utxo.clone());
        Ok(())
    }

    fn utxos_at(&self, address: &Address) -> UtxoResult<Vec<UtxoEntry>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state
            .live
            .iter()
            .filter(|(_, utxo)| &utxo.address == address)
            .map(|(outpoint, utxo)| UtxoEntry::new(*outpoint, utxo.clone()))
            .collect())
    }
}
