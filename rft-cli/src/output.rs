//! Issuance output
//!
//! Everything a command shows the user goes through [`Output`] so tests can
//! capture or discard it. Logs go to stderr through `tracing`; this is stdout.

use lib_types::{Address, TxHash};
use lib_utxo::UtxoEntry;

use crate::error::CliResult;
use crate::logic;

/// Sink for command results
pub trait Output: Send + Sync {
    /// Write one block of text
    fn print(&self, msg: &str) -> CliResult<()>;

    /// Pretty-printed JSON document
    fn json(&self, data: &serde_json::Value) -> CliResult<()> {
        self.print(&serde_json::to_string_pretty(data)?)
    }

    /// Banner opening an issuance action
    fn action(&self, title: &str) -> CliResult<()> {
        self.print(&format!("\n== {} ==", title))
    }

    /// Indented line under the current action
    fn detail(&self, msg: &str) -> CliResult<()> {
        self.print(&format!("   {}", msg))
    }

    fn tx_submitted(&self, action: &str, tx_hash: &TxHash) -> CliResult<()> {
        self.print(&format!("   {} submitted: {}", action, tx_hash))
    }

    fn tx_confirmed(&self, action: &str, tx_hash: &TxHash) -> CliResult<()> {
        self.print(&format!("✅ {} confirmed: {}", action, tx_hash))
    }

    /// One address's UTXOs, as a table or a JSON document
    fn utxo_set(
        &self,
        label: &str,
        address: &Address,
        entries: &[UtxoEntry],
        format: &str,
    ) -> CliResult<()> {
        if format == "table" {
            self.print(&format!(
                "\n{} {} ({} utxos)\n{}",
                label,
                address,
                entries.len(),
                logic::utxo_table(entries)
            ))
        } else {
            self.json(&logic::utxo_set_to_json(label, address, entries))
        }
    }
}

/// Writes to stdout
pub struct ConsoleOutput;

impl Output for ConsoleOutput {
    fn print(&self, msg: &str) -> CliResult<()> {
        println!("{}", msg);
        Ok(())
    }
}

/// Discards everything
pub struct SilentOutput;

impl Output for SilentOutput {
    fn print(&self, _msg: &str) -> CliResult<()> {
        Ok(())
    }
}
