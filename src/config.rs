use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::LedgerError;

/// Ledger-wide settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Upper bound on objects a single transaction may create, take or delete
    pub max_objects_per_transaction: usize,

    /// Keep a receipt for every committed transaction
    pub retain_receipts: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_objects_per_transaction: 1024,
            retain_receipts: true,
        }
    }
}

impl LedgerConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, LedgerError> {
        let config: LedgerConfig =
            serde_json::from_str(json).map_err(|err| LedgerError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read ledger config {}", path.display()))?;
        Ok(Self::from_json_str(&json)?)
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.max_objects_per_transaction == 0 {
            return Err(LedgerError::Config(
                "max_objects_per_transaction must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
