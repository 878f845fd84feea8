//! Ledger persistence
//!
//! Stores the ledger as a JSON document at `~/.tailor/costs.json`

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};
use crate::ledger::UsageLedger;

/// Default ledger location under the user's home directory
const DEFAULT_LEDGER_FILE: &str = ".tailor/costs.json";

/// Environment variable overriding the ledger location
pub const LEDGER_PATH_ENV: &str = "TAILOR_LEDGER_PATH";

/// Loads and persists the usage ledger
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    /// Create a store at the default path, honoring `TAILOR_LEDGER_PATH`
    #[must_use]
    pub fn new() -> Self {
        if let Ok(path) = std::env::var(LEDGER_PATH_ENV) {
            if !path.is_empty() {
                return Self {
                    path: PathBuf::from(path),
                };
            }
        }

        let path = dirs::home_dir()
            .map(|h| h.join(DEFAULT_LEDGER_FILE))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LEDGER_FILE));

        Self { path }
    }

    /// Create a store at a custom path
    #[must_use]
    pub fn with_path(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Ledger file path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the ledger, or an empty one when the file does not exist yet
    pub fn load(&self) -> Result<UsageLedger> {
        if !self.path.exists() {
            debug!(path = ?self.path, "No ledger file yet, starting empty");
            return Ok(UsageLedger::default());
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| Error::Storage(format!("failed to read {:?}: {}", self.path, e)))?;

        serde_json::from_str(&content)
            .map_err(|e| Error::Storage(format!("failed to parse {:?}: {}", self.path, e)))
    }

    /// Persist the ledger.
    ///
    /// Writes to a sibling temporary file and renames it over the target, so
    /// an interrupted save never leaves a garbled ledger behind.
    pub fn save(&self, ledger: &UsageLedger) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::Storage(format!("failed to create directory {:?}: {}", parent, e))
                })?;
            }
        }

        let content = serde_json::to_string_pretty(ledger)
            .map_err(|e| Error::Storage(format!("failed to serialize ledger: {}", e)))?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)
            .map_err(|e| Error::Storage(format!("failed to write {:?}: {}", tmp, e)))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            Error::Storage(format!("failed to replace {:?}: {}", self.path, e))
        })?;

        debug!(path = ?self.path, calls = ledger.calls.len(), "Ledger saved");
        Ok(())
    }
}

impl Default for LedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{OperationKind, UsageRecord};
    use chrono::Utc;
    use tempfile::TempDir;

    fn sample_record(model: &str, cost: f64) -> UsageRecord {
        UsageRecord {
            timestamp: Utc::now(),
            model: model.to_string(),
            input_tokens: 1000,
            output_tokens: 500,
            cost,
            operation: OperationKind::Customization,
        }
    }

    #[test]
    fn test_store_with_path() {
        let store = LedgerStore::with_path("/custom/costs.json");
        assert_eq!(store.path(), Path::new("/custom/costs.json"));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = LedgerStore::with_path(temp_dir.path().join("costs.json"));

        let ledger = store.load().unwrap();
        assert!(ledger.calls.is_empty());
        assert!(ledger.daily_budget.is_none());
        assert!(ledger.monthly_budget.is_none());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = LedgerStore::with_path(temp_dir.path().join("costs.json"));

        let mut ledger = UsageLedger::default();
        ledger.daily_budget = Some(10.0);
        ledger.monthly_budget = Some(200.0);
        ledger.append(sample_record("claude-sonnet-4-20250514", 0.42), 1000);
        ledger.append(sample_record("claude-3-5-haiku-20241022", 0.01), 1000);

        store.save(&ledger).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded.calls.len(), 2);
        assert_eq!(loaded.daily_budget, Some(10.0));
        assert_eq!(loaded.monthly_budget, Some(200.0));
        assert_eq!(loaded.calls[0].model, "claude-sonnet-4-20250514");
        assert!((loaded.total_cost() - 0.43).abs() < 1e-9);
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let temp_dir = TempDir::new().unwrap();
        let store = LedgerStore::with_path(temp_dir.path().join("nested/dir/costs.json"));

        store.save(&UsageLedger::default()).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_save_leaves_no_temporary_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = LedgerStore::with_path(temp_dir.path().join("costs.json"));

        store.save(&UsageLedger::default()).unwrap();

        let entries: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(entries, vec!["costs.json".to_string()]);
    }

    #[test]
    fn test_load_corrupt_file_is_storage_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("costs.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = LedgerStore::with_path(&path);
        let err = store.load().unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }

    #[test]
    fn test_save_into_unwritable_location_is_storage_error() {
        let temp_dir = TempDir::new().unwrap();
        // A file where the parent directory should be.
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();

        let store = LedgerStore::with_path(blocker.join("costs.json"));
        let err = store.save(&UsageLedger::default()).unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }
}
