//! Portfolio History
//!
//! A JSON array of snapshots, one per run. Entries are only ever appended.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CashError, Result};
use crate::model::{Holding, Performance};

pub const HISTORY_FILE: &str = "portfolio_history.json";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PortfolioHistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub total_value_usd: Decimal,

    #[serde(default)]
    pub performance: Performance,

    #[serde(default)]
    pub holdings: Vec<Holding>,
}

/// Append-only store backed by one JSON file
#[derive(Clone, Debug)]
pub struct PortfolioHistory {
    path: PathBuf,
}

impl PortfolioHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// History file inside a logs directory
    pub fn in_dir(logs_dir: &Path) -> Self {
        Self::new(logs_dir.join(HISTORY_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file as an empty array if it does not exist
    pub fn init(&self) -> Result<()> {
        if !self.path.exists() {
            self.write(&[])?;
        }
        Ok(())
    }

    /// All entries, oldest first. A missing file reads as empty.
    pub fn load(&self) -> Result<Vec<PortfolioHistoryEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&raw).map_err(|e| {
            CashError::ReportParse(format!("{} is not a history array: {e}", self.path.display()))
        })
    }

    /// Append one entry and return the new length
    pub fn append(&self, entry: PortfolioHistoryEntry) -> Result<usize> {
        let mut entries = self.load()?;
        entries.push(entry);
        self.write(&entries)?;
        Ok(entries.len())
    }

    /// Replace the file contents via a sibling temp file and rename
    fn write(&self, entries: &[PortfolioHistoryEntry]) -> Result<()> {
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn entry(hours_ago: i64, total: Decimal) -> PortfolioHistoryEntry {
        PortfolioHistoryEntry {
            timestamp: Utc::now() - Duration::hours(hours_ago),
            total_value_usd: total,
            performance: Performance::default(),
            holdings: vec![Holding::new("BTC", dec!(0.5), dec!(85000), "binance")],
        }
    }

    #[test]
    fn test_append_grows_by_one_each_time() {
        let dir = tempfile::tempdir().unwrap();
        let history = PortfolioHistory::in_dir(dir.path());
        history.init().unwrap();
        history.append(entry(48, dec!(60000))).unwrap();

        let initial = history.load().unwrap().len();
        for n in 1..=3 {
            let len = history.append(entry(0, dec!(65000))).unwrap();
            assert_eq!(len, initial + n);
        }

        let entries = history.load().unwrap();
        assert_eq!(entries.len(), initial + 3);
        assert_eq!(entries[0].total_value_usd, dec!(60000));
        assert!(!dir.path().join("portfolio_history.json.tmp").exists());
    }

    #[test]
    fn test_init_writes_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let history = PortfolioHistory::in_dir(dir.path());
        history.init().unwrap();

        assert_eq!(fs::read_to_string(history.path()).unwrap().trim(), "[]");
        assert!(history.load().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_history_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let history = PortfolioHistory::in_dir(dir.path());
        fs::write(history.path(), "{not json").unwrap();

        assert!(matches!(history.load(), Err(CashError::ReportParse(_))));
    }
}
