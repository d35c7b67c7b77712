//! CSV file backend for the trade store.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::models::TradeRecord;

use super::{TradeRow, TradeStore};

/// Trade store backed by a local CSV file with the fixed header row.
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TradeStore for CsvStore {
    async fn load(&self) -> Result<Vec<TradeRecord>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "CSV store not initialized, empty ledger");
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;

        let mut records = Vec::new();
        for row in reader.deserialize::<TradeRow>() {
            let row = row.context("malformed CSV row")?;
            records.push(row.into_record()?);
        }

        Ok(records)
    }

    async fn replace_all(&self, records: &[TradeRecord]) -> Result<()> {
        let mut writer = csv::Writer::from_path(&self.path)
            .with_context(|| format!("failed to write {}", self.path.display()))?;

        for record in records {
            writer.serialize(TradeRow::from_record(record))?;
        }

        writer.flush().context("failed to flush CSV store")?;
        debug!(rows = records.len(), path = %self.path.display(), "CSV store rewritten");
        Ok(())
    }
}
