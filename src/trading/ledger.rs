//! Trade ledger: record lifecycle over the store contract.
//!
//! Every operation is one read-modify-write cycle: load the full ledger,
//! mutate the snapshot, write the full ledger back. Records are never
//! physically deleted; cancellation is a terminal status, not removal.

use anyhow::{bail, Context, Result};
use chrono::Timelike;
use rust_decimal::Decimal;
use tracing::info;

use crate::models::{Direction, TradeRecord, TradeStatus};
use crate::store::TradeStore;

use super::SizingResult;

/// Record lifecycle engine. Enforces the editable-field allow-list: after
/// creation only `exit_price` and `status` change, and only through the
/// operations below.
pub struct Ledger {
    store: Box<dyn TradeStore>,
}

impl Ledger {
    pub fn new(store: Box<dyn TradeStore>) -> Self {
        Self { store }
    }

    /// Current ledger snapshot, in insertion order.
    pub async fn records(&self) -> Result<Vec<TradeRecord>> {
        self.store.load().await
    }

    /// Register a new open trade from a sizing analysis. Returns the row
    /// index and the stored record.
    pub async fn append(
        &self,
        symbol: &str,
        direction: Direction,
        sizing: &SizingResult,
    ) -> Result<(usize, TradeRecord)> {
        if symbol.trim().is_empty() {
            bail!("symbol must not be empty");
        }

        let now = chrono::Local::now().naive_local();
        let now = now.with_nanosecond(0).unwrap_or(now);
        let record = TradeRecord::open(symbol, direction, now, sizing);

        let mut records = self.store.load().await?;
        records.push(record.clone());
        self.store.replace_all(&records).await?;

        let row = records.len() - 1;
        info!(
            row = row,
            symbol = %record.symbol,
            direction = record.direction.as_str(),
            size = %record.position_size,
            "trade registered"
        );
        Ok((row, record))
    }

    /// Close an open trade at `exit_price` and recompute its P&L.
    pub async fn close(&self, row: usize, exit_price: Decimal) -> Result<TradeRecord> {
        if exit_price <= Decimal::ZERO {
            bail!("exit price must be positive");
        }

        let mut records = self.store.load().await?;
        let record = records
            .get_mut(row)
            .with_context(|| format!("no trade at row {row}"))?;

        if record.status != TradeStatus::Open {
            bail!(
                "only open trades can be closed, row {row} is {}",
                record.status.as_str()
            );
        }

        record.exit_price = exit_price;
        record.status = TradeStatus::Closed;
        record.recompute_pnl();
        let closed = record.clone();

        self.store.replace_all(&records).await?;
        info!(row = row, symbol = %closed.symbol, pnl = %closed.pnl, "trade closed");
        Ok(closed)
    }

    /// Cancel an open trade. Terminal: the record stays in the ledger but is
    /// excluded from analytics.
    pub async fn cancel(&self, row: usize) -> Result<TradeRecord> {
        let mut records = self.store.load().await?;
        let record = records
            .get_mut(row)
            .with_context(|| format!("no trade at row {row}"))?;

        if record.status != TradeStatus::Open {
            bail!(
                "only open trades can be cancelled, row {row} is {}",
                record.status.as_str()
            );
        }

        record.status = TradeStatus::Cancelled;
        let cancelled = record.clone();

        self.store.replace_all(&records).await?;
        info!(row = row, symbol = %cancelled.symbol, "trade cancelled");
        Ok(cancelled)
    }

    /// Recompute P&L across the whole ledger and write it back. Returns how
    /// many records changed. Idempotent.
    pub async fn sync(&self) -> Result<usize> {
        let mut records = self.store.load().await?;
        let changed = recompute_pnl(&mut records);
        self.store.replace_all(&records).await?;

        info!(rows = records.len(), changed = changed, "ledger synchronized");
        Ok(changed)
    }
}

/// Recompute P&L for every closed-with-exit record in place. All other
/// records keep their previous value.
pub fn recompute_pnl(records: &mut [TradeRecord]) -> usize {
    records
        .iter_mut()
        .map(|r| r.recompute_pnl())
        .filter(|&changed| changed)
        .count()
}
