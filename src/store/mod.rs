//! Trade store backends: the ledger's load / replace-all persistence contract.
//!
//! The contract is deliberately coarse: `load` fetches the whole ledger and
//! `replace_all` overwrites it. Two concurrent writers against the same
//! backing store can therefore clobber each other between the read and the
//! write. This is an accepted limitation of a single-user journal, not
//! something the backends try to paper over.

mod csv;
mod sqlite;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Direction, TradeRecord, TradeStatus};

pub use self::csv::CsvStore;
pub use self::sqlite::SqliteStore;

/// Timestamp format persisted by this version.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Minute-precision format written by earlier versions, still accepted on load.
const LEGACY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Persistence contract both backends implement.
#[async_trait]
pub trait TradeStore: Send + Sync {
    /// Load the full ledger in insertion order. An absent or uninitialized
    /// backing store is an empty ledger, not an error.
    async fn load(&self) -> Result<Vec<TradeRecord>>;

    /// Overwrite the entire backing collection with `records`.
    async fn replace_all(&self, records: &[TradeRecord]) -> Result<()>;
}

/// One persisted row. Field names and order are the backing store's header
/// row and must not change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRow {
    #[serde(rename = "Data")]
    pub timestamp: String,
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Direção")]
    pub direction: String,
    #[serde(rename = "Entrada")]
    pub entry_price: Decimal,
    #[serde(rename = "Stop Loss")]
    pub stop_price: Decimal,
    #[serde(rename = "Target")]
    pub target_price: Decimal,
    #[serde(rename = "Risco($)")]
    pub risk_amount: Decimal,
    #[serde(rename = "Size($)")]
    pub position_size: Decimal,
    #[serde(rename = "Leverage")]
    pub leverage: Decimal,
    #[serde(rename = "Saída")]
    pub exit_price: Decimal,
    #[serde(rename = "PnL($)")]
    pub pnl: Decimal,
    #[serde(rename = "Status")]
    pub status: String,
}

impl TradeRow {
    pub fn from_record(record: &TradeRecord) -> Self {
        Self {
            timestamp: record.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            symbol: record.symbol.clone(),
            direction: record.direction.as_str().to_string(),
            entry_price: record.entry_price,
            stop_price: record.stop_price,
            target_price: record.target_price,
            risk_amount: record.risk_amount,
            position_size: record.position_size,
            leverage: record.leverage,
            exit_price: record.exit_price,
            pnl: record.pnl,
            status: record.status.as_str().to_string(),
        }
    }

    pub fn into_record(self) -> Result<TradeRecord> {
        let timestamp = parse_timestamp(&self.timestamp)
            .with_context(|| format!("invalid timestamp {:?}", self.timestamp))?;
        let direction = Direction::parse(&self.direction)
            .ok_or_else(|| anyhow!("invalid direction {:?}", self.direction))?;
        let status = TradeStatus::parse(&self.status)
            .ok_or_else(|| anyhow!("invalid status {:?}", self.status))?;

        Ok(TradeRecord {
            timestamp,
            symbol: self.symbol,
            direction,
            entry_price: self.entry_price,
            stop_price: self.stop_price,
            target_price: self.target_price,
            risk_amount: self.risk_amount,
            position_size: self.position_size,
            leverage: self.leverage,
            exit_price: self.exit_price,
            pnl: self.pnl,
            status,
        })
    }
}

fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, LEGACY_TIMESTAMP_FORMAT))
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_record() -> TradeRecord {
        let sizing = crate::trading::compute(
            dec!(100),
            dec!(95),
            dec!(60),
            dec!(1500),
            Direction::Long,
        )
        .expect("valid inputs");
        TradeRecord::open(
            "SOL",
            Direction::Long,
            chrono::NaiveDate::from_ymd_opt(2024, 5, 7)
                .unwrap()
                .and_hms_opt(14, 2, 33)
                .unwrap(),
            &sizing,
        )
    }

    #[test]
    fn row_round_trip() {
        let record = sample_record();
        let row = TradeRow::from_record(&record);

        assert_eq!(row.timestamp, "2024-05-07 14:02:33");
        assert_eq!(row.direction, "LONG");
        assert_eq!(row.status, "ABERTO");

        let back = row.into_record().expect("well-formed row");
        assert_eq!(back, record);
    }

    #[test]
    fn legacy_minute_timestamps_still_load() {
        let mut row = TradeRow::from_record(&sample_record());
        row.timestamp = "2023-11-02 09:15".to_string();

        let record = row.into_record().expect("legacy format accepted");
        assert_eq!(
            record.timestamp,
            chrono::NaiveDate::from_ymd_opt(2023, 11, 2)
                .unwrap()
                .and_hms_opt(9, 15, 0)
                .unwrap()
        );
    }

    #[test]
    fn malformed_rows_are_rejected() {
        let mut row = TradeRow::from_record(&sample_record());
        row.direction = "HEDGE".to_string();
        assert!(row.into_record().is_err());

        let mut row = TradeRow::from_record(&sample_record());
        row.status = "PENDING".to_string();
        assert!(row.into_record().is_err());

        let mut row = TradeRow::from_record(&sample_record());
        row.timestamp = "yesterday".to_string();
        assert!(row.into_record().is_err());
    }
}
