//! Data models for the trade ledger.

mod trade;

pub use trade::{Direction, TradeRecord, TradeStatus};
