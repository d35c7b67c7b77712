//! Trading logic: position sizing and the ledger lifecycle.

mod config;
mod ledger;
mod sizer;

pub use config::JournalConfig;
pub use ledger::Ledger;
pub use sizer::{compute, SizingResult, REWARD_RISK_MULTIPLE};
