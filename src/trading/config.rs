//! Journal configuration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Default inputs for the sizing form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalConfig {
    /// Account capital in dollars
    pub default_capital: Decimal,

    /// Fixed risk budget per trade in dollars
    pub default_risk: Decimal,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            default_capital: dec!(1500.0),
            default_risk: dec!(60.0),
        }
    }
}
