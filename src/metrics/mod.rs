//! Analytics over the ledger: net profit, win rate, equity curve, exposure.

mod calculator;

pub use calculator::StatsCalculator;
