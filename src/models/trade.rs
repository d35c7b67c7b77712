//! Trade record model: one row per trading decision.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::trading::SizingResult;

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "LONG",
            Direction::Short => "SHORT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "LONG" => Some(Direction::Long),
            "SHORT" => Some(Direction::Short),
            _ => None,
        }
    }
}

/// Lifecycle status of a trade record.
///
/// `Cancelled` is terminal: the record stays in the ledger but never closes.
/// The backing store keeps the original Portuguese vocabulary, so `as_str`
/// yields the persisted form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeStatus {
    Open,
    Closed,
    Cancelled,
}

impl TradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Open => "ABERTO",
            TradeStatus::Closed => "FECHADO",
            TradeStatus::Cancelled => "CANCELADO",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "ABERTO" | "OPEN" => Some(TradeStatus::Open),
            "FECHADO" | "CLOSED" => Some(TradeStatus::Closed),
            "CANCELADO" | "CANCELLED" => Some(TradeStatus::Cancelled),
            _ => None,
        }
    }

    /// Whether this status admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TradeStatus::Closed | TradeStatus::Cancelled)
    }

    /// Analytics policy: only closed trades feed the stats. Cancelled trades
    /// are excluded exactly like open ones.
    pub fn counts_toward_analytics(&self) -> bool {
        matches!(self, TradeStatus::Closed)
    }
}

/// One journal entry.
///
/// Everything derived at creation (`target_price`, `position_size`,
/// `leverage`) is immutable afterwards; only `exit_price` and `status` are
/// user-editable, and `pnl` is recomputed from them. Mutation goes through
/// the ledger, which enforces that allow-list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// When the trade was registered (local time, second precision)
    pub timestamp: NaiveDateTime,

    /// Instrument ticker, uppercased
    pub symbol: String,

    /// Trade direction
    pub direction: Direction,

    /// Planned entry price
    pub entry_price: Decimal,

    /// Stop-loss price
    pub stop_price: Decimal,

    /// Take-profit target derived from the reward:risk multiple
    pub target_price: Decimal,

    /// Dollar amount lost on a full stop-out
    pub risk_amount: Decimal,

    /// Notional position size in dollars
    pub position_size: Decimal,

    /// Position size over account capital
    pub leverage: Decimal,

    /// Close price, 0 until the user exits
    pub exit_price: Decimal,

    /// Realized profit/loss, 0 until the trade closes
    pub pnl: Decimal,

    /// Lifecycle status
    pub status: TradeStatus,
}

impl TradeRecord {
    /// Build a new open record from a sizing analysis.
    ///
    /// Derived fields are rounded here, matching the persisted-record
    /// contract: size and target to 2 decimals, leverage to 1.
    pub fn open(
        symbol: &str,
        direction: Direction,
        timestamp: NaiveDateTime,
        sizing: &SizingResult,
    ) -> Self {
        Self {
            timestamp,
            symbol: symbol.trim().to_uppercase(),
            direction,
            entry_price: sizing.entry_price,
            stop_price: sizing.stop_price,
            target_price: sizing.target_price.round_dp(2),
            risk_amount: sizing.risk_amount,
            position_size: sizing.position_size.round_dp(2),
            leverage: sizing.leverage.round_dp(1),
            exit_price: Decimal::ZERO,
            pnl: Decimal::ZERO,
            status: TradeStatus::Open,
        }
    }

    /// Realized P&L for a closed record, `None` while the record is not in
    /// the closed-with-exit state.
    pub fn realized_pnl(&self) -> Option<Decimal> {
        if self.status != TradeStatus::Closed || self.exit_price <= Decimal::ZERO {
            return None;
        }

        let ret = match self.direction {
            Direction::Long => (self.exit_price - self.entry_price) / self.entry_price,
            Direction::Short => (self.entry_price - self.exit_price) / self.entry_price,
        };

        Some((ret * self.position_size).round_dp(2))
    }

    /// Recompute `pnl` from the exit state. Records that are not closed with
    /// a positive exit price are left untouched. Returns whether the stored
    /// value changed.
    pub fn recompute_pnl(&mut self) -> bool {
        match self.realized_pnl() {
            Some(pnl) if pnl != self.pnl => {
                self.pnl = pnl;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trading::{compute, REWARD_RISK_MULTIPLE};
    use rust_decimal_macros::dec;

    fn sample_long() -> TradeRecord {
        let sizing = compute(dec!(100), dec!(95), dec!(60), dec!(1500), Direction::Long)
            .expect("valid inputs");
        TradeRecord::open(
            "btc/usdt",
            Direction::Long,
            chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
            &sizing,
        )
    }

    #[test]
    fn open_record_derives_and_rounds() {
        let record = sample_long();

        assert_eq!(record.symbol, "BTC/USDT");
        assert_eq!(record.position_size, dec!(1200.00));
        assert_eq!(record.leverage, dec!(0.8));
        assert_eq!(record.target_price, dec!(115.00));
        assert_eq!(record.exit_price, Decimal::ZERO);
        assert_eq!(record.pnl, Decimal::ZERO);
        assert_eq!(record.status, TradeStatus::Open);
        assert_eq!(REWARD_RISK_MULTIPLE, dec!(3));
    }

    #[test]
    fn pnl_only_when_closed_with_exit() {
        let mut record = sample_long();

        // Open: no pnl even with an exit price penciled in
        record.exit_price = dec!(110);
        assert_eq!(record.realized_pnl(), None);
        assert!(!record.recompute_pnl());
        assert_eq!(record.pnl, Decimal::ZERO);

        // Closed without exit: still nothing
        record.exit_price = Decimal::ZERO;
        record.status = TradeStatus::Closed;
        assert_eq!(record.realized_pnl(), None);

        // Closed with exit
        record.exit_price = dec!(110);
        assert!(record.recompute_pnl());
        assert_eq!(record.pnl, dec!(120.00));

        // Idempotent
        assert!(!record.recompute_pnl());
        assert_eq!(record.pnl, dec!(120.00));
    }

    #[test]
    fn short_pnl_uses_inverted_return() {
        let sizing = compute(dec!(100), dec!(105), dec!(60), dec!(1500), Direction::Short)
            .expect("valid inputs");
        let mut record = TradeRecord::open(
            "ETH",
            Direction::Short,
            chrono::Local::now().naive_local(),
            &sizing,
        );

        record.status = TradeStatus::Closed;
        record.exit_price = dec!(90);
        record.recompute_pnl();

        // ((100 - 90) / 100) * size
        let expected = (dec!(0.1) * record.position_size).round_dp(2);
        assert_eq!(record.pnl, expected);
        assert!(record.pnl > Decimal::ZERO);
    }

    #[test]
    fn status_policies() {
        assert!(TradeStatus::Closed.counts_toward_analytics());
        assert!(!TradeStatus::Open.counts_toward_analytics());
        assert!(!TradeStatus::Cancelled.counts_toward_analytics());
        assert!(TradeStatus::Cancelled.is_terminal());
        assert!(!TradeStatus::Open.is_terminal());
        assert_eq!(TradeStatus::parse("fechado"), Some(TradeStatus::Closed));
        assert_eq!(Direction::parse("short"), Some(Direction::Short));
        assert_eq!(Direction::parse("sideways"), None);
    }
}
