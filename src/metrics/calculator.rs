//! Calculator for ledger analytics: win rate, equity curve, drawdown, exposure.
//!
//! A derived view, never stored. Only closed trades count; cancelled trades
//! are excluded exactly like open ones (see
//! `TradeStatus::counts_toward_analytics`).

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::TradeRecord;

/// One point on the equity curve: cumulative realized P&L after a close.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub symbol: String,
    pub equity: Decimal,
}

/// Aggregate view over the closed trades of a ledger.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LedgerStats {
    pub closed_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,

    /// Sum of realized P&L
    pub net_profit: Decimal,

    /// Percentage of closed trades with positive P&L, 0 when none closed
    pub win_rate: f64,

    pub avg_win: Decimal,
    pub avg_loss: Decimal,

    /// Gross profit over gross loss
    pub profit_factor: f64,

    /// Mean P&L per closed trade
    pub expectancy: Decimal,

    /// Largest peak-to-trough drop of the equity curve, in dollars
    pub max_drawdown: Decimal,

    /// Cumulative P&L in ledger order
    pub equity_curve: Vec<EquityPoint>,

    /// Total position size per symbol over closed trades
    pub exposure_by_symbol: BTreeMap<String, Decimal>,
}

/// Computes [`LedgerStats`] from a ledger snapshot.
pub struct StatsCalculator;

impl StatsCalculator {
    pub fn calculate(records: &[TradeRecord]) -> LedgerStats {
        let mut stats = LedgerStats::default();

        let closed: Vec<&TradeRecord> = records
            .iter()
            .filter(|r| r.status.counts_toward_analytics())
            .collect();

        stats.closed_trades = closed.len();
        if closed.is_empty() {
            return stats;
        }

        let (wins, losses): (Vec<&TradeRecord>, Vec<&TradeRecord>) =
            closed.iter().copied().partition(|r| r.pnl > Decimal::ZERO);

        stats.winning_trades = wins.len();
        stats.losing_trades = losses.len();
        stats.net_profit = closed.iter().map(|r| r.pnl).sum();
        stats.win_rate = wins.len() as f64 / closed.len() as f64 * 100.0;
        stats.expectancy = stats.net_profit / Decimal::from(closed.len() as u64);

        let gross_profit: Decimal = wins.iter().map(|r| r.pnl).sum();
        let gross_loss: Decimal = losses.iter().map(|r| r.pnl.abs()).sum();

        if !wins.is_empty() {
            stats.avg_win = gross_profit / Decimal::from(wins.len() as u64);
        }
        if !losses.is_empty() {
            stats.avg_loss = gross_loss / Decimal::from(losses.len() as u64);
        }
        if gross_loss > Decimal::ZERO {
            stats.profit_factor =
                gross_profit.to_f64().unwrap_or(0.0) / gross_loss.to_f64().unwrap_or(1.0);
        }

        // Equity curve and drawdown in ledger order
        let mut equity = Decimal::ZERO;
        let mut peak = Decimal::ZERO;
        for record in &closed {
            equity += record.pnl;
            stats.equity_curve.push(EquityPoint {
                timestamp: record.timestamp,
                symbol: record.symbol.clone(),
                equity,
            });

            if equity > peak {
                peak = equity;
            }
            let drawdown = peak - equity;
            if drawdown > stats.max_drawdown {
                stats.max_drawdown = drawdown;
            }
        }

        for record in &closed {
            *stats
                .exposure_by_symbol
                .entry(record.symbol.clone())
                .or_insert(Decimal::ZERO) += record.position_size;
        }

        stats
    }
}

impl fmt::Display for LedgerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== War Room ===")?;
        writeln!(f, "Closed Trades:  {}", self.closed_trades)?;
        writeln!(f, "Net Profit:     ${:.2}", self.net_profit)?;
        writeln!(f, "Win Rate:       {:.1}%", self.win_rate)?;
        writeln!(
            f,
            "Wins / Losses:  {} / {}",
            self.winning_trades, self.losing_trades
        )?;
        writeln!(f, "Avg Win:        ${:.2}", self.avg_win)?;
        writeln!(f, "Avg Loss:       ${:.2}", self.avg_loss)?;
        writeln!(f, "Profit Factor:  {:.2}", self.profit_factor)?;
        writeln!(f, "Expectancy:     ${:.2}", self.expectancy)?;
        write!(f, "Max Drawdown:   ${:.2}", self.max_drawdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, TradeStatus};
    use crate::trading::compute;
    use rust_decimal_macros::dec;

    fn record(symbol: &str, status: TradeStatus, pnl: Decimal) -> TradeRecord {
        let sizing = compute(dec!(100), dec!(95), dec!(60), dec!(1500), Direction::Long)
            .expect("valid inputs");
        let mut record = TradeRecord::open(
            symbol,
            Direction::Long,
            chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            &sizing,
        );
        record.status = status;
        record.pnl = pnl;
        record
    }

    #[test]
    fn empty_ledger_has_zero_win_rate() {
        let stats = StatsCalculator::calculate(&[]);
        assert_eq!(stats.closed_trades, 0);
        assert_eq!(stats.win_rate, 0.0);
        assert_eq!(stats.net_profit, Decimal::ZERO);
        assert!(stats.equity_curve.is_empty());
    }

    #[test]
    fn open_and_cancelled_trades_are_excluded() {
        let records = vec![
            record("BTC", TradeStatus::Open, Decimal::ZERO),
            record("ETH", TradeStatus::Cancelled, Decimal::ZERO),
        ];
        let stats = StatsCalculator::calculate(&records);
        assert_eq!(stats.closed_trades, 0);
        assert_eq!(stats.win_rate, 0.0);
        assert!(stats.exposure_by_symbol.is_empty());
    }

    #[test]
    fn aggregates_over_closed_trades() {
        let records = vec![
            record("BTC", TradeStatus::Closed, dec!(120)),
            record("BTC", TradeStatus::Open, Decimal::ZERO),
            record("ETH", TradeStatus::Closed, dec!(-50)),
            record("BTC", TradeStatus::Closed, dec!(30)),
        ];
        let stats = StatsCalculator::calculate(&records);

        assert_eq!(stats.closed_trades, 3);
        assert_eq!(stats.winning_trades, 2);
        assert_eq!(stats.losing_trades, 1);
        assert_eq!(stats.net_profit, dec!(100));
        assert!((stats.win_rate - 66.666).abs() < 0.01);
        assert_eq!(stats.avg_win, dec!(75));
        assert_eq!(stats.avg_loss, dec!(50));
        assert!((stats.profit_factor - 3.0).abs() < 1e-9);

        // Equity curve: 120, 70, 100; drawdown 50 after the loss
        let equities: Vec<Decimal> = stats.equity_curve.iter().map(|p| p.equity).collect();
        assert_eq!(equities, vec![dec!(120), dec!(70), dec!(100)]);
        assert_eq!(stats.max_drawdown, dec!(50));

        // Exposure: two closed BTC trades at 1200 each
        assert_eq!(stats.exposure_by_symbol["BTC"], dec!(2400.00));
        assert_eq!(stats.exposure_by_symbol["ETH"], dec!(1200.00));
    }
}
