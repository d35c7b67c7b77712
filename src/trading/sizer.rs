//! Fixed-fractional position sizing.
//!
//! The position is sized so that a full stop-out loses exactly the risk
//! budget. Pure arithmetic, no I/O.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::Direction;

/// Reward:risk multiple used to place the take-profit target.
pub const REWARD_RISK_MULTIPLE: Decimal = dec!(3);

/// Pre-trade analysis produced by [`compute`].
///
/// Values are unrounded; rounding to the persisted precision happens when a
/// `TradeRecord` is built from this.
#[derive(Debug, Clone, PartialEq)]
pub struct SizingResult {
    /// Planned entry price (echoed input)
    pub entry_price: Decimal,
    /// Stop-loss price (echoed input)
    pub stop_price: Decimal,
    /// Risk budget in dollars (echoed input)
    pub risk_amount: Decimal,
    /// Absolute distance from entry to stop
    pub stop_distance: Decimal,
    /// Stop distance as a fraction of entry
    pub stop_distance_pct: Decimal,
    /// Notional position size in dollars
    pub position_size: Decimal,
    /// Position size over account capital
    pub leverage: Decimal,
    /// Take-profit price at the reward:risk multiple
    pub target_price: Decimal,
    /// Profit if the target is hit: risk times the multiple
    pub potential_profit: Decimal,
}

/// Run the sizing analysis for a planned trade.
///
/// Returns `None` when the inputs are not yet analyzable (non-positive
/// prices, entry equal to stop, non-positive risk or capital). That is
/// "insufficient input", not an error: the caller simply has no analysis to
/// show. The `entry != stop` precondition also rules out division by zero
/// below.
pub fn compute(
    entry: Decimal,
    stop: Decimal,
    risk: Decimal,
    capital: Decimal,
    direction: Direction,
) -> Option<SizingResult> {
    if entry <= Decimal::ZERO
        || stop <= Decimal::ZERO
        || entry == stop
        || risk <= Decimal::ZERO
        || capital <= Decimal::ZERO
    {
        return None;
    }

    let stop_distance = (entry - stop).abs();
    let stop_distance_pct = stop_distance / entry;
    let position_size = risk / stop_distance_pct;
    let leverage = position_size / capital;

    let target_price = match direction {
        Direction::Long => entry + stop_distance * REWARD_RISK_MULTIPLE,
        Direction::Short => entry - stop_distance * REWARD_RISK_MULTIPLE,
    };

    Some(SizingResult {
        entry_price: entry,
        stop_price: stop,
        risk_amount: risk,
        stop_distance,
        stop_distance_pct,
        position_size,
        leverage,
        target_price,
        potential_profit: risk * REWARD_RISK_MULTIPLE,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_example() {
        let result = compute(dec!(100), dec!(95), dec!(60), dec!(1500), Direction::Long)
            .expect("valid inputs");

        assert_eq!(result.stop_distance, dec!(5));
        assert_eq!(result.stop_distance_pct, dec!(0.05));
        assert_eq!(result.position_size, dec!(1200));
        assert_eq!(result.leverage, dec!(0.8));
        assert_eq!(result.target_price, dec!(115));
        assert_eq!(result.potential_profit, dec!(180));
    }

    #[test]
    fn short_target_is_below_entry() {
        let result = compute(dec!(100), dec!(105), dec!(60), dec!(1500), Direction::Short)
            .expect("valid inputs");

        assert_eq!(result.stop_distance, dec!(5));
        assert_eq!(result.target_price, dec!(85));
        assert_eq!(result.potential_profit, dec!(180));
    }

    #[test]
    fn sizing_identity_holds() {
        // position_size = risk / (|entry - stop| / entry)
        let result = compute(dec!(42.5), dec!(40), dec!(25), dec!(2000), Direction::Long)
            .expect("valid inputs");

        let expected = dec!(25) / (dec!(2.5) / dec!(42.5));
        assert_eq!(result.position_size, expected);
        assert_eq!(result.leverage, expected / dec!(2000));
    }

    #[test]
    fn insufficient_input_yields_none() {
        assert!(compute(dec!(0), dec!(95), dec!(60), dec!(1500), Direction::Long).is_none());
        assert!(compute(dec!(100), dec!(0), dec!(60), dec!(1500), Direction::Long).is_none());
        assert!(compute(dec!(100), dec!(100), dec!(60), dec!(1500), Direction::Long).is_none());
        assert!(compute(dec!(100), dec!(95), dec!(0), dec!(1500), Direction::Long).is_none());
        assert!(compute(dec!(100), dec!(95), dec!(60), dec!(0), Direction::Long).is_none());
    }
}
