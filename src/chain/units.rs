//! Wei to display-unit conversion.

use alloy::primitives::U256;

/// Decimals of the native currency (wei per ETH = 10^18).
pub const NATIVE_DECIMALS: usize = 18;

/// Fractional digits shown for a balance.
pub const DISPLAY_DECIMALS: usize = 4;

/// Balance shown for a session that has not been refreshed.
pub const EMPTY_BALANCE: &str = "0.00";

/// 10^(NATIVE_DECIMALS - DISPLAY_DECIMALS): wei per displayed least digit.
const WEI_PER_STEP: u64 = 100_000_000_000_000;

/// 10^DISPLAY_DECIMALS.
const STEPS_PER_UNIT: u64 = 10_000;

/// Format a wei amount as a 4-decimal native-unit string.
///
/// Rounds half-up: 1.23445 ETH becomes "1.2345".
pub fn format_balance(wei: U256) -> String {
    let step = U256::from(WEI_PER_STEP);
    let half = step / U256::from(2u8);
    let steps = wei.saturating_add(half) / step;

    let per_unit = U256::from(STEPS_PER_UNIT);
    let whole = steps / per_unit;
    let frac = (steps % per_unit).to::<u64>();

    format!("{}.{:0width$}", whole, frac, width = DISPLAY_DECIMALS)
}
