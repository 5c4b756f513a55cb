use rust_decimal::{Decimal, RoundingStrategy};

use crate::core::{AppError, Result};

/// Scale used for every stored money amount
pub const MONEY_SCALE: u32 = 2;

/// Minimum scale a stored fee percentage is padded to
pub const PERCENTAGE_SCALE: u32 = 2;

/// Validates a fee percentage lies within [0, 100]
///
/// Any precision is accepted. Values with fewer than 2 fractional digits are
/// padded so `3` is kept as `3.00`; finer values are kept exactly.
pub fn validate_percentage(percentage: Decimal) -> Result<Decimal> {
    if percentage < Decimal::ZERO || percentage > Decimal::ONE_HUNDRED {
        return Err(AppError::validation(format!(
            "Fee percentage must be between 0 and 100, got {}",
            percentage
        )));
    }

    let mut stored = percentage.normalize();
    if stored.scale() < PERCENTAGE_SCALE {
        stored.rescale(PERCENTAGE_SCALE);
    }
    Ok(stored)
}

/// Validates that a money amount is positive and has at most 2 decimal places
pub fn validate_amount(amount: Decimal) -> Result<Decimal> {
    if amount <= Decimal::ZERO {
        return Err(AppError::validation("Amount must be positive"));
    }

    if amount.normalize().scale() > MONEY_SCALE {
        return Err(AppError::validation(format!(
            "Amounts must have at most {} decimal places, got {}",
            MONEY_SCALE, amount
        )));
    }

    Ok(amount)
}
