//! Error types for odds handling.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised while interpreting a bookmaker price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OddsError {
    /// American odds are never zero and never inside (-100, +100).
    #[error("Invalid American odds: {0}")]
    InvalidOddsFormat(i32),

    /// Decimal odds include the stake, so they are always above 1.
    #[error("Invalid decimal odds: {0}")]
    InvalidDecimalOdds(Decimal),
}
