//! Odds normalization.
//!
//! Turns bookmaker quotes into comparable decimal payout multipliers.

use odds_core::{AmericanOdds, Bookmaker, DecimalOdds, GameId, OddsError, Quote};
use serde::Serialize;

/// Convert an American price to a decimal payout multiplier.
///
/// Fails with [`OddsError::InvalidOddsFormat`] for `0` and for any price
/// inside (-100, +100).
pub fn decimal_price(american_price: i32) -> Result<DecimalOdds, OddsError> {
    Ok(AmericanOdds::new(american_price)?.to_decimal())
}

/// A complete quote with both sides converted to decimal odds.
#[derive(Debug, Clone, Copy)]
pub struct NormalizedQuote<'a> {
    pub quote: &'a Quote,
    /// American prices as quoted.
    pub home_price: i32,
    pub away_price: i32,
    pub home: DecimalOdds,
    pub away: DecimalOdds,
}

/// A quote excluded from evaluation because one of its prices is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedQuote {
    pub game_id: GameId,
    pub bookmaker: Bookmaker,
    pub price: i32,
    pub reason: String,
}

impl RejectedQuote {
    fn new(quote: &Quote, price: i32, error: OddsError) -> Self {
        Self {
            game_id: quote.game_id.clone(),
            bookmaker: quote.bookmaker.clone(),
            price,
            reason: error.to_string(),
        }
    }
}

/// Normalize a quote.
///
/// - `Ok(Some(_))`: both sides priced and valid
/// - `Ok(None)`: a side is not quoted (skipped, not an error)
/// - `Err(_)`: a quoted price is not valid American odds
pub fn normalize(quote: &Quote) -> Result<Option<NormalizedQuote<'_>>, RejectedQuote> {
    let (Some(home_price), Some(away_price)) = (quote.home_price, quote.away_price) else {
        return Ok(None);
    };

    let home = decimal_price(home_price).map_err(|e| RejectedQuote::new(quote, home_price, e))?;
    let away = decimal_price(away_price).map_err(|e| RejectedQuote::new(quote, away_price, e))?;

    Ok(Some(NormalizedQuote {
        quote,
        home_price,
        away_price,
        home,
        away,
    }))
}
