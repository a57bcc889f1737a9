//! Arbitrage detector.
//!
//! Picks the best price on each side of one game across all bookmakers and
//! checks whether the implied probabilities of those prices sum below 1.

use crate::{normalize, RejectedQuote};
use odds_core::{
    ArbitrageResult, BestPrice, DecimalOdds, Quote, IMPLIED_PROBABILITY_DP, PROFIT_MARGIN_DP,
};
use rust_decimal::Decimal;
use tracing::{debug, warn};

/// Fewest valid quotes that can ever form an opportunity. One quote alone is
/// never a cross-book position.
pub const MIN_VALID_QUOTES: usize = 2;

/// Configuration for the arbitrage detector.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Valid two-sided quotes a game needs before it can be flagged.
    /// Values below [`MIN_VALID_QUOTES`] are raised to it.
    pub min_valid_quotes: usize,
}

impl DetectorConfig {
    /// The threshold actually applied.
    pub fn required_valid_quotes(&self) -> usize {
        self.min_valid_quotes.max(MIN_VALID_QUOTES)
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_valid_quotes: MIN_VALID_QUOTES,
        }
    }
}

/// Everything learned from evaluating one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameEvaluation {
    pub result: ArbitrageResult,
    /// Quotes that took part in the best-price search.
    pub valid_quotes: usize,
    /// Quotes skipped because a side was not quoted.
    pub incomplete: usize,
    /// Quotes excluded because a price was malformed.
    pub rejected: Vec<RejectedQuote>,
}

/// Evaluates the quotes of a single game.
#[derive(Debug, Clone, Default)]
pub struct ArbitrageDetector {
    config: DetectorConfig,
}

impl ArbitrageDetector {
    /// Create a new detector with the given configuration.
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Evaluate quotes that all belong to the same game.
    ///
    /// Ties on the best price keep the bookmaker seen first, so the result
    /// depends only on the input order.
    pub fn evaluate(&self, quotes: &[Quote]) -> GameEvaluation {
        let mut best_home: Option<BestPrice> = None;
        let mut best_away: Option<BestPrice> = None;
        let mut valid_quotes = 0;
        let mut incomplete = 0;
        let mut rejected = Vec::new();

        for quote in quotes {
            match normalize(quote) {
                Ok(Some(normalized)) => {
                    valid_quotes += 1;
                    consider(&mut best_home, quote, normalized.home_price, normalized.home);
                    consider(&mut best_away, quote, normalized.away_price, normalized.away);
                }
                Ok(None) => {
                    incomplete += 1;
                    debug!(
                        "Skipping incomplete quote: {} / {}",
                        quote.game_id, quote.bookmaker
                    );
                }
                Err(rejection) => {
                    warn!(
                        "Excluding quote {} / {}: {}",
                        rejection.game_id, rejection.bookmaker, rejection.reason
                    );
                    rejected.push(rejection);
                }
            }
        }

        let result = self.classify(best_home, best_away, valid_quotes);

        GameEvaluation {
            result,
            valid_quotes,
            incomplete,
            rejected,
        }
    }

    fn classify(
        &self,
        best_home: Option<BestPrice>,
        best_away: Option<BestPrice>,
        valid_quotes: usize,
    ) -> ArbitrageResult {
        let (Some(home), Some(away)) = (&best_home, &best_away) else {
            return ArbitrageResult {
                best_home,
                best_away,
                ..ArbitrageResult::empty()
            };
        };

        let sum = home.decimal.implied_probability() + away.decimal.implied_probability();
        let has_opportunity =
            sum < Decimal::ONE && valid_quotes >= self.config.required_valid_quotes();
        let profit_margin_percent = has_opportunity
            .then(|| ((Decimal::ONE - sum) * Decimal::ONE_HUNDRED).round_dp(PROFIT_MARGIN_DP));

        ArbitrageResult {
            has_opportunity,
            implied_probability_sum: Some(sum.round_dp(IMPLIED_PROBABILITY_DP)),
            profit_margin_percent,
            best_home,
            best_away,
        }
    }
}

/// Replace `best` if `decimal` beats it. Strictly greater, so ties keep the
/// earlier bookmaker.
fn consider(best: &mut Option<BestPrice>, quote: &Quote, american: i32, decimal: DecimalOdds) {
    let beats = best.as_ref().map_or(true, |current| decimal > current.decimal);
    if beats {
        *best = Some(BestPrice::new(quote.bookmaker.clone(), american, decimal));
    }
}

/// Evaluate one game's quotes with the default configuration.
pub fn evaluate(quotes: &[Quote]) -> ArbitrageResult {
    ArbitrageDetector::default().evaluate(quotes).result
}
