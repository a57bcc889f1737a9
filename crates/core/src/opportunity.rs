//! Arbitrage evaluation results.

use crate::{Bookmaker, DecimalOdds, GameId, Sport};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Decimal places kept on the reported implied probability sum.
pub const IMPLIED_PROBABILITY_DP: u32 = 4;
/// Decimal places kept on the reported profit margin.
pub const PROFIT_MARGIN_DP: u32 = 2;

/// Winning quote on one side of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestPrice {
    pub bookmaker: Bookmaker,
    /// Price as quoted (American).
    pub american: i32,
    /// Price as a decimal multiplier.
    pub decimal: DecimalOdds,
}

impl BestPrice {
    pub fn new(bookmaker: Bookmaker, american: i32, decimal: DecimalOdds) -> Self {
        Self {
            bookmaker,
            american,
            decimal,
        }
    }
}

/// Outcome of evaluating every quote of one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArbitrageResult {
    pub has_opportunity: bool,
    pub best_home: Option<BestPrice>,
    pub best_away: Option<BestPrice>,
    /// `1/best_home + 1/best_away`; set only when both sides resolved.
    pub implied_probability_sum: Option<Decimal>,
    /// `(1 - sum) * 100`; set only for opportunities.
    pub profit_margin_percent: Option<Decimal>,
}

impl ArbitrageResult {
    /// Result with no resolved side.
    pub fn empty() -> Self {
        Self {
            has_opportunity: false,
            best_home: None,
            best_away: None,
            implied_probability_sum: None,
            profit_margin_percent: None,
        }
    }

    pub fn best_home_price(&self) -> Option<DecimalOdds> {
        self.best_home.as_ref().map(|best| best.decimal)
    }

    pub fn best_home_bookmaker(&self) -> Option<&Bookmaker> {
        self.best_home.as_ref().map(|best| &best.bookmaker)
    }

    pub fn best_away_price(&self) -> Option<DecimalOdds> {
        self.best_away.as_ref().map(|best| best.decimal)
    }

    pub fn best_away_bookmaker(&self) -> Option<&Bookmaker> {
        self.best_away.as_ref().map(|best| &best.bookmaker)
    }

    /// Whether the two winning prices come from different bookmakers.
    pub fn is_cross_book(&self) -> bool {
        match (self.best_home_bookmaker(), self.best_away_bookmaker()) {
            (Some(home), Some(away)) => home != away,
            _ => false,
        }
    }

    /// Split a total stake across both sides so every outcome returns the
    /// same amount. Returns `(home_stake, away_stake)`.
    pub fn stake_split(&self, total: Decimal) -> Option<(Decimal, Decimal)> {
        let home = self.best_home_price()?.implied_probability();
        let away = self.best_away_price()?.implied_probability();
        let sum = home + away;
        if sum.is_zero() {
            return None;
        }
        let home_stake = total * home / sum;
        Some((home_stake, total - home_stake))
    }
}

impl Default for ArbitrageResult {
    fn default() -> Self {
        Self::empty()
    }
}

/// An opportunity as handed to storage, stamped by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpportunityRecord {
    pub game_id: GameId,
    pub sport: Sport,
    pub home_team: String,
    pub away_team: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commence_time: Option<DateTime<Utc>>,
    pub detected_at: DateTime<Utc>,
    pub result: ArbitrageResult,
}

impl OpportunityRecord {
    pub fn profit_margin_percent(&self) -> Decimal {
        self.result.profit_margin_percent.unwrap_or_default()
    }
}
