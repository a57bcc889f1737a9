//! Bookmaker quotes for two-outcome games.

use crate::{AmericanOdds, Bookmaker, DecimalOdds, GameId, OddsError, Sport};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Side of a two-outcome game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }
}

/// One bookmaker's two-sided moneyline price for one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub game_id: GameId,
    pub sport: Sport,
    pub home_team: String,
    pub away_team: String,
    pub bookmaker: Bookmaker,
    /// Display name of the bookmaker, when the source provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmaker_title: Option<String>,
    /// American odds on the home side, `None` when not quoted.
    pub home_price: Option<i32>,
    /// American odds on the away side, `None` when not quoted.
    pub away_price: Option<i32>,
    /// When the bookmaker last updated this price.
    pub observed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commence_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingested_at: Option<DateTime<Utc>>,
}

impl Quote {
    /// Create a quote with no prices yet.
    pub fn new(
        game_id: GameId,
        sport: Sport,
        home_team: impl Into<String>,
        away_team: impl Into<String>,
        bookmaker: Bookmaker,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            game_id,
            sport,
            home_team: home_team.into(),
            away_team: away_team.into(),
            bookmaker,
            bookmaker_title: None,
            home_price: None,
            away_price: None,
            observed_at,
            commence_time: None,
            ingested_at: None,
        }
    }

    /// Set both prices (builder pattern).
    pub fn with_prices(mut self, home_price: Option<i32>, away_price: Option<i32>) -> Self {
        self.home_price = home_price;
        self.away_price = away_price;
        self
    }

    /// Set the bookmaker display name (builder pattern).
    pub fn with_bookmaker_title(mut self, title: impl Into<String>) -> Self {
        self.bookmaker_title = Some(title.into());
        self
    }

    /// Set the scheduled start (builder pattern).
    pub fn with_commence_time(mut self, commence_time: DateTime<Utc>) -> Self {
        self.commence_time = Some(commence_time);
        self
    }

    /// Raw American price on a side.
    pub fn price(&self, side: Side) -> Option<i32> {
        match side {
            Side::Home => self.home_price,
            Side::Away => self.away_price,
        }
    }

    /// Team on a side.
    pub fn team(&self, side: Side) -> &str {
        match side {
            Side::Home => &self.home_team,
            Side::Away => &self.away_team,
        }
    }

    /// Both sides quoted.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.home_price.is_some() && self.away_price.is_some()
    }

    /// Name to show for the bookmaker: the title if known, else the key.
    pub fn bookmaker_name(&self) -> &str {
        self.bookmaker_title
            .as_deref()
            .unwrap_or_else(|| self.bookmaker.as_str())
    }

    /// Normalize both sides to decimal odds.
    ///
    /// `Ok(None)` when a side is not quoted; `Err` when a quoted price is not
    /// valid American odds.
    pub fn decimal_prices(&self) -> Result<Option<(DecimalOdds, DecimalOdds)>, OddsError> {
        let (Some(home), Some(away)) = (self.home_price, self.away_price) else {
            return Ok(None);
        };
        let home = AmericanOdds::new(home)?.to_decimal();
        let away = AmericanOdds::new(away)?.to_decimal();
        Ok(Some((home, away)))
    }
}
